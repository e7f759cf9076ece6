use tracing_subscriber::{fmt::time::ChronoLocal, EnvFilter};

const TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

/// Installs the global subscriber.
///
/// `RUST_LOG` takes precedence over `filter` when set. Calling this twice is
/// harmless: the second installation is ignored.
pub fn init(filter: &str) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_timer(ChronoLocal::new(TIMESTAMP_FORMAT.to_string()))
        .with_target(false)
        .try_init();
}

#[macro_export]
macro_rules! logger {
    (INFO, $($arg:tt)*) => {
        ::tracing::info!($($arg)*)
    };
    (DEBUG, $($arg:tt)*) => {
        ::tracing::debug!($($arg)*)
    };
    (WARN, $($arg:tt)*) => {
        ::tracing::warn!($($arg)*)
    };
    (ERROR, $($arg:tt)*) => {
        ::tracing::error!($($arg)*)
    };
}
