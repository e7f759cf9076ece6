use std::sync::Arc;

use game::battle_service::{BattlePorts, BattleService};
use models::settings::Settings;
use storage::{HttpDeckProvider, MemoryLedger, MemoryRatings};
use tcp::server::BattleServer;

mod game;
mod models;
mod storage;
mod tcp;
mod utils;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::load()?;
    utils::logger::init(&settings.log_filter);

    let ports = BattlePorts {
        decks: Arc::new(HttpDeckProvider::new(&settings.deck_server, &settings.card_server)),
        ratings: Arc::new(MemoryRatings::new(settings.starting_rating)),
        ledger: Arc::new(MemoryLedger::new()),
    };
    let service = Arc::new(BattleService::from_settings(&settings, ports));

    let server = BattleServer::bind(&settings.server_host, settings.server_port, service).await?;
    logger!(
        INFO,
        "[SERVER] Queue timeout {}s, round cap {}, rating delta {}",
        settings.queue_timeout_secs,
        settings.round_cap,
        settings.rating_delta
    );
    Arc::new(server).run().await;

    Ok(())
}
