use thiserror::Error;
use uuid::Uuid;

/// Failures surfaced by the "join battle queue" operation.
///
/// A queue timeout is not an error; it travels as `BattleReport::NoOpponentFound`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BattleError {
    #[error("Player `{0}` has no battle deck configured")]
    DeckNotConfigured(String),
    #[error("Player `{0}` is already queued or battling")]
    AlreadyQueued(String),
    #[error("Storage failure: {0}")]
    StorageFailure(String),
    #[error("Battle `{0}` was abandoned before a result was delivered")]
    Interrupted(Uuid),
    #[error("Battle `{0}` not found")]
    BattleNotFound(Uuid),
}

/// Errors raised by the persistence collaborators.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StorageError {
    #[error("Storage is unavailable")]
    Unavailable,
    #[error("Storage rejected `{operation}`")]
    Rejected { operation: String },
    #[error("Record not found: {0}")]
    NotFound(String),
    #[error("Storage request failed: {0}")]
    Request(String),
    #[error("Invalid storage response: {0}")]
    InvalidResponse(String),
}

impl From<StorageError> for BattleError {
    fn from(error: StorageError) -> Self {
        BattleError::StorageFailure(error.to_string())
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DeckError {
    #[error("No deck configured")]
    NotConfigured,
    #[error("Invalid deck: {0}")]
    InvalidDeck(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Invalid header: {0}")]
    InvalidHeaderError(String),
    #[error("Invalid packet: {0}")]
    InvalidPacketError(String),
    #[error("Unable to encode payload: {0}")]
    EncodeError(String),
    #[error("Unable to decode payload: {0}")]
    DecodeError(String),
}

#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("Unable to write packet: {0}")]
    PackageWriteError(String),
    #[error("Unable to read packet: {0}")]
    PackageReadError(String),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
