//! Ports to the collaborators that own decks, ratings and the battle log,
//! with in-process and HTTP implementations.

pub mod decks;
pub mod ledger;
pub mod ratings;
pub mod retry;

pub use decks::{DeckProvider, HttpDeckProvider};
#[cfg(test)]
pub use decks::MemoryDecks;
pub use ledger::{BattleLedger, MemoryLedger};
pub use ratings::{MemoryRatings, RatingStore, Standing};
pub use retry::RetryPolicy;
