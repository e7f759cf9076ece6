use serde::{Deserialize, Serialize};

use crate::models::deck::BattleDeck;

/// A player admitted to matchmaking: identity, current rating and a
/// validated deck.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: String,
    pub username: String,
    pub rating: u32,
    pub deck: BattleDeck,
}

/// Identity of the caller of "join battle queue".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerIdentity {
    pub id: String,
    pub username: String,
}

impl PlayerIdentity {
    pub fn new(id: &str, username: &str) -> Self {
        Self {
            id: id.to_string(),
            username: username.to_string(),
        }
    }
}

/// Win/loss/draw counters kept next to the rating.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub rating: u32,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
}
