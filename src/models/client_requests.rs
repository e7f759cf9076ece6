use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::player::PlayerIdentity;

pub const MAX_PLAYER_ID_LEN: usize = 64;
pub const MAX_USERNAME_LEN: usize = 32;

/// Payload of a `JoinBattle` packet.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
pub struct JoinBattleRequest {
    pub player_id: String,
    pub username: String,
}

impl JoinBattleRequest {
    /// Rejects requests without an identity or with oversized names, which
    /// would not fit in a result packet.
    pub fn into_identity(self) -> Result<PlayerIdentity, &'static str> {
        if self.player_id.trim().is_empty() {
            return Err("Missing player id.");
        }
        if self.player_id.chars().count() > MAX_PLAYER_ID_LEN {
            return Err("Player id is too long.");
        }
        if self.username.chars().count() > MAX_USERNAME_LEN {
            return Err("Username is too long.");
        }

        let username = if self.username.trim().is_empty() {
            self.player_id.clone()
        } else {
            self.username
        };
        Ok(PlayerIdentity {
            id: self.player_id,
            username,
        })
    }
}

/// Payload of a `FindBattle` packet.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FindBattleRequest {
    pub battle_id: Uuid,
}

/// Payload of a `PlayerStats` packet.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PlayerStatsRequest {
    pub player_id: String,
}
