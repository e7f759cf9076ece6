use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::player::PlayerStats;
use crate::utils::errors::StorageError;

/// How a battle ended for one player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Standing {
    Won,
    Lost,
    Drew,
}

/// Rating persistence owned by the player collaborator.
///
/// Writes are keyed by battle: repeating a write for the same player and
/// battle is accepted without applying it twice.
#[async_trait]
pub trait RatingStore: Send + Sync {
    async fn rating(&self, player_id: &str) -> Result<u32, StorageError>;

    /// Applies a signed delta. The stored rating never goes below zero.
    async fn update_rating(&self, player_id: &str, battle_id: Uuid, delta: i64) -> Result<bool, StorageError>;

    /// Bumps the win/loss/draw counters.
    async fn record_standing(&self, player_id: &str, battle_id: Uuid, standing: Standing)
        -> Result<bool, StorageError>;

    /// Takes back whatever `battle_id` applied to the player. Nothing applied
    /// is not an error.
    async fn revert_battle(&self, player_id: &str, battle_id: Uuid) -> Result<bool, StorageError>;

    async fn stats(&self, player_id: &str) -> Result<PlayerStats, StorageError>;
}

/// What one battle changed for one player.
#[derive(Debug, Clone, Copy, Default)]
struct Applied {
    rating_delta: Option<i64>,
    standing: Option<Standing>,
}

#[derive(Default)]
struct Book {
    players: HashMap<String, PlayerStats>,
    applied: HashMap<(String, Uuid), Applied>,
}

/// In-process rating store. Unknown players start at `starting_rating`.
pub struct MemoryRatings {
    starting_rating: u32,
    book: RwLock<Book>,
}

impl MemoryRatings {
    pub fn new(starting_rating: u32) -> Self {
        Self {
            starting_rating,
            book: RwLock::new(Book::default()),
        }
    }

    #[cfg(test)]
    pub async fn set_rating(&self, player_id: &str, rating: u32) {
        let fresh = self.fresh();
        let mut book = self.book.write().await;
        book.players.entry(player_id.to_string()).or_insert(fresh).rating = rating;
    }

    fn fresh(&self) -> PlayerStats {
        PlayerStats {
            rating: self.starting_rating,
            ..PlayerStats::default()
        }
    }
}

fn apply_delta(stats: &mut PlayerStats, delta: i64) -> i64 {
    let before = i64::from(stats.rating);
    let updated = (before + delta).clamp(0, i64::from(u32::MAX));
    stats.rating = updated as u32;
    updated - before
}

fn counter(stats: &mut PlayerStats, standing: Standing) -> &mut u32 {
    match standing {
        Standing::Won => &mut stats.wins,
        Standing::Lost => &mut stats.losses,
        Standing::Drew => &mut stats.draws,
    }
}

#[async_trait]
impl RatingStore for MemoryRatings {
    async fn rating(&self, player_id: &str) -> Result<u32, StorageError> {
        Ok(self.stats(player_id).await?.rating)
    }

    async fn update_rating(&self, player_id: &str, battle_id: Uuid, delta: i64) -> Result<bool, StorageError> {
        let fresh = self.fresh();
        let mut book = self.book.write().await;
        let key = (player_id.to_string(), battle_id);
        if book.applied.get(&key).is_some_and(|a| a.rating_delta.is_some()) {
            return Ok(true);
        }

        let stats = book.players.entry(player_id.to_string()).or_insert(fresh);
        let applied = apply_delta(stats, delta);
        book.applied.entry(key).or_default().rating_delta = Some(applied);
        Ok(true)
    }

    async fn record_standing(
        &self,
        player_id: &str,
        battle_id: Uuid,
        standing: Standing,
    ) -> Result<bool, StorageError> {
        let fresh = self.fresh();
        let mut book = self.book.write().await;
        let key = (player_id.to_string(), battle_id);
        if let Some(recorded) = book.applied.get(&key).and_then(|a| a.standing) {
            return Ok(recorded == standing);
        }

        let stats = book.players.entry(player_id.to_string()).or_insert(fresh);
        *counter(stats, standing) += 1;
        book.applied.entry(key).or_default().standing = Some(standing);
        Ok(true)
    }

    async fn revert_battle(&self, player_id: &str, battle_id: Uuid) -> Result<bool, StorageError> {
        let mut book = self.book.write().await;
        let Some(applied) = book.applied.remove(&(player_id.to_string(), battle_id)) else {
            return Ok(true);
        };
        let Some(stats) = book.players.get_mut(player_id) else {
            return Ok(true);
        };

        if let Some(delta) = applied.rating_delta {
            apply_delta(stats, -delta);
        }
        if let Some(standing) = applied.standing {
            let count = counter(stats, standing);
            *count = count.saturating_sub(1);
        }
        Ok(true)
    }

    async fn stats(&self, player_id: &str) -> Result<PlayerStats, StorageError> {
        let book = self.book.read().await;
        Ok(book.players.get(player_id).copied().unwrap_or_else(|| self.fresh()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unknown_player_starts_at_default() {
        let ratings = MemoryRatings::new(100);
        assert_eq!(ratings.rating("nobody").await, Ok(100));
    }

    #[tokio::test]
    async fn deltas_accumulate_and_floor_at_zero() {
        let ratings = MemoryRatings::new(100);
        ratings.update_rating("alice", Uuid::new_v4(), 3).await.unwrap();
        assert_eq!(ratings.rating("alice").await, Ok(103));

        ratings.update_rating("alice", Uuid::new_v4(), -500).await.unwrap();
        assert_eq!(ratings.rating("alice").await, Ok(0));
    }

    #[tokio::test]
    async fn repeated_writes_for_a_battle_apply_once() {
        let ratings = MemoryRatings::new(100);
        let battle = Uuid::new_v4();

        assert_eq!(ratings.update_rating("alice", battle, 3).await, Ok(true));
        assert_eq!(ratings.update_rating("alice", battle, 3).await, Ok(true));
        assert_eq!(ratings.record_standing("alice", battle, Standing::Won).await, Ok(true));
        assert_eq!(ratings.record_standing("alice", battle, Standing::Won).await, Ok(true));
        assert_eq!(ratings.record_standing("alice", battle, Standing::Lost).await, Ok(false));

        let stats = ratings.stats("alice").await.unwrap();
        assert_eq!((stats.rating, stats.wins, stats.losses), (103, 1, 0));
    }

    #[tokio::test]
    async fn revert_takes_back_the_clamped_delta() {
        let ratings = MemoryRatings::new(100);
        ratings.set_rating("bob", 2).await;
        let battle = Uuid::new_v4();

        ratings.update_rating("bob", battle, -3).await.unwrap();
        ratings.record_standing("bob", battle, Standing::Lost).await.unwrap();
        ratings.update_rating("bob", Uuid::new_v4(), 10).await.unwrap();
        assert_eq!(ratings.rating("bob").await, Ok(10));

        assert_eq!(ratings.revert_battle("bob", battle).await, Ok(true));
        let stats = ratings.stats("bob").await.unwrap();
        assert_eq!((stats.rating, stats.losses), (12, 0));

        // Nothing left to take back.
        assert_eq!(ratings.revert_battle("bob", battle).await, Ok(true));
        assert_eq!(ratings.rating("bob").await, Ok(12));
    }
}
