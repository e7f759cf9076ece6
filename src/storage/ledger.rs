use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::battle::BattleRecord;
use crate::utils::errors::StorageError;

/// Append-only persistence of battles.
///
/// Each call is atomic at the storage boundary. `Ok(false)` means the store
/// refused the write (unknown battle, battle already crowned, ...).
///
/// Replaying a call that already committed is accepted without writing
/// again, so a call may be retried after an error that hid its commit.
/// A battle that was started but never crowned is void.
#[async_trait]
pub trait BattleLedger: Send + Sync {
    async fn start_battle(&self, ticket_id: Uuid, host_id: &str, opponent_id: &str) -> Result<bool, StorageError>;

    /// Stores line number `index` (from 0). Lines must arrive in order: an
    /// index past the end of the log is refused.
    async fn append_log(&self, ticket_id: Uuid, index: usize, text: &str) -> Result<bool, StorageError>;

    /// Records the winner, or a draw when `winner_id` is `None`. Closes the battle.
    async fn crown_winner(&self, ticket_id: Uuid, winner_id: Option<&str>) -> Result<bool, StorageError>;

    async fn find_battle_by_id(&self, ticket_id: Uuid) -> Result<BattleRecord, StorageError>;
}

/// In-process ledger.
#[derive(Default)]
pub struct MemoryLedger {
    battles: RwLock<HashMap<Uuid, BattleRecord>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub async fn battle_count(&self) -> usize {
        self.battles.read().await.len()
    }

    #[cfg(test)]
    pub async fn crowned_count(&self) -> usize {
        self.battles.read().await.values().filter(|b| b.crowned).count()
    }
}

#[async_trait]
impl BattleLedger for MemoryLedger {
    async fn start_battle(&self, ticket_id: Uuid, host_id: &str, opponent_id: &str) -> Result<bool, StorageError> {
        let mut battles = self.battles.write().await;
        if host_id == opponent_id {
            return Ok(false);
        }
        if let Some(battle) = battles.get(&ticket_id) {
            let replay = !battle.crowned && battle.host_id == host_id && battle.opponent_id == opponent_id;
            return Ok(replay);
        }

        battles.insert(
            ticket_id,
            BattleRecord {
                id: ticket_id,
                host_id: host_id.to_string(),
                opponent_id: opponent_id.to_string(),
                started_at: Utc::now(),
                log: Vec::new(),
                winner: None,
                crowned: false,
            },
        );
        Ok(true)
    }

    async fn append_log(&self, ticket_id: Uuid, index: usize, text: &str) -> Result<bool, StorageError> {
        let mut battles = self.battles.write().await;
        let Some(battle) = battles.get_mut(&ticket_id).filter(|b| !b.crowned) else {
            return Ok(false);
        };

        if index == battle.log.len() {
            battle.log.push(text.to_string());
            return Ok(true);
        }
        Ok(battle.log.get(index).is_some_and(|line| line == text))
    }

    async fn crown_winner(&self, ticket_id: Uuid, winner_id: Option<&str>) -> Result<bool, StorageError> {
        let mut battles = self.battles.write().await;
        let Some(battle) = battles.get_mut(&ticket_id) else {
            return Ok(false);
        };

        let participant = match winner_id {
            Some(id) => id == battle.host_id || id == battle.opponent_id,
            None => true,
        };
        if battle.crowned {
            return Ok(battle.winner.as_deref() == winner_id);
        }
        if !participant {
            return Ok(false);
        }

        battle.winner = winner_id.map(str::to_string);
        battle.crowned = true;
        Ok(true)
    }

    async fn find_battle_by_id(&self, ticket_id: Uuid) -> Result<BattleRecord, StorageError> {
        self.battles
            .read()
            .await
            .get(&ticket_id)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(ticket_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_battle_in_order() {
        let ledger = MemoryLedger::new();
        let id = Uuid::new_v4();

        assert_eq!(ledger.start_battle(id, "alice", "bob").await, Ok(true));
        assert_eq!(ledger.append_log(id, 0, "first").await, Ok(true));
        assert_eq!(ledger.append_log(id, 1, "second").await, Ok(true));
        assert_eq!(ledger.crown_winner(id, Some("bob")).await, Ok(true));

        let record = ledger.find_battle_by_id(id).await.unwrap();
        assert_eq!(record.log, vec!["first".to_string(), "second".to_string()]);
        assert_eq!(record.winner.as_deref(), Some("bob"));
        assert!(record.crowned);
    }

    #[tokio::test]
    async fn replayed_writes_are_not_duplicated() {
        let ledger = MemoryLedger::new();
        let id = Uuid::new_v4();

        assert_eq!(ledger.start_battle(id, "alice", "bob").await, Ok(true));
        assert_eq!(ledger.start_battle(id, "alice", "bob").await, Ok(true));
        assert_eq!(ledger.append_log(id, 0, "first").await, Ok(true));
        assert_eq!(ledger.append_log(id, 0, "first").await, Ok(true));
        assert_eq!(ledger.append_log(id, 0, "other").await, Ok(false));
        assert_eq!(ledger.append_log(id, 2, "gap").await, Ok(false));
        assert_eq!(ledger.crown_winner(id, Some("alice")).await, Ok(true));
        assert_eq!(ledger.crown_winner(id, Some("alice")).await, Ok(true));

        let record = ledger.find_battle_by_id(id).await.unwrap();
        assert_eq!(record.log, vec!["first".to_string()]);
        assert_eq!(ledger.battle_count().await, 1);
    }

    #[tokio::test]
    async fn refuses_writes_after_crowning() {
        let ledger = MemoryLedger::new();
        let id = Uuid::new_v4();
        ledger.start_battle(id, "alice", "bob").await.unwrap();
        ledger.crown_winner(id, None).await.unwrap();

        assert_eq!(ledger.append_log(id, 0, "late").await, Ok(false));
        assert_eq!(ledger.crown_winner(id, Some("alice")).await, Ok(false));
        assert_eq!(ledger.start_battle(id, "alice", "bob").await, Ok(false));
        assert_eq!(ledger.find_battle_by_id(id).await.unwrap().winner, None);
    }

    #[tokio::test]
    async fn refuses_unknown_battles_and_strangers() {
        let ledger = MemoryLedger::new();
        let id = Uuid::new_v4();

        assert_eq!(ledger.append_log(id, 0, "orphan").await, Ok(false));
        assert!(matches!(ledger.find_battle_by_id(id).await, Err(StorageError::NotFound(_))));

        ledger.start_battle(id, "alice", "bob").await.unwrap();
        assert_eq!(ledger.start_battle(id, "alice", "carol").await, Ok(false));
        assert_eq!(ledger.start_battle(Uuid::new_v4(), "alice", "alice").await, Ok(false));
        assert_eq!(ledger.crown_winner(id, Some("mallory")).await, Ok(false));
    }
}
