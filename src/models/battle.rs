use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::player::{Player, PlayerIdentity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TicketStatus {
    Waiting,
    Active,
    Completed,
    Expired,
}

/// Which seat of a ticket a combatant occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Host,
    Opponent,
}

/// Result of a resolved battle, expressed by seat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Winner(Side),
    Draw,
}

/// Result of a resolved battle, expressed by player id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BattleResult {
    Winner(String),
    Draw,
}

/// One matchmaking attempt, from creation through pairing or expiry.
///
/// Transitions are one-way: `Waiting -> Active -> Completed` or
/// `Waiting -> Expired`. Every method refuses to leave a terminal state.
#[derive(Debug, Clone)]
pub struct BattleTicket {
    pub id: Uuid,
    pub host: Player,
    pub opponent: Option<Player>,
    pub status: TicketStatus,
    pub created_at: DateTime<Utc>,
    pub log: Vec<String>,
    pub winner: Option<String>,
}

impl BattleTicket {
    pub fn new(host: Player) -> Self {
        Self {
            id: Uuid::new_v4(),
            host,
            opponent: None,
            status: TicketStatus::Waiting,
            created_at: Utc::now(),
            log: Vec::new(),
            winner: None,
        }
    }

    pub fn is_claimable_by(&self, player_id: &str) -> bool {
        self.status == TicketStatus::Waiting && self.opponent.is_none() && self.host.id != player_id
    }

    /// Attaches `opponent` and moves the ticket to `Active`. Returns the
    /// opponent back when the ticket is no longer claimable.
    pub fn claim(&mut self, opponent: Player) -> Result<(), Player> {
        if !self.is_claimable_by(&opponent.id) {
            return Err(opponent);
        }

        self.opponent = Some(opponent);
        self.status = TicketStatus::Active;
        Ok(())
    }

    pub fn expire(&mut self) -> bool {
        if self.status != TicketStatus::Waiting {
            return false;
        }

        self.status = TicketStatus::Expired;
        true
    }

    pub fn complete(&mut self, log: Vec<String>, winner: Option<String>) -> bool {
        if self.status != TicketStatus::Active {
            return false;
        }

        self.log = log;
        self.winner = winner;
        self.status = TicketStatus::Completed;
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingChange {
    pub player_id: String,
    pub before: u32,
    pub after: u32,
}

/// What both callers of a paired ticket receive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleOutcome {
    pub ticket_id: Uuid,
    pub host: PlayerIdentity,
    pub opponent: PlayerIdentity,
    pub log: Vec<String>,
    pub result: BattleResult,
    pub rating_changes: Vec<RatingChange>,
}

impl BattleOutcome {
    pub fn is_draw(&self) -> bool {
        self.result == BattleResult::Draw
    }

    pub fn winner(&self) -> Option<&str> {
        match &self.result {
            BattleResult::Winner(id) => Some(id),
            BattleResult::Draw => None,
        }
    }

    pub fn opponent_of(&self, player_id: &str) -> &PlayerIdentity {
        if self.host.id == player_id {
            &self.opponent
        } else {
            &self.host
        }
    }
}

/// Expected results of "join battle queue".
#[derive(Debug, Clone, PartialEq)]
pub enum BattleReport {
    Resolved(BattleOutcome),
    NoOpponentFound,
}

/// A battle as held by the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleRecord {
    pub id: Uuid,
    pub host_id: String,
    pub opponent_id: String,
    pub started_at: DateTime<Utc>,
    pub log: Vec<String>,
    pub winner: Option<String>,
    pub crowned: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::card::{Card, Element};
    use crate::models::deck::BattleDeck;

    fn player(id: &str) -> Player {
        let cards = (0..4)
            .map(|i| Card::monster(&format!("{id}-{i}"), "Ork", 40.0, Element::Normal, None))
            .collect();
        Player {
            id: id.to_string(),
            username: id.to_string(),
            rating: 100,
            deck: BattleDeck::new(cards).unwrap(),
        }
    }

    #[test]
    fn claim_is_one_shot() {
        let mut ticket = BattleTicket::new(player("host"));
        assert!(ticket.claim(player("first")).is_ok());
        assert_eq!(ticket.status, TicketStatus::Active);

        let rejected = ticket.claim(player("second")).unwrap_err();
        assert_eq!(rejected.id, "second");
        assert_eq!(ticket.opponent.as_ref().unwrap().id, "first");
    }

    #[test]
    fn host_cannot_claim_own_ticket() {
        let mut ticket = BattleTicket::new(player("host"));
        assert!(ticket.claim(player("host")).is_err());
        assert_eq!(ticket.status, TicketStatus::Waiting);
    }

    #[test]
    fn expired_ticket_cannot_be_claimed_or_completed() {
        let mut ticket = BattleTicket::new(player("host"));
        assert!(ticket.expire());
        assert!(!ticket.expire());
        assert!(ticket.claim(player("late")).is_err());
        assert!(!ticket.complete(vec![], None));
        assert_eq!(ticket.status, TicketStatus::Expired);
    }

    #[test]
    fn completed_ticket_is_immutable() {
        let mut ticket = BattleTicket::new(player("host"));
        ticket.claim(player("guest")).unwrap();
        assert!(ticket.complete(vec!["line".to_string()], Some("host".to_string())));
        assert!(!ticket.complete(vec![], None));
        assert!(!ticket.expire());
        assert_eq!(ticket.log, vec!["line".to_string()]);
    }
}
