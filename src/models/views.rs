use serde::{Deserialize, Serialize};

use crate::models::battle::BattleOutcome;

/// A battle outcome as sent to one of its two players.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BattleOutcomeView {
    pub battle_id: String,
    pub opponent_id: String,
    pub opponent_name: String,
    pub log: Vec<String>,
    pub winner_id: Option<String>,
    pub draw: bool,
    pub won: bool,
    pub rating: Option<u32>,
}

impl BattleOutcomeView {
    pub fn for_player(outcome: &BattleOutcome, player_id: &str) -> Self {
        let opponent = outcome.opponent_of(player_id);
        let rating = outcome
            .rating_changes
            .iter()
            .find(|change| change.player_id == player_id)
            .map(|change| change.after);

        Self {
            battle_id: outcome.ticket_id.to_string(),
            opponent_id: opponent.id.clone(),
            opponent_name: opponent.username.clone(),
            log: outcome.log.clone(),
            winner_id: outcome.winner().map(str::to_string),
            draw: outcome.is_draw(),
            won: outcome.winner() == Some(player_id),
            rating,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::battle::{BattleResult, RatingChange};
    use crate::models::player::PlayerIdentity;
    use uuid::Uuid;

    #[test]
    fn view_is_personalised() {
        let outcome = BattleOutcome {
            ticket_id: Uuid::new_v4(),
            host: PlayerIdentity::new("alice", "Alice"),
            opponent: PlayerIdentity::new("bob", "Bob"),
            log: vec!["Round 1".to_string()],
            result: BattleResult::Winner("bob".to_string()),
            rating_changes: vec![
                RatingChange { player_id: "bob".to_string(), before: 100, after: 103 },
                RatingChange { player_id: "alice".to_string(), before: 100, after: 97 },
            ],
        };

        let alice = BattleOutcomeView::for_player(&outcome, "alice");
        assert_eq!(alice.opponent_name, "Bob");
        assert!(!alice.won);
        assert_eq!(alice.rating, Some(97));

        let bob = BattleOutcomeView::for_player(&outcome, "bob");
        assert_eq!(bob.opponent_id, "alice");
        assert!(bob.won);
        assert_eq!(bob.rating, Some(103));
    }
}
