use crate::models::battle::{RatingChange, Side, Verdict};

pub const DEFAULT_RATING_DELTA: u32 = 3;

/// A player's rating as read from the store when the battle is rated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Seat<'a> {
    pub player_id: &'a str,
    pub rating: u32,
}

/// Symmetric rating adjustment: the winner gains `delta`, the loser loses
/// `delta` but never drops below zero. A drawn battle changes nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatingAdjuster {
    delta: u32,
}

impl Default for RatingAdjuster {
    fn default() -> Self {
        RatingAdjuster::new(DEFAULT_RATING_DELTA)
    }
}

impl RatingAdjuster {
    pub fn new(delta: u32) -> Self {
        Self { delta }
    }

    pub fn winner_rating(&self, rating: u32) -> u32 {
        rating.saturating_add(self.delta)
    }

    pub fn loser_rating(&self, rating: u32) -> u32 {
        rating.saturating_sub(self.delta)
    }

    /// Rating changes for both seats, winner first. Empty on a draw.
    pub fn changes(&self, verdict: Verdict, host: Seat<'_>, opponent: Seat<'_>) -> Vec<RatingChange> {
        let (winner, loser) = match verdict {
            Verdict::Draw => return Vec::new(),
            Verdict::Winner(Side::Host) => (host, opponent),
            Verdict::Winner(Side::Opponent) => (opponent, host),
        };

        vec![
            RatingChange {
                player_id: winner.player_id.to_string(),
                before: winner.rating,
                after: self.winner_rating(winner.rating),
            },
            RatingChange {
                player_id: loser.player_id.to_string(),
                before: loser.rating,
                after: self.loser_rating(loser.rating),
            },
        ]
    }
}

impl RatingChange {
    /// Signed difference to hand to the rating store.
    pub fn delta(&self) -> i64 {
        i64::from(self.after) - i64::from(self.before)
    }
}
