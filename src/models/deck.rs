use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::models::card::{Card, CardRef};
use crate::utils::errors::DeckError;

pub const DECK_SIZE: usize = 4;
pub const MAX_CARD_NAME_LEN: usize = 32;

/// Deck as configured by the player through the deck collaborator.
#[derive(Debug, Deserialize, Serialize)]
pub struct Deck {
    pub id: String,
    #[serde(rename = "playerId")]
    pub player_id: String,
    pub name: String,
    pub cards: Vec<CardRef>,
}

impl Deck {
    /// Checks the deck belongs to `player_id` and references exactly four
    /// distinct cards, one copy each.
    pub fn validate(&self, player_id: &str) -> Result<(), DeckError> {
        if self.cards.is_empty() {
            return Err(DeckError::NotConfigured);
        }
        if self.player_id != player_id {
            return Err(DeckError::InvalidDeck(format!("deck `{}` belongs to another player", self.id)));
        }
        if let Some(card) = self.cards.iter().find(|c| c.amount != 1) {
            return Err(DeckError::InvalidDeck(format!("{} copies of card `{}`", card.amount, card.id)));
        }

        let ids: Vec<&str> = self.cards.iter().map(|c| c.id.as_str()).collect();
        check_distinct(&ids)
    }
}

/// A validated four-card deck ready to enter a battle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleDeck {
    cards: [Card; DECK_SIZE],
}

impl BattleDeck {
    pub fn new(cards: Vec<Card>) -> Result<Self, DeckError> {
        let ids: Vec<&str> = cards.iter().map(|c| c.id.as_str()).collect();
        check_distinct(&ids)?;
        if let Some(card) = cards.iter().find(|c| c.name.chars().count() > MAX_CARD_NAME_LEN) {
            return Err(DeckError::InvalidDeck(format!("name of card `{}` is too long", card.id)));
        }

        let cards: [Card; DECK_SIZE] = cards
            .try_into()
            .map_err(|_| DeckError::InvalidDeck("deck conversion failed".to_string()))?;
        Ok(Self { cards })
    }

    pub fn cards(&self) -> &[Card; DECK_SIZE] {
        &self.cards
    }
}

fn check_distinct(ids: &[&str]) -> Result<(), DeckError> {
    if ids.len() != DECK_SIZE {
        return Err(DeckError::InvalidDeck(format!(
            "expected {DECK_SIZE} cards, found {}",
            ids.len()
        )));
    }

    let unique: HashSet<&&str> = ids.iter().collect();
    if unique.len() != ids.len() {
        return Err(DeckError::InvalidDeck("duplicate card in deck".to_string()));
    }

    Ok(())
}
