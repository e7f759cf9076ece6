#[cfg(test)]
use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::StatusCode;
#[cfg(test)]
use tokio::sync::RwLock;

use crate::logger;
use crate::models::card::Card;
use crate::models::deck::{BattleDeck, Deck};
use crate::models::http_response::SelectedCardsResponse;
use crate::utils::errors::{DeckError, StorageError};

/// Lookup of a player's battle deck.
#[async_trait]
pub trait DeckProvider: Send + Sync {
    /// The player's four battle cards, or [`DeckError::NotConfigured`].
    async fn get_deck(&self, player_id: &str) -> Result<BattleDeck, DeckError>;
}

/// Decks held in process.
#[cfg(test)]
#[derive(Default)]
pub struct MemoryDecks {
    decks: RwLock<HashMap<String, BattleDeck>>,
}

#[cfg(test)]
impl MemoryDecks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, player_id: &str, deck: BattleDeck) {
        self.decks.write().await.insert(player_id.to_string(), deck);
    }
}

#[cfg(test)]
#[async_trait]
impl DeckProvider for MemoryDecks {
    async fn get_deck(&self, player_id: &str) -> Result<BattleDeck, DeckError> {
        self.decks
            .read()
            .await
            .get(player_id)
            .cloned()
            .ok_or(DeckError::NotConfigured)
    }
}

/// Fetches decks from the deck server and their cards from the card server.
pub struct HttpDeckProvider {
    client: reqwest::Client,
    deck_server: String,
    card_server: String,
}

impl HttpDeckProvider {
    pub fn new(deck_server: &str, card_server: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            deck_server: deck_server.trim_end_matches('/').to_string(),
            card_server: card_server.trim_end_matches('/').to_string(),
        }
    }

    /// Request the DECK_SERVER for the player's active deck.
    async fn request_deck(&self, player_id: &str) -> Result<Deck, DeckError> {
        let api_url = format!("{}/api/deck/player/{}/active", self.deck_server, player_id);
        let response = self
            .client
            .get(api_url)
            .send()
            .await
            .map_err(|e| StorageError::Request(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(DeckError::NotConfigured),
            StatusCode::OK => response
                .json::<Deck>()
                .await
                .map_err(|e| DeckError::Storage(StorageError::InvalidResponse(e.to_string()))),
            status => {
                let body = response.text().await.unwrap_or("NO MESSAGE".to_string());
                Err(StorageError::Request(format!("{status}: {body}")).into())
            }
        }
    }

    /// Request the CARD_SERVER for the full data of the selected cards.
    async fn request_cards(&self, deck: &Deck) -> Result<Vec<Card>, DeckError> {
        let api_url = format!("{}/api/card/selected", self.card_server);
        let card_ids: Vec<&String> = deck.cards.iter().map(|c| &c.id).collect();
        let body = serde_json::json!({ "cardIds": card_ids });

        let response = self
            .client
            .post(api_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| StorageError::Request(e.to_string()))?;

        if response.status() != StatusCode::OK {
            let status = response.status();
            let body = response.text().await.unwrap_or("NO MESSAGE".to_string());
            return Err(StorageError::Request(format!("{status}: {body}")).into());
        }

        let selected = response
            .json::<SelectedCardsResponse>()
            .await
            .map_err(|e| StorageError::InvalidResponse(e.to_string()))?;

        if !selected.cards_not_found.is_empty() || !selected.invalid_card_guid.is_empty() {
            return Err(DeckError::InvalidDeck(format!(
                "Not found: {}, Invalid cards: {}",
                selected.cards_not_found.len(),
                selected.invalid_card_guid.len()
            )));
        }

        Ok(selected.cards)
    }
}

#[async_trait]
impl DeckProvider for HttpDeckProvider {
    async fn get_deck(&self, player_id: &str) -> Result<BattleDeck, DeckError> {
        let deck = self.request_deck(player_id).await?;
        deck.validate(player_id)?;

        let mut cards = self.request_cards(&deck).await?;
        logger!(DEBUG, "[DECKS] Fetched {} cards from `{player_id}`'s deck `{}`", cards.len(), deck.name);

        // Keep the deck's own order regardless of how the card server sorts.
        let mut ordered = Vec::with_capacity(deck.cards.len());
        for card_ref in &deck.cards {
            let position = cards
                .iter()
                .position(|c| c.id == card_ref.id)
                .ok_or_else(|| DeckError::InvalidDeck(format!("card `{}` missing from response", card_ref.id)))?;
            ordered.push(cards.swap_remove(position));
        }

        BattleDeck::new(ordered)
    }
}
