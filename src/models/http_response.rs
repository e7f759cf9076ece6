use serde::{Deserialize, Serialize};

use crate::models::card::Card;

/// Body of `POST /api/card/selected` on the card collaborator.
#[derive(Serialize, Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct SelectedCardsResponse {
    pub cards: Vec<Card>,
    #[serde(default)]
    pub cards_not_found: Vec<String>,
    #[serde(default)]
    pub invalid_card_guid: Vec<String>,
}
