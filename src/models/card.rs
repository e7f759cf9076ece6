use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Element {
    Fire,
    Water,
    Normal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CardKind {
    Monster,
    Spell,
}

/// Monster species that take part in special rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Species {
    Goblin,
    Dragon,
    Wizard,
    Ork,
    Knight,
    Kraken,
    FireElf,
}

/// Reference to a card as stored in a deck.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CardRef {
    pub id: String,
    #[serde(default = "default_amount")]
    pub amount: u32,
}

fn default_amount() -> u32 {
    1
}

/// Full card data as served by the card collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: String,
    pub name: String,
    pub damage: f64,
    pub element: Element,
    pub kind: CardKind,
    #[serde(default)]
    pub species: Option<Species>,
}

#[cfg(test)]
impl Card {
    pub fn monster(id: &str, name: &str, damage: f64, element: Element, species: Option<Species>) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            damage,
            element,
            kind: CardKind::Monster,
            species,
        }
    }

    pub fn spell(id: &str, name: &str, damage: f64, element: Element) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            damage,
            element,
            kind: CardKind::Spell,
            species: None,
        }
    }
}

impl Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
