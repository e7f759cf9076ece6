use std::fmt::{self, Display};

use crate::models::battle::Side;
use crate::models::card::{Card, CardKind, Element, Species};

impl Element {
    /// Damage multiplier applied to an attacker of this element hitting
    /// `defender`. Water > Fire > Normal > Water.
    pub fn multiplier_against(self, defender: Element) -> f64 {
        match (self, defender) {
            (Element::Water, Element::Fire)
            | (Element::Fire, Element::Normal)
            | (Element::Normal, Element::Water) => 2.0,
            (Element::Fire, Element::Water)
            | (Element::Normal, Element::Fire)
            | (Element::Water, Element::Normal) => 0.5,
            (Element::Fire, Element::Fire)
            | (Element::Water, Element::Water)
            | (Element::Normal, Element::Normal) => 1.0,
        }
    }
}

/// Species interactions that decide a round regardless of damage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialRule {
    DragonScaresGoblin,
    WizardControlsOrk,
    KnightDrowns,
    KrakenResistsSpells,
    FireElfEvadesDragon,
}

impl SpecialRule {
    /// The rule under which `winner` beats `loser`, if any.
    fn between(winner: &Card, loser: &Card) -> Option<SpecialRule> {
        match (winner.species, winner.kind, winner.element, loser.species, loser.kind) {
            (Some(Species::Dragon), _, _, Some(Species::Goblin), _) => Some(SpecialRule::DragonScaresGoblin),
            (Some(Species::Wizard), _, _, Some(Species::Ork), _) => Some(SpecialRule::WizardControlsOrk),
            (_, CardKind::Spell, Element::Water, Some(Species::Knight), _) => Some(SpecialRule::KnightDrowns),
            (Some(Species::Kraken), _, _, _, CardKind::Spell) => Some(SpecialRule::KrakenResistsSpells),
            (Some(Species::FireElf), _, _, Some(Species::Dragon), _) => Some(SpecialRule::FireElfEvadesDragon),
            _ => None,
        }
    }
}

impl Display for SpecialRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SpecialRule::DragonScaresGoblin => "Goblins are too afraid of Dragons to attack",
            SpecialRule::WizardControlsOrk => "the Wizard controls the Ork",
            SpecialRule::KnightDrowns => "the Knight drowns under the WaterSpell",
            SpecialRule::KrakenResistsSpells => "the Kraken is immune to spells",
            SpecialRule::FireElfEvadesDragon => "the FireElf evades the Dragon",
        };
        write!(f, "{text}")
    }
}

/// Special rule deciding the round between `host` and `opponent`.
///
/// A pairing where both directions fire cancels out and falls back to damage.
pub fn special_rule(host: &Card, opponent: &Card) -> Option<(SpecialRule, Side)> {
    match (SpecialRule::between(host, opponent), SpecialRule::between(opponent, host)) {
        (Some(rule), None) => Some((rule, Side::Host)),
        (None, Some(rule)) => Some((rule, Side::Opponent)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ELEMENTS: [Element; 3] = [Element::Fire, Element::Water, Element::Normal];

    #[test]
    fn multiplier_table_is_reciprocal() {
        for attacker in ELEMENTS {
            for defender in ELEMENTS {
                let forward = attacker.multiplier_against(defender);
                let backward = defender.multiplier_against(attacker);
                if attacker == defender {
                    assert_eq!(forward, 1.0);
                } else {
                    assert_eq!(forward * backward, 1.0, "{attacker:?} vs {defender:?}");
                    assert_ne!(forward, 1.0);
                }
            }
        }
    }

    #[test]
    fn water_beats_fire_beats_normal_beats_water() {
        assert_eq!(Element::Water.multiplier_against(Element::Fire), 2.0);
        assert_eq!(Element::Fire.multiplier_against(Element::Normal), 2.0);
        assert_eq!(Element::Normal.multiplier_against(Element::Water), 2.0);
    }

    #[test]
    fn overrides_are_one_directional() {
        let dragon = Card::monster("d", "Dragon", 50.0, Element::Fire, Some(Species::Dragon));
        let goblin = Card::monster("g", "Goblin", 90.0, Element::Fire, Some(Species::Goblin));

        assert_eq!(special_rule(&goblin, &dragon), Some((SpecialRule::DragonScaresGoblin, Side::Opponent)));
        assert_eq!(special_rule(&dragon, &goblin), Some((SpecialRule::DragonScaresGoblin, Side::Host)));
    }

    #[test]
    fn every_listed_pairing_fires() {
        let wizard = Card::monster("w", "Wizard", 10.0, Element::Normal, Some(Species::Wizard));
        let ork = Card::monster("o", "Ork", 80.0, Element::Normal, Some(Species::Ork));
        let knight = Card::monster("k", "Knight", 90.0, Element::Normal, Some(Species::Knight));
        let water_spell = Card::spell("ws", "WaterSpell", 5.0, Element::Water);
        let fire_spell = Card::spell("fs", "FireSpell", 100.0, Element::Fire);
        let kraken = Card::monster("kr", "Kraken", 1.0, Element::Water, Some(Species::Kraken));
        let elf = Card::monster("e", "FireElf", 1.0, Element::Fire, Some(Species::FireElf));
        let dragon = Card::monster("d", "Dragon", 99.0, Element::Fire, Some(Species::Dragon));

        assert_eq!(special_rule(&wizard, &ork), Some((SpecialRule::WizardControlsOrk, Side::Host)));
        assert_eq!(special_rule(&knight, &water_spell), Some((SpecialRule::KnightDrowns, Side::Opponent)));
        assert_eq!(special_rule(&fire_spell, &kraken), Some((SpecialRule::KrakenResistsSpells, Side::Opponent)));
        assert_eq!(special_rule(&dragon, &elf), Some((SpecialRule::FireElfEvadesDragon, Side::Opponent)));
    }

    #[test]
    fn unrelated_pairings_have_no_override() {
        let knight = Card::monster("k", "Knight", 90.0, Element::Normal, Some(Species::Knight));
        let fire_spell = Card::spell("fs", "FireSpell", 100.0, Element::Fire);
        let ork = Card::monster("o", "Ork", 80.0, Element::Normal, Some(Species::Ork));

        assert_eq!(special_rule(&knight, &fire_spell), None);
        assert_eq!(special_rule(&knight, &ork), None);
    }
}
