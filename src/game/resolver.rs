use crate::game::rng::BattleRng;
use crate::game::rules::{special_rule, SpecialRule};
use crate::models::battle::{Side, Verdict};
use crate::models::card::Card;
use crate::models::deck::BattleDeck;
use crate::models::player::Player;

pub const DEFAULT_ROUND_CAP: u32 = 100;

/// Tunables of a battle: how many rounds are fought and, optionally, a fixed
/// seed for the card draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BattleRules {
    pub round_cap: u32,
    pub seed: Option<u64>,
}

impl Default for BattleRules {
    fn default() -> Self {
        Self {
            round_cap: DEFAULT_ROUND_CAP,
            seed: None,
        }
    }
}

impl BattleRules {
    pub fn rng(&self) -> BattleRng {
        match self.seed {
            Some(seed) => BattleRng::new(seed),
            None => BattleRng::from_entropy(),
        }
    }
}

/// One side of a battle as seen by the resolver.
#[derive(Debug, Clone, Copy)]
pub struct Combatant<'a> {
    pub name: &'a str,
    pub deck: &'a BattleDeck,
}

impl<'a> From<&'a Player> for Combatant<'a> {
    fn from(player: &'a Player) -> Self {
        Self {
            name: &player.username,
            deck: &player.deck,
        }
    }
}

/// Result of a single exchange of cards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoundResult {
    pub host_damage: f64,
    pub opponent_damage: f64,
    pub winner: Option<Side>,
    pub rule: Option<SpecialRule>,
}

impl RoundResult {
    /// Resolves one round: special rules first, then elemental damage.
    pub fn fight(host: &Card, opponent: &Card) -> Self {
        if let Some((rule, side)) = special_rule(host, opponent) {
            return Self {
                host_damage: host.damage,
                opponent_damage: opponent.damage,
                winner: Some(side),
                rule: Some(rule),
            };
        }

        let host_damage = host.damage * host.element.multiplier_against(opponent.element);
        let opponent_damage = opponent.damage * opponent.element.multiplier_against(host.element);
        let winner = if host_damage > opponent_damage {
            Some(Side::Host)
        } else if opponent_damage > host_damage {
            Some(Side::Opponent)
        } else {
            None
        };

        Self {
            host_damage,
            opponent_damage,
            winner,
            rule: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub log: Vec<String>,
    pub verdict: Verdict,
    pub host_rounds: u32,
    pub opponent_rounds: u32,
}

/// Plays a fixed number of rounds between two decks and compares how many
/// rounds each side took. Cards are drawn with replacement.
#[derive(Debug, Clone, Copy)]
pub struct BattleResolver {
    round_cap: u32,
}

impl BattleResolver {
    pub fn new(round_cap: u32) -> Self {
        Self { round_cap }
    }

    pub fn resolve(&self, host: Combatant, opponent: Combatant, rng: &mut BattleRng) -> Resolution {
        let mut log = Vec::with_capacity(self.round_cap as usize);
        let mut host_rounds = 0;
        let mut opponent_rounds = 0;

        for round in 1..=self.round_cap {
            let host_card = draw(host.deck, rng);
            let opponent_card = draw(opponent.deck, rng);
            let result = RoundResult::fight(host_card, opponent_card);

            match result.winner {
                Some(Side::Host) => host_rounds += 1,
                Some(Side::Opponent) => opponent_rounds += 1,
                None => {}
            }

            log.push(log_line(round, &host, host_card, &opponent, opponent_card, &result));
        }

        let verdict = if host_rounds > opponent_rounds {
            Verdict::Winner(Side::Host)
        } else if opponent_rounds > host_rounds {
            Verdict::Winner(Side::Opponent)
        } else {
            Verdict::Draw
        };

        Resolution {
            log,
            verdict,
            host_rounds,
            opponent_rounds,
        }
    }
}

fn draw<'a>(deck: &'a BattleDeck, rng: &mut BattleRng) -> &'a Card {
    let cards = deck.cards();
    &cards[rng.pick(cards.len())]
}

fn log_line(
    round: u32,
    host: &Combatant,
    host_card: &Card,
    opponent: &Combatant,
    opponent_card: &Card,
    result: &RoundResult,
) -> String {
    let outcome = match result.winner {
        Some(Side::Host) => format!("{} wins", host.name),
        Some(Side::Opponent) => format!("{} wins", opponent.name),
        None => "draw".to_string(),
    };
    let rule = match result.rule {
        Some(rule) => format!(" ({rule})"),
        None => String::new(),
    };

    format!(
        "Round {round}: {}'s {host_card} ({}) vs {}'s {opponent_card} ({}) => {outcome}{rule}",
        host.name, result.host_damage, opponent.name, result.opponent_damage,
    )
}
