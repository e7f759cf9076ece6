use std::sync::Arc;

use uuid::Uuid;

use crate::game::matchmaking::{MatchmakingPool, PoolEntry};
use crate::game::rating::{RatingAdjuster, Seat};
use crate::game::resolver::{BattleResolver, BattleRules, Combatant};
use crate::logger;
use crate::models::battle::{
    BattleOutcome, BattleRecord, BattleReport, BattleResult, BattleTicket, RatingChange, Side, Verdict,
};
use crate::models::player::{Player, PlayerIdentity, PlayerStats};
use crate::models::settings::Settings;
use crate::storage::{BattleLedger, DeckProvider, RatingStore, RetryPolicy, Standing};
use crate::utils::errors::{BattleError, DeckError, StorageError};

/// The collaborators the battle core talks to.
#[derive(Clone)]
pub struct BattlePorts {
    pub decks: Arc<dyn DeckProvider>,
    pub ratings: Arc<dyn RatingStore>,
    pub ledger: Arc<dyn BattleLedger>,
}

/// Entry point of "join battle queue": admits the player, pairs them through
/// the pool and, on the joiner's side, resolves, persists and rates the battle.
pub struct BattleService {
    pool: MatchmakingPool,
    ports: BattlePorts,
    rules: BattleRules,
    adjuster: RatingAdjuster,
    retry: RetryPolicy,
}

impl BattleService {
    pub fn new(
        pool: MatchmakingPool,
        ports: BattlePorts,
        rules: BattleRules,
        adjuster: RatingAdjuster,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            pool,
            ports,
            rules,
            adjuster,
            retry,
        }
    }

    pub fn from_settings(settings: &Settings, ports: BattlePorts) -> Self {
        BattleService::new(
            MatchmakingPool::new(settings.queue_timeout()),
            ports,
            settings.battle_rules(),
            RatingAdjuster::new(settings.rating_delta),
            settings.retry_policy(),
        )
    }

    #[cfg(test)]
    pub fn pool(&self) -> &MatchmakingPool {
        &self.pool
    }

    /// Queues the player for a battle.
    ///
    /// Returns the resolved battle, or `NoOpponentFound` once the queue timeout
    /// elapses. Both players of a pairing receive the same outcome, including
    /// when persistence fails.
    pub async fn join_battle(self: Arc<Self>, identity: PlayerIdentity) -> Result<BattleReport, BattleError> {
        let player = self.admit(identity).await?;

        match self.pool.enter(player)? {
            PoolEntry::Host(host) => host.wait().await,
            PoolEntry::Joiner(mut claim) => {
                let ticket_id = claim.ticket().id;
                let service = Arc::clone(&self);

                // Resolution runs detached so the host still gets a result if
                // this caller goes away mid-battle.
                let battle = tokio::spawn(async move {
                    let result = service.run_battle(claim.ticket_mut()).await;
                    claim.deliver(result)
                });

                match battle.await {
                    Ok(result) => result.map(BattleReport::Resolved),
                    Err(error) => {
                        logger!(ERROR, "[BATTLE] Resolution of `{ticket_id}` aborted: {error}");
                        Err(BattleError::Interrupted(ticket_id))
                    }
                }
            }
        }
    }

    /// The ledger's record of a battle. Uncrowned records belong to battles
    /// that are still being written or were rolled back.
    pub async fn find_battle(&self, ticket_id: Uuid) -> Result<BattleRecord, BattleError> {
        let ledger = &self.ports.ledger;
        self.retry
            .run("find_battle_by_id", move || ledger.find_battle_by_id(ticket_id))
            .await
            .map_err(|error| match error {
                StorageError::NotFound(_) => BattleError::BattleNotFound(ticket_id),
                other => other.into(),
            })
    }

    pub async fn player_stats(&self, player_id: &str) -> Result<PlayerStats, BattleError> {
        let ratings = &self.ports.ratings;
        Ok(self.retry.run("stats", move || ratings.stats(player_id)).await?)
    }

    /// Builds the pool-ready player: a validated deck and the current rating.
    async fn admit(&self, identity: PlayerIdentity) -> Result<Player, BattleError> {
        let decks = &self.ports.decks;
        let player_id = identity.id.as_str();
        let lookup = self
            .retry
            .run("get_deck", move || async move {
                match decks.get_deck(player_id).await {
                    Err(DeckError::Storage(error)) => Err(error),
                    other => Ok(other),
                }
            })
            .await?;

        let deck = match lookup {
            Ok(deck) => deck,
            Err(error) => {
                logger!(WARN, "[BATTLE] `{player_id}` cannot queue: {error}");
                return Err(BattleError::DeckNotConfigured(identity.id));
            }
        };

        let ratings = &self.ports.ratings;
        let rating = self.retry.run("rating", move || ratings.rating(player_id)).await?;

        Ok(Player {
            id: identity.id,
            username: identity.username,
            rating,
            deck,
        })
    }

    async fn run_battle(&self, ticket: &mut BattleTicket) -> Result<BattleOutcome, BattleError> {
        let ticket_id = ticket.id;
        let Some(opponent) = ticket.opponent.clone() else {
            return Err(BattleError::Interrupted(ticket_id));
        };
        let host = ticket.host.clone();

        let mut rng = self.rules.rng();
        let resolution = BattleResolver::new(self.rules.round_cap).resolve(
            Combatant::from(&host),
            Combatant::from(&opponent),
            &mut rng,
        );
        let winner = match resolution.verdict {
            Verdict::Winner(Side::Host) => Some(host.id.clone()),
            Verdict::Winner(Side::Opponent) => Some(opponent.id.clone()),
            Verdict::Draw => None,
        };
        logger!(
            INFO,
            "[BATTLE] `{}` vs `{}` on `{ticket_id}` (seed {}): {}-{}, winner: {}",
            host.username,
            opponent.username,
            rng.seed(),
            resolution.host_rounds,
            resolution.opponent_rounds,
            winner.as_deref().unwrap_or("draw")
        );

        self.record(ticket_id, &host, &opponent, &resolution.log).await?;
        let settled = self
            .settle(ticket_id, resolution.verdict, &host, &opponent, winner.as_deref())
            .await;
        let rating_changes = match settled {
            Ok(changes) => changes,
            Err(error) => {
                self.compensate(ticket_id, &host, &opponent).await;
                return Err(error);
            }
        };

        ticket.complete(resolution.log.clone(), winner.clone());

        Ok(BattleOutcome {
            ticket_id,
            host: PlayerIdentity::new(&host.id, &host.username),
            opponent: PlayerIdentity::new(&opponent.id, &opponent.username),
            log: resolution.log,
            result: winner.map_or(BattleResult::Draw, BattleResult::Winner),
            rating_changes,
        })
    }

    /// Opens the ledger record and writes the log. The record stays
    /// uncrowned until [`BattleService::settle`] succeeds.
    async fn record(&self, ticket_id: Uuid, host: &Player, opponent: &Player, log: &[String]) -> Result<(), BattleError> {
        let ledger = &self.ports.ledger;

        self.retry
            .run_accepted("start_battle", move || ledger.start_battle(ticket_id, &host.id, &opponent.id))
            .await?;
        for (index, line) in log.iter().enumerate() {
            self.retry
                .run_accepted("append_log", move || ledger.append_log(ticket_id, index, line))
                .await?;
        }

        Ok(())
    }

    /// Applies ratings and standings, then crowns the winner.
    async fn settle(
        &self,
        ticket_id: Uuid,
        verdict: Verdict,
        host: &Player,
        opponent: &Player,
        winner: Option<&str>,
    ) -> Result<Vec<RatingChange>, BattleError> {
        let changes = self.rate(ticket_id, verdict, host, opponent).await?;

        let ledger = &self.ports.ledger;
        self.retry
            .run_accepted("crown_winner", move || ledger.crown_winner(ticket_id, winner))
            .await?;

        Ok(changes)
    }

    async fn rate(
        &self,
        ticket_id: Uuid,
        verdict: Verdict,
        host: &Player,
        opponent: &Player,
    ) -> Result<Vec<RatingChange>, BattleError> {
        let ratings = &self.ports.ratings;

        // Ratings may have moved since admission.
        let host_rating = self.retry.run("rating", move || ratings.rating(&host.id)).await?;
        let opponent_rating = self.retry.run("rating", move || ratings.rating(&opponent.id)).await?;
        let host_seat = Seat {
            player_id: &host.id,
            rating: host_rating,
        };
        let opponent_seat = Seat {
            player_id: &opponent.id,
            rating: opponent_rating,
        };

        let mut changes = self.adjuster.changes(verdict, host_seat, opponent_seat);
        for change in &mut changes {
            let (player_id, delta) = (change.player_id.as_str(), change.delta());
            self.retry
                .run_accepted("update_rating", move || ratings.update_rating(player_id, ticket_id, delta))
                .await?;
            change.after = self.retry.run("rating", move || ratings.rating(player_id)).await?;
            logger!(INFO, "[RATING] `{}`: {} -> {}", change.player_id, change.before, change.after);
        }

        let standings = match verdict {
            Verdict::Winner(Side::Host) => [(host, Standing::Won), (opponent, Standing::Lost)],
            Verdict::Winner(Side::Opponent) => [(host, Standing::Lost), (opponent, Standing::Won)],
            Verdict::Draw => [(host, Standing::Drew), (opponent, Standing::Drew)],
        };
        for (player, standing) in standings {
            self.retry
                .run_accepted("record_standing", move || {
                    ratings.record_standing(&player.id, ticket_id, standing)
                })
                .await?;
        }

        Ok(changes)
    }

    /// Rolls back what a failed settlement applied to the players. The ledger
    /// record is left uncrowned, which marks the battle void.
    async fn compensate(&self, ticket_id: Uuid, host: &Player, opponent: &Player) {
        let ratings = &self.ports.ratings;

        for player in [host, opponent] {
            let reverted = self
                .retry
                .run_accepted("revert_battle", move || ratings.revert_battle(&player.id, ticket_id))
                .await;
            match reverted {
                Ok(()) => logger!(WARN, "[RATING] Rolled back `{ticket_id}` for `{}`", player.id),
                Err(error) => logger!(
                    ERROR,
                    "[RATING] `{}` keeps changes from void battle `{ticket_id}` ({error})",
                    player.id
                ),
            }
        }
    }
}
