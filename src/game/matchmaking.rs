use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::oneshot;
use uuid::Uuid;

use crate::logger;
use crate::models::battle::{BattleOutcome, BattleReport, BattleTicket};
use crate::models::player::Player;
use crate::utils::errors::BattleError;

pub const DEFAULT_QUEUE_TIMEOUT: Duration = Duration::from_secs(60);

type Delivery = Result<BattleOutcome, BattleError>;

struct WaitingEntry {
    ticket: BattleTicket,
    notify: oneshot::Sender<Delivery>,
    host_slot: QueueSlot,
}

/// Tickets still waiting for an opponent, plus every player currently
/// holding a ticket (waiting or battling).
#[derive(Default)]
struct Registry {
    tickets: HashMap<Uuid, WaitingEntry>,
    queued: HashSet<String>,
}

type SharedRegistry = Arc<Mutex<Registry>>;

fn lock(registry: &Mutex<Registry>) -> MutexGuard<'_, Registry> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Registry of waiting battle tickets.
///
/// Insert, claim and expiry all happen under one mutex, so a ticket is
/// claimed at most once and never after it expired. The lock is never held
/// across an `.await`.
///
/// A player stays queued from entry until their battle is delivered: the
/// host's slot lives in the waiting entry and moves to the [`ClaimedTicket`]
/// on claim. Entries leave the map before they are dropped, since dropping a
/// slot takes the lock.
pub struct MatchmakingPool {
    registry: SharedRegistry,
    timeout: Duration,
}

/// What a caller became on entering the pool.
pub enum PoolEntry {
    /// No claimable ticket existed; a new one waits for an opponent.
    Host(HostTicket),
    /// An existing ticket was claimed; the caller must resolve it.
    Joiner(ClaimedTicket),
}

impl Default for MatchmakingPool {
    fn default() -> Self {
        MatchmakingPool::new(DEFAULT_QUEUE_TIMEOUT)
    }
}

impl MatchmakingPool {
    pub fn new(timeout: Duration) -> Self {
        Self {
            registry: Arc::new(Mutex::new(Registry::default())),
            timeout,
        }
    }

    /// Claims any waiting ticket hosted by someone else, or opens a new one.
    ///
    /// Which of several waiting tickets gets claimed is unspecified.
    pub fn enter(&self, player: Player) -> Result<PoolEntry, BattleError> {
        let player_id = player.id.clone();
        let mut registry = lock(&self.registry);

        if !registry.queued.insert(player_id.clone()) {
            return Err(BattleError::AlreadyQueued(player_id));
        }

        let claimable = registry
            .tickets
            .values()
            .find(|entry| entry.ticket.is_claimable_by(&player_id))
            .map(|entry| entry.ticket.id);

        let mut player = player;
        if let Some(mut entry) = claimable.and_then(|id| registry.tickets.remove(&id)) {
            match entry.ticket.claim(player) {
                Ok(()) => {
                    drop(registry);
                    let waited = Utc::now() - entry.ticket.created_at;
                    logger!(
                        INFO,
                        "[POOL] `{player_id}` claimed ticket `{}` hosted by `{}` after {}ms",
                        entry.ticket.id,
                        entry.ticket.host.id,
                        waited.num_milliseconds()
                    );
                    let joiner_slot = QueueSlot::new(player_id, Arc::clone(&self.registry));
                    return Ok(PoolEntry::Joiner(ClaimedTicket {
                        ticket: entry.ticket,
                        notify: Some(entry.notify),
                        slots: vec![entry.host_slot, joiner_slot],
                    }));
                }
                Err(returned) => {
                    registry.tickets.insert(entry.ticket.id, entry);
                    player = returned;
                }
            }
        }

        let ticket = BattleTicket::new(player);
        let ticket_id = ticket.id;
        let (notify, receiver) = oneshot::channel();
        let host_slot = QueueSlot::new(player_id.clone(), Arc::clone(&self.registry));
        registry.tickets.insert(
            ticket_id,
            WaitingEntry {
                ticket,
                notify,
                host_slot,
            },
        );
        drop(registry);

        logger!(INFO, "[POOL] `{player_id}` opened ticket `{ticket_id}`");
        Ok(PoolEntry::Host(HostTicket {
            ticket_id,
            receiver,
            timeout: self.timeout,
            registry: Arc::clone(&self.registry),
        }))
    }

    #[cfg(test)]
    pub fn waiting_count(&self) -> usize {
        lock(&self.registry).tickets.len()
    }

    #[cfg(test)]
    pub fn is_waiting(&self, ticket_id: Uuid) -> bool {
        lock(&self.registry).tickets.contains_key(&ticket_id)
    }

    #[cfg(test)]
    pub fn is_queued(&self, player_id: &str) -> bool {
        lock(&self.registry).queued.contains(player_id)
    }
}

/// Marks a player as busy until dropped.
struct QueueSlot {
    player_id: String,
    registry: SharedRegistry,
}

impl QueueSlot {
    fn new(player_id: String, registry: SharedRegistry) -> Self {
        Self { player_id, registry }
    }
}

impl Drop for QueueSlot {
    fn drop(&mut self) {
        lock(&self.registry).queued.remove(&self.player_id);
    }
}

/// A ticket this caller opened and now waits on.
pub struct HostTicket {
    ticket_id: Uuid,
    receiver: oneshot::Receiver<Delivery>,
    timeout: Duration,
    registry: SharedRegistry,
}

impl HostTicket {
    #[cfg(test)]
    pub fn ticket_id(&self) -> Uuid {
        self.ticket_id
    }

    /// Suspends until a joiner delivers the outcome or the timeout fires.
    pub async fn wait(mut self) -> Result<BattleReport, BattleError> {
        if let Ok(delivery) = tokio::time::timeout(self.timeout, &mut self.receiver).await {
            return unpack(self.ticket_id, delivery);
        }

        if self.expire() {
            logger!(INFO, "[POOL] Ticket `{}` expired without an opponent", self.ticket_id);
            return Ok(BattleReport::NoOpponentFound);
        }

        // Claimed in the same instant the timer fired; the joiner owes us a result.
        let delivery = (&mut self.receiver).await;
        unpack(self.ticket_id, delivery)
    }

    /// Removes the ticket if it is still waiting. Returns `false` when a
    /// joiner got there first.
    fn expire(&self) -> bool {
        let removed = lock(&self.registry).tickets.remove(&self.ticket_id);
        match removed {
            Some(mut entry) => entry.ticket.expire(),
            None => false,
        }
    }
}

impl Drop for HostTicket {
    fn drop(&mut self) {
        // A host that stops waiting must not be claimable anymore. Once
        // claimed, the entry is gone and the slot belongs to the joiner.
        let abandoned = lock(&self.registry).tickets.remove(&self.ticket_id);
        drop(abandoned);
    }
}

fn unpack(
    ticket_id: Uuid,
    delivery: Result<Delivery, oneshot::error::RecvError>,
) -> Result<BattleReport, BattleError> {
    match delivery {
        Ok(Ok(outcome)) => Ok(BattleReport::Resolved(outcome)),
        Ok(Err(error)) => Err(error),
        Err(_) => Err(BattleError::Interrupted(ticket_id)),
    }
}

/// A ticket this caller claimed. Whoever holds it owes the host a result;
/// dropping it undelivered wakes the host with `Interrupted`.
///
/// Holds the queue slots of both players until the result is delivered.
pub struct ClaimedTicket {
    ticket: BattleTicket,
    notify: Option<oneshot::Sender<Delivery>>,
    slots: Vec<QueueSlot>,
}

impl ClaimedTicket {
    pub fn ticket(&self) -> &BattleTicket {
        &self.ticket
    }

    pub fn ticket_mut(&mut self) -> &mut BattleTicket {
        &mut self.ticket
    }

    /// Hands the same result to the waiting host and back to the caller.
    pub fn deliver(mut self, result: Delivery) -> Delivery {
        // Both players may queue again by the time either sees the result.
        self.slots.clear();
        if let Some(notify) = self.notify.take() {
            if notify.send(result.clone()).is_err() {
                logger!(WARN, "[POOL] Host of ticket `{}` stopped waiting", self.ticket.id);
            }
        }
        result
    }
}
