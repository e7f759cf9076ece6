use std::sync::Arc;

use serde::Serialize;

use crate::game::battle_service::BattleService;
use crate::logger;
use crate::models::battle::BattleReport;
use crate::models::client_requests::{FindBattleRequest, JoinBattleRequest, PlayerStatsRequest};
use crate::models::views::BattleOutcomeView;
use crate::tcp::header::HeaderType;
use crate::tcp::packet::Packet;
use crate::utils::errors::BattleError;

/// Maps request packets onto the battle service and its results back onto
/// response packets.
pub struct Protocol {
    pub service: Arc<BattleService>,
}

impl Protocol {
    pub fn new(service: Arc<BattleService>) -> Self {
        Protocol { service }
    }

    /// Handles a packet received from a client based on its header type.
    ///
    /// Always produces exactly one response packet. The caller closes the
    /// connection after answering a `Disconnect`.
    pub async fn handle_packet(&self, packet: &Packet) -> Packet {
        logger!(
            DEBUG,
            "[PROTOCOL] Received packet: {{ type: {}, size: {} }}",
            packet.header.header_type,
            packet.header.payload_length
        );

        match packet.header.header_type {
            HeaderType::Disconnect => Packet::new(HeaderType::Disconnect, b""),
            HeaderType::Ping => Packet::new(HeaderType::Ping, b""),
            HeaderType::JoinBattle => match packet.decode::<JoinBattleRequest>() {
                Ok(request) => self.handle_join_battle(request).await,
                Err(error) => {
                    logger!(WARN, "[PROTOCOL] Could not parse join battle request ({error})");
                    Packet::new(
                        HeaderType::InvalidPacketPayload,
                        b"Could not parse join battle request.",
                    )
                }
            },
            HeaderType::FindBattle => match packet.decode::<FindBattleRequest>() {
                Ok(request) => self.handle_find_battle(request).await,
                Err(error) => {
                    logger!(WARN, "[PROTOCOL] Could not parse find battle request ({error})");
                    Packet::new(HeaderType::InvalidPacketPayload, b"Could not parse find battle request.")
                }
            },
            HeaderType::PlayerStats => match packet.decode::<PlayerStatsRequest>() {
                Ok(request) => self.handle_player_stats(request).await,
                Err(error) => {
                    logger!(WARN, "[PROTOCOL] Could not parse player stats request ({error})");
                    Packet::new(HeaderType::InvalidPacketPayload, b"Could not parse player stats request.")
                }
            },
            _ => {
                logger!(WARN, "[PROTOCOL] Invalid header");
                Packet::new(HeaderType::InvalidHeader, b"")
            }
        }
    }

    async fn handle_join_battle(&self, request: JoinBattleRequest) -> Packet {
        let identity = match request.into_identity() {
            Ok(identity) => identity,
            Err(reason) => return Packet::new(HeaderType::InvalidPacketPayload, reason.as_bytes()),
        };
        let player_id = identity.id.clone();

        let report = Arc::clone(&self.service).join_battle(identity).await;
        match report {
            Ok(BattleReport::Resolved(outcome)) => {
                let view = BattleOutcomeView::for_player(&outcome, &player_id);
                Packet::encode(HeaderType::BattleResult, &view).unwrap_or_else(|error| {
                    logger!(ERROR, "[PROTOCOL] Unable to encode result of `{}` ({error})", outcome.ticket_id);
                    Packet::new(HeaderType::ERROR, b"Unable to encode battle result.")
                })
            }
            Ok(BattleReport::NoOpponentFound) => Packet::new(HeaderType::NoOpponentFound, b""),
            Err(error) => error_packet(&error),
        }
    }

    async fn handle_find_battle(&self, request: FindBattleRequest) -> Packet {
        match self.service.find_battle(request.battle_id).await {
            Ok(record) => encode_or_error(HeaderType::FindBattle, &record),
            Err(error) => error_packet(&error),
        }
    }

    async fn handle_player_stats(&self, request: PlayerStatsRequest) -> Packet {
        match self.service.player_stats(&request.player_id).await {
            Ok(stats) => encode_or_error(HeaderType::PlayerStats, &stats),
            Err(error) => error_packet(&error),
        }
    }
}

fn encode_or_error<T: Serialize>(header_type: HeaderType, body: &T) -> Packet {
    Packet::encode(header_type, body).unwrap_or_else(|error| {
        logger!(ERROR, "[PROTOCOL] Unable to encode {header_type} response ({error})");
        Packet::new(HeaderType::ERROR, b"Unable to encode response.")
    })
}

fn error_packet(error: &BattleError) -> Packet {
    let header_type = match error {
        BattleError::DeckNotConfigured(_) => HeaderType::DeckNotConfigured,
        BattleError::AlreadyQueued(_) => HeaderType::AlreadyQueued,
        BattleError::StorageFailure(_) => HeaderType::StorageFailure,
        BattleError::BattleNotFound(_) => HeaderType::BattleNotFound,
        BattleError::Interrupted(_) => HeaderType::ERROR,
    };
    Packet::new(header_type, error.to_string().as_bytes())
}
