use std::fmt::Display;

use crate::utils::checksum::CheckSum;
use crate::utils::errors::ProtocolError;

/// Size of a serialized [`Header`], delimiter included.
pub const HEADER_SIZE: usize = 6;
const DELIMITER: u8 = 0x0A;

/// Represents the type of message in a protocol packet.
///
/// Each variant maps to a specific `u8` value used during transmission.
///
/// # Variants
///
/// - `Disconnect` - Client is disconnecting.
/// - `JoinBattle` - Client queues for a battle (CBOR `JoinBattleRequest`).
/// - `BattleResult` - Server sends the resolved battle (CBOR `BattleOutcomeView`).
/// - `NoOpponentFound` - The queue timed out without a pairing.
/// - `FindBattle` - Looks up a battle record (CBOR `FindBattleRequest`, answered with a `BattleRecord`).
/// - `PlayerStats` - Looks up a player's rating and standings (CBOR `PlayerStatsRequest`).
///
/// ### Errors (0xF0–0xFF):
/// - `DeckNotConfigured` - Player has no usable battle deck.
/// - `AlreadyQueued` - Player is already waiting or battling.
/// - `StorageFailure` - A collaborator failed while resolving the battle.
/// - `BattleNotFound` - No battle with the requested id.
/// - `InvalidChecksum` - Payload failed checksum validation.
/// - `InvalidHeader` - Malformed or unrecognized header.
/// - `ERROR` - Generic error.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HeaderType {
    Disconnect = 0x00,
    Ping = 0x02,

    JoinBattle = 0x20,
    BattleResult = 0x21,
    NoOpponentFound = 0x22,
    FindBattle = 0x23,
    PlayerStats = 0x24,

    DeckNotConfigured = 0xF2,
    AlreadyQueued = 0xF3,
    StorageFailure = 0xF4,
    BattleNotFound = 0xF5,
    InvalidPacketPayload = 0xF1,
    InvalidHeader = 0xFA,
    InvalidChecksum = 0xFD,
    ERROR = 0xFE,
}

impl Display for HeaderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let str = match self {
            HeaderType::Disconnect => "DISCONNECT",
            HeaderType::Ping => "PING",

            HeaderType::JoinBattle => "JOIN_BATTLE",
            HeaderType::BattleResult => "BATTLE_RESULT",
            HeaderType::NoOpponentFound => "NO_OPPONENT_FOUND",
            HeaderType::FindBattle => "FIND_BATTLE",
            HeaderType::PlayerStats => "PLAYER_STATS",

            HeaderType::DeckNotConfigured => "DECK_NOT_CONFIGURED",
            HeaderType::AlreadyQueued => "ALREADY_QUEUED",
            HeaderType::StorageFailure => "STORAGE_FAILURE",
            HeaderType::BattleNotFound => "BATTLE_NOT_FOUND",
            HeaderType::InvalidPacketPayload => "INVALID_PACKET_PAYLOAD",
            HeaderType::InvalidHeader => "INVALID_HEADER",
            HeaderType::InvalidChecksum => "INVALID_CHECKSUM",
            HeaderType::ERROR => "ERROR",
        };

        write!(f, "{}", str)
    }
}

impl TryFrom<u8> for HeaderType {
    type Error = ();

    /// Returns `Err(())` if the byte does not correspond to any defined message type.
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(HeaderType::Disconnect),
            0x02 => Ok(HeaderType::Ping),

            0x20 => Ok(HeaderType::JoinBattle),
            0x21 => Ok(HeaderType::BattleResult),
            0x22 => Ok(HeaderType::NoOpponentFound),
            0x23 => Ok(HeaderType::FindBattle),
            0x24 => Ok(HeaderType::PlayerStats),

            0xF1 => Ok(HeaderType::InvalidPacketPayload),
            0xF2 => Ok(HeaderType::DeckNotConfigured),
            0xF3 => Ok(HeaderType::AlreadyQueued),
            0xF4 => Ok(HeaderType::StorageFailure),
            0xF5 => Ok(HeaderType::BattleNotFound),
            0xFA => Ok(HeaderType::InvalidHeader),
            0xFD => Ok(HeaderType::InvalidChecksum),
            0xFE => Ok(HeaderType::ERROR),
            _ => Err(()),
        }
    }
}

/// Represents a fixed-size protocol header for packet transmission.
///
/// Contains the message type, payload length, and a checksum for validation.
/// Serialized as 6 bytes total when sent over the network.
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    pub checksum: u16,
    pub payload_length: u16,
    pub header_type: HeaderType,
}

impl Header {
    /// Creates a new `Header` from the given message type and payload.
    ///
    /// Calculates the checksum and payload length automatically.
    pub fn new(header_type: HeaderType, payload: &[u8]) -> Self {
        Self {
            checksum: CheckSum::new(payload),
            payload_length: payload.len() as u16,
            header_type,
        }
    }

    /// Serializes the header into a fixed-size byte array.
    ///
    /// Format: [type, payload_len (2 bytes), checksum (2 bytes), 0x0A].
    pub fn wrap_header(&self) -> [u8; HEADER_SIZE] {
        let [len_hi, len_lo] = self.payload_length.to_be_bytes();
        let [ck_hi, ck_lo] = self.checksum.to_be_bytes();

        [self.header_type as u8, len_hi, len_lo, ck_hi, ck_lo, DELIMITER]
    }

    /// Parses a `Header` from a byte slice.
    ///
    /// Returns an error if the slice has the wrong size, lacks the delimiter
    /// or has an unknown type.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ProtocolError> {
        if bytes.len() != HEADER_SIZE || bytes[5] != DELIMITER {
            return Err(ProtocolError::InvalidHeaderError(format!(
                "Format invalid: {:?}",
                bytes
            )));
        }

        let header_type = HeaderType::try_from(bytes[0]).map_err(|_| {
            ProtocolError::InvalidHeaderError(format!("Invalid message type: {:#04X}", bytes[0]))
        })?;

        Ok(Self {
            header_type,
            payload_length: u16::from_be_bytes([bytes[1], bytes[2]]),
            checksum: u16::from_be_bytes([bytes[3], bytes[4]]),
        })
    }
}
