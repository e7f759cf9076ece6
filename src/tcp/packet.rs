use serde::{de::DeserializeOwned, Serialize};

use crate::logger;
use crate::tcp::header::{Header, HeaderType, HEADER_SIZE};
use crate::utils::checksum::CheckSum;
use crate::utils::errors::ProtocolError;

/// Represents a complete network packet with a protocol header and payload.
///
/// Handles serialization and parsing for message transmission.
#[derive(Debug, Clone, PartialEq)]
pub struct Packet {
    /// The header of the packet, containing metadata such as type and payload length.
    pub header: Header,
    /// The payload of the packet, containing the actual data being transmitted.
    pub payload: Box<[u8]>,
}

impl Packet {
    /// Parses a raw byte slice into a `Packet`.
    ///
    /// Expects a 6-byte header followed by exactly `payload_length` bytes.
    pub fn parse(protocol: &[u8]) -> Result<Self, ProtocolError> {
        if protocol.len() < HEADER_SIZE {
            logger!(ERROR, "[PROTOCOL] Not enough bytes for a valid packet");
            return Err(ProtocolError::InvalidPacketError(
                "Not enough bytes for a valid packet".to_string(),
            ));
        }

        let header = Header::from_bytes(&protocol[..HEADER_SIZE])?;
        let payload = &protocol[HEADER_SIZE..];
        if payload.len() != header.payload_length as usize {
            return Err(ProtocolError::InvalidPacketError(format!(
                "Expected {} payload bytes, got {}",
                header.payload_length,
                payload.len()
            )));
        }

        Ok(Self {
            header,
            payload: payload.to_vec().into_boxed_slice(),
        })
    }

    /// Creates a new `Packet` from a message type and payload.
    ///
    /// Automatically constructs the header based on the provided payload.
    pub fn new(header_type: HeaderType, payload: &[u8]) -> Self {
        let header = Header::new(header_type, payload);
        let payload = payload.to_vec().into_boxed_slice();
        Self { header, payload }
    }

    /// Creates a packet whose payload is `body` encoded as CBOR.
    pub fn encode<T: Serialize>(header_type: HeaderType, body: &T) -> Result<Self, ProtocolError> {
        let payload = serde_cbor::to_vec(body).map_err(|e| ProtocolError::EncodeError(e.to_string()))?;
        if payload.len() > u16::MAX as usize {
            return Err(ProtocolError::EncodeError(format!(
                "Payload of {} bytes does not fit in a packet",
                payload.len()
            )));
        }
        Ok(Packet::new(header_type, &payload))
    }

    /// Decodes the CBOR payload.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, ProtocolError> {
        serde_cbor::from_slice(&self.payload).map_err(|e| ProtocolError::DecodeError(e.to_string()))
    }

    pub fn has_valid_checksum(&self) -> bool {
        CheckSum::check(self.header.checksum, &self.payload)
    }

    /// Serializes the packet into a byte slice.
    ///
    /// Combines the header and payload into a single buffer for transmission.
    pub fn wrap_packet(&self) -> Box<[u8]> {
        let header = self.header.wrap_header();
        let mut packet = Vec::with_capacity(header.len() + self.payload.len());

        packet.extend_from_slice(&header);
        packet.extend_from_slice(&self.payload);

        packet.into_boxed_slice()
    }
}
