use std::io::ErrorKind;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

use super::protocol::Protocol;
use crate::logger;
use crate::tcp::header::{Header, HeaderType, HEADER_SIZE};
use crate::tcp::packet::Packet;
use crate::utils::errors::NetworkError;

const SEND_ATTEMPTS: u32 = 3;

/// A connected client. Requests are answered one at a time, in order.
pub struct Client {
    addr: SocketAddr,
    protocol: Arc<Protocol>,
    read_stream: OwnedReadHalf,
    write_stream: OwnedWriteHalf,
}

impl Client {
    pub fn new(stream: TcpStream, addr: SocketAddr, protocol: Arc<Protocol>) -> Self {
        let (read_stream, write_stream) = stream.into_split();
        Self {
            addr,
            protocol,
            read_stream,
            write_stream,
        }
    }

    /// Handles the main lifecycle of a connected client.
    ///
    /// - Reads packets in a loop and answers each through the protocol.
    /// - Answers a bad checksum with `InvalidChecksum` and keeps reading.
    /// - Answers a malformed header with `InvalidHeader` and closes, since the
    ///   stream can no longer be framed.
    /// - Abandons a pending request when the peer hangs up, which takes the
    ///   player back out of the matchmaking pool.
    pub async fn connect(mut self) {
        let addr = self.addr;
        logger!(DEBUG, "[CLIENT] Listening to `{addr}`");

        loop {
            let packet = match self.read_packet().await {
                Ok(Some(packet)) => packet,
                Ok(None) => break,
                Err(NetworkError::Protocol(error)) => {
                    logger!(ERROR, "[CLIENT] Invalid packet from `{addr}` ({error})");
                    let _ = self.send_packet(&Packet::new(HeaderType::InvalidHeader, b"")).await;
                    break;
                }
                Err(error) => {
                    logger!(DEBUG, "[CLIENT] `{addr}` stopped reading ({error})");
                    break;
                }
            };

            if !packet.has_valid_checksum() {
                logger!(ERROR, "[CLIENT] Invalid checksum value from `{addr}`");
                if self.send_packet(&Packet::new(HeaderType::InvalidChecksum, b"")).await.is_err() {
                    break;
                }
                continue;
            }

            let protocol = Arc::clone(&self.protocol);
            let response = tokio::select! {
                response = protocol.handle_packet(&packet) => response,
                _ = hangup(&mut self.read_stream) => {
                    logger!(INFO, "[CLIENT] `{addr}` hung up with a pending {}", packet.header.header_type);
                    break;
                }
            };

            if self.send_packet(&response).await.is_err() {
                break;
            }
            if packet.header.header_type == HeaderType::Disconnect {
                break;
            }
        }

        logger!(INFO, "[CLIENT] Client `{addr}` disconnected");
    }

    /// Reads one framed packet. `Ok(None)` means the peer closed the stream.
    async fn read_packet(&mut self) -> Result<Option<Packet>, NetworkError> {
        let mut header_bytes = [0u8; HEADER_SIZE];
        match self.read_stream.read_exact(&mut header_bytes).await {
            Ok(_) => {}
            Err(error) if error.kind() == ErrorKind::UnexpectedEof => return Ok(None),
            Err(error) => return Err(NetworkError::PackageReadError(error.to_string())),
        }

        let header = Header::from_bytes(&header_bytes)?;
        let mut frame = Vec::with_capacity(HEADER_SIZE + header.payload_length as usize);
        frame.extend_from_slice(&header_bytes);
        frame.resize(HEADER_SIZE + header.payload_length as usize, 0);
        self.read_stream
            .read_exact(&mut frame[HEADER_SIZE..])
            .await
            .map_err(|e| NetworkError::PackageReadError(e.to_string()))?;

        Ok(Some(Packet::parse(&frame)?))
    }

    /// Sends a packet to the client, retrying up to 3 times if the send fails.
    async fn send_packet(&mut self, packet: &Packet) -> Result<(), NetworkError> {
        let addr = self.addr;
        let packet_data = packet.wrap_packet();

        for attempt in 1..=SEND_ATTEMPTS {
            if let Err(error) = self.write_stream.write_all(&packet_data).await {
                logger!(
                    ERROR,
                    "[CLIENT] Failed to send packet to `{addr}` ({error}). Retrying... [{attempt}/{SEND_ATTEMPTS}]"
                );
                tokio::time::sleep(Duration::from_millis(500)).await;
                continue;
            }

            logger!(
                DEBUG,
                "[CLIENT] Sent packet {{ type: {}, size: {} }} to `{addr}`",
                packet.header.header_type,
                packet_data.len(),
            );
            return Ok(());
        }

        Err(NetworkError::PackageWriteError(format!(
            "gave up on `{addr}` after {SEND_ATTEMPTS} attempts"
        )))
    }
}

/// Resolves once the peer closes its side of the connection. Pending bytes
/// are left in the socket for the next `read_packet`.
async fn hangup(stream: &mut OwnedReadHalf) {
    let mut byte = [0u8; 1];
    match stream.peek(&mut byte).await {
        Ok(0) | Err(_) => {}
        Ok(_) => std::future::pending().await,
    }
}
