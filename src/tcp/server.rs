use std::io::Error;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;

use super::client::Client;
use super::protocol::Protocol;
use crate::game::battle_service::BattleService;
use crate::logger;

/// Accepts connections and serves each one on its own task.
pub struct BattleServer {
    socket: TcpListener,
    protocol: Arc<Protocol>,
}

impl BattleServer {
    pub async fn bind(host: &str, port: u16, service: Arc<BattleService>) -> Result<Self, Error> {
        let socket = TcpListener::bind((host, port)).await?;
        logger!(INFO, "[SERVER] Server connection open: {}", socket.local_addr()?);

        Ok(Self {
            socket,
            protocol: Arc::new(Protocol::new(service)),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, Error> {
        self.socket.local_addr()
    }

    pub async fn run(self: Arc<Self>) {
        loop {
            match self.socket.accept().await {
                Ok((stream, addr)) => {
                    logger!(DEBUG, "[SERVER] Incoming connection from `{addr}`");
                    let client = Client::new(stream, addr, Arc::clone(&self.protocol));
                    tokio::spawn(client.connect());
                }
                Err(error) => logger!(ERROR, "[SERVER] Failed to accept connection ({error})"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::battle_service::BattlePorts;
    use crate::game::matchmaking::MatchmakingPool;
    use crate::game::rating::RatingAdjuster;
    use crate::game::resolver::BattleRules;
    use crate::models::card::{Card, Element, Species};
    use crate::models::battle::BattleRecord;
    use crate::models::client_requests::{FindBattleRequest, JoinBattleRequest};
    use crate::models::deck::BattleDeck;
    use crate::models::views::BattleOutcomeView;
    use crate::storage::{MemoryDecks, MemoryLedger, MemoryRatings, RetryPolicy};
    use crate::tcp::header::{Header, HeaderType, HEADER_SIZE};
    use crate::tcp::packet::Packet;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    fn deck(prefix: &str, species: Species, damage: f64) -> BattleDeck {
        let cards = (0..4)
            .map(|i| Card::monster(&format!("{prefix}-{i}"), prefix, damage, Element::Normal, Some(species)))
            .collect();
        BattleDeck::new(cards).unwrap()
    }

    async fn start(timeout: Duration) -> SocketAddr {
        let decks = Arc::new(MemoryDecks::new());
        decks.insert("alice", deck("Knight", Species::Knight, 60.0)).await;
        decks.insert("bob", deck("Ork", Species::Ork, 20.0)).await;

        let ports = BattlePorts {
            decks,
            ratings: Arc::new(MemoryRatings::new(100)),
            ledger: Arc::new(MemoryLedger::new()),
        };
        let rules = BattleRules {
            round_cap: 100,
            seed: Some(3),
        };
        let service = BattleService::new(
            MatchmakingPool::new(timeout),
            ports,
            rules,
            RatingAdjuster::new(3),
            RetryPolicy::default(),
        );

        let server = Arc::new(BattleServer::bind("127.0.0.1", 0, Arc::new(service)).await.unwrap());
        let addr = server.local_addr().unwrap();
        tokio::spawn(server.run());
        addr
    }

    async fn request(stream: &mut TcpStream, packet: &Packet) -> Packet {
        stream.write_all(&packet.wrap_packet()).await.unwrap();

        let mut header = [0u8; HEADER_SIZE];
        stream.read_exact(&mut header).await.unwrap();
        let header = Header::from_bytes(&header).unwrap();
        let mut payload = vec![0u8; header.payload_length as usize];
        stream.read_exact(&mut payload).await.unwrap();

        Packet {
            header,
            payload: payload.into_boxed_slice(),
        }
    }

    fn join(player_id: &str) -> Packet {
        let request = JoinBattleRequest {
            player_id: player_id.to_string(),
            username: player_id.to_uppercase(),
        };
        Packet::encode(HeaderType::JoinBattle, &request).unwrap()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn two_connections_battle_each_other() {
        let addr = start(Duration::from_secs(5)).await;
        let mut alice = TcpStream::connect(addr).await.unwrap();
        let mut bob = TcpStream::connect(addr).await.unwrap();

        let alice_join = join("alice");
        let bob_join = join("bob");
        let (alice_packet, bob_packet) = tokio::join!(request(&mut alice, &alice_join), request(&mut bob, &bob_join));

        assert_eq!(alice_packet.header.header_type, HeaderType::BattleResult);
        assert_eq!(bob_packet.header.header_type, HeaderType::BattleResult);

        let alice_view: BattleOutcomeView = alice_packet.decode().unwrap();
        let bob_view: BattleOutcomeView = bob_packet.decode().unwrap();
        assert_eq!(alice_view.battle_id, bob_view.battle_id);
        assert_eq!(alice_view.log, bob_view.log);
        assert_eq!(alice_view.opponent_name, "BOB");
        assert!(alice_view.won);
        assert_eq!(alice_view.rating, Some(103));
        assert_eq!(bob_view.rating, Some(97));

        let lookup = FindBattleRequest {
            battle_id: alice_view.battle_id.parse().unwrap(),
        };
        let response = request(&mut bob, &Packet::encode(HeaderType::FindBattle, &lookup).unwrap()).await;
        assert_eq!(response.header.header_type, HeaderType::FindBattle);
        let record: BattleRecord = response.decode().unwrap();
        assert!(record.crowned);
        assert_eq!(record.winner.as_deref(), Some("alice"));
        assert_eq!(record.log, alice_view.log);
    }

    #[tokio::test]
    async fn lone_connection_gets_no_opponent() {
        let addr = start(Duration::from_millis(50)).await;
        let mut alice = TcpStream::connect(addr).await.unwrap();

        let response = request(&mut alice, &join("alice")).await;
        assert_eq!(response.header.header_type, HeaderType::NoOpponentFound);

        let pong = request(&mut alice, &Packet::new(HeaderType::Ping, b"")).await;
        assert_eq!(pong.header.header_type, HeaderType::Ping);
    }

    #[tokio::test]
    async fn bad_checksum_keeps_connection_open() {
        let addr = start(Duration::from_millis(50)).await;
        let mut stream = TcpStream::connect(addr).await.unwrap();

        let mut packet = Packet::new(HeaderType::Ping, b"ab");
        packet.header.checksum ^= 0xFFFF;
        let response = request(&mut stream, &packet).await;
        assert_eq!(response.header.header_type, HeaderType::InvalidChecksum);

        let pong = request(&mut stream, &Packet::new(HeaderType::Ping, b"")).await;
        assert_eq!(pong.header.header_type, HeaderType::Ping);
    }
}
