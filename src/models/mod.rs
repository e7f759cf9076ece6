pub mod battle;
pub mod card;
pub mod client_requests;
pub mod deck;
pub mod http_response;
pub mod player;
pub mod settings;
pub mod views;
