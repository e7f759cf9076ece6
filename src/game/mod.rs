pub mod battle_service;
pub mod matchmaking;
pub mod rating;
pub mod resolver;
pub mod rng;
pub mod rules;
