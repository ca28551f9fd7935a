//! Lobby - places connections into matches

mod service;

pub use service::LobbyService;
