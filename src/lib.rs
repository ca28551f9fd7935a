//! Authoritative game server for networked turn-based tactics.
//!
//! The server is the sole writer of match state: each match runs as its own
//! tokio task, consuming fire-and-forget client intents and replicating
//! every state change to read-only observers over a broadcast channel.

pub mod app;
pub mod config;
pub mod game;
pub mod http;
pub mod lobby;
pub mod util;
pub mod ws;
