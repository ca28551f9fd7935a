//! Match core: turn/round coordination, movement budgets, attacks, victory

pub mod attack;
pub mod r#match;
pub mod movement;
pub mod spawn;
pub mod terrain;
pub mod unit;
pub mod victory;

pub use r#match::{GameMatch, MatchConfig, MatchHandle, MatchPhase, MatchRegistry};

use crate::ws::protocol::ClientMsg;
use uuid::Uuid;

/// Client intent received from a WebSocket connection. The player id is
/// attached by the server at registration; client payloads never carry
/// identity.
#[derive(Debug, Clone)]
pub struct PlayerIntent {
    pub player_id: Uuid,
    pub msg: ClientMsg,
    pub received_at: u64,
}
