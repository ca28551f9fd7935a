//! WebSocket protocol message definitions
//! These are the wire types for client-server communication

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A point on the battlefield plane
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance_to(&self, other: Vec2) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Point at `distance` from `self` along the direction to `toward`.
    /// Returns `toward` itself when the two points coincide.
    pub fn point_along(&self, toward: Vec2, distance: f32) -> Vec2 {
        let len = self.distance_to(toward);
        if len <= f32::EPSILON {
            return toward;
        }
        let t = distance / len;
        Vec2 {
            x: self.x + (toward.x - self.x) * t,
            y: self.y + (toward.y - self.y) * t,
        }
    }
}

/// Unit archetypes available in the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitClass {
    /// Long move distance, short attack range
    Vanguard,
    /// Short move distance, long attack range
    Marksman,
}

/// Messages sent from client to server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMsg {
    /// Request to join an open match
    JoinMatch,

    /// Request to move a unit toward a world point. The server clips the
    /// path to the unit's remaining movement budget.
    MoveUnit {
        unit_id: Uuid,
        target: Vec2,
    },

    /// Request to attack an enemy unit with one of our units
    AttackUnit {
        unit_id: Uuid,
        target_unit_id: Uuid,
    },

    /// End the current turn early
    EndTurn,

    /// Ping for latency measurement
    Ping {
        /// Client timestamp
        t: u64,
    },

    /// Leave current match
    LeaveMatch,
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMsg {
    /// Welcome message after connection
    Welcome {
        player_id: Uuid,
        server_time: u64,
    },

    /// Confirmation of match join
    MatchJoined {
        match_id: Uuid,
        /// Seed for deterministic spawn placement
        seed: u64,
        /// All players in the match at join time
        players: Vec<PlayerInfo>,
        /// Roster at join time (empty until the match starts)
        units: Vec<UnitView>,
    },

    /// Player joined the match
    PlayerJoined {
        player: PlayerInfo,
    },

    /// Player left the match
    PlayerLeft {
        player_id: Uuid,
        reason: String,
    },

    /// Countdown before units spawn and the first turn starts
    MatchCountdown {
        seconds_remaining: u32,
    },

    /// A unit was spawned and registered on the roster
    UnitSpawned {
        unit: UnitView,
    },

    /// A new turn has started for this player
    TurnStarted {
        player_id: Uuid,
        round: u32,
    },

    /// The outgoing player's turn ended
    TurnEnded {
        player_id: Uuid,
    },

    /// A full cycle through all players completed
    RoundChanged {
        round: u32,
    },

    /// Countdown for the active turn
    TimerUpdated {
        time_left: f32,
    },

    /// A unit moved; `remaining_move_distance` is `None` once movement is
    /// unbounded (late-game escalation)
    UnitMoved {
        unit_id: Uuid,
        position: Vec2,
        remaining_move_distance: Option<f32>,
    },

    /// A unit spent its attack for this turn
    UnitAttacked {
        unit_id: Uuid,
        target_unit_id: Uuid,
    },

    /// A unit was destroyed and is permanently out of play
    UnitDied {
        unit_id: Uuid,
    },

    /// The match is over
    GameEnded {
        winner_player_id: Option<Uuid>,
    },

    /// Error message
    Error {
        code: String,
        message: String,
    },

    /// Pong response
    Pong {
        /// Echo back client timestamp
        t: u64,
    },
}

/// Player info for lobby/join
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub player_id: Uuid,
    pub display_name: String,
}

/// Replicated unit state as observed by clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitView {
    pub unit_id: Uuid,
    pub owner_id: Uuid,
    pub class: UnitClass,
    pub position: Vec2,
    /// `None` means the unit's movement is unbounded
    pub remaining_move_distance: Option<f32>,
    pub has_attacked: bool,
    pub alive: bool,
}
