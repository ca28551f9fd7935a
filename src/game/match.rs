//! Match state and authoritative tick loop
//!
//! One tokio task per match owns all mutable state. Clients submit
//! fire-and-forget intents over an mpsc channel; state changes are
//! replicated through a broadcast channel. Rejected intents are dropped
//! silently: the absence of a follow-up notification is the caller's only
//! signal.

use dashmap::DashMap;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::time::interval;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::util::time::{tick_delta, TICK_DURATION_MICROS};
use crate::ws::protocol::{ClientMsg, PlayerInfo, ServerMsg, Vec2};

use super::attack::AttackSystem;
use super::movement::MovementSystem;
use super::spawn::{starting_units, SpawnZone};
use super::terrain::{OpenField, PathOracle};
use super::unit::Unit;
use super::victory;
use super::PlayerIntent;

/// Match lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPhase {
    /// Waiting for players
    Waiting,
    /// Enough players joined; short countdown before units spawn
    Starting,
    /// Turns are cycling
    InProgress,
    /// Terminal; no further turn or round mutation
    Ended,
}

/// Game tuning, sourced from the server config
#[derive(Debug, Clone, Copy)]
pub struct MatchConfig {
    /// Seconds per turn
    pub turn_duration: f32,
    /// Round at which the forced unit-count decision runs and, failing
    /// that, movement becomes unbounded
    pub escalation_round: u32,
    pub min_players: usize,
    pub max_players: usize,
    /// Seconds between filling the match and the first turn
    pub start_countdown: f32,
}

impl MatchConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            turn_duration: config.turn_duration_secs,
            escalation_round: config.escalation_round,
            min_players: config.min_players,
            max_players: config.max_players,
            start_countdown: 3.0,
        }
    }
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            turn_duration: 60.0,
            escalation_round: 10,
            min_players: 2,
            max_players: 2,
            start_countdown: 3.0,
        }
    }
}

/// A player slot, kept in join order. Turn rotation and the "first player"
/// round boundary both follow this order.
#[derive(Debug, Clone)]
pub struct PlayerSlot {
    pub player_id: Uuid,
    pub display_name: String,
}

/// Match state (owned by the match task)
pub struct MatchState {
    pub id: Uuid,
    pub seed: u64,
    pub phase: MatchPhase,
    pub tick: u64,
    pub players: Vec<PlayerSlot>,
    /// Append-only roster; dead units stay but cannot act
    pub units: Vec<Unit>,
    pub current_player: Uuid,
    pub time_left: f32,
    pub round: u32,
    /// Sticky once enabled; turn resets then keep budgets unbounded
    pub escalation_active: bool,
    pub countdown_remaining: f32,
    pub config: MatchConfig,
    pub rng: ChaCha8Rng,
}

impl MatchState {
    pub fn new(id: Uuid, seed: u64, config: MatchConfig) -> Self {
        Self {
            id,
            seed,
            phase: MatchPhase::Waiting,
            tick: 0,
            players: Vec::new(),
            units: Vec::new(),
            current_player: Uuid::nil(),
            time_left: 0.0,
            round: 1,
            escalation_active: false,
            countdown_remaining: config.start_countdown,
            config,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Whether it is this player's turn right now
    pub fn is_player_turn(&self, player_id: Uuid) -> bool {
        self.phase == MatchPhase::InProgress && self.current_player == player_id
    }

    pub fn connected_ids(&self) -> Vec<Uuid> {
        self.players.iter().map(|p| p.player_id).collect()
    }

    pub fn first_player(&self) -> Option<Uuid> {
        self.players.first().map(|p| p.player_id)
    }

    /// Next player in join order after the current one; the current player
    /// again when nobody else is connected (single-player fallback).
    fn next_player(&self) -> Option<Uuid> {
        if self.players.is_empty() {
            return None;
        }
        let position = self
            .players
            .iter()
            .position(|p| p.player_id == self.current_player);
        let next = match position {
            Some(index) => (index + 1) % self.players.len(),
            // Current player disconnected mid-turn
            None => 0,
        };
        Some(self.players[next].player_id)
    }

    pub fn unit(&self, unit_id: Uuid) -> Option<&Unit> {
        self.units.iter().find(|u| u.id == unit_id)
    }

    fn unit_index(&self, unit_id: Uuid) -> Option<usize> {
        self.units.iter().position(|u| u.id == unit_id)
    }
}

/// Handle to a running match
#[derive(Clone)]
pub struct MatchHandle {
    pub id: Uuid,
    pub intent_tx: mpsc::Sender<PlayerIntent>,
    pub events_tx: broadcast::Sender<ServerMsg>,
    pub player_count: Arc<AtomicUsize>,
    /// Cleared once the match leaves the waiting phase; late joins go to a
    /// fresh match instead
    pub accepting: Arc<AtomicBool>,
}

impl MatchHandle {
    pub fn player_count(&self) -> usize {
        self.player_count.load(Ordering::Relaxed)
    }

    pub fn is_accepting(&self) -> bool {
        self.accepting.load(Ordering::Relaxed)
    }
}

/// Registry of all active matches
pub struct MatchRegistry {
    matches: DashMap<Uuid, MatchHandle>,
}

impl MatchRegistry {
    pub fn new() -> Self {
        Self {
            matches: DashMap::new(),
        }
    }

    pub fn get(&self, id: &Uuid) -> Option<MatchHandle> {
        self.matches.get(id).map(|m| m.value().clone())
    }

    pub fn insert(&self, handle: MatchHandle) {
        self.matches.insert(handle.id, handle);
    }

    pub fn remove(&self, id: &Uuid) -> Option<MatchHandle> {
        self.matches.remove(id).map(|(_, h)| h)
    }

    pub fn active_matches(&self) -> usize {
        self.matches.len()
    }

    pub fn total_players(&self) -> usize {
        self.matches.iter().map(|m| m.value().player_count()).sum()
    }

    /// Find a match still waiting for players with a free slot
    pub fn find_open_match(&self, max_players: usize) -> Option<MatchHandle> {
        for entry in self.matches.iter() {
            let handle = entry.value();
            if handle.is_accepting() && handle.player_count() < max_players {
                return Some(handle.clone());
            }
        }
        None
    }
}

impl Default for MatchRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// The authoritative turn-based match
pub struct GameMatch {
    state: MatchState,
    intent_rx: mpsc::Receiver<PlayerIntent>,
    events_tx: broadcast::Sender<ServerMsg>,
    oracle: Box<dyn PathOracle>,
    player_count: Arc<AtomicUsize>,
    accepting: Arc<AtomicBool>,
}

impl GameMatch {
    /// Create a new match with the default open-field terrain
    pub fn new(id: Uuid, seed: u64, config: MatchConfig) -> (Self, MatchHandle) {
        Self::with_oracle(id, seed, config, Box::new(OpenField::default()))
    }

    /// Create a new match consuming the given terrain oracle
    pub fn with_oracle(
        id: Uuid,
        seed: u64,
        config: MatchConfig,
        oracle: Box<dyn PathOracle>,
    ) -> (Self, MatchHandle) {
        let (intent_tx, intent_rx) = mpsc::channel(256);
        let (events_tx, _) = broadcast::channel(256);
        let player_count = Arc::new(AtomicUsize::new(0));
        let accepting = Arc::new(AtomicBool::new(true));

        let handle = MatchHandle {
            id,
            intent_tx,
            events_tx: events_tx.clone(),
            player_count: player_count.clone(),
            accepting: accepting.clone(),
        };

        let game_match = Self {
            state: MatchState::new(id, seed, config),
            intent_rx,
            events_tx,
            oracle,
            player_count,
            accepting,
        };

        (game_match, handle)
    }

    pub fn state(&self) -> &MatchState {
        &self.state
    }

    /// Run the authoritative tick loop
    pub async fn run(mut self) {
        info!(match_id = %self.state.id, "Match task started");

        let mut tick_interval = interval(Duration::from_micros(TICK_DURATION_MICROS));
        tick_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tick_interval.tick().await;

            // Drain intent queue; arrival order is the serialization order
            while let Ok(intent) = self.intent_rx.try_recv() {
                self.process_intent(intent);
            }

            self.step(tick_delta());

            if self.state.phase == MatchPhase::Ended {
                info!(match_id = %self.state.id, "Match ended");
                break;
            }

            if self.state.players.is_empty() && self.state.phase != MatchPhase::Waiting {
                info!(match_id = %self.state.id, "All players left, ending match");
                break;
            }
        }
    }

    /// Handle one client intent. The player id was attached server-side at
    /// connection registration and is the only identity trusted here.
    pub fn process_intent(&mut self, intent: PlayerIntent) {
        match intent.msg {
            ClientMsg::JoinMatch => self.handle_join(intent.player_id),
            ClientMsg::MoveUnit { unit_id, target } => {
                self.handle_move(intent.player_id, unit_id, target);
            }
            ClientMsg::AttackUnit {
                unit_id,
                target_unit_id,
            } => {
                self.handle_attack(intent.player_id, unit_id, target_unit_id);
            }
            ClientMsg::EndTurn => self.handle_end_turn(intent.player_id),
            ClientMsg::Ping { t } => {
                let _ = self.events_tx.send(ServerMsg::Pong { t });
            }
            ClientMsg::LeaveMatch => self.handle_leave(intent.player_id),
        }
    }

    /// Advance the match by one tick
    pub fn step(&mut self, dt: f32) {
        self.state.tick += 1;

        match self.state.phase {
            MatchPhase::Waiting | MatchPhase::Ended => {}
            MatchPhase::Starting => {
                self.state.countdown_remaining -= dt;
                if self.state.countdown_remaining <= 0.0 {
                    self.spawn_all_units();
                    self.start_first_turn();
                }
            }
            MatchPhase::InProgress => self.tick_turn(dt),
        }
    }

    fn handle_join(&mut self, player_id: Uuid) {
        if self
            .state
            .players
            .iter()
            .any(|p| p.player_id == player_id)
        {
            warn!(player_id = %player_id, "Player already in match");
            return;
        }

        if self.state.phase != MatchPhase::Waiting {
            let _ = self.events_tx.send(ServerMsg::Error {
                code: "match_started".to_string(),
                message: "Match already started".to_string(),
            });
            return;
        }

        if self.state.players.len() >= self.state.config.max_players {
            let _ = self.events_tx.send(ServerMsg::Error {
                code: "match_full".to_string(),
                message: "Match is full".to_string(),
            });
            return;
        }

        let slot = PlayerSlot {
            player_id,
            display_name: format!("Player_{}", &player_id.to_string()[..8]),
        };

        let _ = self.events_tx.send(ServerMsg::PlayerJoined {
            player: PlayerInfo {
                player_id,
                display_name: slot.display_name.clone(),
            },
        });

        self.state.players.push(slot);
        self.player_count
            .store(self.state.players.len(), Ordering::Relaxed);

        let players: Vec<PlayerInfo> = self
            .state
            .players
            .iter()
            .map(|p| PlayerInfo {
                player_id: p.player_id,
                display_name: p.display_name.clone(),
            })
            .collect();

        let _ = self.events_tx.send(ServerMsg::MatchJoined {
            match_id: self.state.id,
            seed: self.state.seed,
            players,
            units: self.state.units.iter().map(Unit::view).collect(),
        });

        info!(
            match_id = %self.state.id,
            player_id = %player_id,
            player_count = self.state.players.len(),
            "Player joined match"
        );

        if self.state.players.len() >= self.state.config.min_players {
            self.state.phase = MatchPhase::Starting;
            self.state.countdown_remaining = self.state.config.start_countdown;
            self.accepting.store(false, Ordering::Relaxed);
            let _ = self.events_tx.send(ServerMsg::MatchCountdown {
                seconds_remaining: self.state.config.start_countdown.ceil() as u32,
            });
        }
    }

    fn handle_leave(&mut self, player_id: Uuid) {
        let before = self.state.players.len();
        self.state.players.retain(|p| p.player_id != player_id);
        if self.state.players.len() == before {
            return;
        }

        self.player_count
            .store(self.state.players.len(), Ordering::Relaxed);

        let _ = self.events_tx.send(ServerMsg::PlayerLeft {
            player_id,
            reason: "disconnected".to_string(),
        });

        info!(match_id = %self.state.id, player_id = %player_id, "Player left match");
    }

    /// Spawn the starting roster for every player and register it.
    /// Units are never created mid-match after this point.
    fn spawn_all_units(&mut self) {
        let players: Vec<Uuid> = self.state.connected_ids();
        for (index, player_id) in players.into_iter().enumerate() {
            let zone = SpawnZone::for_player_index(index);
            for unit in starting_units(player_id, zone, &mut self.state.rng) {
                self.register_unit(unit);
            }
        }
    }

    /// Idempotent append to the roster
    pub fn register_unit(&mut self, unit: Unit) {
        if self.state.unit(unit.id).is_some() {
            return;
        }
        let _ = self.events_tx.send(ServerMsg::UnitSpawned { unit: unit.view() });
        self.state.units.push(unit);
    }

    /// Precondition: at least one player joined and the match has not
    /// started yet.
    fn start_first_turn(&mut self) {
        let Some(first) = self.state.first_player() else {
            return;
        };

        self.state.phase = MatchPhase::InProgress;
        self.state.round = 1;
        self.state.current_player = first;
        self.begin_turn();

        info!(match_id = %self.state.id, player_id = %first, "First turn started");
    }

    /// One in-progress tick: victory first (short-circuits the rest), then
    /// the turn timer with the timeout fallback.
    fn tick_turn(&mut self, dt: f32) {
        let connected = self.state.connected_ids();
        if let Some(winner) = victory::evaluate(&self.state.units, &connected) {
            self.end_game(Some(winner));
            return;
        }

        self.state.time_left = (self.state.time_left - dt).max(0.0);
        let _ = self.events_tx.send(ServerMsg::TimerUpdated {
            time_left: self.state.time_left,
        });

        if self.state.time_left <= 0.0 {
            // Timeout behaves exactly like an explicit end-turn; a turn is
            // never left stuck
            self.end_turn();
        }
    }

    fn handle_end_turn(&mut self, requested_by: Uuid) {
        // The acting player is derived from the connection, never from a
        // client-supplied id; only the current player may end the turn.
        if !self.state.is_player_turn(requested_by) {
            debug!(
                match_id = %self.state.id,
                player_id = %requested_by,
                "End-turn request outside requester's turn, dropped"
            );
            return;
        }
        self.end_turn();
    }

    fn end_turn(&mut self) {
        let _ = self.events_tx.send(ServerMsg::TurnEnded {
            player_id: self.state.current_player,
        });

        let Some(next) = self.state.next_player() else {
            return;
        };

        // A round boundary is crossed when the turn cycles back to the
        // first player in join order
        if Some(next) == self.state.first_player() {
            self.state.round += 1;
            let _ = self.events_tx.send(ServerMsg::RoundChanged {
                round: self.state.round,
            });

            if self.state.round == self.state.config.escalation_round {
                if let Some(winner) = victory::decide_by_unit_count(&self.state.units) {
                    self.end_game(Some(winner));
                    return;
                }
            }

            if self.state.round >= self.state.config.escalation_round {
                self.enable_escalation();
            }
        }

        // Single-player fallback: next may equal the current player; the
        // timer and unit resets still apply
        self.state.current_player = next;
        self.begin_turn();
    }

    /// Reset the timer and the incoming player's units, then announce the
    /// turn. Budget and attack flag reset together, exactly once per
    /// owner-turn start.
    fn begin_turn(&mut self) {
        self.state.time_left = self.state.config.turn_duration;
        let _ = self.events_tx.send(ServerMsg::TimerUpdated {
            time_left: self.state.time_left,
        });

        let escalation = self.state.escalation_active;
        let current = self.state.current_player;
        for unit in self
            .state
            .units
            .iter_mut()
            .filter(|u| u.alive && u.owner_id == current)
        {
            unit.reset_turn(escalation);
            let _ = self.events_tx.send(ServerMsg::UnitMoved {
                unit_id: unit.id,
                position: unit.position,
                remaining_move_distance: unit.budget.remaining(),
            });
        }

        let _ = self.events_tx.send(ServerMsg::TurnStarted {
            player_id: current,
            round: self.state.round,
        });
        let _ = self.events_tx.send(ServerMsg::RoundChanged {
            round: self.state.round,
        });
    }

    /// Grant every registered unit unbounded movement for the rest of the
    /// match (catch-up mechanic against stalemates)
    fn enable_escalation(&mut self) {
        if !self.state.escalation_active {
            info!(
                match_id = %self.state.id,
                round = self.state.round,
                "Round escalation: unbounded movement enabled"
            );
        }
        self.state.escalation_active = true;

        for unit in self.state.units.iter_mut().filter(|u| u.alive) {
            unit.set_infinite_movement(true);
            let _ = self.events_tx.send(ServerMsg::UnitMoved {
                unit_id: unit.id,
                position: unit.position,
                remaining_move_distance: unit.budget.remaining(),
            });
        }
    }

    fn handle_move(&mut self, player_id: Uuid, unit_id: Uuid, target: Vec2) {
        if self.state.phase != MatchPhase::InProgress {
            return;
        }

        let Some(index) = self.state.unit_index(unit_id) else {
            return;
        };

        {
            let unit = &self.state.units[index];
            if unit.owner_id != player_id
                || !unit.alive
                || !self.state.is_player_turn(unit.owner_id)
                || !unit.budget.can_move()
            {
                debug!(
                    match_id = %self.state.id,
                    player_id = %player_id,
                    unit_id = %unit_id,
                    "Move request rejected, dropped"
                );
                return;
            }
        }

        let from = self.state.units[index].position;
        let Some(waypoints) = self.oracle.compute_path(from, target) else {
            debug!(
                match_id = %self.state.id,
                unit_id = %unit_id,
                "Destination unreachable, move dropped"
            );
            return;
        };

        let Some(clip) = MovementSystem::clip_path(&waypoints, self.state.units[index].budget)
        else {
            return;
        };

        let unit = &mut self.state.units[index];
        unit.position = clip.destination;
        unit.budget.consume(clip.consumed);

        let _ = self.events_tx.send(ServerMsg::UnitMoved {
            unit_id,
            position: unit.position,
            remaining_move_distance: unit.budget.remaining(),
        });
    }

    fn handle_attack(&mut self, player_id: Uuid, unit_id: Uuid, target_unit_id: Uuid) {
        if self.state.phase != MatchPhase::InProgress || unit_id == target_unit_id {
            return;
        }

        let (Some(attacker_index), Some(target_index)) = (
            self.state.unit_index(unit_id),
            self.state.unit_index(target_unit_id),
        ) else {
            return;
        };

        {
            let attacker = &self.state.units[attacker_index];
            if attacker.owner_id != player_id
                || !attacker.alive
                || !self.state.is_player_turn(attacker.owner_id)
            {
                debug!(
                    match_id = %self.state.id,
                    player_id = %player_id,
                    unit_id = %unit_id,
                    "Attack request outside requester's turn, dropped"
                );
                return;
            }

            let target = &self.state.units[target_index];
            if let Err(rejection) = AttackSystem::validate(attacker, target) {
                debug!(
                    match_id = %self.state.id,
                    unit_id = %unit_id,
                    target_unit_id = %target_unit_id,
                    ?rejection,
                    "Attack request rejected, dropped"
                );
                return;
            }
        }

        self.state.units[attacker_index].has_attacked = true;
        let _ = self.events_tx.send(ServerMsg::UnitAttacked {
            unit_id,
            target_unit_id,
        });

        // Attacks are binary: the target is permanently out of play. The
        // roster keeps the entry so victory evaluation sees the loss.
        self.state.units[target_index].alive = false;
        let _ = self.events_tx.send(ServerMsg::UnitDied {
            unit_id: target_unit_id,
        });

        info!(
            match_id = %self.state.id,
            unit_id = %unit_id,
            target_unit_id = %target_unit_id,
            "Unit destroyed"
        );
    }

    /// Terminal transition; broadcasts the outcome exactly once
    fn end_game(&mut self, winner: Option<Uuid>) {
        if self.state.phase == MatchPhase::Ended {
            return;
        }

        self.state.phase = MatchPhase::Ended;
        self.state.time_left = 0.0;
        let _ = self.events_tx.send(ServerMsg::TimerUpdated { time_left: 0.0 });
        let _ = self.events_tx.send(ServerMsg::GameEnded {
            winner_player_id: winner,
        });

        info!(
            match_id = %self.state.id,
            winner = ?winner,
            round = self.state.round,
            "Game ended"
        );
    }
}
