//! Lobby service - match placement and lifecycle
//!
//! A turn-based match binds a player for the lifetime of the connection, so
//! placement happens once at registration: the player gets the open match
//! with a free slot, or a fresh match task is spawned for them. The returned
//! channels talk straight to that match.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tracing::info;
use uuid::Uuid;

use crate::game::{GameMatch, MatchConfig, MatchRegistry, PlayerIntent};
use crate::util::time::unix_millis;
use crate::ws::protocol::{ClientMsg, ServerMsg};

pub struct LobbyService {
    registry: Arc<MatchRegistry>,
    config: MatchConfig,
    /// Player -> match they were placed into
    player_matches: DashMap<Uuid, Uuid>,
}

impl LobbyService {
    pub fn new(registry: Arc<MatchRegistry>, config: MatchConfig) -> Self {
        Self {
            registry,
            config,
            player_matches: DashMap::new(),
        }
    }

    /// Register a player connection (called when the WebSocket connects).
    /// Returns the intent sender and notification receiver for the match
    /// the player was placed into.
    pub fn register_player(
        &self,
        player_id: Uuid,
    ) -> (mpsc::Sender<PlayerIntent>, broadcast::Receiver<ServerMsg>) {
        let handle = match self.registry.find_open_match(self.config.max_players) {
            Some(handle) => handle,
            None => self.spawn_match(),
        };

        self.player_matches.insert(player_id, handle.id);

        info!(player_id = %player_id, match_id = %handle.id, "Player placed into match");

        (handle.intent_tx.clone(), handle.events_tx.subscribe())
    }

    /// Forward a disconnect to the player's match and forget the placement
    pub async fn unregister_player(&self, player_id: Uuid) {
        let Some((_, match_id)) = self.player_matches.remove(&player_id) else {
            return;
        };

        if let Some(handle) = self.registry.get(&match_id) {
            let _ = handle
                .intent_tx
                .send(PlayerIntent {
                    player_id,
                    msg: ClientMsg::LeaveMatch,
                    received_at: unix_millis(),
                })
                .await;
        }
    }

    /// Create a match, register it, and spawn its authoritative task
    fn spawn_match(&self) -> crate::game::MatchHandle {
        let match_id = Uuid::new_v4();
        let seed = rand::random::<u64>();
        let (game_match, handle) = GameMatch::new(match_id, seed, self.config);

        self.registry.insert(handle.clone());

        let registry = self.registry.clone();
        tokio::spawn(async move {
            game_match.run().await;
            registry.remove(&match_id);
        });

        info!(match_id = %match_id, seed, "Match created");

        handle
    }
}
