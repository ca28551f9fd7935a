//! Application state shared across routes

use std::sync::Arc;

use crate::config::Config;
use crate::game::{MatchConfig, MatchRegistry};
use crate::lobby::LobbyService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub lobby: Arc<LobbyService>,
    pub match_registry: Arc<MatchRegistry>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let config = Arc::new(config);
        let match_registry = Arc::new(MatchRegistry::new());

        let lobby = Arc::new(LobbyService::new(
            match_registry.clone(),
            MatchConfig::from_config(&config),
        ));

        Self {
            config,
            lobby,
            match_registry,
        }
    }
}
