//! Integration tests for lobby placement and match lifecycle

use std::sync::Arc;
use std::time::Duration;

use tactics_server::game::{MatchConfig, MatchRegistry, PlayerIntent};
use tactics_server::lobby::LobbyService;
use tactics_server::ws::protocol::ClientMsg;
use uuid::Uuid;

async fn join(
    lobby: &LobbyService,
    player_id: Uuid,
) -> tokio::sync::mpsc::Sender<PlayerIntent> {
    let (intent_tx, _events_rx) = lobby.register_player(player_id);
    intent_tx
        .send(PlayerIntent {
            player_id,
            msg: ClientMsg::JoinMatch,
            received_at: 0,
        })
        .await
        .expect("match task accepts intents");
    // Give the match task a couple of ticks to process the join
    tokio::time::sleep(Duration::from_millis(500)).await;
    intent_tx
}

#[tokio::test]
async fn players_fill_a_match_before_a_new_one_opens() {
    let registry = Arc::new(MatchRegistry::new());
    let lobby = LobbyService::new(registry.clone(), MatchConfig::default());

    let _a_tx = join(&lobby, Uuid::new_v4()).await;
    assert_eq!(registry.active_matches(), 1);
    assert_eq!(registry.total_players(), 1);

    let _b_tx = join(&lobby, Uuid::new_v4()).await;
    assert_eq!(registry.active_matches(), 1);
    assert_eq!(registry.total_players(), 2);

    // The first match is full and counting down, so the next connection is
    // placed into a fresh match
    let _c_tx = join(&lobby, Uuid::new_v4()).await;
    assert_eq!(registry.active_matches(), 2);
}

#[tokio::test]
async fn disconnecting_player_is_forwarded_to_the_match() {
    let registry = Arc::new(MatchRegistry::new());
    let lobby = LobbyService::new(registry.clone(), MatchConfig::default());

    let player = Uuid::new_v4();
    let _tx = join(&lobby, player).await;
    assert_eq!(registry.total_players(), 1);

    lobby.unregister_player(player).await;
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(registry.total_players(), 0);
}
