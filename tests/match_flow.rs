//! Integration tests for the turn-based match flow, driven through the
//! public match API the server task uses.

use tactics_server::game::terrain::PathOracle;
use tactics_server::game::unit::MoveBudget;
use tactics_server::game::{GameMatch, MatchConfig, MatchHandle, MatchPhase, PlayerIntent};
use tactics_server::ws::protocol::{ClientMsg, ServerMsg, UnitClass, Vec2};
use uuid::Uuid;

fn intent(player_id: Uuid, msg: ClientMsg) -> PlayerIntent {
    PlayerIntent {
        player_id,
        msg,
        received_at: 0,
    }
}

fn config() -> MatchConfig {
    MatchConfig {
        turn_duration: 60.0,
        escalation_round: 10,
        min_players: 2,
        max_players: 2,
        start_countdown: 1.0,
    }
}

/// Join two players and run the countdown out so the first turn starts
fn started_match(config: MatchConfig) -> (GameMatch, MatchHandle, Uuid, Uuid) {
    let (mut gm, handle) = GameMatch::new(Uuid::new_v4(), 7, config);
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
    gm.process_intent(intent(a, ClientMsg::JoinMatch));
    gm.process_intent(intent(b, ClientMsg::JoinMatch));
    gm.step(config.start_countdown + 0.1);
    (gm, handle, a, b)
}

#[test]
fn first_turn_goes_to_the_first_joiner() {
    let (gm, _handle, a, _b) = started_match(config());

    let state = gm.state();
    assert_eq!(state.phase, MatchPhase::InProgress);
    assert_eq!(state.current_player, a);
    assert_eq!(state.round, 1);
    assert_eq!(state.time_left, 60.0);

    // Each player got one unit of each archetype
    for player in state.connected_ids() {
        let classes: Vec<UnitClass> = state
            .units
            .iter()
            .filter(|u| u.owner_id == player)
            .map(|u| u.class)
            .collect();
        assert_eq!(classes.len(), 2);
        assert!(classes.contains(&UnitClass::Vanguard));
        assert!(classes.contains(&UnitClass::Marksman));
    }
}

#[test]
fn third_player_cannot_join_a_full_match() {
    let (mut gm, _handle, _a, _b) = started_match(config());
    let late = Uuid::new_v4();
    gm.process_intent(intent(late, ClientMsg::JoinMatch));
    assert_eq!(gm.state().players.len(), 2);
}

#[test]
fn round_increments_only_on_full_cycles() {
    let (mut gm, _handle, a, b) = started_match(config());

    gm.process_intent(intent(a, ClientMsg::EndTurn));
    assert_eq!(gm.state().current_player, b);
    // Partial cycle: still round 1
    assert_eq!(gm.state().round, 1);

    gm.process_intent(intent(b, ClientMsg::EndTurn));
    assert_eq!(gm.state().current_player, a);
    assert_eq!(gm.state().round, 2);
}

#[test]
fn end_turn_is_only_accepted_from_the_current_player() {
    let (mut gm, _handle, a, b) = started_match(config());

    gm.process_intent(intent(b, ClientMsg::EndTurn));
    assert_eq!(gm.state().current_player, a);
    assert_eq!(gm.state().round, 1);
}

#[test]
fn turn_timer_expiry_ends_the_turn() {
    let (mut gm, _handle, a, b) = started_match(config());
    assert_eq!(gm.state().current_player, a);

    // Run the timer down in coarse ticks; the timeout behaves like an
    // explicit end-turn
    for _ in 0..60 {
        gm.step(1.0);
    }

    assert_eq!(gm.state().current_player, b);
    assert_eq!(gm.state().phase, MatchPhase::InProgress);
    assert_eq!(gm.state().time_left, 60.0);
}

#[test]
fn movement_budget_decreases_and_never_goes_negative() {
    let (mut gm, _handle, a, _b) = started_match(config());

    let unit_id = gm
        .state()
        .units
        .iter()
        .find(|u| u.owner_id == a && u.class == UnitClass::Marksman)
        .map(|u| u.id)
        .unwrap();
    let start = gm.state().unit(unit_id).unwrap().position;

    // Marksman budget is 4.0; ask for a 3-unit straight move
    let target = Vec2::new(start.x + 3.0, start.y);
    gm.process_intent(intent(a, ClientMsg::MoveUnit { unit_id, target }));

    let unit = gm.state().unit(unit_id).unwrap();
    assert_eq!(unit.position, target);
    match unit.budget {
        MoveBudget::Finite(remaining) => assert!((remaining - 1.0).abs() < 1e-4),
        MoveBudget::Unbounded => panic!("budget should still be finite"),
    }

    // A second long request only gets the single remaining unit of travel
    let far = Vec2::new(start.x + 20.0, start.y);
    gm.process_intent(intent(a, ClientMsg::MoveUnit { unit_id, target: far }));
    let unit = gm.state().unit(unit_id).unwrap();
    assert!((unit.position.x - (start.x + 4.0)).abs() < 1e-4);
    assert_eq!(unit.budget, MoveBudget::Finite(0.0));

    // Exhausted budget: further requests are dropped
    gm.process_intent(intent(a, ClientMsg::MoveUnit { unit_id, target: far }));
    let unit = gm.state().unit(unit_id).unwrap();
    assert!((unit.position.x - (start.x + 4.0)).abs() < 1e-4);
}

/// Oracle that routes every request through a fixed dog-leg so paths have a
/// known multi-segment shape
struct DogLeg;

impl PathOracle for DogLeg {
    fn compute_path(&self, from: Vec2, to: Vec2) -> Option<Vec<Vec2>> {
        Some(vec![from, Vec2::new(to.x, from.y), to])
    }
}

#[test]
fn multi_segment_paths_are_clipped_mid_segment() {
    let cfg = config();
    let (mut gm, _handle) = GameMatch::with_oracle(Uuid::new_v4(), 7, cfg, Box::new(DogLeg));
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
    gm.process_intent(intent(a, ClientMsg::JoinMatch));
    gm.process_intent(intent(b, ClientMsg::JoinMatch));
    gm.step(cfg.start_countdown + 0.1);

    let unit_id = gm
        .state()
        .units
        .iter()
        .find(|u| u.owner_id == a && u.class == UnitClass::Marksman)
        .map(|u| u.id)
        .unwrap();
    let start = gm.state().unit(unit_id).unwrap().position;

    // Dog-leg path: 3 east, then 5 north; cumulative [0, 3, 8] against a
    // budget of 4 clips one unit up the second segment
    let target = Vec2::new(start.x + 3.0, start.y + 5.0);
    gm.process_intent(intent(a, ClientMsg::MoveUnit { unit_id, target }));

    let unit = gm.state().unit(unit_id).unwrap();
    assert!((unit.position.x - (start.x + 3.0)).abs() < 1e-4);
    assert!((unit.position.y - (start.y + 1.0)).abs() < 1e-4);
    assert_eq!(unit.budget, MoveBudget::Finite(0.0));
}

/// Oracle for terrain where nothing is reachable
struct Walled;

impl PathOracle for Walled {
    fn compute_path(&self, _from: Vec2, _to: Vec2) -> Option<Vec<Vec2>> {
        None
    }
}

#[test]
fn unreachable_destinations_are_dropped_silently() {
    let cfg = config();
    let (mut gm, _handle) = GameMatch::with_oracle(Uuid::new_v4(), 7, cfg, Box::new(Walled));
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
    gm.process_intent(intent(a, ClientMsg::JoinMatch));
    gm.process_intent(intent(b, ClientMsg::JoinMatch));
    gm.step(cfg.start_countdown + 0.1);

    let unit_id = gm
        .state()
        .units
        .iter()
        .find(|u| u.owner_id == a)
        .map(|u| u.id)
        .unwrap();
    let before = gm.state().unit(unit_id).unwrap();
    let (position, budget) = (before.position, before.budget);

    gm.process_intent(intent(
        a,
        ClientMsg::MoveUnit {
            unit_id,
            target: Vec2::new(0.0, 0.0),
        },
    ));

    let unit = gm.state().unit(unit_id).unwrap();
    assert_eq!(unit.position, position);
    assert_eq!(unit.budget, budget);
}

#[test]
fn single_player_end_turn_keeps_the_turn_but_resets_units() {
    let cfg = MatchConfig {
        min_players: 1,
        max_players: 1,
        ..config()
    };
    let (mut gm, _handle) = GameMatch::new(Uuid::new_v4(), 7, cfg);
    let a = Uuid::new_v4();
    gm.process_intent(intent(a, ClientMsg::JoinMatch));
    gm.step(cfg.start_countdown + 0.1);
    assert_eq!(gm.state().current_player, a);

    // Spend some budget
    let unit_id = gm
        .state()
        .units
        .iter()
        .find(|u| u.owner_id == a && u.class == UnitClass::Vanguard)
        .map(|u| u.id)
        .unwrap();
    let start = gm.state().unit(unit_id).unwrap().position;
    gm.process_intent(intent(
        a,
        ClientMsg::MoveUnit {
            unit_id,
            target: Vec2::new(start.x + 2.0, start.y),
        },
    ));
    assert_eq!(
        gm.state().unit(unit_id).unwrap().budget,
        MoveBudget::Finite(6.0)
    );

    gm.process_intent(intent(a, ClientMsg::EndTurn));

    // Turn never leaves the lone player, yet turn state fully resets
    assert_eq!(gm.state().current_player, a);
    assert_eq!(
        gm.state().unit(unit_id).unwrap().budget,
        MoveBudget::Finite(8.0)
    );
    assert_eq!(gm.state().time_left, 60.0);
}

#[test]
fn turn_notifications_are_broadcast_in_order() {
    let cfg = config();
    let (mut gm, handle) = GameMatch::new(Uuid::new_v4(), 7, cfg);
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
    let mut rx = handle.events_tx.subscribe();

    gm.process_intent(intent(a, ClientMsg::JoinMatch));
    gm.process_intent(intent(b, ClientMsg::JoinMatch));
    gm.step(cfg.start_countdown + 0.1);
    gm.process_intent(intent(a, ClientMsg::EndTurn));

    let mut msgs = Vec::new();
    while let Ok(msg) = rx.try_recv() {
        msgs.push(msg);
    }

    let ended_at = msgs
        .iter()
        .position(|m| matches!(m, ServerMsg::TurnEnded { player_id } if *player_id == a))
        .expect("turn_ended for the outgoing player");
    let started_at = msgs
        .iter()
        .rposition(|m| matches!(m, ServerMsg::TurnStarted { player_id, .. } if *player_id == b))
        .expect("turn_started for the incoming player");
    assert!(ended_at < started_at);

    assert!(msgs
        .iter()
        .any(|m| matches!(m, ServerMsg::MatchCountdown { .. })));
    assert!(msgs.iter().any(|m| matches!(m, ServerMsg::UnitSpawned { .. })));
    assert!(msgs.iter().any(|m| matches!(m, ServerMsg::TimerUpdated { .. })));
}
