use parlor::api::handlers::{cleanup, matchmaking, moves};
use parlor::api::models::ServerMessage;
use parlor::api::state::{AppState, SharedState};
use parlor::application::session::{Seat, Session};
use parlor::config::AppConfig;
use parlor::domain::models::{Color, ConnId, Difficulty, EndReason, GameId, MovePayload};
use parlor::domain::position::Board;
use parlor::infrastructure::identity::StaticDirectory;
use parlor::infrastructure::store::{GameKind, MemoryStore, NewGame};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use uuid::Uuid;

type Inbox = mpsc::UnboundedReceiver<ServerMessage>;

fn test_state() -> SharedState {
    let mut config = AppConfig::default();
    config.limits.move_interval_ms = 0;
    config.limits.room_interval_ms = 0;
    config.session.disconnect_grace_secs = 60;
    AppState::new(
        config,
        Arc::new(MemoryStore::new()),
        Arc::new(StaticDirectory::new()),
    )
}

fn connect(state: &SharedState, user: &str) -> (ConnId, Inbox) {
    let conn = Uuid::new_v4();
    let (tx, rx) = mpsc::unbounded_channel();
    state.register_client(conn, user.to_string(), tx);
    (conn, rx)
}

fn next(rx: &mut Inbox) -> ServerMessage {
    rx.try_recv().expect("expected a queued message")
}

fn drain(rx: &mut Inbox) {
    while rx.try_recv().is_ok() {}
}

/// Pairs alice (white) and bob (black) over quick match and drains the
/// setup traffic, leaving both inboxes clean.
async fn start_match(state: &SharedState) -> (ConnId, Inbox, ConnId, Inbox, GameId) {
    let (a, mut rx_a) = connect(state, "alice");
    let (b, mut rx_b) = connect(state, "bob");
    matchmaking::handle_quick_match(state, a).await;
    matchmaking::handle_quick_match(state, b).await;
    drain(&mut rx_a);
    drain(&mut rx_b);
    let game_id = state
        .store
        .find_active(&"alice".to_string())
        .await
        .unwrap()
        .unwrap()
        .id;
    (a, rx_a, b, rx_b, game_id)
}

fn mv(from: &str, to: &str) -> MovePayload {
    MovePayload::new(from, to, None)
}

#[tokio::test]
async fn a_legal_move_echoes_to_both_players_and_persists() {
    let state = test_state();
    let (a, mut rx_a, _b, mut rx_b, game_id) = start_match(&state).await;

    moves::handle_move(&state, a, mv("e2", "e4")).await;

    let expected = ServerMessage::Move {
        from: "e2".into(),
        to: "e4".into(),
        promotion: None,
    };
    assert_eq!(next(&mut rx_a), expected);
    assert_eq!(next(&mut rx_b), expected);

    let log = state.store.moves(game_id).await.unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].ply, 1);
    assert_eq!(log[0].san, "e4");
    assert!(log[0].fen.starts_with("rnbqkbnr/pppppppp/8/8/4P3"));
}

#[tokio::test]
async fn moving_out_of_turn_is_rejected() {
    let state = test_state();
    let (_a, _rx_a, b, mut rx_b, game_id) = start_match(&state).await;

    moves::handle_move(&state, b, mv("e7", "e5")).await;

    assert_eq!(
        next(&mut rx_b),
        ServerMessage::Error {
            message: "Not your turn".to_string()
        }
    );
    assert!(state.store.moves(game_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn an_illegal_move_is_rejected() {
    let state = test_state();
    let (a, mut rx_a, _b, _rx_b, game_id) = start_match(&state).await;

    moves::handle_move(&state, a, mv("e2", "e5")).await;

    assert_eq!(
        next(&mut rx_a),
        ServerMessage::Error {
            message: "Illegal move".to_string()
        }
    );
    assert!(state.store.moves(game_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn a_connection_without_a_game_is_told_so() {
    let state = test_state();
    let (c, mut rx_c) = connect(&state, "carol");

    moves::handle_move(&state, c, mv("e2", "e4")).await;

    assert_eq!(
        next(&mut rx_c),
        ServerMessage::Error {
            message: "No active game found".to_string()
        }
    );
}

#[tokio::test]
async fn moves_are_blocked_while_the_opponent_is_away() {
    let state = test_state();
    let (a, mut rx_a, b, _rx_b, _game_id) = start_match(&state).await;

    cleanup::handle_disconnect(&state, b).await;
    assert_eq!(next(&mut rx_a), ServerMessage::OpponentDisconnected);

    moves::handle_move(&state, a, mv("e2", "e4")).await;
    assert_eq!(
        next(&mut rx_a),
        ServerMessage::Error {
            message: "Waiting for opponent to reconnect.".to_string()
        }
    );
}

#[tokio::test]
async fn promotion_needs_an_explicit_piece_choice() {
    let state = test_state();
    let (a, mut rx_a) = connect(&state, "alice");
    let (b, mut rx_b) = connect(&state, "bob");

    let record = state
        .store
        .create_game(NewGame {
            white: "alice".to_string(),
            black: Some("bob".to_string()),
            kind: GameKind::Multiplayer,
            difficulty: None,
        })
        .await
        .unwrap();
    let board = Board::from_fen("8/P6k/8/8/8/8/8/K7 w - - 0 1").unwrap();
    state.insert_session(Session::multiplayer(
        record.id,
        board,
        Seat::occupied(&"alice".to_string(), a),
        Seat::occupied(&"bob".to_string(), b),
        record.created_at,
    ));

    moves::handle_move(&state, a, mv("a7", "a8")).await;
    assert_eq!(
        next(&mut rx_a),
        ServerMessage::Error {
            message: "Pawn promotion required! Please select Queen, Rook, Bishop, or Knight."
                .to_string()
        }
    );

    moves::handle_move(&state, a, MovePayload::new("a7", "a8", Some("q"))).await;
    let expected = ServerMessage::Move {
        from: "a7".into(),
        to: "a8".into(),
        promotion: Some("q".into()),
    };
    assert_eq!(next(&mut rx_a), expected);
    assert_eq!(next(&mut rx_b), expected);

    let log = state.store.moves(record.id).await.unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].san, "a8=Q");
    assert_eq!(log[0].promotion.as_deref(), Some("q"));
}

#[tokio::test]
async fn rapid_fire_moves_are_rate_limited() {
    let mut config = AppConfig::default();
    config.limits.move_interval_ms = 60_000;
    config.session.disconnect_grace_secs = 60;
    let state = AppState::new(
        config,
        Arc::new(MemoryStore::new()),
        Arc::new(StaticDirectory::new()),
    );
    let (a, mut rx_a, _b, _rx_b, _game_id) = start_match(&state).await;

    moves::handle_move(&state, a, mv("e2", "e4")).await;
    assert!(matches!(next(&mut rx_a), ServerMessage::Move { .. }));

    moves::handle_move(&state, a, mv("d2", "d4")).await;
    assert_eq!(
        next(&mut rx_a),
        ServerMessage::Error {
            message: "Move too fast. Please wait a moment.".to_string()
        }
    );
}

#[tokio::test]
async fn checkmate_ends_the_game_and_completes_the_record() {
    let state = test_state();
    let (a, mut rx_a, b, mut rx_b, game_id) = start_match(&state).await;

    moves::handle_move(&state, a, mv("f2", "f3")).await;
    moves::handle_move(&state, b, mv("e7", "e5")).await;
    moves::handle_move(&state, a, mv("g2", "g4")).await;
    drain(&mut rx_a);
    drain(&mut rx_b);

    moves::handle_move(&state, b, mv("d8", "h4")).await;

    assert!(matches!(next(&mut rx_a), ServerMessage::Move { .. }));
    assert_eq!(
        next(&mut rx_a),
        ServerMessage::GameOver {
            winner: Some(Color::Black),
            reason: EndReason::Checkmate,
        }
    );
    assert!(matches!(next(&mut rx_b), ServerMessage::Move { .. }));
    assert!(matches!(next(&mut rx_b), ServerMessage::GameOver { .. }));

    assert!(state.sessions.is_empty());
    // Completed games stop matching as active but keep their history.
    assert!(state
        .store
        .find_active(&"alice".to_string())
        .await
        .unwrap()
        .is_none());
    assert_eq!(state.store.moves(game_id).await.unwrap().len(), 4);
}

#[tokio::test]
async fn the_engine_answers_a_single_player_move() {
    let state = test_state();
    let (a, mut rx_a) = connect(&state, "alice");

    matchmaking::handle_single_player(&state, a, Some("easy".to_string())).await;
    drain(&mut rx_a);
    let game_id = state
        .store
        .find_active(&"alice".to_string())
        .await
        .unwrap()
        .unwrap()
        .id;

    moves::handle_move(&state, a, mv("e2", "e4")).await;
    assert_eq!(
        next(&mut rx_a),
        ServerMessage::Move {
            from: "e2".into(),
            to: "e4".into(),
            promotion: None,
        }
    );

    let reply = tokio::time::timeout(Duration::from_secs(5), rx_a.recv())
        .await
        .expect("engine reply timed out")
        .expect("channel closed");
    assert!(matches!(reply, ServerMessage::Move { .. }));

    let log = state.store.moves(game_id).await.unwrap();
    assert_eq!(log.len(), 2);
    assert_eq!(log[1].ply, 2);
}

#[tokio::test]
async fn mating_the_engine_ends_the_game_without_a_reply() {
    let state = test_state();
    let (a, mut rx_a) = connect(&state, "alice");

    let record = state
        .store
        .create_game(NewGame {
            white: "alice".to_string(),
            black: None,
            kind: GameKind::SinglePlayer,
            difficulty: Some(Difficulty::Easy),
        })
        .await
        .unwrap();
    let board = Board::from_fen("k7/8/1K6/8/8/8/8/7R w - - 0 1").unwrap();
    state.insert_session(Session::single_player(
        record.id,
        board,
        Seat::occupied(&"alice".to_string(), a),
        Difficulty::Easy,
        record.created_at,
    ));

    moves::handle_move(&state, a, mv("h1", "h8")).await;

    assert!(matches!(next(&mut rx_a), ServerMessage::Move { .. }));
    assert_eq!(
        next(&mut rx_a),
        ServerMessage::GameOver {
            winner: Some(Color::White),
            reason: EndReason::Checkmate,
        }
    );
    assert!(state.sessions.is_empty());

    // Long enough for a wrongly scheduled reply to have landed.
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert!(rx_a.try_recv().is_err());
}

#[tokio::test]
async fn a_pending_engine_reply_is_dropped_with_its_game() {
    let state = test_state();
    let (a, mut rx_a) = connect(&state, "alice");

    matchmaking::handle_single_player(&state, a, Some("easy".to_string())).await;
    drain(&mut rx_a);
    let game_id = state
        .store
        .find_active(&"alice".to_string())
        .await
        .unwrap()
        .unwrap()
        .id;

    moves::handle_move(&state, a, mv("e2", "e4")).await;
    assert!(matches!(next(&mut rx_a), ServerMessage::Move { .. }));

    // Leave before the reply timer fires.
    cleanup::handle_end_game(&state, a).await;
    assert!(state.sessions.is_empty());
    assert!(state.store.moves(game_id).await.is_err());

    tokio::time::sleep(Duration::from_millis(700)).await;
    assert!(rx_a.try_recv().is_err());
}
