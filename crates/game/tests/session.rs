use std::time::{Duration, Instant};

use gambit::view::{self, captured_pieces, status_line};
use gambit::{
    ClientMessage, ConnectionStatus, EndReason, GameAssignment, GameResult, Gesture,
    MemoryTransport, MoveSpec, PieceKind, RequestKind, ServerMessage, Session, SessionConfig,
    SessionError, SessionEvent, SessionPhase, Side, Square, SyncState, ValidationError, Winner,
};

fn sq(name: &str) -> Square {
    name.parse().unwrap()
}

fn mv(from: &str, to: &str) -> MoveSpec {
    MoveSpec::new(sq(from), sq(to))
}

fn sent(session: &mut Session<MemoryTransport>) -> Vec<ClientMessage> {
    session.transport_mut().take_decoded().unwrap()
}

fn connected() -> Session<MemoryTransport> {
    let mut session = Session::new(MemoryTransport::new(), SessionConfig::default());
    session.on_open();
    session
}

fn registered() -> Session<MemoryTransport> {
    let mut session = connected();
    session.submit_username("alice").unwrap();
    session.request_game(300).unwrap();
    sent(&mut session);
    session.drain_events();
    session
}

fn in_game(color: Side) -> Session<MemoryTransport> {
    let mut session = registered();
    session
        .handle_message(ServerMessage::InitGame(GameAssignment {
            color,
            white_player: "A".to_string(),
            black_player: "B".to_string(),
            time_control: None,
            game_id: Some("g-1".to_string()),
        }))
        .unwrap();
    session.drain_events();
    session
}

fn server_move(session: &mut Session<MemoryTransport>, from: &str, to: &str) {
    session.handle_message(ServerMessage::Move(mv(from, to))).unwrap();
}

#[test]
fn test_username_rules_leave_state_unchanged() {
    let mut session = connected();

    assert_eq!(
        session.submit_username(" a "),
        Err(ValidationError::UsernameTooShort)
    );
    assert_eq!(
        session.submit_username("no spaces"),
        Err(ValidationError::UsernameCharset)
    );
    assert_eq!(
        session.submit_username("mybadword"),
        Err(ValidationError::UsernameDenied)
    );
    assert_eq!(session.phase(), SessionPhase::Unregistered);
    assert_eq!(session.username(), None);
    assert!(sent(&mut session).is_empty());

    assert_eq!(
        session.request_game(300),
        Err(ValidationError::NotRegistered)
    );

    session.submit_username("  alice_1 ").unwrap();
    assert_eq!(session.username(), Some("alice_1"));
    assert_eq!(
        sent(&mut session),
        vec![ClientMessage::SetUsername {
            username: "alice_1".to_string()
        }]
    );
}

#[test]
fn test_actions_need_connection() {
    let mut session = Session::new(MemoryTransport::new(), SessionConfig::default());
    assert_eq!(session.status(), ConnectionStatus::Connecting);
    assert_eq!(
        session.submit_username("alice"),
        Err(ValidationError::NotConnected)
    );
    assert_eq!(status_line(&session, Instant::now()), "Connecting to server...");
}

#[test]
fn test_request_game_sends_time_control_then_init() {
    let mut session = connected();
    session.submit_username("alice").unwrap();
    sent(&mut session);

    assert_eq!(
        session.request_game(0),
        Err(ValidationError::InvalidTimeControl)
    );
    session.request_game(180).unwrap();

    assert_eq!(
        sent(&mut session),
        vec![
            ClientMessage::TimeControl { seconds: 180 },
            ClientMessage::InitGame
        ]
    );
    assert_eq!(session.phase(), SessionPhase::Searching);
    assert_eq!(
        session.request_game(180),
        Err(ValidationError::GameInProgress)
    );

    session.handle_text(r#"{"type":"waiting"}"#).unwrap();
    assert_eq!(
        status_line(&session, Instant::now()),
        "Waiting for opponent..."
    );
}

#[test]
fn test_fresh_game() {
    let mut session = registered();
    session
        .handle_text(
            r#"{"type":"init_game","payload":{"color":"white","whitePlayer":"A","blackPlayer":"B"}}"#,
        )
        .unwrap();

    let game = session.game().unwrap();
    assert_eq!(game.color(), Side::White);
    assert_eq!(game.side_to_move(), Side::White);
    assert_eq!(game.opponent(), "B");
    assert_eq!(game.time_control(), Some(300));
    assert!(captured_pieces(game.position()).is_empty());
    assert_eq!(status_line(&session, Instant::now()), "A's turn");

    assert_eq!(
        session.drain_events(),
        vec![SessionEvent::GameStarted {
            color: Side::White,
            opponent: "B".to_string()
        }]
    );
}

#[test]
fn test_scripted_move() {
    let mut session = in_game(Side::Black);
    server_move(&mut session, "e2", "e4");

    let game = session.game().unwrap();
    let pawn = game.position().piece_at(sq("e4")).unwrap();
    assert_eq!((pawn.kind, pawn.side), (PieceKind::Pawn, Side::White));
    assert_eq!(game.side_to_move(), Side::Black);
    assert_eq!(view::last_move(game.records()), Some((sq("e2"), sq("e4"))));
    assert_eq!(game.records()[0].san, "e4");
    assert_eq!(status_line(&session, Instant::now()), "B's turn");

    assert!(matches!(
        session.drain_events().as_slice(),
        [SessionEvent::MoveApplied { capture: false, check: false, .. }]
    ));
}

#[test]
fn test_click_gesture_requests_without_applying() {
    let mut session = in_game(Side::White);

    assert_eq!(session.click_square(sq("e2")), Gesture::Selected(sq("e2")));
    assert_eq!(
        session.click_square(sq("e4")),
        Gesture::Completed(mv("e2", "e4"))
    );
    assert_eq!(sent(&mut session), vec![ClientMessage::Move(mv("e2", "e4"))]);

    let game = session.game().unwrap();
    assert!(game.position().piece_at(sq("e4")).is_none());
    assert!(game.position().piece_at(sq("e2")).is_some());
    assert_eq!(game.ply(), 0);
}

#[test]
fn test_duplicate_move_is_deduplicated() {
    let mut session = in_game(Side::White);

    assert!(session.attempt_move(mv("e2", "e4")));
    assert!(!session.attempt_move(mv("e2", "e4")));
    assert_eq!(sent(&mut session).len(), 1);
    assert!(session.is_outstanding(RequestKind::Move));

    server_move(&mut session, "e2", "e4");
    assert!(!session.is_outstanding(RequestKind::Move));
}

#[test]
fn test_move_requires_turn_and_legality() {
    let mut black = in_game(Side::Black);
    assert!(!black.attempt_move(mv("e7", "e5")));
    assert_eq!(black.click_square(sq("e7")), Gesture::Ignored);

    let mut white = in_game(Side::White);
    assert!(!white.attempt_move(mv("e2", "e5")));
    assert!(sent(&mut white).is_empty());
}

#[test]
fn test_game_over_blocks_moves() {
    let mut session = in_game(Side::White);
    session
        .handle_text(r#"{"type":"game_over","payload":{"winner":"white","reason":"checkmate"}}"#)
        .unwrap();

    let game = session.game().unwrap();
    assert!(game.is_over());
    assert_eq!(
        game.result(),
        Some(&GameResult {
            winner: Winner::White,
            reason: EndReason::Checkmate
        })
    );

    assert!(!session.attempt_move(mv("e2", "e4")));
    assert_eq!(session.click_square(sq("e2")), Gesture::Ignored);
    assert!(!session.resign());
    assert!(!session.offer_draw());
    assert!(sent(&mut session).is_empty());
    assert_eq!(
        status_line(&session, Instant::now()),
        "Checkmate! White wins!"
    );

    // a finished game does not block the next one
    session.request_game(60).unwrap();
    assert_eq!(session.phase(), SessionPhase::Searching);
}

#[test]
fn test_draw_lifecycle() {
    let mut session = in_game(Side::White);

    assert!(session.offer_draw());
    assert!(!session.offer_draw());
    assert_eq!(sent(&mut session), vec![ClientMessage::DrawOffer]);
    assert!(session.game().unwrap().draw_offer().sent);
    assert_eq!(
        status_line(&session, Instant::now()),
        "Draw offer sent. Waiting for response..."
    );

    session
        .handle_text(r#"{"type":"draw_response","payload":{"accepted":false}}"#)
        .unwrap();

    let game = session.game().unwrap();
    assert!(!game.draw_offer().sent);
    assert!(game.result().is_none());
    assert!(!session.is_outstanding(RequestKind::DrawOffer));
    assert_eq!(
        status_line(&session, Instant::now()),
        "Draw offer declined. Continue playing!"
    );

    let later = Instant::now() + Duration::from_secs(4);
    session.tick(later);
    assert_eq!(status_line(&session, later), "A's turn");
}

#[test]
fn test_responding_to_draw_offer() {
    let mut session = in_game(Side::Black);
    assert!(!session.respond_to_draw(true));

    session.handle_text(r#"{"type":"draw_offer"}"#).unwrap();
    assert!(session.game().unwrap().draw_offer().pending);
    assert_eq!(
        status_line(&session, Instant::now()),
        "Your opponent offers a draw!"
    );

    assert!(session.respond_to_draw(false));
    assert!(!session.respond_to_draw(false));
    assert_eq!(
        sent(&mut session),
        vec![ClientMessage::DrawResponse { accepted: false }]
    );
    assert!(!session.game().unwrap().draw_offer().pending);
}

#[test]
fn test_promotion_flow_suppresses_clicks() {
    let mut session = in_game(Side::White);
    for (from, to) in [
        ("h2", "h4"),
        ("g7", "g5"),
        ("h4", "g5"),
        ("h7", "h6"),
        ("g5", "h6"),
        ("b8", "c6"),
        ("h6", "h7"),
        ("c6", "b4"),
    ] {
        server_move(&mut session, from, to);
    }

    session.click_square(sq("h7"));
    assert_eq!(
        session.click_square(sq("g8")),
        Gesture::PromotionRequired {
            from: sq("h7"),
            to: sq("g8")
        }
    );
    assert_eq!(session.click_square(sq("a2")), Gesture::Ignored);
    assert_eq!(session.click_square(sq("g8")), Gesture::Ignored);
    assert!(sent(&mut session).is_empty());

    assert_eq!(session.cancel_selection(), Gesture::Deselected);
    session.click_square(sq("h7"));
    session.click_square(sq("g8"));

    let expected = mv("h7", "g8").with_promotion(PieceKind::Queen);
    assert_eq!(
        session.choose_promotion(PieceKind::Queen),
        Gesture::Completed(expected)
    );
    assert_eq!(sent(&mut session), vec![ClientMessage::Move(expected)]);

    session.handle_message(ServerMessage::Move(expected)).unwrap();
    let record = session.game().unwrap().last_move().unwrap();
    assert_eq!(record.san, "hxg8=Q");
    assert_eq!(record.captured, Some(PieceKind::Knight));
}

#[test]
fn test_out_of_sync_move_triggers_resync() {
    let mut session = in_game(Side::White);
    server_move(&mut session, "e2", "e4");
    session.drain_events();

    let err = session
        .handle_message(ServerMessage::Move(mv("e2", "e4")))
        .unwrap_err();
    assert!(matches!(err, SessionError::Reconciliation(_)));

    let game = session.game().unwrap();
    assert!(game.is_stale());
    assert_eq!(game.ply(), 1);
    assert_eq!(
        sent(&mut session),
        vec![ClientMessage::SyncRequest {
            game_id: Some("g-1".to_string())
        }]
    );
    assert_eq!(session.drain_events(), vec![SessionEvent::Desynchronized]);

    // further moves wait for the full list
    server_move(&mut session, "e7", "e5");
    assert_eq!(session.game().unwrap().ply(), 1);

    session
        .handle_message(ServerMessage::Sync(SyncState {
            game_id: Some("g-1".to_string()),
            moves: vec![mv("e2", "e4"), mv("e7", "e5"), mv("g1", "f3")],
            white_time: Some(280.0),
            black_time: Some(290.0),
        }))
        .unwrap();

    let game = session.game().unwrap();
    assert!(!game.is_stale());
    assert_eq!(game.ply(), 3);
    assert_eq!(game.side_to_move(), Side::Black);
    assert_eq!(game.clock().remaining(Side::White), 280.0);
    assert!(!session.is_outstanding(RequestKind::Resync));
    assert_eq!(
        session.drain_events(),
        vec![SessionEvent::Resynchronized { ply: 3 }]
    );
}

#[test]
fn test_request_timeout_restores_pre_request_state() {
    let mut session = in_game(Side::White);
    assert!(session.offer_draw());
    sent(&mut session);

    session.tick(Instant::now() + Duration::from_secs(5));
    assert!(session.is_outstanding(RequestKind::DrawOffer));

    session.tick(Instant::now() + Duration::from_secs(11));
    assert!(!session.is_outstanding(RequestKind::DrawOffer));
    assert!(!session.game().unwrap().draw_offer().sent);
    assert!(
        session
            .drain_events()
            .contains(&SessionEvent::RequestExpired("draw offer"))
    );

    assert!(session.offer_draw());
}

#[test]
fn test_server_error_is_transient() {
    let mut session = in_game(Side::White);
    assert!(session.attempt_move(mv("e2", "e4")));

    session
        .handle_text(r#"{"type":"error","payload":{"message":"Invalid move"}}"#)
        .unwrap();
    assert!(!session.is_outstanding(RequestKind::Move));
    assert_eq!(status_line(&session, Instant::now()), "Invalid move");

    let later = Instant::now() + Duration::from_millis(2100);
    session.tick(later);
    assert_eq!(status_line(&session, later), "A's turn");
}

#[test]
fn test_opponent_disconnect_is_a_win() {
    let mut session = in_game(Side::Black);
    session
        .handle_text(r#"{"type":"opponent_disconnected"}"#)
        .unwrap();

    let result = session.game().unwrap().result().cloned().unwrap();
    assert_eq!(result.winner, Winner::Black);
    assert_eq!(result.reason, EndReason::Forfeit);
    assert_eq!(view::outcome(&result, Side::Black).headline, "Victory");
    assert_eq!(
        status_line(&session, Instant::now()),
        "Opponent disconnected. You win!"
    );
}

#[test]
fn test_time_update_projects_clock() {
    let mut session = in_game(Side::White);
    session
        .handle_text(r#"{"type":"time_update","payload":{"whiteTime":295,"blackTime":300}}"#)
        .unwrap();

    let clock = session.game().unwrap().clock();
    assert_eq!(view::format_clock(clock.remaining(Side::White)), "4:55");
    assert_eq!(view::format_clock(clock.remaining(Side::Black)), "5:00");
}

#[test]
fn test_malformed_messages_are_dropped() {
    let mut session = in_game(Side::White);

    assert!(matches!(
        session.handle_text("{not json"),
        Err(SessionError::Protocol(_))
    ));
    assert!(matches!(
        session.handle_text(r#"{"type":"summon_dragon"}"#),
        Err(SessionError::Protocol(_))
    ));
    assert!(matches!(
        session.handle_text(r#"{"type":"move","payload":{"move":{"from":"e2"}}}"#),
        Err(SessionError::Protocol(_))
    ));

    let game = session.game().unwrap();
    assert_eq!(game.ply(), 0);
    assert!(!game.is_stale());
}

#[test]
fn test_reconnect_resumes_game() {
    let mut session = in_game(Side::White);
    server_move(&mut session, "e2", "e4");

    session.on_close();
    assert_eq!(session.status(), ConnectionStatus::Disconnected);
    assert!(!session.offer_draw());
    assert_eq!(
        status_line(&session, Instant::now()),
        "Disconnected from server"
    );

    let old = session.reattach(MemoryTransport::new());
    assert_eq!(old.sent().count(), 0);
    session.on_open();

    assert_eq!(
        sent(&mut session),
        vec![
            ClientMessage::SetUsername {
                username: "alice".to_string()
            },
            ClientMessage::Resume {
                game_id: "g-1".to_string(),
                ply: 1
            },
        ]
    );
    assert!(session.is_outstanding(RequestKind::Resync));
}

#[test]
fn test_resign_is_deduplicated() {
    let mut session = in_game(Side::White);

    assert!(session.resign());
    assert!(!session.resign());
    assert_eq!(sent(&mut session), vec![ClientMessage::Resign]);
    assert!(session.is_outstanding(RequestKind::Resign));

    session
        .handle_text(r#"{"type":"game_over","payload":{"winner":"black","reason":"resignation"}}"#)
        .unwrap();
    assert!(!session.is_outstanding(RequestKind::Resign));
}

#[test]
fn test_accepted_draw_stays_outstanding_until_game_over() {
    let mut session = in_game(Side::Black);
    session.handle_text(r#"{"type":"draw_offer"}"#).unwrap();

    assert!(session.respond_to_draw(true));
    assert!(!session.respond_to_draw(true));

    // a repeated offer cannot be answered twice
    session.handle_text(r#"{"type":"draw_offer"}"#).unwrap();
    assert!(!session.respond_to_draw(true));

    assert_eq!(
        sent(&mut session),
        vec![ClientMessage::DrawResponse { accepted: true }]
    );
    assert!(session.is_outstanding(RequestKind::DrawResponse));

    session
        .handle_text(r#"{"type":"game_over","payload":{"winner":"draw","reason":"agreement"}}"#)
        .unwrap();
    assert!(!session.is_outstanding(RequestKind::DrawResponse));
    assert!(session.game().unwrap().is_over());
}

#[test]
fn test_repeated_game_over_keeps_first_result() {
    let mut session = in_game(Side::White);
    session
        .handle_text(r#"{"type":"game_over","payload":{"winner":"white","reason":"checkmate"}}"#)
        .unwrap();
    session
        .handle_text(r#"{"type":"game_over","payload":{"winner":"black","reason":"timeout"}}"#)
        .unwrap();

    assert_eq!(
        session.game().unwrap().result(),
        Some(&GameResult {
            winner: Winner::White,
            reason: EndReason::Checkmate
        })
    );
    let game_overs = session
        .drain_events()
        .into_iter()
        .filter(|e| matches!(e, SessionEvent::GameOver(_)))
        .count();
    assert_eq!(game_overs, 1);
}

#[test]
fn test_waiting_during_live_game_is_ignored() {
    let mut session = in_game(Side::White);
    session.handle_text(r#"{"type":"waiting"}"#).unwrap();
    assert_eq!(session.phase(), SessionPhase::InGame);
    assert!(session.game().is_some());

    session
        .handle_text(r#"{"type":"game_over","payload":{"winner":"black","reason":"timeout"}}"#)
        .unwrap();
    session.handle_text(r#"{"type":"waiting"}"#).unwrap();
    assert_eq!(session.phase(), SessionPhase::Searching);
}
