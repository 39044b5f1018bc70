use crate::api::handlers::report;
use crate::api::models::ServerMessage;
use crate::api::state::AppState;
use crate::application::session::{Session, SessionKind};
use crate::domain::models::{Color, ConnId, GameId, GameOutcome, MovePayload};
use crate::error::GameError;
use crate::infrastructure::ai;
use crate::infrastructure::store::{GameStatus, MoveRecord};
use std::sync::Arc;
use tokio::sync::RwLockWriteGuard;

/// Validates, persists, applies and broadcasts one submitted move, then
/// either closes the game or hands the turn over. Single-player games get
/// a delayed engine reply scheduled after the human's move lands.
pub async fn handle_move(state: &Arc<AppState>, conn: ConnId, mv: MovePayload) {
    let Some(session_ref) = state.find_session_by_conn(conn).await else {
        report(state, conn, GameError::NoActiveGame);
        return;
    };

    // The attempt is stamped whether or not the move goes through.
    if !state.move_gate.check(conn) {
        report(state, conn, GameError::MoveRateLimited);
        return;
    }

    let mut session = session_ref.write().await;
    if let Err(err) = check_seat_and_turn(&session, conn, &mv) {
        drop(session);
        report(state, conn, err);
        return;
    }

    match commit_move(state, &mut session, &mv).await {
        Err(err) => {
            drop(session);
            report(state, conn, err);
        }
        Ok(Some(outcome)) => finish_game(state, session, outcome).await,
        Ok(None) => schedule_engine_reply(state, session),
    }
}

/// Multiplayer-only gate: the mover must hold a seat, both players must be
/// online, it must be their turn, and a promotion needs its tag. In
/// single-player games legality checking covers all of this.
fn check_seat_and_turn(session: &Session, conn: ConnId, mv: &MovePayload) -> Result<(), GameError> {
    if !session.is_multiplayer() {
        return Ok(());
    }
    let color = session.color_of_conn(conn).ok_or(GameError::NotInGame)?;
    if !session.fully_connected() {
        return Err(GameError::OpponentAway);
    }
    if session.board.turn() != color {
        return Err(GameError::NotYourTurn);
    }
    if session.board.requires_promotion(&mv.from, &mv.to) && mv.promotion_char().is_none() {
        return Err(GameError::PromotionRequired);
    }
    Ok(())
}

/// Validates a move, appends it to the durable log, applies it in memory
/// and echoes it to every participant. The append strictly precedes the
/// in-memory apply, so a stored move is never missing from a later replay.
pub(crate) async fn commit_move(
    state: &Arc<AppState>,
    session: &mut Session,
    mv: &MovePayload,
) -> Result<Option<GameOutcome>, GameError> {
    let applied = session.board.validate(mv).map_err(|err| {
        tracing::debug!(game_id = %session.game_id, %err, "move rejected");
        GameError::IllegalMove
    })?;

    let record = MoveRecord {
        ply: session.board.ply() + 1,
        from: mv.from.clone(),
        to: mv.to.clone(),
        promotion: mv.promotion.clone(),
        san: applied.san.clone(),
        fen: applied.fen.clone(),
    };
    state.store.append_move(session.game_id, record).await?;

    session.board.apply(mv).map_err(|err| {
        tracing::error!(game_id = %session.game_id, %err, "validated move failed to apply");
        GameError::Internal
    })?;

    let echo = ServerMessage::Move {
        from: mv.from.clone(),
        to: mv.to.clone(),
        promotion: mv.promotion.clone(),
    };
    for member in session.participant_conns() {
        state.send(member, echo.clone());
    }

    Ok(session.board.outcome())
}

/// Announces the verdict, completes the durable record and drops the
/// session. Finished games stay in the store for history.
pub(crate) async fn finish_game(
    state: &Arc<AppState>,
    session: RwLockWriteGuard<'_, Session>,
    outcome: GameOutcome,
) {
    let game_id = session.game_id;
    let members = session.participant_conns();
    drop(session);

    for member in members {
        state.send(
            member,
            ServerMessage::GameOver {
                winner: outcome.winner,
                reason: outcome.reason,
            },
        );
    }
    if let Err(err) = state.store.set_status(game_id, GameStatus::Completed).await {
        tracing::warn!(%game_id, %err, "failed to mark game completed");
    }
    state.cancel_eviction(game_id);
    state.remove_session(game_id);
    tracing::info!(%game_id, reason = ?outcome.reason, "game finished");
}

fn schedule_engine_reply(state: &Arc<AppState>, session: RwLockWriteGuard<'_, Session>) {
    let SessionKind::SinglePlayer { difficulty, .. } = &session.kind else {
        return;
    };
    let delay = ai::reply_delay(*difficulty);
    let game_id = session.game_id;
    drop(session);

    let state = Arc::clone(state);
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        engine_reply(&state, game_id).await;
    });
}

/// Runs the engine's turn. The session may have ended or been replaced
/// while the reply timer ran, so everything is re-checked under the lock.
pub(crate) async fn engine_reply(state: &Arc<AppState>, game_id: GameId) {
    let Some(session_ref) = state.session_ref(game_id) else {
        tracing::debug!(%game_id, "engine reply skipped, session gone");
        return;
    };
    let mut session = session_ref.write().await;

    let inner = &mut *session;
    let chosen = match &mut inner.kind {
        SessionKind::SinglePlayer { engine, .. } => {
            if inner.board.turn() != Color::Black {
                return;
            }
            engine.choose_move(&inner.board, Color::Black)
        }
        SessionKind::Multiplayer { .. } => return,
    };

    match chosen {
        Some(mv) => match commit_move(state, inner, &mv).await {
            Ok(Some(outcome)) => finish_game(state, session, outcome).await,
            Ok(None) => {}
            Err(err) => {
                tracing::error!(%game_id, %err, "engine move failed");
                if let Some(outcome) = session.board.outcome() {
                    finish_game(state, session, outcome).await;
                }
            }
        },
        // No move means no legal move: let the terminal check settle it.
        None => {
            if let Some(outcome) = session.board.outcome() {
                finish_game(state, session, outcome).await;
            } else {
                tracing::error!(%game_id, "engine returned no move in a live position");
            }
        }
    }
}
