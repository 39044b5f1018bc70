use crate::api::handlers::report;
use crate::api::models::{HistoryEntry, OpponentProfile, ServerMessage};
use crate::api::state::AppState;
use crate::application::session::{Seat, Session};
use crate::domain::models::{Color, ConnId, Difficulty, MovePayload, UserId};
use crate::domain::position::Board;
use crate::error::GameError;
use crate::infrastructure::store::{GameKind, GameRecord};
use std::sync::Arc;

/// Looks up the user's most recent active game and, if one exists,
/// rebuilds it from the move log and reattaches this connection. Runs on
/// every successful authentication.
pub async fn resume_for(state: &Arc<AppState>, conn: ConnId, user: &UserId) {
    let record = match state.store.find_active(user).await {
        Ok(Some(record)) => record,
        Ok(None) => {
            state.send(conn, ServerMessage::NoGameToResume);
            return;
        }
        Err(err) => {
            tracing::warn!(%user, %err, "active game lookup failed");
            state.send(
                conn,
                ServerMessage::Error {
                    message: "Failed to check for active games".to_string(),
                },
            );
            return;
        }
    };

    let game_id = record.id;
    if let Err(err) = resume_game(state, conn, user, record).await {
        tracing::warn!(%game_id, %user, %err, "resume failed");
        report(state, conn, err);
    }
}

async fn resume_game(
    state: &Arc<AppState>,
    conn: ConnId,
    user: &UserId,
    record: GameRecord,
) -> Result<(), GameError> {
    let records = state.store.moves(record.id).await.map_err(|err| {
        tracing::error!(game_id = %record.id, %err, "move log unreadable");
        GameError::Reconstruction
    })?;

    let payloads = records
        .iter()
        .map(|rec| MovePayload::new(&rec.from, &rec.to, rec.promotion.as_deref()));
    let board = Board::replay(payloads).map_err(|err| {
        tracing::error!(game_id = %record.id, %err, "move log failed to replay");
        GameError::Reconstruction
    })?;

    let my_color = if record.white == *user {
        Color::White
    } else {
        Color::Black
    };
    let opponent_user = match my_color {
        Color::White => record.black.clone(),
        Color::Black => Some(record.white.clone()),
    };
    let opponent_conn = opponent_user
        .as_ref()
        .and_then(|other| state.conn_of_user(other));
    let is_single = record.kind == GameKind::SinglePlayer;

    // Reattach to a live session if the opponent kept it alive, otherwise
    // rebuild one around the replayed board.
    let session_ref = match state.session_ref(record.id) {
        Some(existing) => {
            existing.write().await.attach(my_color, conn);
            existing
        }
        None => {
            let my_seat = Seat::occupied(user, conn);
            let session = if is_single {
                Session::single_player(
                    record.id,
                    board,
                    my_seat,
                    record.difficulty.unwrap_or(Difficulty::Medium),
                    record.created_at,
                )
            } else {
                let other_seat = match (&opponent_user, opponent_conn) {
                    (Some(other), Some(other_conn)) => Seat::occupied(other, other_conn),
                    (Some(other), None) => Seat::vacant(other),
                    (None, _) => Seat::vacant(&String::new()),
                };
                let (white, black) = match my_color {
                    Color::White => (my_seat, other_seat),
                    Color::Black => (other_seat, my_seat),
                };
                Session::multiplayer(record.id, board, white, black, record.created_at)
            };
            state.insert_session(session)
        }
    };

    state.cancel_eviction(record.id);

    if !is_single {
        if let Some(other_conn) = opponent_conn {
            state.send(other_conn, ServerMessage::OpponentReconnected);
        }
    }

    let opponent = match (&opponent_user, opponent_conn) {
        (Some(other), Some(_)) if !is_single => state
            .identity
            .profile(other)
            .await
            .map(|profile| OpponentProfile::from_profile(other, &profile)),
        _ => None,
    };

    let fen = session_ref.read().await.board.fen();
    state.send(
        conn,
        ServerMessage::ResumeGame {
            color: my_color,
            fen,
            moves: records.iter().map(HistoryEntry::from).collect(),
            opponent_connected: opponent_conn.is_some(),
            waiting_for_opponent: if is_single {
                false
            } else {
                opponent_conn.is_none()
            },
            opponent,
        },
    );
    tracing::info!(game_id = %record.id, %user, moves = records.len(), "game resumed");
    Ok(())
}
