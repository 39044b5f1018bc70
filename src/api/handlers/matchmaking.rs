use crate::api::handlers::report;
use crate::api::models::{OpponentProfile, ServerMessage};
use crate::api::state::AppState;
use crate::application::session::{Room, Seat, Session};
use crate::domain::models::{Color, ConnId, Difficulty, GameId};
use crate::domain::position::Board;
use crate::error::GameError;
use crate::infrastructure::store::{GameKind, NewGame};
use rand::Rng;
use std::sync::Arc;

const ROOM_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const ROOM_CODE_LEN: usize = 6;

/// Quick match: the first caller parks in the pending slot, the second is
/// paired against them. A connection asking again just keeps its slot.
pub async fn handle_quick_match(state: &Arc<AppState>, conn: ConnId) {
    let opponent = {
        let mut slot = state.pending.lock().await;
        match slot.take() {
            Some(waiting) if waiting != conn && state.clients.contains_key(&waiting) => {
                Some(waiting)
            }
            _ => {
                *slot = Some(conn);
                None
            }
        }
    };

    match opponent {
        None => state.send(conn, ServerMessage::WaitingForOpponent),
        Some(white_conn) => {
            if let Err(err) = pair(state, white_conn, conn, PairVia::QuickMatch).await {
                tracing::warn!(%conn, error = %err, "quick match pairing failed");
                report(state, conn, err);
            }
        }
    }
}

/// Starts a game against the engine. The caller always takes white.
pub async fn handle_single_player(
    state: &Arc<AppState>,
    conn: ConnId,
    difficulty: Option<String>,
) {
    let Some(user) = state.user_of(conn) else {
        report(state, conn, GameError::Internal);
        return;
    };
    let difficulty = difficulty
        .as_deref()
        .and_then(Difficulty::parse)
        .unwrap_or(state.config.game.default_difficulty);

    let record = match state
        .store
        .create_game(NewGame {
            white: user.clone(),
            black: None,
            kind: GameKind::SinglePlayer,
            difficulty: Some(difficulty),
        })
        .await
    {
        Ok(record) => record,
        Err(err) => {
            report(state, conn, err.into());
            return;
        }
    };

    let session = Session::single_player(
        record.id,
        Board::new(),
        Seat::occupied(&user, conn),
        difficulty,
        record.created_at,
    );
    state.insert_session(session);
    tracing::info!(game_id = %record.id, %conn, difficulty = difficulty.as_str(), "single-player game started");

    state.send(
        conn,
        ServerMessage::InitGame {
            color: Color::White,
            opponent: None,
        },
    );
}

pub async fn handle_create_room(state: &Arc<AppState>, conn: ConnId) {
    if !state.room_gate.check(conn) {
        report(state, conn, GameError::RoomRateLimited);
        return;
    }

    let code = loop {
        let candidate = generate_room_code();
        if !state.rooms.contains_key(&candidate) {
            break candidate;
        }
    };
    state.rooms.insert(code.clone(), Room::new(code.clone(), conn));
    tracing::info!(%conn, room = %code, "room created");

    state.send(conn, ServerMessage::RoomCreated { room_id: code });
    state.send(conn, ServerMessage::WaitingForOpponent);
}

pub async fn handle_join_room(state: &Arc<AppState>, conn: ConnId, room_id: String) {
    let creator = {
        let Some(mut room) = state.rooms.get_mut(&room_id) else {
            report(state, conn, GameError::RoomNotFound);
            return;
        };
        if room.is_full() {
            drop(room);
            report(state, conn, GameError::RoomFull);
            return;
        }
        room.joiner = Some(conn);
        room.creator
    };

    if !state.clients.contains_key(&creator) {
        // The creator is gone; the room died with them.
        state.rooms.remove(&room_id);
        report(state, conn, GameError::RoomNotFound);
        return;
    }

    match pair(state, creator, conn, PairVia::Room).await {
        Ok(game_id) => {
            if let Some(mut room) = state.rooms.get_mut(&room_id) {
                room.game_id = Some(game_id);
            }
        }
        Err(err) => {
            if let Some(mut room) = state.rooms.get_mut(&room_id) {
                room.joiner = None;
            }
            tracing::warn!(%conn, room = %room_id, error = %err, "room pairing failed");
            report(state, conn, err);
        }
    }
}

/// Gives up a held quick-match slot. Only the holder can cancel.
pub async fn handle_cancel_matchmaking(state: &Arc<AppState>, conn: ConnId) {
    let mut slot = state.pending.lock().await;
    if *slot == Some(conn) {
        *slot = None;
        drop(slot);
        state.send(conn, ServerMessage::MatchmakingCancelled);
    }
}

#[derive(Clone, Copy)]
enum PairVia {
    QuickMatch,
    Room,
}

/// Creates the durable game, registers the session and tells both players.
/// The earlier-arriving connection takes white.
async fn pair(
    state: &Arc<AppState>,
    white_conn: ConnId,
    black_conn: ConnId,
    via: PairVia,
) -> Result<GameId, GameError> {
    let white_user = state.user_of(white_conn).ok_or(GameError::Internal)?;
    let black_user = state.user_of(black_conn).ok_or(GameError::Internal)?;

    let record = state
        .store
        .create_game(NewGame {
            white: white_user.clone(),
            black: Some(black_user.clone()),
            kind: GameKind::Multiplayer,
            difficulty: None,
        })
        .await?;

    let session = Session::multiplayer(
        record.id,
        Board::new(),
        Seat::occupied(&white_user, white_conn),
        Seat::occupied(&black_user, black_conn),
        record.created_at,
    );
    state.insert_session(session);
    tracing::info!(game_id = %record.id, %white_conn, %black_conn, "multiplayer game started");

    let (white_profile, black_profile) = tokio::join!(
        state.identity.profile(&white_user),
        state.identity.profile(&black_user)
    );
    let white_sees = black_profile
        .as_ref()
        .map(|p| OpponentProfile::from_profile(&black_user, p));
    let black_sees = white_profile
        .as_ref()
        .map(|p| OpponentProfile::from_profile(&white_user, p));

    let announce = |color: Color, opponent: Option<OpponentProfile>| match via {
        PairVia::QuickMatch => ServerMessage::InitGame { color, opponent },
        PairVia::Room => ServerMessage::RoomJoined { color, opponent },
    };
    state.send(white_conn, announce(Color::White, white_sees));
    state.send(black_conn, announce(Color::Black, black_sees));

    Ok(record.id)
}

fn generate_room_code() -> String {
    let mut rng = rand::thread_rng();
    (0..ROOM_CODE_LEN)
        .map(|_| ROOM_CODE_ALPHABET[rng.gen_range(0..ROOM_CODE_ALPHABET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn room_codes_are_six_uppercase_alphanumerics() {
        for _ in 0..100 {
            let code = generate_room_code();
            assert_eq!(code.len(), ROOM_CODE_LEN);
            assert!(code
                .bytes()
                .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit()));
        }
    }
}
