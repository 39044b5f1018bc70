use crate::api::models::ServerMessage;
use crate::api::state::AppState;
use crate::domain::models::{ConnId, GameId};
use std::sync::Arc;
use std::time::Duration;

/// Tears down everything a closed connection owned: registry entry,
/// matchmaking slot, rate-limit stamps and its seat in a live session.
/// A vacated session is not dropped immediately; an eviction timer gives
/// the player the grace window to come back.
pub async fn handle_disconnect(state: &Arc<AppState>, conn: ConnId) {
    state.remove_client(conn);

    {
        let mut pending = state.pending.lock().await;
        if *pending == Some(conn) {
            *pending = None;
            tracing::debug!(%conn, "matchmaking slot cleared on disconnect");
        }
    }
    state.move_gate.forget(conn);
    state.room_gate.forget(conn);

    let Some(session_ref) = state.find_session_by_conn(conn).await else {
        return;
    };

    let mut session = session_ref.write().await;
    let game_id = session.game_id;
    let opponent = session.opponent_conn(conn);
    session.detach_conn(conn);
    drop(session);

    if let Some(other) = opponent {
        state.send(other, ServerMessage::OpponentDisconnected);
    }
    arm_eviction(state, game_id);
}

/// Starts (or restarts) the grace timer for a game someone just left.
/// When it fires the game is evicted; a resume cancels it first.
pub fn arm_eviction(state: &Arc<AppState>, game_id: GameId) {
    let grace = Duration::from_secs(state.config.session.disconnect_grace_secs);
    let task_state = Arc::clone(state);
    let handle = tokio::spawn(async move {
        tokio::time::sleep(grace).await;
        evict(&task_state, game_id).await;
    });
    if let Some(old) = state.evictions.insert(game_id, handle) {
        old.abort();
        tracing::debug!(%game_id, "eviction timer rearmed");
    } else {
        tracing::debug!(%game_id, grace_secs = grace.as_secs(), "eviction timer armed");
    }
}

/// The grace window elapsed without a resume: tell whoever is still
/// around, drop the session and erase the stored game.
async fn evict(state: &Arc<AppState>, game_id: GameId) {
    state.evictions.remove(&game_id);

    if let Some(session_ref) = state.session_ref(game_id) {
        let session = session_ref.read().await;
        for member in session.participant_conns() {
            state.send(member, ServerMessage::GameEndedDisconnect);
        }
    }
    state.remove_session(game_id);
    if let Err(err) = state.store.delete_game(game_id).await {
        tracing::warn!(%game_id, %err, "failed to delete evicted game");
    }
    tracing::info!(%game_id, "game evicted after grace period");
}

/// A player chose to leave. Unlike a dropped socket this is final: no
/// grace period, the game is deleted and the opponent told immediately.
pub async fn handle_end_game(state: &Arc<AppState>, conn: ConnId) {
    let Some(session_ref) = state.find_session_by_conn(conn).await else {
        tracing::debug!(%conn, "end_game with no session");
        return;
    };

    let session = session_ref.read().await;
    let game_id = session.game_id;
    let opponent = session.opponent_conn(conn);
    drop(session);

    state.remove_session(game_id);
    state.cancel_eviction(game_id);
    if let Err(err) = state.store.delete_game(game_id).await {
        tracing::error!(%game_id, %err, "failed to delete ended game");
    }

    if let Some(other) = opponent {
        state.send(other, ServerMessage::OpponentLeft);
    }
    tracing::info!(%game_id, %conn, "game ended by player");
}
