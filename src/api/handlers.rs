pub mod cleanup;
pub mod matchmaking;
pub mod moves;
pub mod resume;

use crate::api::models::ServerMessage;
use crate::api::state::AppState;
use crate::domain::models::ConnId;
use crate::error::GameError;

/// Answers a failed request on its connection. Room-code misses get their
/// own message type; everything else becomes a generic error notice.
pub(crate) fn report(state: &AppState, conn: ConnId, err: GameError) {
    if let GameError::Persistence(ref cause) = err {
        tracing::warn!(%conn, %cause, "request failed on the store");
    }
    match err {
        GameError::RoomNotFound => state.send(conn, ServerMessage::RoomNotFound),
        other => state.send(
            conn,
            ServerMessage::Error {
                message: other.client_message(),
            },
        ),
    }
}
