use crate::api::handlers::{cleanup, matchmaking, moves, resume};
use crate::api::models::{ClientMessage, ServerMessage};
use crate::api::state::SharedState;
use crate::domain::models::MovePayload;
use crate::error::GameError;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use uuid::Uuid;

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<SharedState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Drives one WebSocket for its whole life: a writer task drains the
/// outbound channel while this task reads frames. The first message must
/// be `auth`; everything before that is rejected. Whatever happens, the
/// connection is cleaned up when the read loop ends.
async fn handle_socket(socket: WebSocket, state: SharedState) {
    let conn = Uuid::new_v4();
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();

    let writer = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let text = match serde_json::to_string(&msg) {
                Ok(text) => text,
                Err(err) => {
                    tracing::error!(%err, "outbound message failed to serialize");
                    continue;
                }
            };
            if sink.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    let mut authenticated = false;
    while let Some(Ok(frame)) = stream.next().await {
        let text = match frame {
            Message::Text(text) => text,
            Message::Close(_) => break,
            _ => continue,
        };

        let message = match serde_json::from_str::<ClientMessage>(&text) {
            Ok(message) => message,
            Err(err) => {
                tracing::debug!(%conn, %err, "unparseable client message");
                continue;
            }
        };

        match message {
            ClientMessage::Auth { user_id } => {
                if authenticated || user_id.is_empty() {
                    continue;
                }
                state.register_client(conn, user_id.clone(), tx.clone());
                authenticated = true;
                tracing::info!(%conn, user = %user_id, "client authenticated");
                resume::resume_for(&state, conn, &user_id).await;
            }
            _ if !authenticated => {
                // Not registered yet, so reply over the raw channel.
                let _ = tx.send(ServerMessage::Error {
                    message: GameError::AuthenticationRequired.to_string(),
                });
            }
            ClientMessage::InitGame => matchmaking::handle_quick_match(&state, conn).await,
            ClientMessage::SinglePlayer { difficulty } => {
                matchmaking::handle_single_player(&state, conn, difficulty).await
            }
            ClientMessage::CreateRoom => matchmaking::handle_create_room(&state, conn).await,
            ClientMessage::JoinRoom { room_id } => {
                matchmaking::handle_join_room(&state, conn, room_id).await
            }
            ClientMessage::Move {
                from,
                to,
                promotion,
            } => {
                let payload = MovePayload {
                    from,
                    to,
                    promotion,
                };
                moves::handle_move(&state, conn, payload).await;
            }
            ClientMessage::CancelMatchmaking => {
                matchmaking::handle_cancel_matchmaking(&state, conn).await
            }
            ClientMessage::EndGame => cleanup::handle_end_game(&state, conn).await,
        }
    }

    cleanup::handle_disconnect(&state, conn).await;
    writer.abort();
    tracing::info!(%conn, "connection closed");
}
