use crate::infrastructure::store::StoreError;
use thiserror::Error;

/// Everything that can go wrong while serving a client request. The
/// `Display` text of each variant is the message sent back over the wire,
/// so keep it suitable for an end user.
#[derive(Debug, Error)]
pub enum GameError {
    #[error("Authentication required")]
    AuthenticationRequired,
    #[error("Move too fast. Please wait a moment.")]
    MoveRateLimited,
    #[error("Please wait before creating another room")]
    RoomRateLimited,
    #[error("Illegal move")]
    IllegalMove,
    #[error("Not your turn")]
    NotYourTurn,
    #[error("You are not a player in this game")]
    NotInGame,
    #[error("Waiting for opponent to reconnect.")]
    OpponentAway,
    #[error("Pawn promotion required! Please select Queen, Rook, Bishop, or Knight.")]
    PromotionRequired,
    #[error("Room not found")]
    RoomNotFound,
    #[error("Room is full")]
    RoomFull,
    #[error("No active game found")]
    NoActiveGame,
    #[error("Failed to resume game. Please try again.")]
    Reconstruction,
    #[error("persistence failure: {0}")]
    Persistence(#[from] StoreError),
    #[error("Internal server error")]
    Internal,
}

impl GameError {
    /// Message appropriate for the client. Store internals stay in the logs.
    pub fn client_message(&self) -> String {
        match self {
            GameError::Persistence(_) => GameError::Internal.to_string(),
            other => other.to_string(),
        }
    }
}
