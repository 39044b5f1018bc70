use crate::domain::models::{Color, EndReason, UserId};
use crate::infrastructure::identity::DisplayProfile;
use crate::infrastructure::store::MoveRecord;
use serde::{Deserialize, Serialize};

/// Messages the client may send. Unknown or malformed frames are ignored
/// at the socket layer, not answered.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Auth { user_id: UserId },
    InitGame,
    SinglePlayer { difficulty: Option<String> },
    CreateRoom,
    JoinRoom { room_id: String },
    Move {
        from: String,
        to: String,
        promotion: Option<String>,
    },
    CancelMatchmaking,
    EndGame,
}

/// Messages the server pushes. Session events go to every connected member
/// of the session; everything else answers a single connection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    InitGame {
        color: Color,
        opponent: Option<OpponentProfile>,
    },
    WaitingForOpponent,
    Move {
        from: String,
        to: String,
        promotion: Option<String>,
    },
    GameOver {
        winner: Option<Color>,
        reason: EndReason,
    },
    RoomCreated { room_id: String },
    RoomJoined {
        color: Color,
        opponent: Option<OpponentProfile>,
    },
    RoomNotFound,
    MatchmakingCancelled,
    ResumeGame {
        color: Color,
        fen: String,
        moves: Vec<HistoryEntry>,
        opponent_connected: bool,
        waiting_for_opponent: bool,
        opponent: Option<OpponentProfile>,
    },
    NoGameToResume,
    OpponentLeft,
    OpponentDisconnected,
    OpponentReconnected,
    GameEndedDisconnect,
    Error { message: String },
}

/// What one player gets to see about the other.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OpponentProfile {
    pub name: String,
    pub contact: Option<String>,
    pub user_id: UserId,
}

impl OpponentProfile {
    pub fn from_profile(user: &UserId, profile: &DisplayProfile) -> Self {
        OpponentProfile {
            name: profile.display_name(),
            contact: profile.contact.clone(),
            user_id: user.clone(),
        }
    }
}

/// One move of a resumed game's history, oldest first.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub from: String,
    pub to: String,
    pub san: String,
    pub fen: String,
}

impl From<&MoveRecord> for HistoryEntry {
    fn from(record: &MoveRecord) -> Self {
        HistoryEntry {
            from: record.from.clone(),
            to: record.to.clone(),
            san: record.san.clone(),
            fen: record.fen.clone(),
        }
    }
}
