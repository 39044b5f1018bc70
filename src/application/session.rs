use crate::domain::models::{Color, ConnId, Difficulty, GameId, UserId};
use crate::domain::position::Board;
use crate::infrastructure::ai::Engine;
use std::time::SystemTime;

/// One side of a game: who sits there and, if they are currently online,
/// through which connection.
#[derive(Clone, Debug)]
pub struct Seat {
    pub user: UserId,
    pub conn: Option<ConnId>,
}

impl Seat {
    pub fn occupied(user: &UserId, conn: ConnId) -> Self {
        Seat {
            user: user.clone(),
            conn: Some(conn),
        }
    }

    pub fn vacant(user: &UserId) -> Self {
        Seat {
            user: user.clone(),
            conn: None,
        }
    }
}

pub enum SessionKind {
    /// Human on the white seat, engine replying as black.
    SinglePlayer {
        seat: Seat,
        difficulty: Difficulty,
        engine: Engine,
    },
    Multiplayer { white: Seat, black: Seat },
}

/// Live state of one game: the board plus who is attached to it. Shared
/// behind a lock; all field access happens under that lock.
pub struct Session {
    pub game_id: GameId,
    pub board: Board,
    pub started_at: SystemTime,
    pub kind: SessionKind,
}

impl Session {
    pub fn single_player(
        game_id: GameId,
        board: Board,
        seat: Seat,
        difficulty: Difficulty,
        started_at: SystemTime,
    ) -> Self {
        Session {
            game_id,
            board,
            started_at,
            kind: SessionKind::SinglePlayer {
                seat,
                difficulty,
                engine: Engine::for_difficulty(difficulty),
            },
        }
    }

    pub fn multiplayer(
        game_id: GameId,
        board: Board,
        white: Seat,
        black: Seat,
        started_at: SystemTime,
    ) -> Self {
        Session {
            game_id,
            board,
            started_at,
            kind: SessionKind::Multiplayer { white, black },
        }
    }

    pub fn is_multiplayer(&self) -> bool {
        matches!(self.kind, SessionKind::Multiplayer { .. })
    }

    pub fn difficulty(&self) -> Option<Difficulty> {
        match &self.kind {
            SessionKind::SinglePlayer { difficulty, .. } => Some(*difficulty),
            SessionKind::Multiplayer { .. } => None,
        }
    }

    /// Whether this connection currently occupies a seat here.
    pub fn involves_conn(&self, conn: ConnId) -> bool {
        match &self.kind {
            SessionKind::SinglePlayer { seat, .. } => seat.conn == Some(conn),
            SessionKind::Multiplayer { white, black } => {
                white.conn == Some(conn) || black.conn == Some(conn)
            }
        }
    }

    pub fn color_of_conn(&self, conn: ConnId) -> Option<Color> {
        match &self.kind {
            SessionKind::SinglePlayer { seat, .. } => {
                (seat.conn == Some(conn)).then_some(Color::White)
            }
            SessionKind::Multiplayer { white, black } => {
                if white.conn == Some(conn) {
                    Some(Color::White)
                } else if black.conn == Some(conn) {
                    Some(Color::Black)
                } else {
                    None
                }
            }
        }
    }

    pub fn color_of_user(&self, user: &UserId) -> Option<Color> {
        match &self.kind {
            SessionKind::SinglePlayer { seat, .. } => (&seat.user == user).then_some(Color::White),
            SessionKind::Multiplayer { white, black } => {
                if &white.user == user {
                    Some(Color::White)
                } else if &black.user == user {
                    Some(Color::Black)
                } else {
                    None
                }
            }
        }
    }

    /// Both seats reachable right now. Single-player needs only the human.
    pub fn fully_connected(&self) -> bool {
        match &self.kind {
            SessionKind::SinglePlayer { seat, .. } => seat.conn.is_some(),
            SessionKind::Multiplayer { white, black } => {
                white.conn.is_some() && black.conn.is_some()
            }
        }
    }

    /// Connections to broadcast session events to.
    pub fn participant_conns(&self) -> Vec<ConnId> {
        match &self.kind {
            SessionKind::SinglePlayer { seat, .. } => seat.conn.into_iter().collect(),
            SessionKind::Multiplayer { white, black } => {
                white.conn.into_iter().chain(black.conn).collect()
            }
        }
    }

    /// The connection of the other seat, if online. Robust against the
    /// caller's own seat having been detached already.
    pub fn opponent_conn(&self, conn: ConnId) -> Option<ConnId> {
        match &self.kind {
            SessionKind::SinglePlayer { .. } => None,
            SessionKind::Multiplayer { white, black } => [white.conn, black.conn]
                .into_iter()
                .flatten()
                .find(|c| *c != conn),
        }
    }

    /// Puts a (re)connected player on their seat.
    pub fn attach(&mut self, color: Color, conn: ConnId) {
        match &mut self.kind {
            SessionKind::SinglePlayer { seat, .. } => seat.conn = Some(conn),
            SessionKind::Multiplayer { white, black } => match color {
                Color::White => white.conn = Some(conn),
                Color::Black => black.conn = Some(conn),
            },
        }
    }

    /// Clears whichever seat this connection holds. Returns the seat color
    /// when something was detached.
    pub fn detach_conn(&mut self, conn: ConnId) -> Option<Color> {
        match &mut self.kind {
            SessionKind::SinglePlayer { seat, .. } => {
                if seat.conn == Some(conn) {
                    seat.conn = None;
                    return Some(Color::White);
                }
                None
            }
            SessionKind::Multiplayer { white, black } => {
                if white.conn == Some(conn) {
                    white.conn = None;
                    return Some(Color::White);
                }
                if black.conn == Some(conn) {
                    black.conn = None;
                    return Some(Color::Black);
                }
                None
            }
        }
    }
}

/// A private rendezvous point: whoever created it plays white once exactly
/// one other connection joins with the code.
#[derive(Clone, Debug)]
pub struct Room {
    pub code: String,
    pub creator: ConnId,
    pub joiner: Option<ConnId>,
    pub game_id: Option<GameId>,
}

impl Room {
    pub fn new(code: String, creator: ConnId) -> Self {
        Room {
            code,
            creator,
            joiner: None,
            game_id: None,
        }
    }

    pub fn is_full(&self) -> bool {
        self.joiner.is_some()
    }
}
