use crate::domain::models::{Difficulty, GameId, UserId};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;
use thiserror::Error;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameStatus {
    Active,
    Completed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameKind {
    SinglePlayer,
    Multiplayer,
}

/// Durable record of a game. Outlives the in-memory session so a player can
/// resume after either side of the socket goes away.
#[derive(Clone, Debug)]
pub struct GameRecord {
    pub id: GameId,
    pub white: UserId,
    pub black: Option<UserId>,
    pub status: GameStatus,
    pub kind: GameKind,
    pub difficulty: Option<Difficulty>,
    pub created_at: SystemTime,
    /// Monotonic creation counter. Breaks timestamp ties when picking the
    /// most recent active game of a player.
    pub seq: u64,
}

/// One accepted move, stored in the order it was played.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MoveRecord {
    pub ply: u32,
    pub from: String,
    pub to: String,
    pub promotion: Option<String>,
    pub san: String,
    pub fen: String,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("game {0} not found")]
    GameNotFound(GameId),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Arguments for opening a new game record.
#[derive(Clone, Debug)]
pub struct NewGame {
    pub white: UserId,
    pub black: Option<UserId>,
    pub kind: GameKind,
    pub difficulty: Option<Difficulty>,
}

#[async_trait]
pub trait GameStore: Send + Sync {
    async fn create_game(&self, new: NewGame) -> Result<GameRecord, StoreError>;

    /// Appends a move to a game's log. Fails if the game does not exist.
    async fn append_move(&self, game: GameId, mv: MoveRecord) -> Result<(), StoreError>;

    /// The full move log of a game, ordered by ply.
    async fn moves(&self, game: GameId) -> Result<Vec<MoveRecord>, StoreError>;

    /// The most recently created ACTIVE game the user occupies a seat in.
    async fn find_active(&self, user: &UserId) -> Result<Option<GameRecord>, StoreError>;

    async fn set_status(&self, game: GameId, status: GameStatus) -> Result<(), StoreError>;

    /// Removes a game and its move log. Deleting an absent game is a no-op.
    async fn delete_game(&self, game: GameId) -> Result<(), StoreError>;
}

/// In-process store backed by concurrent maps.
pub struct MemoryStore {
    games: DashMap<GameId, GameRecord>,
    moves: DashMap<GameId, Vec<MoveRecord>>,
    seq: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore {
            games: DashMap::new(),
            moves: DashMap::new(),
            seq: AtomicU64::new(0),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        MemoryStore::new()
    }
}

#[async_trait]
impl GameStore for MemoryStore {
    async fn create_game(&self, new: NewGame) -> Result<GameRecord, StoreError> {
        let record = GameRecord {
            id: Uuid::new_v4(),
            white: new.white,
            black: new.black,
            status: GameStatus::Active,
            kind: new.kind,
            difficulty: new.difficulty,
            created_at: SystemTime::now(),
            seq: self.seq.fetch_add(1, Ordering::Relaxed),
        };
        self.games.insert(record.id, record.clone());
        self.moves.insert(record.id, Vec::new());
        Ok(record)
    }

    async fn append_move(&self, game: GameId, mv: MoveRecord) -> Result<(), StoreError> {
        let mut log = self
            .moves
            .get_mut(&game)
            .ok_or(StoreError::GameNotFound(game))?;
        log.push(mv);
        Ok(())
    }

    async fn moves(&self, game: GameId) -> Result<Vec<MoveRecord>, StoreError> {
        let mut log = self
            .moves
            .get(&game)
            .map(|entry| entry.clone())
            .ok_or(StoreError::GameNotFound(game))?;
        log.sort_by_key(|m| m.ply);
        Ok(log)
    }

    async fn find_active(&self, user: &UserId) -> Result<Option<GameRecord>, StoreError> {
        let best = self
            .games
            .iter()
            .filter(|entry| {
                let record = entry.value();
                record.status == GameStatus::Active
                    && (record.white == *user || record.black.as_deref() == Some(user.as_str()))
            })
            .max_by_key(|entry| entry.value().seq)
            .map(|entry| entry.value().clone());
        Ok(best)
    }

    async fn set_status(&self, game: GameId, status: GameStatus) -> Result<(), StoreError> {
        let mut record = self
            .games
            .get_mut(&game)
            .ok_or(StoreError::GameNotFound(game))?;
        record.status = status;
        Ok(())
    }

    async fn delete_game(&self, game: GameId) -> Result<(), StoreError> {
        self.moves.remove(&game);
        self.games.remove(&game);
        Ok(())
    }
}
