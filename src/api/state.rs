use crate::api::models::ServerMessage;
use crate::application::rate_limit::RateGate;
use crate::application::session::{Room, Session};
use crate::config::AppConfig;
use crate::domain::models::{ConnId, GameId, UserId};
use crate::infrastructure::identity::IdentityProvider;
use crate::infrastructure::store::GameStore;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex, RwLock};
use tokio::task::JoinHandle;

/// An authenticated connection and its outbound message channel.
pub struct ClientHandle {
    pub user: UserId,
    sender: mpsc::UnboundedSender<ServerMessage>,
}

pub type SessionRef = Arc<RwLock<Session>>;
pub type SharedState = Arc<AppState>;

/// Everything the handlers share: the durable store, the identity backend,
/// and the in-memory registries for connections, sessions, rooms, the
/// quick-match slot and pending eviction timers.
pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<dyn GameStore>,
    pub identity: Arc<dyn IdentityProvider>,
    pub clients: DashMap<ConnId, ClientHandle>,
    pub sessions: DashMap<GameId, SessionRef>,
    pub rooms: DashMap<String, Room>,
    /// At most one connection waits for a quick match at a time.
    pub pending: Mutex<Option<ConnId>>,
    pub evictions: DashMap<GameId, JoinHandle<()>>,
    pub move_gate: RateGate,
    pub room_gate: RateGate,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        store: Arc<dyn GameStore>,
        identity: Arc<dyn IdentityProvider>,
    ) -> SharedState {
        let move_gate = RateGate::new(Duration::from_millis(config.limits.move_interval_ms));
        let room_gate = RateGate::new(Duration::from_millis(config.limits.room_interval_ms));
        Arc::new(AppState {
            config,
            store,
            identity,
            clients: DashMap::new(),
            sessions: DashMap::new(),
            rooms: DashMap::new(),
            pending: Mutex::new(None),
            evictions: DashMap::new(),
            move_gate,
            room_gate,
        })
    }

    pub fn register_client(
        &self,
        conn: ConnId,
        user: UserId,
        sender: mpsc::UnboundedSender<ServerMessage>,
    ) {
        self.clients.insert(conn, ClientHandle { user, sender });
    }

    pub fn remove_client(&self, conn: ConnId) -> Option<ClientHandle> {
        self.clients.remove(&conn).map(|(_, handle)| handle)
    }

    pub fn user_of(&self, conn: ConnId) -> Option<UserId> {
        self.clients.get(&conn).map(|handle| handle.user.clone())
    }

    pub fn conn_of_user(&self, user: &UserId) -> Option<ConnId> {
        self.clients
            .iter()
            .find(|entry| &entry.value().user == user)
            .map(|entry| *entry.key())
    }

    /// Sends to one connection. A missing client or a closed channel is
    /// not an error; the disconnect path cleans those up.
    pub fn send(&self, conn: ConnId, message: ServerMessage) {
        if let Some(handle) = self.clients.get(&conn) {
            let _ = handle.sender.send(message);
        }
    }

    pub fn insert_session(&self, session: Session) -> SessionRef {
        let game_id = session.game_id;
        let session_ref: SessionRef = Arc::new(RwLock::new(session));
        self.sessions.insert(game_id, session_ref.clone());
        session_ref
    }

    pub fn session_ref(&self, game_id: GameId) -> Option<SessionRef> {
        self.sessions.get(&game_id).map(|entry| entry.value().clone())
    }

    pub fn remove_session(&self, game_id: GameId) {
        self.sessions.remove(&game_id);
    }

    /// Finds the session a connection is seated in, multiplayer games
    /// first. Session refs are collected before locking so no map shard
    /// stays held across an await.
    pub async fn find_session_by_conn(&self, conn: ConnId) -> Option<SessionRef> {
        let candidates: Vec<SessionRef> = self
            .sessions
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        for multiplayer_pass in [true, false] {
            for session_ref in &candidates {
                let session = session_ref.read().await;
                if session.is_multiplayer() == multiplayer_pass && session.involves_conn(conn) {
                    return Some(session_ref.clone());
                }
            }
        }
        None
    }

    pub fn cancel_eviction(&self, game_id: GameId) {
        if let Some((_, handle)) = self.evictions.remove(&game_id) {
            handle.abort();
            tracing::debug!(%game_id, "eviction timer cancelled");
        }
    }

    /// Aborts every armed eviction timer. Used on shutdown so games stay
    /// resumable after a restart.
    pub fn cancel_all_evictions(&self) {
        let armed: Vec<GameId> = self.evictions.iter().map(|entry| *entry.key()).collect();
        for game_id in armed {
            self.cancel_eviction(game_id);
        }
    }
}
