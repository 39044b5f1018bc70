use crate::domain::models::Difficulty;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub limits: LimitsConfig,
    pub session: SessionConfig,
    pub game: GameConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LimitsConfig {
    /// Minimum gap between two move attempts from one connection, in ms.
    pub move_interval_ms: u64,
    /// Minimum gap between two room creations from one connection, in ms.
    pub room_interval_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    /// How long a game survives with a player disconnected before it is
    /// evicted and its records deleted.
    pub disconnect_grace_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GameConfig {
    pub default_difficulty: Difficulty,
}

impl AppConfig {
    pub fn load() -> Self {
        let config_path = "Config.toml";
        let mut config = if Path::new(config_path).exists() {
            let contents = fs::read_to_string(config_path).expect("Failed to read Config.toml");
            toml::from_str(&contents).expect("Failed to parse Config.toml")
        } else {
            eprintln!("Config.toml not found, using defaults");
            Self::default()
        };

        config.merge_env();

        eprintln!("----------------------------------------");
        eprintln!("Parlor Configuration:");
        eprintln!("  Port: {}", config.server.port);
        eprintln!(
            "  Rate limits: move {} ms, room {} ms",
            config.limits.move_interval_ms, config.limits.room_interval_ms
        );
        eprintln!(
            "  Disconnect grace: {} s",
            config.session.disconnect_grace_secs
        );
        eprintln!(
            "  Default difficulty: {}",
            config.game.default_difficulty.as_str()
        );
        eprintln!("----------------------------------------");

        config
    }

    fn merge_env(&mut self) {
        if let Ok(val) = std::env::var("PARLOR_PORT") {
            if let Ok(parsed) = val.parse() {
                self.server.port = parsed;
            }
        }
        if let Ok(val) = std::env::var("PARLOR_MOVE_INTERVAL_MS") {
            if let Ok(parsed) = val.parse() {
                self.limits.move_interval_ms = parsed;
            }
        }
        if let Ok(val) = std::env::var("PARLOR_ROOM_INTERVAL_MS") {
            if let Ok(parsed) = val.parse() {
                self.limits.room_interval_ms = parsed;
            }
        }
        if let Ok(val) = std::env::var("PARLOR_DISCONNECT_GRACE_SECS") {
            if let Ok(parsed) = val.parse() {
                self.session.disconnect_grace_secs = parsed;
            }
        }
        if let Ok(val) = std::env::var("PARLOR_DEFAULT_DIFFICULTY") {
            if let Some(parsed) = Difficulty::parse(&val) {
                self.game.default_difficulty = parsed;
            }
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 8081 }
    }
}
impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            move_interval_ms: 500,
            room_interval_ms: 5000,
        }
    }
}
impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            disconnect_grace_secs: 30,
        }
    }
}
impl Default for GameConfig {
    fn default() -> Self {
        Self {
            default_difficulty: Difficulty::Medium,
        }
    }
}
impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            limits: LimitsConfig::default(),
            session: SessionConfig::default(),
            game: GameConfig::default(),
        }
    }
}
