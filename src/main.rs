use parlor::api;
use parlor::api::state::AppState;
use parlor::config::AppConfig;
use parlor::infrastructure::identity::NullIdentity;
use parlor::infrastructure::store::MemoryStore;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("parlor=info,tower_http=info")),
        )
        .with(fmt::layer())
        .init();

    let config = AppConfig::load();
    let state = AppState::new(config, Arc::new(MemoryStore::new()), Arc::new(NullIdentity));

    api::start_server(state).await
}
