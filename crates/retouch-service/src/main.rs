//! Service entry point.

use std::sync::Arc;

use retouch_service::{create_router, AppState, ServiceConfig};
use retouch_store::Store;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServiceConfig::from_env()?;
    let listen_addr = config.listen_addr.clone();

    let store = open_store(&config)?;
    let state = AppState::new(store, config);
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&listen_addr).await?;
    tracing::info!(addr = %listen_addr, "retouch service listening");
    axum::serve(listener, router).await?;

    Ok(())
}

#[cfg(feature = "rocksdb-backend")]
fn open_store(config: &ServiceConfig) -> Result<Arc<dyn Store>, Box<dyn std::error::Error>> {
    tracing::info!(data_dir = %config.data_dir, "opening RocksDB store");
    Ok(Arc::new(retouch_store::RocksStore::open(&config.data_dir)?))
}

#[cfg(not(feature = "rocksdb-backend"))]
fn open_store(_config: &ServiceConfig) -> Result<Arc<dyn Store>, Box<dyn std::error::Error>> {
    tracing::warn!("rocksdb-backend disabled - using in-memory store, data will not survive restarts");
    Ok(Arc::new(retouch_store::MemoryStore::new()))
}
