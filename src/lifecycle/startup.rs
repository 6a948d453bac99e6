//! Startup orchestration.
//!
//! # Responsibilities
//! - Open the record store from its configured file
//! - Bind the listener last, once everything else is ready
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal

use tokio::net::TcpListener;

use crate::config::{ListenerConfig, StorageConfig};
use crate::store::{JsonFilePersistence, Store, StoreError};

/// Open the store, restoring its last committed state.
pub fn open_store(config: &StorageConfig) -> Result<Store, StoreError> {
    let store = Store::open(JsonFilePersistence::new(&config.path))?;
    tracing::info!(
        path = %config.path,
        collections = store.collections().count(),
        "Store opened"
    );
    Ok(store)
}

/// Bind the TCP listener for the API.
pub async fn bind(config: &ListenerConfig) -> std::io::Result<TcpListener> {
    let listener = TcpListener::bind(&config.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");
    Ok(listener)
}
