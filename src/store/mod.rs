//! Record store subsystem.
//!
//! # Data Flow
//! ```text
//! handler
//!     → Store (insert / select / find / update / delete)
//!     → in-memory collections (name → ordered JSON records)
//!     → persistence.rs (full snapshot written after every mutation)
//!
//! Startup:
//!     persistence.rs load → Snapshot → Store
//! ```
//!
//! # Design Decisions
//! - Single owner: the store is passed explicitly, never global
//! - Linear scans, no indexes
//! - Overwrite-style persistence (no append log)
//! - Write failures are returned to the caller, never swallowed

pub mod criteria;
pub mod engine;
pub mod persistence;
pub mod record;

pub use criteria::Criteria;
pub use persistence::{JsonFilePersistence, MemoryPersistence, Persistence, Snapshot};
pub use record::Record;
pub use engine::Store;

use thiserror::Error;

/// Errors raised by the record store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("store JSON could not be read or written: {0}")]
    Json(#[from] serde_json::Error),

    #[error("record in collection `{collection}` is malformed: {source}")]
    Corrupt {
        collection: String,
        #[source]
        source: serde_json::Error,
    },
}
