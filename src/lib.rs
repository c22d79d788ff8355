//! # Harvest - museum collection harvester
//!
//! Pulls paginated object records from a museum collection API, flattens
//! them into three related tables and persists them in SQLite.
//!
//! Harvest provides:
//! - A paginating collector over a pluggable `PageSource`
//! - Normalization of raw records into metadata, media and color rows
//! - Transactional migration of a staged batch into SQLite
//! - A fixed catalog of analytical queries
//! - A two-step guarded clear of all persisted data

pub mod record;
pub mod staging;
pub mod collector;
pub mod storage;
pub mod catalog;
pub mod eraser;
pub mod session;
pub mod config;
pub mod server;
pub mod output;
pub mod ui;


// Re-exports for convenient access
pub use record::{ArtifactRow, ColorRow, MediaRow, RawRecord};
pub use staging::{StagePolicy, StagedBatch};
pub use collector::{Collector, HttpPageSource, PageSource, StopReason};
pub use storage::{ArtifactStore, ColorPolicy, QueryTable, Table};
pub use session::{ClearOutcome, Session, SessionOptions};

/// Result type alias for Harvest operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Harvest operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Remote API unavailable: {0}")]
    RemoteUnavailable(String),

    #[error("No staged records to migrate; collect a category first")]
    EmptyBatch,

    #[error("Query '{key}' failed: {message}")]
    QueryFailed { key: String, message: String },

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Refusing to run a statement that modifies the store: {0}")]
    NotReadOnly(String),

    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    #[error("Unknown query: {0}")]
    UnknownQuery(String),

    #[error("Unknown table: {0}")]
    UnknownTable(String),

    #[error("Configuration error: {0}")]
    Config(String),
}
