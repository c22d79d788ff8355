//! Storage Layer - SQLite-backed persistence
//!
//! System of record is SQLite with tables:
//! - artifact_metadata(id, title, culture, period, century, medium, ...)
//! - artifact_media(objectid, imagecount, mediacount, colorcount, rank, ...)
//! - artifact_colors(objectid, color, spectrum, hue, percent, css3)

pub mod schema;
pub mod sqlite;

pub use schema::Table;
pub use sqlite::{ArtifactStore, ClearReport, ColorPolicy, DbStats, InsertCounts, MigrateReport, QueryTable};
