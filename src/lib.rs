//! # foodscrape - normalizing sink for scraped restaurant data
//!
//! Takes the records a restaurant-listing crawler emits and persists them
//! into a relational SQLite schema with referential integrity.
//!
//! foodscrape provides:
//! - A tagged [`Record`] type covering the two recognized record shapes
//! - Menu decomposition into restaurants, menu categories and items
//! - Tag normalization with insert-or-ignore reference data
//! - Customer to restaurant link expansion for discovery records
//! - A per-record transactional router and a multi-worker ingest pipeline

pub mod record;
pub mod storage;
pub mod menu;
pub mod tags;
pub mod linker;
pub mod router;
pub mod pipeline;
pub mod config;
pub mod ui;

// Re-exports for convenient access
pub use record::{Record, Discovery, MenuRecord};
pub use router::{RecordRouter, Outcome};
pub use pipeline::{Pipeline, IngestReport};
pub use storage::SqliteStore;

/// Result type alias for foodscrape operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for foodscrape operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Unrecognized record: {0}")]
    Classification(String),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Storage error: {0}")]
    Storage(rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        if err.sqlite_error_code() == Some(rusqlite::ErrorCode::ConstraintViolation) {
            Error::ConstraintViolation(err.to_string())
        } else {
            Error::Storage(err)
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Classification(err.to_string())
    }
}

/// Coarse failure category used when reporting dropped records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Classification,
    ConstraintViolation,
    Storage,
}

impl Error {
    pub fn kind(&self) -> FailureKind {
        match self {
            Error::Classification(_) => FailureKind::Classification,
            Error::ConstraintViolation(_) => FailureKind::ConstraintViolation,
            Error::Storage(_) | Error::Io(_) => FailureKind::Storage,
        }
    }
}
