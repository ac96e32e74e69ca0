//! Error types for calsync-core operations.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading, extracting or reconciling calendars.
#[derive(Error, Debug)]
pub enum SyncError {
    /// The input is not a calendar document at all.
    #[error("Malformed calendar input: {0}")]
    MalformedInput(String),

    /// An event component carries no UID (1-based position among the document's events).
    #[error("Event #{position} has no UID")]
    MissingUid { position: usize },

    /// A required timestamp is missing or unparseable and the policy is `Reject`.
    #[error("Event '{uid}' is missing a valid {field}")]
    MissingField { uid: String, field: &'static str },

    /// The event ends before it starts and the policy is `Reject`.
    #[error("Event '{uid}' ends before it starts")]
    InvalidRange { uid: String },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SyncError {
    /// True for every variant that describes bad input rather than a filesystem failure.
    pub fn is_malformed_input(&self) -> bool {
        !matches!(self, SyncError::Io { .. })
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
