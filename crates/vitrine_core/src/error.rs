//! Error types for vitrine_core
//!
//! Most failure modes on a page are not errors at all: a missing element just
//! means the feature that needed it is absent. The variants here cover the
//! few places a collaborator can actually fail.

use thiserror::Error;

/// Errors surfaced by the page behavior core and its collaborators
#[derive(Error, Debug)]
pub enum VitrineError {
    /// The durable flag store could not be read or written (private mode, quota, ...)
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Configuration could not be parsed
    #[error("Configuration parse failed: {0}")]
    Config(#[from] serde_json::Error),

    /// Configuration parsed but is inconsistent
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Host environment failure (browser API threw, no window, ...)
    #[error("Host error: {0}")]
    Host(String),
}

/// Result type for vitrine_core operations
pub type Result<T> = std::result::Result<T, VitrineError>;
