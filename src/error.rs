//! Error types
//!
//! `Error` is the invocation-failure class: anything that reaches the hosting
//! runtime as a failed activation. Recoverable conditions (missing assets,
//! malformed paths, unmatched requests) never become an `Error`.

use std::path::PathBuf;

/// Boxed error used at the renderer seam
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read asset '{}': {source}", path.display())]
    Asset {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to load route manifest '{}': {reason}", path.display())]
    Manifest { path: PathBuf, reason: String },

    #[error("invalid invocation: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Failure raised by the upstream renderer
#[derive(Debug, thiserror::Error)]
#[error("renderer failed: {0}")]
pub struct RenderError(#[source] pub BoxError);

impl RenderError {
    pub fn new(err: impl Into<BoxError>) -> Self {
        Self(err.into())
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
