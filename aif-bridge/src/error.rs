/// Error types for the ML bridge and artifact store
use crate::operation::Operation;
use aif_core::ParseError;
use aif_utils::error::UploadError;
use std::path::PathBuf;
use thiserror::Error;

/// Boundary failures. A script that runs and exits non-zero is not an
/// error; it comes back as an unsuccessful [`crate::BridgeOutcome`].
#[derive(Error, Debug)]
pub enum BridgeError {
    /// Artifact missing or unwritable
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Upload rejected before anything touched the disk
    #[error("upload rejected: {0}")]
    Upload(#[from] UploadError),

    /// Artifact is not UTF-8 text
    #[error("{} is not valid UTF-8", path.display())]
    Encoding { path: PathBuf },

    /// Artifact content failed CSV validation
    #[error("validation failed: {0}")]
    Validation(#[from] ParseError),

    /// A request of the same kind is still running
    #[error("{0} is already running")]
    Busy(Operation),
}

impl BridgeError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BridgeError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Type alias for Results using BridgeError
pub type Result<T> = std::result::Result<T, BridgeError>;
