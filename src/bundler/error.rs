//! Error types for the packaging layer.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for packaging operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while staging, packaging or writing artifacts.
#[derive(Error, Debug)]
pub enum Error {
    /// Filesystem operation failed on a specific path.
    #[error("{context} {}: {error}", path.display())]
    Fs {
        /// What was being done
        context: &'static str,
        /// Path involved
        path: PathBuf,
        /// Underlying error
        #[source]
        error: std::io::Error,
    },

    /// JSON serialization failure.
    #[error("{0}")]
    Json(#[from] serde_json::Error),

    /// Path could not be turned into an absolute or named path.
    #[error("invalid path {}: {reason}", path.display())]
    InvalidPath {
        /// Offending path
        path: PathBuf,
        /// Reason for the error
        reason: String,
    },

    /// Error with a free-form message.
    #[error("{0}")]
    GenericError(String),
}

/// Attaches path context to IO results.
pub trait ErrorExt<T> {
    /// Maps an IO error into [`Error::Fs`] carrying `context` and `path`.
    fn fs_context(self, context: &'static str, path: impl AsRef<Path>) -> Result<T>;
}

impl<T> ErrorExt<T> for std::result::Result<T, std::io::Error> {
    fn fs_context(self, context: &'static str, path: impl AsRef<Path>) -> Result<T> {
        self.map_err(|error| Error::Fs {
            context,
            path: path.as_ref().to_path_buf(),
            error,
        })
    }
}

/// Returns early with a formatted [`Error::GenericError`].
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::bundler::Error::GenericError(format!($($arg)*)).into())
    };
}
