//! Error types for the Pages build pipeline.
//!
//! Every component boundary returns [`Result`]; the process exit code is
//! derived from the error kind via [`PagesError::exit_code`].

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, PagesError>;

/// Exit code used by every fatal error without a dedicated code.
pub const EXIT_CODE_GENERIC: i32 = 1;

/// Exit code for a bindings blob that is not valid JSON.
pub const EXIT_CODE_INVALID_BINDINGS: i32 = 1;

/// Exit code for a functions directory that produced no routes.
pub const EXIT_CODE_FUNCTIONS_NO_ROUTES: i32 = 156;

/// Main error type for all pipeline operations
#[derive(Error, Debug)]
pub enum PagesError {
    /// Required input (static assets or functions) is missing
    #[error("{reason}")]
    UserInput {
        /// What the user needs to fix
        reason: String,
    },

    /// The serialized bindings blob could not be parsed
    #[error("Could not parse a valid set of 'bindings': {source}")]
    BindingParse {
        /// Underlying JSON error
        #[source]
        source: serde_json::Error,
    },

    /// The functions tree resolved to zero routes
    #[error(
        "No routes found when building Functions directory: {}. \
         Add a file exporting an onRequest handler (e.g. {}/index.js) or remove the directory.",
        directory.display(),
        directory.display()
    )]
    NoRoutes {
        /// Functions directory that was scanned
        directory: PathBuf,
    },

    /// Any other failure raised by the delegated builder, forwarded as-is
    #[error(transparent)]
    Builder(anyhow::Error),

    /// CLI argument errors
    #[error("CLI error: {0}")]
    Cli(#[from] CliError),

    /// Project configuration errors
    #[error("Config error in {}: {reason}", path.display())]
    Config {
        /// Config file being read
        path: PathBuf,
        /// Reason for the error
        reason: String,
    },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Packaging and output errors
    #[error("Bundler error: {0}")]
    Bundler(#[from] crate::bundler::Error),
}

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid command line arguments
    #[error("Invalid arguments: {reason}")]
    InvalidArguments {
        /// Reason for the error
        reason: String,
    },

    /// Conflicting arguments
    #[error("Conflicting arguments: {arguments:?}")]
    ConflictingArguments {
        /// Arguments that conflict
        arguments: Vec<String>,
    },
}

impl PagesError {
    /// Process exit code associated with this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NoRoutes { .. } => EXIT_CODE_FUNCTIONS_NO_ROUTES,
            Self::BindingParse { .. } => EXIT_CODE_INVALID_BINDINGS,
            _ => EXIT_CODE_GENERIC,
        }
    }

    /// Actionable hint printed under the error message, when one exists.
    pub fn remediation(&self) -> Option<String> {
        match self {
            Self::UserInput { .. } => Some(
                "Pass --build-output-directory with a _worker.js, or create a functions directory."
                    .to_string(),
            ),
            Self::BindingParse { .. } => {
                Some("--bindings must be a JSON object, e.g. '{\"d1_databases\":{\"DB\":{}}}'.".to_string())
            }
            Self::NoRoutes { .. } => None,
            Self::Builder(_) => Some("Check the compiler output above for details.".to_string()),
            _ => None,
        }
    }
}
