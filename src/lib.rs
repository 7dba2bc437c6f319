//! Pages build pipeline library.
//!
//! Compiles a raw `_worker.js` or a directory of Functions route handlers
//! into a single worker script, and optionally packages it as a
//! deterministic `multipart/form-data` upload payload.
//!
//! It can be used both as a CLI tool and as a library dependency.

pub mod bundler;
pub mod cli;
pub mod config;
pub mod error;

// Re-export commonly used types
pub use error::{CliError, PagesError, Result};
