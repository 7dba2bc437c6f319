//! Reclassification of builder failures into pipeline errors.

use super::builder::{BuildError, BundleResult};
use crate::error::{PagesError, Result};

/// Maps a builder outcome onto the pipeline's error contract.
///
/// `NoRoutes` becomes the fatal [`PagesError::NoRoutes`] with its dedicated
/// exit code; any other failure is forwarded untouched.
pub fn translate(outcome: std::result::Result<BundleResult, BuildError>) -> Result<BundleResult> {
    outcome.map_err(|error| match error {
        BuildError::NoRoutes { directory } => {
            log::debug!("Builder found no routes in {}", directory.display());
            PagesError::NoRoutes { directory }
        }
        BuildError::Failed(error) => PagesError::Builder(error),
    })
}
