//! Build mode selection from the project layout.

use crate::error::{PagesError, Result};
use std::path::{Path, PathBuf};

/// Functions directory used when none is given.
pub const DEFAULT_FUNCTIONS_DIRECTORY: &str = "functions";

/// File name of a raw worker script inside the build output directory.
pub const RAW_WORKER_FILENAME: &str = "_worker.js";

/// The deployable unit chosen for this invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildMode {
    /// Compile a single `_worker.js` entry script.
    RawWorker(PathBuf),
    /// Compile a directory of route handlers.
    Functions(PathBuf),
}

impl BuildMode {
    /// Script or directory being compiled.
    pub fn path(&self) -> &Path {
        match self {
            Self::RawWorker(path) | Self::Functions(path) => path,
        }
    }
}

/// Selects the build mode.
///
/// A `_worker.js` in the build output directory always wins over a
/// functions directory. When neither a build output directory nor a
/// non-default functions directory is given and `functions/` is missing,
/// there is nothing to build.
pub fn resolve_build_mode(
    build_output_directory: Option<&Path>,
    functions_directory: &Path,
) -> Result<BuildMode> {
    if let Some(output_dir) = build_output_directory {
        let worker_script = output_dir.join(RAW_WORKER_FILENAME);
        if worker_script.exists() {
            log::debug!("Found raw worker at {}", worker_script.display());
            return Ok(BuildMode::RawWorker(worker_script));
        }
    }

    if build_output_directory.is_none()
        && functions_directory == Path::new(DEFAULT_FUNCTIONS_DIRECTORY)
        && !functions_directory.exists()
    {
        return Err(PagesError::UserInput {
            reason: format!(
                "Could not find anything to build. \
                 No static assets directory was given and no '{}' directory exists.",
                DEFAULT_FUNCTIONS_DIRECTORY
            ),
        });
    }

    Ok(BuildMode::Functions(functions_directory.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_worker_wins_over_functions() {
        let dir = tempfile::tempdir().unwrap();
        let assets = dir.path().join("public");
        let functions = dir.path().join("functions");
        std::fs::create_dir_all(&assets).unwrap();
        std::fs::create_dir_all(&functions).unwrap();
        std::fs::write(assets.join(RAW_WORKER_FILENAME), "export default {}").unwrap();
        std::fs::write(functions.join("index.js"), "export const onRequest = () => {}").unwrap();

        let mode = resolve_build_mode(Some(&assets), &functions).unwrap();
        assert_eq!(mode, BuildMode::RawWorker(assets.join(RAW_WORKER_FILENAME)));
    }

    #[test]
    fn missing_default_functions_is_user_input_error() {
        // Relative default path; the test binary runs from the crate root,
        // which has no functions directory.
        let err = resolve_build_mode(None, Path::new(DEFAULT_FUNCTIONS_DIRECTORY)).unwrap_err();
        assert!(matches!(err, PagesError::UserInput { .. }));
    }

    #[test]
    fn custom_functions_directory_is_selected_even_if_missing() {
        let mode = resolve_build_mode(None, Path::new("does-not-exist/api")).unwrap();
        assert_eq!(mode, BuildMode::Functions(PathBuf::from("does-not-exist/api")));
    }

    #[test]
    fn assets_without_worker_fall_back_to_functions() {
        let dir = tempfile::tempdir().unwrap();
        let mode = resolve_build_mode(Some(dir.path()), Path::new(DEFAULT_FUNCTIONS_DIRECTORY)).unwrap();
        assert_eq!(
            mode,
            BuildMode::Functions(PathBuf::from(DEFAULT_FUNCTIONS_DIRECTORY))
        );
    }
}
