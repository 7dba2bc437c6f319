//! Compiler executable detection.

use std::path::{Path, PathBuf};

/// Executable name searched for in `PATH`.
pub const COMPILER_BINARY: &str = "esbuild";

/// Locates the compiler.
///
/// Order: an explicit path, `node_modules/.bin/esbuild` under `project_root`,
/// then `PATH`.
pub fn find_compiler(explicit: Option<&Path>, project_root: &Path) -> anyhow::Result<PathBuf> {
    if let Some(path) = explicit {
        if path.is_file() {
            return Ok(path.to_path_buf());
        }
        return which::which(path).map_err(|e| {
            anyhow::anyhow!("compiler '{}' could not be found: {}", path.display(), e)
        });
    }

    let local = project_root
        .join("node_modules")
        .join(".bin")
        .join(COMPILER_BINARY);
    if local.is_file() {
        log::debug!("Using project-local compiler at {}", local.display());
        return Ok(local);
    }

    match which::which(COMPILER_BINARY) {
        Ok(path) => {
            log::debug!("Found {} at: {}", COMPILER_BINARY, path.display());
            Ok(path)
        }
        Err(e) => Err(anyhow::anyhow!(
            "{} not found in PATH ({}). Install it with `npm install --save-dev esbuild` \
             or pass --compiler.",
            COMPILER_BINARY,
            e
        )),
    }
}
