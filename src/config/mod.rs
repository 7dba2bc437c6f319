//! Project configuration from `pages.toml`.
//!
//! Only the `[build]` table is read. Every key is optional and CLI flags
//! take precedence over it.

use crate::error::{PagesError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Config file looked up in the working directory by default.
pub const DEFAULT_CONFIG_FILE: &str = "pages.toml";

/// Compatibility flag that implies `--node-compat`.
pub const NODEJS_COMPAT_FLAG: &str = "nodejs_compat";

/// Parsed `pages.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    #[serde(default)]
    pub build: BuildSection,
}

/// `[build]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildSection {
    pub functions_directory: Option<PathBuf>,
    pub build_output_directory: Option<PathBuf>,
    pub fallback_service: Option<String>,
    #[serde(default)]
    pub compatibility_flags: Vec<String>,
}

impl ProjectConfig {
    /// Whether Node.js compatibility was requested via compatibility flags.
    pub fn node_compat(&self) -> bool {
        self.build
            .compatibility_flags
            .iter()
            .any(|flag| flag == NODEJS_COMPAT_FLAG)
    }
}

/// Loads a project config.
///
/// A missing file yields the empty config unless `required` is set, which
/// is the case when the path was given explicitly.
pub fn load_project_config(path: &Path, required: bool) -> Result<ProjectConfig> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound && !required => {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(ProjectConfig::default());
        }
        Err(e) => {
            return Err(PagesError::Config {
                path: path.to_path_buf(),
                reason: format!("failed to read: {}", e),
            });
        }
    };

    let config: ProjectConfig = toml::from_str(&contents).map_err(|e| PagesError::Config {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    log::info!("Loaded config from {}", path.display());
    Ok(config)
}
