//! Resolved configuration for one pipeline run.

use super::resolve::DEFAULT_FUNCTIONS_DIRECTORY;
use std::path::PathBuf;

/// Binding name of the static asset service used when no route matches.
pub const DEFAULT_FALLBACK_SERVICE: &str = "ASSETS";

/// Output file written when only compiling.
pub const DEFAULT_OUTFILE: &str = "_worker.js";

/// Output file written in binary-envelope mode.
pub const DEFAULT_BUNDLE_OUTFILE: &str = "_worker.bundle";

/// Settings for a pipeline run, after CLI flags and `pages.toml` are merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSettings {
    /// Functions directory.
    pub functions_directory: PathBuf,
    /// Static assets directory, which may contain `_worker.js`.
    pub build_output_directory: Option<PathBuf>,
    /// Final artifact path.
    pub outfile: PathBuf,
    /// Route table JSON output (Functions mode only).
    pub output_config_path: Option<PathBuf>,
    /// `_routes.json` output (Functions mode only).
    pub output_routes_path: Option<PathBuf>,
    pub minify: bool,
    pub sourcemap: bool,
    pub watch: bool,
    pub plugin: bool,
    pub fallback_service: String,
    /// Emits a warning only.
    pub node_compat: bool,
    /// Serialized bindings blob.
    pub bindings: Option<String>,
    /// Package the build as a multipart upload payload.
    pub bundle: bool,
    /// Directory for intermediate build output.
    pub temp_dir: PathBuf,
}

impl BuildSettings {
    /// Default output path for the given envelope mode.
    pub fn default_outfile(bundle: bool) -> PathBuf {
        PathBuf::from(if bundle {
            DEFAULT_BUNDLE_OUTFILE
        } else {
            DEFAULT_OUTFILE
        })
    }
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            functions_directory: PathBuf::from(DEFAULT_FUNCTIONS_DIRECTORY),
            build_output_directory: None,
            outfile: Self::default_outfile(false),
            output_config_path: None,
            output_routes_path: None,
            minify: false,
            sourcemap: false,
            watch: false,
            plugin: false,
            fallback_service: DEFAULT_FALLBACK_SERVICE.to_string(),
            node_compat: false,
            bindings: None,
            bundle: false,
            temp_dir: std::env::temp_dir(),
        }
    }
}
