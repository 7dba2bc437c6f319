//! Command line argument parsing and validation.

use crate::bundler::BuildSettings;
use crate::bundler::resolve::DEFAULT_FUNCTIONS_DIRECTORY;
use crate::bundler::settings::DEFAULT_FALLBACK_SERVICE;
use crate::config::{DEFAULT_CONFIG_FILE, ProjectConfig};
use crate::error::CliError;
use clap::Parser;
use std::path::PathBuf;

/// Compile a Pages project into a deployable worker
#[derive(Parser, Debug)]
#[command(
    name = "pages-bundle",
    version,
    about = "Compile a Pages project into a deployable worker",
    long_about = "Compiles either a raw _worker.js in the build output directory or a \
directory of Functions route handlers into a single worker script.

With --bundle, the compiled worker is packaged as a multipart upload payload.

Usage:
  pages-bundle
  pages-bundle api --outfile dist/_worker.js --minify
  pages-bundle --build-output-directory public --bundle

Exit code 156 = the Functions directory contained no routes."
)]
pub struct Args {
    /// Functions directory [default: functions]
    #[arg(value_name = "DIRECTORY")]
    pub directory: Option<PathBuf>,

    /// Output file [default: _worker.js, or _worker.bundle with --bundle]
    #[arg(long, value_name = "PATH")]
    pub outfile: Option<PathBuf>,

    /// Write the discovered route table as JSON
    #[arg(long, value_name = "PATH")]
    pub output_config_path: Option<PathBuf>,

    /// Write a _routes.json for the discovered routes
    #[arg(long, value_name = "PATH")]
    pub output_routes_path: Option<PathBuf>,

    /// Minify the output
    #[arg(long)]
    pub minify: bool,

    /// Emit a source map next to the output
    #[arg(long)]
    pub sourcemap: bool,

    /// Rebuild when inputs change
    #[arg(long)]
    pub watch: bool,

    /// Build a plugin instead of a standalone worker
    #[arg(long)]
    pub plugin: bool,

    /// Binding serving requests no route matches [default: ASSETS]
    #[arg(long, value_name = "BINDING")]
    pub fallback_service: Option<String>,

    /// Static assets directory, checked for a _worker.js
    #[arg(long, value_name = "DIRECTORY")]
    pub build_output_directory: Option<PathBuf>,

    /// Request Node.js compatibility (warns only)
    #[arg(long)]
    pub node_compat: bool,

    /// Bindings as a JSON object
    #[arg(long, value_name = "JSON")]
    pub bindings: Option<String>,

    /// Package the compiled worker as a multipart upload payload
    #[arg(long)]
    pub bundle: bool,

    /// esbuild-compatible compiler executable
    #[arg(long, value_name = "PATH", env = "PAGES_BUNDLE_COMPILER")]
    pub compiler: Option<PathBuf>,

    /// Project config file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> Result<(), CliError> {
        if let Some(service) = &self.fallback_service
            && service.trim().is_empty()
        {
            return Err(CliError::InvalidArguments {
                reason: "--fallback-service cannot be empty".to_string(),
            });
        }

        if let Some(outfile) = &self.outfile {
            for (flag, other) in [
                ("--output-config-path", &self.output_config_path),
                ("--output-routes-path", &self.output_routes_path),
            ] {
                if other.as_ref() == Some(outfile) {
                    return Err(CliError::ConflictingArguments {
                        arguments: vec!["--outfile".to_string(), flag.to_string()],
                    });
                }
            }
        }

        Ok(())
    }

    /// Config file path and whether it was given explicitly.
    pub fn config_path(&self) -> (PathBuf, bool) {
        match &self.config {
            Some(path) => (path.clone(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        }
    }

    /// Merges flags over the project config into pipeline settings.
    pub fn settings(&self, config: &ProjectConfig) -> BuildSettings {
        let build = &config.build;
        BuildSettings {
            functions_directory: self
                .directory
                .clone()
                .or_else(|| build.functions_directory.clone())
                .unwrap_or_else(|| PathBuf::from(DEFAULT_FUNCTIONS_DIRECTORY)),
            build_output_directory: self
                .build_output_directory
                .clone()
                .or_else(|| build.build_output_directory.clone()),
            outfile: self
                .outfile
                .clone()
                .unwrap_or_else(|| BuildSettings::default_outfile(self.bundle)),
            output_config_path: self.output_config_path.clone(),
            output_routes_path: self.output_routes_path.clone(),
            minify: self.minify,
            sourcemap: self.sourcemap,
            watch: self.watch,
            plugin: self.plugin,
            fallback_service: self
                .fallback_service
                .clone()
                .or_else(|| build.fallback_service.clone())
                .unwrap_or_else(|| DEFAULT_FALLBACK_SERVICE.to_string()),
            node_compat: self.node_compat || config.node_compat(),
            bindings: self.bindings.clone(),
            bundle: self.bundle,
            temp_dir: std::env::temp_dir(),
        }
    }
}
