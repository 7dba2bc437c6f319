//! Delegated builder boundary.
//!
//! The pipeline talks to compilation through the [`Builder`] trait. The
//! shipped implementation, [`CommandBuilder`], discovers routes for a
//! functions tree, renders the generated entry, and hands the actual
//! compilation to an external esbuild-compatible executable.
//!
//! # Module Organization
//!
//! - [`command`] - [`CommandBuilder`] and compiler invocation
//! - [`compiler`] - Compiler executable lookup
//! - [`entry`] - Generated functions entry script
//! - [`routes`] - File-path route discovery
//! - [`routes_json`] - `_routes.json` include/exclude generation

mod command;
mod compiler;
mod entry;
mod routes;
mod routes_json;
mod template;

pub use command::CommandBuilder;
pub use compiler::find_compiler;
pub use routes::{RouteConfig, discover_routes};
pub use routes_json::{ROUTES_JSON_VERSION, RoutesJson, routes_json};

use std::future::Future;
use std::path::PathBuf;
use thiserror::Error;

/// Output format of a compiled bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BundleType {
    /// ES module worker (`export default { fetch }`).
    Esm,
    /// Service-worker style script.
    CommonJs,
}

/// Kind of a module inside a bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleType {
    Esm,
    CommonJs,
    Text,
    Binary,
    Wasm,
}

impl ModuleType {
    /// MIME type used for this module's multipart part.
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Esm => "application/javascript+module",
            Self::CommonJs => "application/javascript",
            Self::Text => "text/plain",
            Self::Binary => "application/octet-stream",
            Self::Wasm => "application/wasm",
        }
    }

    /// Whether the module's content is read as UTF-8 text.
    pub fn is_text(self) -> bool {
        matches!(self, Self::Esm | Self::CommonJs | Self::Text)
    }
}

impl From<BundleType> for ModuleType {
    fn from(bundle_type: BundleType) -> Self {
        match bundle_type {
            BundleType::Esm => Self::Esm,
            BundleType::CommonJs => Self::CommonJs,
        }
    }
}

/// Content of a module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleContent {
    Text(String),
    Binary(Vec<u8>),
}

impl ModuleContent {
    /// Raw bytes of the content.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(text) => text.as_bytes(),
            Self::Binary(bytes) => bytes,
        }
    }
}

/// One named, typed content block of a bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    /// Module name, relative to the entry point's directory.
    pub name: String,
    /// Module content.
    pub content: ModuleContent,
    /// Module kind.
    pub module_type: ModuleType,
}

/// Description of a finished build.
///
/// The compiled entry lives on disk at `resolved_entry_point_path`; the
/// packager reads it from there rather than from memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleResult {
    /// Absolute path of the compiled entry script.
    pub resolved_entry_point_path: PathBuf,
    /// Additional modules, in emission order.
    pub modules: Vec<Module>,
    /// Format of the entry script.
    pub bundle_type: BundleType,
}

/// Options for compiling a `_worker.js` entry.
#[derive(Debug, Clone)]
pub struct RawWorkerOptions {
    /// Path of the `_worker.js` script.
    pub input: PathBuf,
    /// Build output (static assets) directory containing the script.
    pub directory: PathBuf,
    /// Where the compiled script is written.
    pub outfile: PathBuf,
    pub minify: bool,
    pub sourcemap: bool,
    pub watch: bool,
    pub node_compat: bool,
}

/// Options for compiling a functions tree.
#[derive(Debug, Clone)]
pub struct FunctionsOptions {
    /// Functions directory to scan for route handlers.
    pub functions_directory: PathBuf,
    /// Where the compiled script is written.
    pub outfile: PathBuf,
    /// Where the generated entry script is rendered before compilation.
    pub entry_path: PathBuf,
    /// Optional JSON dump of the discovered route table.
    pub output_config_path: Option<PathBuf>,
    /// Optional `_routes.json` output.
    pub output_routes_path: Option<PathBuf>,
    pub minify: bool,
    pub sourcemap: bool,
    pub watch: bool,
    /// Build as a plugin instead of a standalone worker.
    pub plugin: bool,
    /// Binding name of the service that serves unmatched requests.
    pub fallback_service: String,
    pub node_compat: bool,
    /// D1 binding names to expose to handlers.
    pub d1_databases: Vec<String>,
    /// Build output directory, when one was given.
    pub build_output_directory: Option<PathBuf>,
}

/// Failure raised by a [`Builder`].
#[derive(Error, Debug)]
pub enum BuildError {
    /// The functions tree contained no route handlers.
    #[error("No routes found in {}", directory.display())]
    NoRoutes {
        /// Functions directory that was scanned
        directory: PathBuf,
    },

    /// Any other compilation failure.
    #[error(transparent)]
    Failed(#[from] anyhow::Error),
}

/// Compiles a project into a [`BundleResult`].
pub trait Builder {
    /// Compiles a single `_worker.js` script.
    fn build_raw_worker(
        &self,
        options: RawWorkerOptions,
    ) -> impl Future<Output = Result<BundleResult, BuildError>> + Send;

    /// Compiles a functions tree.
    fn build_functions(
        &self,
        options: FunctionsOptions,
    ) -> impl Future<Output = Result<BundleResult, BuildError>> + Send;
}
