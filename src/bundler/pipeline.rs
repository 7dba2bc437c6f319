//! Build pipeline orchestration.
//!
//! Runs, in order and each to completion:
//!
//! 1. Build mode resolution
//! 2. Binding extraction
//! 3. Delegated build
//! 4. Error translation
//! 5. Packaging (binary-envelope mode only)
//! 6. Output writing (binary-envelope mode only)

use super::bindings::extract_bindings;
use super::builder::{Builder, BundleResult, FunctionsOptions, RawWorkerOptions};
use super::output::write_output;
use super::packager::package;
use super::report::{BuildEvent, LogReporter, Reporter};
use super::resolve::{BuildMode, resolve_build_mode};
use super::settings::BuildSettings;
use super::temp::{IdGenerator, UuidIds, allocate_temp_path};
use super::translate::translate;
use crate::error::Result;
use std::path::PathBuf;
use std::sync::Arc;

/// Prefix of the scratch file the compiler writes in binary-envelope mode.
pub const BUNDLED_WORKER_PREFIX: &str = "bundledWorker";

/// Prefix of the generated functions entry script.
pub const FUNCTIONS_ENTRY_PREFIX: &str = "functionsEntry";

/// What a successful run produced.
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    /// Mode that was built.
    pub mode: BuildMode,
    /// Builder output description.
    pub bundle: BundleResult,
    /// Final artifact path.
    pub output: PathBuf,
}

/// Pipeline orchestrator.
///
/// Owns the [`Builder`] plus the collaborators that would otherwise be
/// process-wide state: the scratch id source and the event reporter.
pub struct Pipeline<B> {
    builder: B,
    ids: Arc<dyn IdGenerator>,
    reporter: Arc<dyn Reporter>,
}

impl<B: Builder> Pipeline<B> {
    /// Creates a pipeline with random scratch ids and log reporting.
    pub fn new(builder: B) -> Self {
        Self {
            builder,
            ids: Arc::new(UuidIds),
            reporter: Arc::new(LogReporter),
        }
    }

    /// Replaces the scratch id source.
    pub fn with_ids(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    /// Replaces the event reporter.
    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Runs the pipeline once.
    ///
    /// Nothing is written to `settings.outfile` in binary-envelope mode
    /// unless packaging succeeded.
    pub async fn run(&self, settings: &BuildSettings) -> Result<BuildOutcome> {
        if settings.node_compat {
            self.reporter.report(BuildEvent::NodeCompatRequested);
        }

        let mode = resolve_build_mode(
            settings.build_output_directory.as_deref(),
            &settings.functions_directory,
        )?;
        self.reporter.report(BuildEvent::ModeSelected {
            raw_worker: matches!(mode, BuildMode::RawWorker(_)),
        });

        let bindings = extract_bindings(settings.bindings.as_deref())?;

        let builder_outfile = if settings.bundle {
            allocate_temp_path(
                &settings.temp_dir,
                BUNDLED_WORKER_PREFIX,
                "mjs",
                self.ids.as_ref(),
            )?
        } else {
            settings.outfile.clone()
        };

        let outcome = match &mode {
            BuildMode::RawWorker(input) => {
                let directory = input
                    .parent()
                    .map(PathBuf::from)
                    .unwrap_or_default();
                self.builder
                    .build_raw_worker(RawWorkerOptions {
                        input: input.clone(),
                        directory,
                        outfile: builder_outfile,
                        minify: settings.minify,
                        sourcemap: settings.sourcemap,
                        watch: settings.watch,
                        node_compat: settings.node_compat,
                    })
                    .await
            }
            BuildMode::Functions(directory) => {
                let entry_path = allocate_temp_path(
                    &settings.temp_dir,
                    FUNCTIONS_ENTRY_PREFIX,
                    "mjs",
                    self.ids.as_ref(),
                )?;
                self.builder
                    .build_functions(FunctionsOptions {
                        functions_directory: directory.clone(),
                        outfile: builder_outfile,
                        entry_path,
                        output_config_path: settings.output_config_path.clone(),
                        output_routes_path: settings.output_routes_path.clone(),
                        minify: settings.minify,
                        sourcemap: settings.sourcemap,
                        watch: settings.watch,
                        plugin: settings.plugin,
                        fallback_service: settings.fallback_service.clone(),
                        node_compat: settings.node_compat,
                        d1_databases: bindings.d1_database_ids(),
                        build_output_directory: settings.build_output_directory.clone(),
                    })
                    .await
            }
        };

        let bundle = translate(outcome)?;

        if settings.bundle {
            let payload = package(&bundle).await?;
            write_output(&settings.outfile, &payload.body).await?;
        }

        self.reporter.report(BuildEvent::Built {
            bundle: settings.bundle,
            output: settings.outfile.clone(),
        });

        Ok(BuildOutcome {
            mode,
            bundle,
            output: settings.outfile.clone(),
        })
    }
}
