//! Command line interface for pages-bundle.

mod args;

pub use args::Args;

use crate::bundler::{CommandBuilder, Pipeline};
use crate::config::load_project_config;
use crate::error::Result;

/// Main CLI entry point
pub async fn run() -> Result<i32> {
    let args = Args::parse_args();
    run_with(args).await
}

/// Runs the pipeline for already parsed arguments.
pub async fn run_with(args: Args) -> Result<i32> {
    args.validate()?;

    let (config_path, required) = args.config_path();
    let config = load_project_config(&config_path, required)?;
    let settings = args.settings(&config);

    let project_root = std::env::current_dir()?;
    let builder = CommandBuilder::new(args.compiler.clone(), project_root);
    let outcome = Pipeline::new(builder).run(&settings).await?;

    if settings.watch {
        log::info!(
            "Watching {}; press Ctrl+C to stop",
            outcome.mode.path().display()
        );
        tokio::signal::ctrl_c().await?;
    }

    Ok(0)
}
