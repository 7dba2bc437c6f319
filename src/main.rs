//! pages-bundle - compile a Pages project into a deployable worker.

use pages_bundle::cli;
use std::process;

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let exit_code = match cli::run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            if let Some(hint) = e.remediation() {
                eprintln!("{}", hint);
            }
            e.exit_code()
        }
    };

    process::exit(exit_code);
}
