use std::process::ExitCode;

use clap::Parser;

use release_check::cli::{Cli, run};
use release_check::config::log_path;
use release_check::logging::init_logging;

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Logging is best effort; a read-only data dir must not block the check
    let _guard = init_logging(&log_path())
        .inspect_err(|e| eprintln!("warning: logging disabled: {}", e))
        .ok();

    let success = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run(cli, &mut std::io::stdout().lock()))?;

    Ok(if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
