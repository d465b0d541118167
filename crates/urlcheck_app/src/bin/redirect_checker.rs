use std::path::PathBuf;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use urlcheck_app::{
    init_logging, listen_for_shutdown, load_config, run_redirect_checker, CheckerConfig,
};
use urlcheck_logging::check_info;

/// Resolves redirect chains for URLs taken from the check queue.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// RON config file.
    #[arg(long, short)]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config: CheckerConfig = load_config(&cli.config)?;
    init_logging(&config.log);

    let cancel = CancellationToken::new();
    let exit = listen_for_shutdown(cancel.clone())?;
    run_redirect_checker(config, cancel).await?;

    let code = exit.exit_code();
    check_info!("Redirect checker stopped with code {}", code);
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}
