use std::path::PathBuf;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use urlcheck_app::{
    init_logging, listen_for_shutdown, load_config, run_notification_pusher, PusherConfig,
};
use urlcheck_logging::check_info;

/// Posts queued notifications to their callback URLs.
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
    let config: PusherConfig = load_config(&cli.config)?;
    init_logging(&config.log);

    let cancel = CancellationToken::new();
    let exit = listen_for_shutdown(cancel.clone())?;
    run_notification_pusher(config, cancel).await?;

    let code = exit.exit_code();
    check_info!("Notification pusher stopped with code {}", code);
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}
