use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::filter::LevelFilter;

use loterm::config::{Cli, Config, DEFAULT_PORT};
use loterm::daemon::Daemon;
use loterm::workdir::WorkingDir;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_cli(Cli::parse());
    init_tracing(config.show_logs);

    if let Some(ref raw) = config.rejected_port {
        warn!(port = %raw, fallback = DEFAULT_PORT, "the specified port isn't available, using default");
    }
    if !config.ignored_args.is_empty() {
        warn!(args = ?config.ignored_args, "ignoring extra arguments");
    }
    info!(port = config.port, "starting server");

    let daemon = Daemon::bind(
        config.listen_addr(),
        WorkingDir::from_home(),
        config.show_commands,
        tokio::io::stdout(),
    )
    .await?;

    let exit = daemon.exit_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupted, shutting down");
            exit.cancel();
        }
    });

    daemon.run().await?;
    Ok(())
}

fn init_tracing(enabled: bool) {
    let level = if enabled {
        LevelFilter::INFO
    } else {
        LevelFilter::OFF
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_max_level(level)
        .init();
}
