use clap::Parser;
use tracing::error;

use loterm::client::send_request;

/// Send requests to a loterm daemon, one connection each
#[derive(Debug, Parser)]
#[command(name = "loterm-send", version)]
struct Args {
    /// Daemon address
    #[arg(long, default_value = "127.0.0.1:8080")]
    addr: String,

    /// Requests such as "RUNecho hi", "MOVE /tmp" or "EXIT"
    #[arg(required = true, allow_hyphen_values = true)]
    requests: Vec<String>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let args = Args::parse();
    let mut failed = false;
    for (i, request) in args.requests.iter().enumerate() {
        if let Err(e) = send_request(args.addr.as_str(), request).await {
            error!(request = i, addr = %args.addr, err = %e, "failed to send request");
            failed = true;
        }
    }
    if failed {
        std::process::exit(1);
    }
}
