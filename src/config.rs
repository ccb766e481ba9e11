use std::net::{Ipv4Addr, SocketAddr};

use clap::Parser;

/// Port used when the argument is missing, non-numeric or out of range
pub const DEFAULT_PORT: u16 = 8080;

const MIN_PORT: i64 = 1;
const MAX_PORT: i64 = 9998;

/// Positional arguments. Every value is accepted; unusable ones fall back
/// to defaults instead of aborting startup.
#[derive(Debug, Parser)]
#[command(name = "loterm", about = "Run shell commands sent over TCP", version)]
pub struct Cli {
    /// Port to listen on (1-9998, default 8080)
    #[arg(allow_hyphen_values = true)]
    pub port: Option<String>,

    /// "yes" echoes each RUN command line before running it
    #[arg(allow_hyphen_values = true)]
    pub show_commands: Option<String>,

    /// "no" turns logging off
    #[arg(allow_hyphen_values = true)]
    pub show_logs: Option<String>,

    /// Anything after the three known arguments is ignored
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, hide = true)]
    pub rest: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
    pub show_commands: bool,
    pub show_logs: bool,
    /// Port argument that was rejected in favour of `DEFAULT_PORT`
    pub rejected_port: Option<String>,
    /// Extra arguments that were ignored
    pub ignored_args: Vec<String>,
}

impl Config {
    pub fn from_cli(cli: Cli) -> Self {
        let (port, rejected_port) = match cli.port {
            Some(raw) => match parse_port(&raw) {
                Some(port) => (port, None),
                None => (DEFAULT_PORT, Some(raw)),
            },
            None => (DEFAULT_PORT, None),
        };

        Self {
            port,
            show_commands: cli.show_commands.as_deref() == Some("yes"),
            show_logs: cli.show_logs.as_deref() != Some("no"),
            rejected_port,
            ignored_args: cli.rest,
        }
    }

    /// Listen on every interface
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.port))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            show_commands: false,
            show_logs: true,
            rejected_port: None,
            ignored_args: Vec::new(),
        }
    }
}

/// Accept only integers in 1..=9998
pub fn parse_port(raw: &str) -> Option<u16> {
    let port: i64 = raw.parse().ok()?;
    if (MIN_PORT..=MAX_PORT).contains(&port) {
        u16::try_from(port).ok()
    } else {
        None
    }
}
