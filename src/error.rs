use std::fmt;
use std::io;
use std::net::SocketAddr;

/// Failure to decode or encode a single length-prefixed request frame
#[derive(Debug)]
pub enum FrameError {
    Io(io::Error),
    /// The peer closed the connection before the announced length was read
    Truncated { expected: usize, received: usize },
    /// A byte sequence that is not valid modified UTF-8
    Malformed { offset: usize },
    /// The encoded string does not fit a 16-bit length prefix
    TooLong(usize),
    /// Decoded UTF-16 contains an unpaired surrogate
    InvalidUtf16,
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::Io(e) => write!(f, "frame I/O error: {}", e),
            FrameError::Truncated { expected, received } => write!(
                f,
                "connection closed after {} of {} frame bytes",
                received, expected
            ),
            FrameError::Malformed { offset } => {
                write!(f, "malformed modified UTF-8 at byte {}", offset)
            }
            FrameError::TooLong(len) => {
                write!(f, "encoded string is {} bytes, limit is 65535", len)
            }
            FrameError::InvalidUtf16 => write!(f, "string contains an unpaired surrogate"),
        }
    }
}

impl std::error::Error for FrameError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FrameError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for FrameError {
    fn from(err: io::Error) -> Self {
        FrameError::Io(err)
    }
}

/// Failure while running a shell command
#[derive(Debug)]
pub enum ExecError {
    Spawn(io::Error),
    /// Forwarding subprocess output failed
    Io(io::Error),
    Wait(io::Error),
}

impl fmt::Display for ExecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecError::Spawn(e) => write!(f, "Failed to spawn command: {}", e),
            ExecError::Io(e) => write!(f, "Failed to forward command output: {}", e),
            ExecError::Wait(e) => write!(f, "Failed waiting for command: {}", e),
        }
    }
}

impl std::error::Error for ExecError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExecError::Spawn(e) | ExecError::Io(e) | ExecError::Wait(e) => Some(e),
        }
    }
}

/// Errors that stop the daemon
#[derive(Debug)]
pub enum DaemonError {
    Bind { addr: SocketAddr, source: io::Error },
    /// The executor task panicked or was aborted
    Worker(tokio::task::JoinError),
}

impl fmt::Display for DaemonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DaemonError::Bind { addr, source } => {
                write!(f, "Failed to listen on {}: {}", addr, source)
            }
            DaemonError::Worker(e) => write!(f, "Executor stopped unexpectedly: {}", e),
        }
    }
}

impl std::error::Error for DaemonError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DaemonError::Bind { source, .. } => Some(source),
            DaemonError::Worker(e) => Some(e),
        }
    }
}
