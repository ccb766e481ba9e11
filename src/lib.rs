//! Remote command-execution daemon.
//!
//! A TCP listener decodes one length-prefixed request per connection and
//! queues it; a single executor drains the queue, running `RUN` commands
//! through the host shell in a server-held working directory, switching
//! that directory on `MOVE`, and stopping everything on `EXIT`.

pub mod client;
pub mod config;
pub mod daemon;
pub mod error;
pub mod executor;
pub mod request;
pub mod server;
pub mod wire;
pub mod workdir;
