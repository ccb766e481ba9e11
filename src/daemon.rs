use std::io;
use std::net::SocketAddr;

use tokio::io::AsyncWrite;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::error::DaemonError;
use crate::executor::Executor;
use crate::server::Server;
use crate::workdir::WorkingDir;

/// A bound listener plus the executor it feeds, sharing one exit token
pub struct Daemon<W> {
    server: Server,
    executor: Executor<W>,
    exit: CancellationToken,
}

impl<W> Daemon<W>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    /// Bind `addr` and prepare an executor that writes command output to
    /// `output`, starting in `workdir`
    pub async fn bind(
        addr: SocketAddr,
        workdir: WorkingDir,
        show_commands: bool,
        output: W,
    ) -> Result<Self, DaemonError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let exit = CancellationToken::new();
        let server = Server::bind(addr, tx, exit.clone()).await?;
        let executor =
            Executor::new(rx, workdir, exit.clone(), output).show_commands(show_commands);
        Ok(Self {
            server,
            executor,
            exit,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.server.local_addr()
    }

    /// Cancelling this token stops both loops, same as an `EXIT` request
    pub fn exit_token(&self) -> CancellationToken {
        self.exit.clone()
    }

    /// Serve until exit, then wait for the in-flight command to finish
    pub async fn run(self) -> Result<Executor<W>, DaemonError> {
        // Cancels on any way out of the worker, panics included
        let stop_listener = self.exit.clone().drop_guard();
        let executor = self.executor;
        let worker = tokio::spawn(async move {
            let _stop_listener = stop_listener;
            executor.run().await
        });
        self.server.run().await;
        let executor = worker.await.map_err(DaemonError::Worker)?;
        info!("daemon stopped");
        Ok(executor)
    }
}
