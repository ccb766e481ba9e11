use std::io;
use std::net::SocketAddr;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::DaemonError;
use crate::wire::read_frame;

/// Sending end of the command queue
pub type CommandSender = mpsc::UnboundedSender<String>;

/// Accepts one connection at a time and pushes its single request onto the
/// command queue. Never waits on command execution.
pub struct Server {
    listener: TcpListener,
    queue: CommandSender,
    exit: CancellationToken,
}

impl Server {
    /// Bind the listening socket. Failing here is fatal for the daemon.
    pub async fn bind(
        addr: SocketAddr,
        queue: CommandSender,
        exit: CancellationToken,
    ) -> Result<Self, DaemonError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| DaemonError::Bind { addr, source })?;
        Ok(Self {
            listener,
            queue,
            exit,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections until the exit token is cancelled
    pub async fn run(self) {
        if let Ok(addr) = self.local_addr() {
            info!(%addr, "waiting for connections");
        }

        loop {
            let accepted = tokio::select! {
                biased;
                () = self.exit.cancelled() => break,
                accepted = self.listener.accept() => accepted,
            };

            let (stream, peer) = match accepted {
                Ok(accepted) => accepted,
                Err(e) => {
                    warn!(err = %e, "accept failed");
                    continue;
                }
            };

            // A client that never finishes its request must not hold up exit
            tokio::select! {
                biased;
                () = self.exit.cancelled() => {
                    info!(%peer, "exiting, dropping unread connection");
                    break;
                }
                () = handle_connection(stream, peer, &self.queue) => {}
            }
        }
        info!("listener stopped");
    }
}

/// Read exactly one request, enqueue it, and drop the connection
async fn handle_connection(mut stream: TcpStream, peer: SocketAddr, queue: &CommandSender) {
    info!(%peer, "connection received");
    let request = match read_frame(&mut stream).await {
        Ok(request) => request,
        Err(e) => {
            warn!(%peer, err = %e, "dropping connection");
            return;
        }
    };

    info!(%peer, %request, "received request");
    if queue.send(request).is_err() {
        warn!(%peer, "executor is no longer running, request discarded");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::time::timeout;

    use crate::client::send_request;

    async fn start() -> (SocketAddr, mpsc::UnboundedReceiver<String>, CancellationToken) {
        let (tx, rx) = mpsc::unbounded_channel();
        let exit = CancellationToken::new();
        let server = Server::bind("127.0.0.1:0".parse().unwrap(), tx, exit.clone())
            .await
            .unwrap();
        let addr = server.local_addr().unwrap();
        tokio::spawn(server.run());
        (addr, rx, exit)
    }

    #[tokio::test]
    async fn test_enqueues_one_request_per_connection() {
        let (addr, mut rx, _exit) = start().await;
        send_request(addr, "RUNecho one").await.unwrap();
        send_request(addr, "MOVE /tmp").await.unwrap();

        assert_eq!(rx.recv().await.unwrap(), "RUNecho one");
        assert_eq!(rx.recv().await.unwrap(), "MOVE /tmp");
    }

    #[tokio::test]
    async fn test_closes_connection_after_request() {
        let (addr, mut rx, _exit) = start().await;
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(&[0x00, 0x04]).await.unwrap();
        stream.write_all(b"EXIT").await.unwrap();

        let mut buf = [0u8; 1];
        let n = timeout(Duration::from_secs(5), stream.read(&mut buf))
            .await
            .unwrap()
            .unwrap_or(0);
        assert_eq!(n, 0);
        assert_eq!(rx.recv().await.unwrap(), "EXIT");
    }

    #[tokio::test]
    async fn test_survives_truncated_request() {
        let (addr, mut rx, _exit) = start().await;
        {
            let mut stream = TcpStream::connect(addr).await.unwrap();
            stream.write_all(&[0x00, 0x10, b'R']).await.unwrap();
        }
        send_request(addr, "RUNecho ok").await.unwrap();

        assert_eq!(rx.recv().await.unwrap(), "RUNecho ok");
    }

    #[tokio::test]
    async fn test_survives_malformed_request() {
        let (addr, mut rx, _exit) = start().await;
        {
            let mut stream = TcpStream::connect(addr).await.unwrap();
            stream.write_all(&[0x00, 0x02, 0xFF, 0xFF]).await.unwrap();
        }
        send_request(addr, "EXIT").await.unwrap();

        assert_eq!(rx.recv().await.unwrap(), "EXIT");
    }

    #[tokio::test]
    async fn test_stops_accepting_after_exit() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let exit = CancellationToken::new();
        let server = Server::bind("127.0.0.1:0".parse().unwrap(), tx, exit.clone())
            .await
            .unwrap();
        let handle = tokio::spawn(server.run());

        exit.cancel();
        timeout(Duration::from_secs(5), handle).await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_exit_interrupts_connection_that_never_sends() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let exit = CancellationToken::new();
        let server = Server::bind("127.0.0.1:0".parse().unwrap(), tx, exit.clone())
            .await
            .unwrap();
        let addr = server.local_addr().unwrap();
        let handle = tokio::spawn(server.run());

        let _silent = TcpStream::connect(addr).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        exit.cancel();
        timeout(Duration::from_secs(5), handle).await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_bind_conflict_is_bind_error() {
        let (addr, _rx, _exit) = start().await;
        let (tx, _rx2) = mpsc::unbounded_channel();
        let result = Server::bind(addr, tx, CancellationToken::new()).await;
        assert!(matches!(result, Err(DaemonError::Bind { .. })));
    }
}
