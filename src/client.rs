use tokio::io::AsyncWriteExt;
use tokio::net::{TcpStream, ToSocketAddrs};

use crate::error::FrameError;
use crate::wire::write_frame;

/// Send one request over a fresh connection, then close it.
/// The daemon never answers, so nothing is read back.
pub async fn send_request<A>(addr: A, request: &str) -> Result<(), FrameError>
where
    A: ToSocketAddrs,
{
    let mut stream = TcpStream::connect(addr).await?;
    write_frame(&mut stream, request).await?;
    stream.shutdown().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_send_request_writes_prefixed_frame() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let reader = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut bytes = Vec::new();
            stream.read_to_end(&mut bytes).await.unwrap();
            bytes
        });

        send_request(addr, "RUN\0").await.unwrap();
        assert_eq!(
            reader.await.unwrap(),
            vec![0x00, 0x05, b'R', b'U', b'N', 0xC0, 0x80]
        );
    }

    #[tokio::test]
    async fn test_send_request_to_closed_port_fails() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        assert!(matches!(
            send_request(addr, "EXIT").await,
            Err(FrameError::Io(_))
        ));
    }
}
