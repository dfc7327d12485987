//! Client connection handle
//!
//! Wraps one accepted TCP socket behind a cheaply cloneable handle so the
//! registry, the multiplexer and the broadcaster can all refer to the same
//! socket. The socket is closed when the last clone is dropped.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpStream;

/// One accepted client socket, identified by its peer address.
#[derive(Clone, Debug)]
pub struct Connection {
    stream: Arc<TcpStream>,
    peer: SocketAddr,
}

impl Connection {
    pub fn new(stream: TcpStream, peer: SocketAddr) -> Self {
        Self {
            stream: Arc::new(stream),
            peer,
        }
    }

    /// Peer address, used as the connection's unique handle.
    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// Waits until the socket is ready for read.
    pub async fn readable(&self) -> io::Result<()> {
        self.stream.readable().await
    }

    /// Non-blocking bounded read into `buf`. Returns `Ok(0)` on a graceful
    /// peer close and `WouldBlock` on spurious readiness.
    pub fn try_read(&self, buf: &mut [u8]) -> io::Result<usize> {
        self.stream.try_read(buf)
    }

    /// Writes the whole of `data` to the peer, waiting for writability
    /// between partial writes. Blocks as long as the peer keeps the socket
    /// open but stops reading; there is no per-send timeout.
    pub async fn send(&self, mut data: &[u8]) -> io::Result<()> {
        while !data.is_empty() {
            self.stream.writable().await?;
            match self.stream.try_write(data) {
                Ok(n) => data = &data[n..],
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}
