use std::net::SocketAddr;
use std::time::Duration;

use futures_util::future::join_all;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout};

use relaycast::{Server, ServerConfig, ServerError};

fn test_config() -> ServerConfig {
    ServerConfig {
        bind_address: "127.0.0.1".to_string(),
        port: 0,
        max_clients: 64,
        backlog: 1024,
        buffer_size: 1024,
        accept_wait_secs: 1,
        loop_pause_ms: 5,
    }
}

// Start a server on an ephemeral port and return it with its bound address.
async fn start_server(config: ServerConfig) -> (Server, SocketAddr) {
    let server = Server::new(config);
    server.start(0).await.expect("server should start");
    let addr = server.local_addr().await.expect("server should be bound");
    (server, addr)
}

async fn connect(addr: SocketAddr) -> TcpStream {
    TcpStream::connect(addr).await.expect("failed to connect")
}

// Poll until the registry holds exactly `expected` clients.
async fn wait_for_clients(server: &Server, expected: usize) {
    timeout(Duration::from_secs(5), async {
        while server.client_count().await != expected {
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap_or_else(|_| {
        panic!("timed out waiting for {} registered client(s)", expected);
    });
}

// One bounded read, failing the test if nothing arrives in time.
async fn recv(stream: &mut TcpStream) -> Vec<u8> {
    let mut buf = [0u8; 1024];
    let n = timeout(Duration::from_secs(5), stream.read(&mut buf))
        .await
        .expect("timed out waiting for a relayed message")
        .expect("read failed");
    buf[..n].to_vec()
}

#[tokio::test]
async fn test_connect_registers_client() {
    let (server, addr) = start_server(test_config()).await;

    let _client = connect(addr).await;
    wait_for_clients(&server, 1).await;

    server.stop().await.unwrap();
}

#[tokio::test]
async fn test_broadcast_reaches_all_clients_including_sender() {
    let (server, addr) = start_server(test_config()).await;

    let mut sender = connect(addr).await;
    let mut receiver = connect(addr).await;
    wait_for_clients(&server, 2).await;

    sender.write_all(b"hello").await.unwrap();

    // Byte-for-byte relay to every client, echo to the sender included.
    assert_eq!(recv(&mut receiver).await, b"hello");
    assert_eq!(recv(&mut sender).await, b"hello");

    server.stop().await.unwrap();
}

#[tokio::test]
async fn test_no_retroactive_delivery_to_late_joiner() {
    let (server, addr) = start_server(test_config()).await;

    let mut first = connect(addr).await;
    wait_for_clients(&server, 1).await;

    first.write_all(b"hello").await.unwrap();
    assert_eq!(recv(&mut first).await, b"hello");

    let mut second = connect(addr).await;
    wait_for_clients(&server, 2).await;

    first.write_all(b"world").await.unwrap();
    // The late joiner sees only messages sent after it was registered.
    assert_eq!(recv(&mut second).await, b"world");

    server.stop().await.unwrap();
}

#[tokio::test]
async fn test_disconnect_removes_client() {
    let (server, addr) = start_server(test_config()).await;

    let _kept = connect(addr).await;
    let dropped = connect(addr).await;
    wait_for_clients(&server, 2).await;

    drop(dropped);
    wait_for_clients(&server, 1).await;

    server.stop().await.unwrap();
}

#[tokio::test]
async fn test_stop_when_not_running_fails() {
    let server = Server::new(test_config());
    assert!(matches!(server.stop().await, Err(ServerError::NotRunning)));
}

#[tokio::test]
async fn test_stop_releases_listener_and_clients() {
    let (server, addr) = start_server(test_config()).await;

    let mut client = connect(addr).await;
    wait_for_clients(&server, 1).await;

    server.stop().await.unwrap();
    assert!(!server.is_running().await);
    assert!(matches!(server.stop().await, Err(ServerError::NotRunning)));

    // The client's connection was closed by the shutdown.
    let mut buf = [0u8; 16];
    match timeout(Duration::from_secs(5), client.read(&mut buf)).await {
        Ok(Ok(0)) | Ok(Err(_)) => {}
        Ok(Ok(n)) => panic!("expected a closed connection, read {} bytes", n),
        Err(_) => panic!("timed out waiting for the connection to close"),
    }

    // The listening socket was released.
    assert!(TcpStream::connect(addr).await.is_err());
}

#[tokio::test]
async fn test_restart_on_same_port() {
    let (server, addr) = start_server(test_config()).await;
    server.stop().await.unwrap();

    server.start(addr.port()).await.expect("restart should succeed");
    let _client = connect(addr).await;
    wait_for_clients(&server, 1).await;

    server.stop().await.unwrap();
}

#[tokio::test]
async fn test_burst_of_concurrent_connections() {
    let (server, addr) = start_server(test_config()).await;

    let results = join_all((0..50).map(|_| TcpStream::connect(addr))).await;
    let clients: Vec<TcpStream> = results
        .into_iter()
        .map(|r| r.expect("connect failed during burst"))
        .collect();

    wait_for_clients(&server, clients.len()).await;

    server.stop().await.unwrap();
}

#[tokio::test]
async fn test_send_failure_does_not_abort_broadcast() {
    let (server, addr) = start_server(test_config()).await;

    let mut sender = connect(addr).await;
    let mut receiver = connect(addr).await;
    let aborted = connect(addr).await;
    wait_for_clients(&server, 3).await;

    // Abrupt close: linger 0 makes the drop reset the connection, so the
    // next send to it fails instead of buffering.
    aborted.set_linger(Some(Duration::ZERO)).unwrap();
    drop(aborted);

    sender.write_all(b"payload").await.unwrap();
    assert_eq!(recv(&mut receiver).await, b"payload");
    assert_eq!(recv(&mut sender).await, b"payload");

    server.stop().await.unwrap();
}

#[tokio::test]
async fn test_rejects_connections_over_client_limit() {
    let config = ServerConfig {
        max_clients: 1,
        ..test_config()
    };
    let (server, addr) = start_server(config).await;

    let mut kept = connect(addr).await;
    wait_for_clients(&server, 1).await;

    // The second connection is accepted by the OS, then closed by the server.
    let mut rejected = connect(addr).await;
    let mut buf = [0u8; 16];
    match timeout(Duration::from_secs(5), rejected.read(&mut buf)).await {
        Ok(Ok(0)) | Ok(Err(_)) => {}
        Ok(Ok(n)) => panic!("expected rejection, read {} bytes", n),
        Err(_) => panic!("timed out waiting for the rejection"),
    }
    assert_eq!(server.client_count().await, 1);

    // The registered client is unaffected.
    kept.write_all(b"still here").await.unwrap();
    assert_eq!(recv(&mut kept).await, b"still here");

    server.stop().await.unwrap();
}
