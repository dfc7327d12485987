//! Server lifecycle
//!
//! Owns the listening socket, the shared client registry, the running flag
//! and the two loop tasks. `start` binds and spawns the loops; `stop`
//! signals them, joins them, then releases every socket exactly once.

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{error, info};
use tokio::net::{TcpListener, TcpSocket};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::client::ClientRegistry;
use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::relay::{AcceptLoop, MessageLoop};

/// Resources held only while the server is running.
struct ListenerState {
    listener: Arc<TcpListener>,
    local_addr: SocketAddr,
    accept_task: JoinHandle<()>,
    message_task: JoinHandle<()>,
}

pub struct Server {
    config: Arc<ServerConfig>,
    registry: Arc<ClientRegistry>,
    running: Arc<AtomicBool>,
    state: Mutex<Option<ListenerState>>,
}

impl Server {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config: Arc::new(config),
            registry: Arc::new(ClientRegistry::new()),
            running: Arc::new(AtomicBool::new(false)),
            state: Mutex::new(None),
        }
    }

    /// Binds the listener on `port` and starts the accept and message
    /// loops. Socket creation, bind and listen failures are reported as
    /// distinct errors; on any of them the server does not enter the
    /// running state and the partially created socket is released.
    pub async fn start(&self, port: u16) -> Result<(), ServerError> {
        let mut state = self.state.lock().await;
        if state.is_some() {
            return Err(ServerError::AlreadyRunning);
        }

        info!("Starting server on port {}", port);
        let listener = self.bind_listener(port)?;
        let local_addr = listener.local_addr().map_err(ServerError::Listen)?;
        let listener = Arc::new(listener);

        self.running.store(true, Ordering::SeqCst);

        let accept_loop = AcceptLoop::new(
            Arc::clone(&listener),
            Arc::clone(&self.registry),
            Arc::clone(&self.running),
            Arc::clone(&self.config),
        );
        let message_loop = MessageLoop::new(
            Arc::clone(&self.registry),
            Arc::clone(&self.running),
            Arc::clone(&self.config),
        );

        *state = Some(ListenerState {
            listener,
            local_addr,
            accept_task: tokio::spawn(accept_loop.run()),
            message_task: tokio::spawn(message_loop.run()),
        });

        info!("Server listening on {}", local_addr);
        Ok(())
    }

    fn bind_listener(&self, port: u16) -> Result<TcpListener, ServerError> {
        let ip: Ipv4Addr = self
            .config
            .bind_address
            .parse()
            .map_err(|_| ServerError::InvalidBindAddress(self.config.bind_address.clone()))?;
        let addr = SocketAddr::from((ip, port));

        let socket = TcpSocket::new_v4().map_err(ServerError::Socket)?;
        socket.set_reuseaddr(true).map_err(ServerError::Socket)?;
        socket.bind(addr).map_err(|e| ServerError::Bind(addr, e))?;
        socket.listen(self.config.backlog).map_err(ServerError::Listen)
    }

    /// Signals both loops to stop, joins them, then closes the listener and
    /// every client connection. Fails if the server is not running.
    pub async fn stop(&self) -> Result<(), ServerError> {
        let mut state = self.state.lock().await;
        let Some(running_state) = state.take() else {
            return Err(ServerError::NotRunning);
        };

        info!("Stopping server");
        self.running.store(false, Ordering::SeqCst);
        // Unblock the message loop's unbounded wait; the accept loop exits
        // within its bounded wait.
        self.registry.wake_waiters();

        if let Err(e) = running_state.accept_task.await {
            error!("Accept loop task failed: {}", e);
        }
        if let Err(e) = running_state.message_task.await {
            error!("Message loop task failed: {}", e);
        }

        drop(running_state.listener);
        self.registry.clear().await;

        info!("Server stopped");
        Ok(())
    }

    pub async fn is_running(&self) -> bool {
        self.state.lock().await.is_some()
    }

    /// Address the listener is bound to, while running. Useful when
    /// starting on port 0.
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        self.state.lock().await.as_ref().map(|s| s.local_addr)
    }

    /// Number of clients currently registered.
    pub async fn client_count(&self) -> usize {
        self.registry.len().await
    }
}
