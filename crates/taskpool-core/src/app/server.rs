//! Server - accept loop.
//!
//! One spawned task per connection. The loop itself never waits on a
//! handler: it allocates the client id, spawns, and goes back to `accept`.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Mutex, watch};

use crate::app::connection::ConnectionHandler;
use crate::app::registry::TaskRegistry;
use crate::domain::ClientId;
use crate::error::ServerError;

/// Pause after a failed accept (e.g. out of file descriptors) before retrying.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Monotonic client id source. Ids are never reused, even after disconnect.
pub struct ClientIdAllocator {
    next: Mutex<ClientId>,
}

impl ClientIdAllocator {
    pub fn new() -> Self {
        Self {
            next: Mutex::new(ClientId::FIRST),
        }
    }

    pub async fn allocate(&self) -> ClientId {
        let mut next = self.next.lock().await;
        let id = *next;
        *next = id.next();
        id
    }
}

impl Default for ClientIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Server {
    listener: TcpListener,
    registry: Arc<TaskRegistry>,
    client_ids: ClientIdAllocator,
}

impl Server {
    pub async fn bind(addr: SocketAddr, registry: Arc<TaskRegistry>) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;
        Ok(Self {
            listener,
            registry,
            client_ids: ClientIdAllocator::new(),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections until `shutdown` flips to `true` (or its sender is dropped).
    ///
    /// Connections already being served are not interrupted.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        match self.listener.local_addr() {
            Ok(addr) => tracing::info!(addr = %addr, "task server listening"),
            Err(err) => tracing::warn!(error = %err, "task server listening on unknown address"),
        }

        loop {
            if *shutdown.borrow() {
                break;
            }

            let accepted = tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    continue;
                }
                accepted = self.listener.accept() => accepted,
            };

            match accepted {
                Ok((stream, peer)) => self.spawn_handler(stream, peer).await,
                Err(err) => {
                    tracing::warn!(error = %err, "accept failed");
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                }
            }
        }

        tracing::info!("task server stopped accepting connections");
    }

    async fn spawn_handler(&self, stream: TcpStream, peer: SocketAddr) {
        let client_id = self.client_ids.allocate().await;
        tracing::info!(client_id = %client_id, peer = %peer, "client connected");

        let handler = ConnectionHandler::new(stream, client_id, Arc::clone(&self.registry));
        tokio::spawn(async move {
            match handler.run().await {
                Ok(()) => tracing::info!(client_id = %client_id, "client disconnected"),
                Err(err) => {
                    tracing::warn!(client_id = %client_id, error = %err, "connection closed on I/O error");
                }
            }
        });
    }
}
