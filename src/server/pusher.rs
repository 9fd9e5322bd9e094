//! Message delivery to connected clients.
//!
//! The WebSocket itself is created in the handler layer; this module only
//! manages the per-client sender channels and pushes serialized events into
//! them. Sends are fire-and-forget: a failed push is logged and absorbed, a
//! slow or dead peer never stalls matchmaking or relay for other pairs.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{mpsc, Mutex};

use crate::domain::ClientId;

/// Channel feeding one client's WebSocket writer task.
pub type PusherChannel = mpsc::UnboundedSender<String>;

/// Failure to deliver a message to one client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PushError {
    #[error("client '{0}' has no registered channel")]
    NotConnected(ClientId),
    #[error("channel for client '{0}' is closed")]
    ChannelClosed(ClientId),
}

/// Transport seam between the signaling logic and the WebSocket layer.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// Register a freshly connected client's sender channel.
    async fn register(&self, client_id: ClientId, sender: PusherChannel);

    /// Drop a disconnected client's sender channel.
    async fn unregister(&self, client_id: &ClientId);

    /// Deliver one serialized event to one client.
    async fn push_to(&self, client_id: &ClientId, content: &str) -> Result<(), PushError>;

    /// Deliver one serialized event to several clients, tolerating partial
    /// failure.
    async fn broadcast(&self, targets: Vec<ClientId>, content: &str);
}

/// [`MessagePusher`] over the shared map of WebSocket sender channels.
pub struct WebSocketMessagePusher {
    clients: Mutex<HashMap<ClientId, PusherChannel>>,
}

impl WebSocketMessagePusher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            clients: Mutex::new(HashMap::new()),
        })
    }
}

#[async_trait]
impl MessagePusher for WebSocketMessagePusher {
    async fn register(&self, client_id: ClientId, sender: PusherChannel) {
        let mut clients = self.clients.lock().await;
        tracing::debug!("Registered channel for client '{}'", client_id);
        clients.insert(client_id, sender);
    }

    async fn unregister(&self, client_id: &ClientId) {
        let mut clients = self.clients.lock().await;
        clients.remove(client_id);
        tracing::debug!("Unregistered channel for client '{}'", client_id);
    }

    async fn push_to(&self, client_id: &ClientId, content: &str) -> Result<(), PushError> {
        let clients = self.clients.lock().await;
        let sender = clients
            .get(client_id)
            .ok_or_else(|| PushError::NotConnected(client_id.clone()))?;
        sender
            .send(content.to_string())
            .map_err(|_| PushError::ChannelClosed(client_id.clone()))
    }

    async fn broadcast(&self, targets: Vec<ClientId>, content: &str) {
        let clients = self.clients.lock().await;
        for target in targets {
            match clients.get(&target) {
                Some(sender) => {
                    if sender.send(content.to_string()).is_err() {
                        tracing::warn!("Failed to push broadcast to client '{}'", target);
                    }
                }
                None => {
                    tracing::warn!("Client '{}' not found during broadcast, skipping", target);
                }
            }
        }
    }
}
