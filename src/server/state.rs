//! Shared server state.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::domain::SignalingCore;

use super::pusher::MessagePusher;

/// Shared application state.
///
/// The whole signaling core sits behind one coarse mutex: handlers are
/// short and the event volume is low, so serializing every mutation is the
/// simplest way to keep the waiting pool, room directory and session
/// registry mutually consistent. Message delivery goes through the pusher
/// and never holds the core lock.
pub struct AppState {
    pub core: Mutex<SignalingCore>,
    pub pusher: Arc<dyn MessagePusher>,
}

impl AppState {
    pub fn new(pusher: Arc<dyn MessagePusher>) -> Arc<Self> {
        Arc::new(Self {
            core: Mutex::new(SignalingCore::new()),
            pusher,
        })
    }
}
