//! WebSocket signaling server implementation.

mod event;
mod handler;
mod pusher;
mod runner;
mod shutdown;
mod state;

pub use event::{InboundEvent, OutboundEvent};
pub use pusher::{MessagePusher, PushError, PusherChannel, WebSocketMessagePusher};
pub use runner::{run_server, DEFAULT_PORT};
pub use state::AppState;
