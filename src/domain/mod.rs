//! Domain model of the matchmaking and signaling relay core.
//!
//! Everything in this layer is synchronous, pure state manipulation with no
//! transport concerns, which keeps the pairing rules easy to test. The
//! server layer owns the single [`SignalingCore`] behind a mutex and turns
//! the returned outcomes into WebSocket messages.

mod error;
mod room;
mod session;
mod signaling;

pub use error::SignalingError;
pub use room::{Room, RoomId, ROOM_CAPACITY};
pub use session::{ClientId, ClientSession, ClientStatus};
pub use signaling::{
    JoinOutcome, MatchOutcome, RoomEnded, RoomSnapshot, SessionSnapshot, SignalingCore,
    StateSnapshot,
};
