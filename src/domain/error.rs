//! Domain error types.

use thiserror::Error;

use super::{room::RoomId, session::ClientId};

/// Failures detected by the signaling core.
///
/// All of these are absorbed locally by the caller (logged, optionally
/// echoed back as a diagnostic message); none of them is fatal. Races
/// between a disconnect and an in-flight action are expected, so stale
/// references must be rejected quietly rather than raised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignalingError {
    /// Registry lookup miss, e.g. a late-arriving event after disconnect
    #[error("client '{0}' is not registered")]
    UnknownClient(ClientId),

    /// Duplicate connect with an identifier that is still live
    #[error("client '{0}' is already connected")]
    AlreadyConnected(ClientId),

    /// The supplied room id is not the sender's current room
    #[error("room '{room_id}' is not the current room of client '{client_id}'")]
    StaleRoom { client_id: ClientId, room_id: RoomId },

    /// The room record no longer exists
    #[error("room '{0}' does not exist")]
    RoomNotFound(RoomId),

    /// The sender is alone in the room, nobody to relay to
    #[error("no partner present in room '{0}'")]
    PartnerMissing(RoomId),
}
