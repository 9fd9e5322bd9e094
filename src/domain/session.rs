//! Client session model.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::room::RoomId;

/// Opaque identifier of one connected client.
///
/// Assigned by the server at connect time and stable for the lifetime of the
/// connection; never reused (UUID v4).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(String);

impl ClientId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Generate a fresh identifier for a newly accepted connection.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Explicit per-client state machine.
///
/// Transitions:
/// - `Idle -> Waiting` on a random-match request
/// - `Idle | Waiting -> InRoom` on pairing or named-room join (a `Waiting`
///   client's pool entry is dropped when the join completes)
/// - `InRoom -> Idle` on chat end / partner loss
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientStatus {
    /// Connected, not waiting and not paired
    Idle,
    /// In the waiting pool for a random partner
    Waiting,
    /// Member of the room with the given id
    InRoom(RoomId),
}

/// One connected client as tracked by the session registry.
#[derive(Debug, Clone)]
pub struct ClientSession {
    pub id: ClientId,
    pub status: ClientStatus,
    /// Unix timestamp when connected (JST, milliseconds); informational
    pub connected_at: i64,
}

impl ClientSession {
    pub fn new(id: ClientId, connected_at: i64) -> Self {
        Self {
            id,
            status: ClientStatus::Idle,
            connected_at,
        }
    }

    /// Current room, if any.
    pub fn room(&self) -> Option<&RoomId> {
        match &self.status {
            ClientStatus::InRoom(room_id) => Some(room_id),
            _ => None,
        }
    }
}
