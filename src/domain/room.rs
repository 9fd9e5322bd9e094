//! Room model: the two-party pairing unit.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::session::ClientId;

/// A room never holds more than two members.
pub const ROOM_CAPACITY: usize = 2;

/// Room identifier.
///
/// Matchmade rooms get a generated UUID; named rooms carry the
/// caller-supplied string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Generate an identifier for a matchmade room.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One two-party pairing.
///
/// Member order is join order; the first member is the designated offer
/// initiator by convention. The convention is consumed by the clients, not
/// interpreted here, but the ordering contract must hold.
#[derive(Debug, Clone)]
pub struct Room {
    pub id: RoomId,
    members: Vec<ClientId>,
    /// Unix timestamp when created (JST, milliseconds); informational
    pub created_at: i64,
}

impl Room {
    pub fn new(id: RoomId, created_at: i64) -> Self {
        Self {
            id,
            members: Vec::with_capacity(ROOM_CAPACITY),
            created_at,
        }
    }

    /// Members in join order.
    pub fn members(&self) -> &[ClientId] {
        &self.members
    }

    pub fn is_full(&self) -> bool {
        self.members.len() >= ROOM_CAPACITY
    }

    pub fn contains(&self, client_id: &ClientId) -> bool {
        self.members.iter().any(|id| id == client_id)
    }

    /// Append a member, preserving join order.
    ///
    /// Returns `false` without mutating when the room is already full.
    pub fn add_member(&mut self, client_id: ClientId) -> bool {
        if self.is_full() {
            return false;
        }
        self.members.push(client_id);
        true
    }

    /// The other member of the room, if present.
    pub fn partner_of(&self, client_id: &ClientId) -> Option<&ClientId> {
        self.members.iter().find(|id| *id != client_id)
    }

    /// Members other than the given one (0 or 1 entries for a ≤2 room).
    pub fn members_except(&self, client_id: &ClientId) -> Vec<ClientId> {
        self.members
            .iter()
            .filter(|id| *id != client_id)
            .cloned()
            .collect()
    }
}
