//! The signaling core: session registry, matchmaker, room directory and
//! relay resolution behind one owning struct.
//!
//! All operations take `&mut self` (or `&self` for pure lookups) and return
//! outcome values describing who must be notified; actually pushing
//! messages over the transport is the server layer's job. Serializing the
//! whole core behind a single mutex is what rules out the pairing races
//! (two clients matched into two rooms at once, a teardown overlapping a
//! relay).

use std::collections::{HashMap, VecDeque};

use serde::Serialize;

use crate::common::time::timestamp_to_jst_rfc3339;

use super::{
    error::SignalingError,
    room::{Room, RoomId, ROOM_CAPACITY},
    session::{ClientId, ClientSession, ClientStatus},
};

/// Result of a random-match request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    /// Rejected: the requester is already paired
    AlreadyInRoom(RoomId),
    /// Still in the waiting pool (first request or idempotent re-request)
    Waiting,
    /// Matched. `users` is in insertion order; the first entry is the
    /// designated offer initiator.
    Paired {
        room_id: RoomId,
        users: [ClientId; 2],
    },
}

/// Result of a named-room join request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    /// Rejected: the requester is already paired
    AlreadyInRoom(RoomId),
    /// The room did not exist; created it with the requester as sole member
    Created(RoomId),
    /// The requester completed the pair. `users` is in join order; the
    /// first entry (the room creator) is the designated offer initiator.
    Started {
        room_id: RoomId,
        users: Vec<ClientId>,
    },
    /// Rejected: the room already has two members. Nothing was mutated.
    Full(RoomId),
}

/// Result of a room teardown (explicit end-chat or disconnect).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomEnded {
    pub room_id: RoomId,
    /// The other members whose chat just ended (0 or 1 entries)
    pub notified: Vec<ClientId>,
}

/// Point-in-time view of one session, for the debug snapshot.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub id: ClientId,
    pub room: Option<RoomId>,
    pub connected_at: String,
}

/// Point-in-time view of one room, for the debug snapshot.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    pub id: RoomId,
    pub users: Vec<ClientId>,
    pub created_at: String,
}

/// Full state snapshot (sessions + rooms), sorted for stable output.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateSnapshot {
    pub connections: Vec<SessionSnapshot>,
    pub rooms: Vec<RoomSnapshot>,
}

/// Single source of truth for all matchmaking and signaling state.
///
/// Invariants maintained by every operation:
/// - a room never has more than [`ROOM_CAPACITY`] members
/// - every room member is a live session whose status points back at that
///   room (bidirectional consistency)
/// - the waiting pool holds only live, room-less sessions, in FIFO order
#[derive(Debug, Default)]
pub struct SignalingCore {
    sessions: HashMap<ClientId, ClientSession>,
    rooms: HashMap<RoomId, Room>,
    waiting: VecDeque<ClientId>,
}

impl SignalingCore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a newly connected client with no room.
    pub fn connect(&mut self, client_id: ClientId, connected_at: i64) -> Result<(), SignalingError> {
        if self.sessions.contains_key(&client_id) {
            return Err(SignalingError::AlreadyConnected(client_id));
        }
        self.sessions
            .insert(client_id.clone(), ClientSession::new(client_id, connected_at));
        Ok(())
    }

    /// Remove a client: drop its waiting-pool entry, tear down its room if
    /// it has one, then delete the session.
    ///
    /// Unknown ids are a silent no-op so that disconnect-after-cleanup
    /// races never escalate.
    pub fn disconnect(&mut self, client_id: &ClientId) -> Option<RoomEnded> {
        let session = self.sessions.get(client_id)?;
        let room_id = session.room().cloned();

        // The pool must never hold a dangling identifier
        self.waiting.retain(|id| id != client_id);

        let ended = room_id.map(|room_id| self.teardown_room(client_id, &room_id));
        self.sessions.remove(client_id);
        ended
    }

    /// Request a random partner (FIFO).
    ///
    /// The first two waiting clients pair, in arrival order; the pairing
    /// outcome is deterministic for a fixed arrival order.
    pub fn find_partner(
        &mut self,
        client_id: &ClientId,
        now: i64,
    ) -> Result<MatchOutcome, SignalingError> {
        let session = self
            .sessions
            .get(client_id)
            .ok_or_else(|| SignalingError::UnknownClient(client_id.clone()))?;
        match &session.status {
            ClientStatus::InRoom(room_id) => return Ok(MatchOutcome::AlreadyInRoom(room_id.clone())),
            // Idempotent re-request: one pool entry per client
            ClientStatus::Waiting => return Ok(MatchOutcome::Waiting),
            ClientStatus::Idle => {}
        }

        self.waiting.push_back(client_id.clone());
        self.set_status(client_id, ClientStatus::Waiting);

        if self.waiting.len() < ROOM_CAPACITY {
            return Ok(MatchOutcome::Waiting);
        }

        // Pair the two earliest-inserted waiters; the first becomes the
        // designated offer initiator.
        let (Some(first), Some(second)) = (self.waiting.pop_front(), self.waiting.pop_front())
        else {
            return Ok(MatchOutcome::Waiting);
        };
        let room_id = RoomId::generate();
        let mut room = Room::new(room_id.clone(), now);
        room.add_member(first.clone());
        room.add_member(second.clone());
        self.rooms.insert(room_id.clone(), room);
        self.set_status(&first, ClientStatus::InRoom(room_id.clone()));
        self.set_status(&second, ClientStatus::InRoom(room_id.clone()));

        Ok(MatchOutcome::Paired {
            room_id,
            users: [first, second],
        })
    }

    /// Create or join a named room by caller-supplied id.
    pub fn join_room(
        &mut self,
        client_id: &ClientId,
        room_id: RoomId,
        now: i64,
    ) -> Result<JoinOutcome, SignalingError> {
        let session = self
            .sessions
            .get(client_id)
            .ok_or_else(|| SignalingError::UnknownClient(client_id.clone()))?;
        if let ClientStatus::InRoom(current) = &session.status {
            // Must end the current chat first
            return Ok(JoinOutcome::AlreadyInRoom(current.clone()));
        }

        let Some(room) = self.rooms.get_mut(&room_id) else {
            let mut room = Room::new(room_id.clone(), now);
            room.add_member(client_id.clone());
            self.rooms.insert(room_id.clone(), room);
            self.waiting.retain(|id| id != client_id);
            self.set_status(client_id, ClientStatus::InRoom(room_id.clone()));
            return Ok(JoinOutcome::Created(room_id));
        };

        // Capacity is checked before anything mutates: a rejected requester
        // keeps its waiting-pool entry and status untouched.
        if !room.add_member(client_id.clone()) {
            return Ok(JoinOutcome::Full(room_id));
        }
        let users = room.members().to_vec();

        // A completed named-room join supersedes a pending random-match
        // request
        self.waiting.retain(|id| id != client_id);
        self.set_status(client_id, ClientStatus::InRoom(room_id.clone()));
        Ok(JoinOutcome::Started { room_id, users })
    }

    /// End the client's current chat, if any.
    ///
    /// Shares its teardown with [`SignalingCore::disconnect`]: the room is
    /// deleted entirely, never left with a lone member.
    pub fn end_chat(&mut self, client_id: &ClientId) -> Result<Option<RoomEnded>, SignalingError> {
        let session = self
            .sessions
            .get(client_id)
            .ok_or_else(|| SignalingError::UnknownClient(client_id.clone()))?;
        let Some(room_id) = session.room().cloned() else {
            return Ok(None);
        };
        Ok(Some(self.teardown_room(client_id, &room_id)))
    }

    /// Resolve the relay target for a signaling payload.
    ///
    /// Pure lookup: the payload itself never enters the core. Rejects when
    /// the supplied room id is not the sender's current room (stale
    /// reference from a just-ended chat), when the room record is gone, or
    /// when the sender is alone in the room.
    pub fn relay_target(
        &self,
        sender: &ClientId,
        room_id: &RoomId,
    ) -> Result<ClientId, SignalingError> {
        let session = self
            .sessions
            .get(sender)
            .ok_or_else(|| SignalingError::UnknownClient(sender.clone()))?;
        if session.room() != Some(room_id) {
            return Err(SignalingError::StaleRoom {
                client_id: sender.clone(),
                room_id: room_id.clone(),
            });
        }
        let room = self
            .rooms
            .get(room_id)
            .ok_or_else(|| SignalingError::RoomNotFound(room_id.clone()))?;
        room.partner_of(sender)
            .cloned()
            .ok_or_else(|| SignalingError::PartnerMissing(room_id.clone()))
    }

    pub fn session(&self, client_id: &ClientId) -> Option<&ClientSession> {
        self.sessions.get(client_id)
    }

    pub fn room(&self, room_id: &RoomId) -> Option<&Room> {
        self.rooms.get(room_id)
    }

    /// Identifiers of all connected clients (debug fan-out targets).
    pub fn connected_client_ids(&self) -> Vec<ClientId> {
        self.sessions.keys().cloned().collect()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn waiting_count(&self) -> usize {
        self.waiting.len()
    }

    /// Full state snapshot for the `debugInfo` broadcast and the HTTP
    /// debug endpoints, sorted by id for stable output.
    pub fn snapshot(&self) -> StateSnapshot {
        let mut connections: Vec<SessionSnapshot> = self
            .sessions
            .values()
            .map(|session| SessionSnapshot {
                id: session.id.clone(),
                room: session.room().cloned(),
                connected_at: timestamp_to_jst_rfc3339(session.connected_at),
            })
            .collect();
        connections.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));

        let mut rooms: Vec<RoomSnapshot> = self
            .rooms
            .values()
            .map(|room| RoomSnapshot {
                id: room.id.clone(),
                users: room.members().to_vec(),
                created_at: timestamp_to_jst_rfc3339(room.created_at),
            })
            .collect();
        rooms.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));

        StateSnapshot { connections, rooms }
    }

    /// Delete the room and reset every member's status. Invoked identically
    /// from explicit end-chat and from disconnect handling.
    fn teardown_room(&mut self, initiator: &ClientId, room_id: &RoomId) -> RoomEnded {
        let notified = match self.rooms.remove(room_id) {
            Some(room) => room.members_except(initiator),
            None => Vec::new(),
        };
        for member in &notified {
            self.set_status(member, ClientStatus::Idle);
        }
        self.set_status(initiator, ClientStatus::Idle);
        RoomEnded {
            room_id: room_id.clone(),
            notified,
        }
    }

    fn set_status(&mut self, client_id: &ClientId, status: ClientStatus) {
        if let Some(session) = self.sessions.get_mut(client_id) {
            session.status = status;
        }
    }
}
