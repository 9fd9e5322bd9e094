//! Matchmaking and signaling relay server for two-party WebRTC video chat.
//!
//! Pairs anonymous WebSocket clients into two-party rooms (random FIFO
//! matchmaking or named join-by-id rooms) and relays opaque signaling
//! payloads between the two members of a room. Media transport is
//! peer-to-peer and never reaches this server.

// layers
pub mod domain;
pub mod server;

// shared library
pub mod common;
