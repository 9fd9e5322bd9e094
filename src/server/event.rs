//! Wire format of the WebSocket protocol.
//!
//! One JSON text message per event, tagged by a camelCase `type` field. The
//! `signal` payload is application-opaque: the server carries it as a raw
//! [`serde_json::Value`] and never looks inside.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{ClientId, RoomId, RoomSnapshot, SessionSnapshot};

/// Events received from a client.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum InboundEvent {
    /// Request a random partner
    FindPartner,
    /// Create or join a named room
    #[serde(rename_all = "camelCase")]
    JoinSpecificRoom { room_id: String },
    /// Relay an opaque signaling payload to the room partner
    #[serde(rename_all = "camelCase")]
    Signal { room_id: String, signal: Value },
    /// End the current chat
    EndChat,
}

/// Events pushed to a client.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum OutboundEvent {
    /// Sent once right after the upgrade, carrying the server-assigned id
    #[serde(rename_all = "camelCase")]
    Connected { client_id: ClientId },
    /// Still in the waiting pool
    Waiting,
    /// The room now has two members; the first user is the designated
    /// offer initiator
    #[serde(rename_all = "camelCase")]
    ChatStart {
        room_id: RoomId,
        users: Vec<ClientId>,
    },
    /// Created (or alone in) a named room
    #[serde(rename_all = "camelCase")]
    WaitingInRoom { room_id: RoomId },
    /// Named-room join rejected: the room already has two members
    #[serde(rename_all = "camelCase")]
    RoomFull { room_id: RoomId },
    /// The partner ended the chat or disconnected
    ChatEnded,
    /// Relayed signaling payload
    Signal { signal: Value, from: ClientId },
    /// Human-readable diagnostic string
    Debug { message: String },
    /// Aggregate state snapshot, broadcast after each mutation
    #[serde(rename_all = "camelCase")]
    DebugInfo {
        connections: Vec<SessionSnapshot>,
        rooms: Vec<RoomSnapshot>,
        timestamp: String,
    },
}

impl OutboundEvent {
    /// Serialize for the wire. The enum contains nothing that can fail to
    /// serialize, so a failure is reported as an error log, not a panic.
    pub fn to_json(&self) -> Option<String> {
        match serde_json::to_string(self) {
            Ok(json) => Some(json),
            Err(e) => {
                tracing::error!("Failed to serialize outbound event: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inbound_find_partner_parses() {
        // テスト項目: findPartner イベントがパースできる
        // given (前提条件):
        let json = r#"{"type":"findPartner"}"#;

        // when (操作):
        let event: InboundEvent = serde_json::from_str(json).unwrap();

        // then (期待する結果):
        assert!(matches!(event, InboundEvent::FindPartner));
    }

    #[test]
    fn test_inbound_signal_keeps_payload_opaque() {
        // テスト項目: signal の中身が解釈されずにそのまま保持される
        // given (前提条件):
        let json = r#"{"type":"signal","roomId":"room1","signal":{"sdp":"v=0","kind":"offer"}}"#;

        // when (操作):
        let event: InboundEvent = serde_json::from_str(json).unwrap();

        // then (期待する結果):
        let InboundEvent::Signal { room_id, signal } = event else {
            panic!("expected signal event");
        };
        assert_eq!(room_id, "room1");
        assert_eq!(signal["sdp"], "v=0");
        assert_eq!(signal["kind"], "offer");
    }

    #[test]
    fn test_inbound_unknown_type_is_an_error() {
        // テスト項目: 未知のイベント種別はパースエラーになる
        // given (前提条件):
        let json = r#"{"type":"selfDestruct"}"#;

        // when (操作):
        let result = serde_json::from_str::<InboundEvent>(json);

        // then (期待する結果):
        assert!(result.is_err());
    }

    #[test]
    fn test_outbound_chat_start_uses_camel_case_tag_and_fields() {
        // テスト項目: chatStart が仕様どおりの camelCase で出力される
        // given (前提条件):
        let event = OutboundEvent::ChatStart {
            room_id: RoomId::new("room1"),
            users: vec![ClientId::new("a"), ClientId::new("b")],
        };

        // when (操作):
        let json: Value = serde_json::from_str(&event.to_json().unwrap()).unwrap();

        // then (期待する結果): users は参加順（先頭が initiator）
        assert_eq!(json["type"], "chatStart");
        assert_eq!(json["roomId"], "room1");
        assert_eq!(json["users"][0], "a");
        assert_eq!(json["users"][1], "b");
    }

    #[test]
    fn test_outbound_relayed_signal_carries_sender() {
        // テスト項目: リレーされた signal に from が付与される
        // given (前提条件):
        let event = OutboundEvent::Signal {
            signal: serde_json::json!({"candidate": "xyz"}),
            from: ClientId::new("a"),
        };

        // when (操作):
        let json: Value = serde_json::from_str(&event.to_json().unwrap()).unwrap();

        // then (期待する結果):
        assert_eq!(json["type"], "signal");
        assert_eq!(json["from"], "a");
        assert_eq!(json["signal"]["candidate"], "xyz");
    }
}
