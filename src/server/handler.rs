//! WebSocket connection handlers and event dispatch.

use std::sync::Arc;

use axum::{
    Json,
    extract::{
        Path, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;

use crate::{
    common::time::{get_jst_timestamp, timestamp_to_jst_rfc3339},
    domain::{ClientId, JoinOutcome, MatchOutcome, RoomEnded, RoomId, RoomSnapshot, StateSnapshot},
};

use super::{
    event::{InboundEvent, OutboundEvent},
    state::AppState,
};

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, StatusCode> {
    // Identifier is assigned here, not supplied by the client, so it is
    // unique per connection and never reused.
    let client_id = ClientId::generate();

    // Create a channel for this client to receive messages
    let (tx, rx) = mpsc::unbounded_channel();

    {
        let mut core = state.core.lock().await;
        if let Err(e) = core.connect(client_id.clone(), get_jst_timestamp()) {
            tracing::warn!("Rejecting connection: {}", e);
            return Err(StatusCode::CONFLICT);
        }
    }
    state.pusher.register(client_id.clone(), tx).await;
    tracing::info!("Client '{}' connected and registered", client_id);

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, client_id, rx)))
}

/// Spawns a task that drains the rx channel into the WebSocket sink.
///
/// All outbound traffic for one client funnels through its channel, so the
/// core never awaits a peer's socket directly.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    })
}

async fn handle_socket(
    socket: WebSocket,
    state: Arc<AppState>,
    client_id: ClientId,
    rx: mpsc::UnboundedReceiver<String>,
) {
    let (mut sender, mut receiver) = socket.split();

    // Tell the client its server-assigned id before anything else; the
    // client needs it to recognize itself in `chatStart.users`.
    let connected = OutboundEvent::Connected {
        client_id: client_id.clone(),
    };
    if let Some(json) = connected.to_json()
        && sender.send(Message::Text(json.into())).await.is_err()
    {
        tracing::warn!("Client '{}' dropped before the id handshake", client_id);
        handle_disconnect(&state, &client_id).await;
        return;
    }

    broadcast_debug_info(&state).await;

    let recv_state = state.clone();
    let recv_client_id = client_id.clone();

    // Task receiving events from this client
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::error!("WebSocket error: {}", e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => match serde_json::from_str::<InboundEvent>(&text) {
                    Ok(event) => dispatch(&recv_state, &recv_client_id, event).await,
                    Err(e) => {
                        tracing::warn!(
                            "Ignoring unparseable message from '{}': {}",
                            recv_client_id,
                            e
                        );
                    }
                },
                Message::Ping(_) => {
                    tracing::debug!("Received ping");
                    // Ping/pong is handled automatically by the WebSocket protocol
                }
                Message::Close(_) => {
                    tracing::info!("Client '{}' requested close", recv_client_id);
                    break;
                }
                _ => {}
            }
        }
    });

    // Task pushing events from the core to this client
    let mut send_task = pusher_loop(rx, sender);

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    handle_disconnect(&state, &client_id).await;
    tracing::info!(
        "Client '{}' disconnected and removed from registry",
        client_id
    );
}

async fn dispatch(state: &AppState, client_id: &ClientId, event: InboundEvent) {
    match event {
        InboundEvent::FindPartner => on_find_partner(state, client_id).await,
        InboundEvent::JoinSpecificRoom { room_id } => {
            on_join_room(state, client_id, RoomId::new(room_id)).await;
        }
        InboundEvent::Signal { room_id, signal } => {
            on_signal(state, client_id, RoomId::new(room_id), signal).await;
        }
        InboundEvent::EndChat => on_end_chat(state, client_id).await,
    }
}

async fn on_find_partner(state: &AppState, client_id: &ClientId) {
    let outcome = {
        let mut core = state.core.lock().await;
        core.find_partner(client_id, get_jst_timestamp())
    };
    match outcome {
        Err(e) => {
            tracing::debug!("Dropping findPartner from '{}': {}", client_id, e);
            return;
        }
        Ok(MatchOutcome::AlreadyInRoom(room_id)) => {
            push_debug(state, client_id, format!("Already in a room: {}", room_id)).await;
        }
        Ok(MatchOutcome::Waiting) => {
            push(state, client_id, &OutboundEvent::Waiting).await;
            push_debug(state, client_id, "Waiting for partner".to_string()).await;
        }
        Ok(MatchOutcome::Paired { room_id, users }) => {
            tracing::info!(
                "Match created: '{}' with '{}' in room '{}'",
                users[0],
                users[1],
                room_id
            );
            let event = OutboundEvent::ChatStart {
                room_id,
                users: users.to_vec(),
            };
            for user in &users {
                push(state, user, &event).await;
            }
        }
    }
    broadcast_debug_info(state).await;
}

async fn on_join_room(state: &AppState, client_id: &ClientId, room_id: RoomId) {
    let outcome = {
        let mut core = state.core.lock().await;
        core.join_room(client_id, room_id, get_jst_timestamp())
    };
    match outcome {
        Err(e) => {
            tracing::debug!("Dropping joinSpecificRoom from '{}': {}", client_id, e);
            return;
        }
        Ok(JoinOutcome::AlreadyInRoom(current)) => {
            push_debug(state, client_id, format!("Already in a room: {}", current)).await;
        }
        Ok(JoinOutcome::Created(room_id)) => {
            tracing::info!("Client '{}' created room '{}'", client_id, room_id);
            push(state, client_id, &OutboundEvent::WaitingInRoom { room_id }).await;
        }
        Ok(JoinOutcome::Started { room_id, users }) => {
            tracing::info!("Chat started in room '{}'", room_id);
            let event = OutboundEvent::ChatStart {
                room_id,
                users: users.clone(),
            };
            for user in &users {
                push(state, user, &event).await;
            }
        }
        Ok(JoinOutcome::Full(room_id)) => {
            push(state, client_id, &OutboundEvent::RoomFull { room_id }).await;
        }
    }
    broadcast_debug_info(state).await;
}

async fn on_signal(
    state: &AppState,
    client_id: &ClientId,
    room_id: RoomId,
    signal: serde_json::Value,
) {
    let target = {
        let core = state.core.lock().await;
        core.relay_target(client_id, &room_id)
    };
    match target {
        Ok(target) => {
            let event = OutboundEvent::Signal {
                signal,
                from: client_id.clone(),
            };
            push(state, &target, &event).await;
            push_debug(state, client_id, format!("Signal forwarded to '{}'", target)).await;
        }
        Err(e) => {
            // Expected race: a signal in flight while the chat was ending
            tracing::debug!("Rejecting signal from '{}': {}", client_id, e);
            push_debug(state, client_id, "Invalid room for signaling".to_string()).await;
        }
    }
}

async fn on_end_chat(state: &AppState, client_id: &ClientId) {
    let ended = {
        let mut core = state.core.lock().await;
        core.end_chat(client_id)
    };
    match ended {
        Err(e) => {
            tracing::debug!("Dropping endChat from '{}': {}", client_id, e);
            return;
        }
        Ok(None) => {}
        Ok(Some(ended)) => {
            tracing::info!("Client '{}' ended chat in room '{}'", client_id, ended.room_id);
            notify_chat_ended(state, &ended, "Chat ended by partner").await;
            push_debug(state, client_id, "You ended the chat".to_string()).await;
        }
    }
    broadcast_debug_info(state).await;
}

/// Shared disconnect cleanup: tear down the room (if any), drop the sender
/// channel, notify the remaining member, refresh the debug snapshot.
async fn handle_disconnect(state: &AppState, client_id: &ClientId) {
    let ended = {
        let mut core = state.core.lock().await;
        core.disconnect(client_id)
    };
    state.pusher.unregister(client_id).await;
    if let Some(ended) = ended {
        tracing::info!(
            "Room '{}' torn down after '{}' disconnected",
            ended.room_id,
            client_id
        );
        notify_chat_ended(state, &ended, "Partner disconnected").await;
    }
    broadcast_debug_info(state).await;
}

/// Notify the remaining members of a torn-down room. The structural effect
/// of an explicit end-chat and a disconnect is identical; only the
/// diagnostic wording differs.
async fn notify_chat_ended(state: &AppState, ended: &RoomEnded, wording: &str) {
    for other in &ended.notified {
        push(state, other, &OutboundEvent::ChatEnded).await;
        push_debug(state, other, wording.to_string()).await;
    }
}

/// Fire-and-forget push of one event to one client.
async fn push(state: &AppState, target: &ClientId, event: &OutboundEvent) {
    let Some(json) = event.to_json() else { return };
    if let Err(e) = state.pusher.push_to(target, &json).await {
        // A vanished peer has no bearing on sender-side state
        tracing::warn!("Failed to push event to client '{}': {}", target, e);
    }
}

async fn push_debug(state: &AppState, target: &ClientId, message: String) {
    push(state, target, &OutboundEvent::Debug { message }).await;
}

/// Broadcast the aggregate state snapshot to every connected client.
/// Diagnostic convenience only; failures are absorbed by the pusher.
async fn broadcast_debug_info(state: &AppState) {
    let (snapshot, targets) = {
        let core = state.core.lock().await;
        (core.snapshot(), core.connected_client_ids())
    };
    let event = OutboundEvent::DebugInfo {
        connections: snapshot.connections,
        rooms: snapshot.rooms,
        timestamp: timestamp_to_jst_rfc3339(get_jst_timestamp()),
    };
    if let Some(json) = event.to_json() {
        state.pusher.broadcast(targets, &json).await;
    }
}

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Get list of rooms
pub async fn get_rooms(State(state): State<Arc<AppState>>) -> Json<Vec<RoomSnapshot>> {
    let core = state.core.lock().await;
    Json(core.snapshot().rooms)
}

/// Get room detail by ID
pub async fn get_room_detail(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
) -> Result<Json<RoomSnapshot>, StatusCode> {
    let core = state.core.lock().await;
    core.snapshot()
        .rooms
        .into_iter()
        .find(|room| room.id.as_str() == room_id)
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

/// Debug endpoint exposing the full state snapshot
pub async fn debug_state(State(state): State<Arc<AppState>>) -> Json<StateSnapshot> {
    let core = state.core.lock().await;
    Json(core.snapshot())
}
