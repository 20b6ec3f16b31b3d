//! # Realtime
//!
//! Live updates for the admin dashboard and for patients' apps.
//!
//! ## Protocol
//!
//! WebSocket on `/ws`, JSON text frames both ways: `{"event": ..., "data": ...}`.
//!
//! Client frames
//! - `join_admin` with `{"token": <staff token>}`: joins the `admin` room
//! - `join_patient` with `{"token": <patient token>}`: joins `patient_<id>`
//!
//! Server frames
//! - `joined` / `error` acknowledging a join
//! - admin room: `new_patient`, `new_appointment`, `appointment_cancelled`, `appointment_updated`
//! - patient room: `appointment_status_changed`
//!
//! ## Fan-out
//!
//! One `tokio::sync::broadcast` channel carries every notification tagged with
//! its room. Each socket keeps the rooms it joined and drops the rest. A slow
//! socket that lags behind loses the oldest notifications, never the request
//! that produced them.
use std::{collections::HashSet, fmt, sync::Arc};

use axum::{
    extract::{
        State as AxumState, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::sync::broadcast::{self, Receiver, Sender, error::RecvError};
use tracing::{debug, info, warn};

use crate::{
    auth::{ACCESS_DENIED, Principal, resolve},
    state::State,
    utils::new_id,
};

const CHANNEL_CAPACITY: usize = 256;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Room {
    Admin,
    Patient(String),
}

impl fmt::Display for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Room::Admin => f.write_str("admin"),
            Room::Patient(user_id) => write!(f, "patient_{user_id}"),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct Notification {
    #[serde(skip)]
    pub room: Room,
    pub event: &'static str,
    pub data: Value,
}

#[derive(Clone)]
pub struct Hub {
    sender: Sender<Arc<Notification>>,
}

impl Default for Hub {
    fn default() -> Self {
        Self::new()
    }
}

impl Hub {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);

        Self { sender }
    }

    pub fn subscribe(&self) -> Receiver<Arc<Notification>> {
        self.sender.subscribe()
    }

    pub fn emit_to_admin(&self, event: &'static str, data: Value) {
        self.emit(Room::Admin, event, data);
    }

    pub fn emit_to_patient(&self, user_id: &str, event: &'static str, data: Value) {
        self.emit(Room::Patient(user_id.to_string()), event, data);
    }

    fn emit(&self, room: Room, event: &'static str, data: Value) {
        let notification = Arc::new(Notification { room, event, data });

        // Err only means nobody is listening right now.
        if let Err(e) = self.sender.send(notification) {
            debug!("No listeners for {} in room {}", e.0.event, e.0.room);
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
enum ClientFrame {
    JoinAdmin { token: String },
    JoinPatient { token: String },
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    AxumState(state): AxumState<Arc<State>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| session(socket, state))
}

async fn session(mut socket: WebSocket, state: Arc<State>) {
    let sid = new_id();
    info!("Client connected: {sid}");

    let mut rooms = HashSet::new();
    let mut notifications = state.hub.subscribe();

    loop {
        tokio::select! {
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    let reply = handle_frame(&state, &mut rooms, text.as_str()).await;

                    if let Some(room) = joined_room(&reply) {
                        info!("Client {sid} joined {room}");
                    }

                    if socket.send(Message::Text(reply.to_string().into())).await.is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!("Socket error on {sid}: {e}");
                    break;
                }
            },
            notification = notifications.recv() => match notification {
                Ok(notification) => {
                    if !rooms.contains(&notification.room) {
                        continue;
                    }

                    let frame = json!({ "event": notification.event, "data": notification.data });
                    if socket.send(Message::Text(frame.to_string().into())).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Client {sid} lagged, skipped {skipped} notifications");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    info!("Client disconnected: {sid}");
}

/// Applies one client frame, returning the acknowledgement to send back.
async fn handle_frame(state: &State, rooms: &mut HashSet<Room>, text: &str) -> Value {
    let frame: ClientFrame = match serde_json::from_str(text) {
        Ok(frame) => frame,
        Err(_) => return error_frame("Evento desconhecido"),
    };

    let joined = match frame {
        ClientFrame::JoinAdmin { token } => match resolve(state, &token).await {
            Ok(Principal::Staff(_)) => Ok(Room::Admin),
            Ok(Principal::Patient(_)) => Err(ACCESS_DENIED.to_string()),
            Err(e) => Err(e.to_string()),
        },
        ClientFrame::JoinPatient { token } => match resolve(state, &token).await {
            Ok(Principal::Patient(patient)) => Ok(Room::Patient(patient.id)),
            Ok(Principal::Staff(_)) => Err(ACCESS_DENIED.to_string()),
            Err(e) => Err(e.to_string()),
        },
    };

    match joined {
        Ok(room) => {
            let reply = json!({ "event": "joined", "data": { "room": room.to_string() } });
            rooms.insert(room);
            reply
        }
        Err(detail) => error_frame(&detail),
    }
}

/// Room name of a `joined` acknowledgement.
fn joined_room(reply: &Value) -> Option<&str> {
    reply.get("data")?.get("room")?.as_str()
}

fn error_frame(detail: &str) -> Value {
    json!({ "event": "error", "data": { "detail": detail } })
}
