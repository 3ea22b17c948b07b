//! WebSocket transport: one connection, one participant.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{
        State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::IntoResponse,
};
use codelive_core::{ExerciseCatalog, ParticipantId};
use futures::{SinkExt, StreamExt};
use tokio::sync::{RwLock, mpsc};
use uuid::Uuid;

use codelive_session::{EditApplied, SessionRegistry};

use crate::protocol::{ClientMessage, ServerMessage};

/// Outbound handle for one connected participant.
type Outbox = mpsc::UnboundedSender<ServerMessage>;

/// Shared WebSocket handler state.
///
/// The connection map lets edits fan out to other participants without
/// touching their sockets directly: each connection drains its own
/// unbounded channel, so a slow socket never blocks session processing.
pub struct WsState<C>
where
    C: ExerciseCatalog,
{
    registry: Arc<SessionRegistry<C>>,
    connections: RwLock<HashMap<ParticipantId, Outbox>>,
}

impl<C> WsState<C>
where
    C: ExerciseCatalog,
{
    /// Create WebSocket state over a session registry.
    #[must_use]
    pub fn new(registry: Arc<SessionRegistry<C>>) -> Self {
        Self {
            registry,
            connections: RwLock::new(HashMap::new()),
        }
    }

    /// Deliver a message to one participant, fire-and-forget. A closed
    /// or missing connection is logged and never propagates.
    async fn deliver(&self, to: ParticipantId, msg: ServerMessage) {
        let connections = self.connections.read().await;
        let Some(outbox) = connections.get(&to) else {
            tracing::debug!(%to, "dropping message for unknown participant");
            return;
        };
        if outbox.send(msg).is_err() {
            tracing::debug!(%to, "dropping message for closed connection");
        }
    }
}

/// WebSocket upgrade handler.
///
/// Use this as an Axum route handler.
pub async fn ws_handler<C>(
    ws: WebSocketUpgrade,
    State(state): State<Arc<WsState<C>>>,
) -> impl IntoResponse
where
    C: ExerciseCatalog + 'static,
{
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket<C>(socket: WebSocket, state: Arc<WsState<C>>)
where
    C: ExerciseCatalog + 'static,
{
    let participant_id: ParticipantId = Uuid::new_v4();
    let (mut sender, mut receiver) = socket.split();

    // Channel for sending messages to the client
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();

    // Spawn task to forward messages to WebSocket
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let json = match serde_json::to_string(&msg) {
                Ok(j) => j,
                Err(e) => {
                    tracing::error!("Failed to serialize message: {e}");
                    continue;
                }
            };
            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    state
        .connections
        .write()
        .await
        .insert(participant_id, tx.clone());

    // Exercise id of the session this connection is attached to.
    let mut current: Option<String> = None;

    while let Some(msg) = receiver.next().await {
        let text = match msg {
            Ok(Message::Text(text)) => text,
            Ok(Message::Binary(data)) => match String::from_utf8(data.to_vec()) {
                Ok(s) => s.into(),
                Err(_) => continue,
            },
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                tracing::error!("WebSocket error: {e}");
                break;
            }
        };

        let client_msg: ClientMessage = match serde_json::from_str(&text) {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!("Invalid client message: {e}");
                let _ = tx.send(ServerMessage::Error {
                    message: format!("Invalid message: {e}"),
                });
                continue;
            }
        };

        dispatch(&state, participant_id, &mut current, &tx, client_msg).await;
    }

    // Cleanup: disconnect doubles as leave, idempotently.
    if let Some(exercise_id) = current.take() {
        state.registry.leave(&exercise_id, participant_id).await;
    }
    state.connections.write().await.remove(&participant_id);
    send_task.abort();

    tracing::info!(%participant_id, "WebSocket disconnected");
}

/// Handle one parsed client message for one connection.
///
/// `current` is the exercise id of the session this connection is
/// attached to; `outbox` carries replies to the sender. Failures are
/// request-scoped: an erroring message never detaches the participant
/// from its session.
async fn dispatch<C>(
    state: &WsState<C>,
    participant_id: ParticipantId,
    current: &mut Option<String>,
    outbox: &Outbox,
    msg: ClientMessage,
) where
    C: ExerciseCatalog,
{
    match msg {
        ClientMessage::Join { exercise_id } => {
            match state.registry.join(&exercise_id, participant_id).await {
                Ok(joined) => {
                    // Leave the previous session only once the new join
                    // has succeeded; a failed join must not detach the
                    // participant from a healthy session.
                    if let Some(previous) = current.take() {
                        if previous != exercise_id {
                            state.registry.leave(&previous, participant_id).await;
                        }
                    }
                    *current = Some(exercise_id);
                    let _ = outbox.send(ServerMessage::Joined {
                        role: joined.role,
                        buffer: joined.buffer,
                    });
                }
                Err(e) => {
                    let _ = outbox.send(ServerMessage::Error {
                        message: e.to_string(),
                    });
                }
            }
        }
        ClientMessage::Edit { text } => {
            let Some(exercise_id) = current.as_deref() else {
                let _ = outbox.send(ServerMessage::Error {
                    message: "Not attached to a session".to_string(),
                });
                return;
            };
            match state.registry.apply_edit(exercise_id, participant_id, text).await {
                Ok(EditApplied::Broadcast(set)) => {
                    for recipient in &set.recipients {
                        state
                            .deliver(
                                *recipient,
                                ServerMessage::BufferUpdated {
                                    text: set.text.clone(),
                                },
                            )
                            .await;
                    }
                    if set.match_outcome.is_entry() {
                        for member in &set.members {
                            state.deliver(*member, ServerMessage::SolutionMatched).await;
                        }
                    }
                }
                Ok(EditApplied::Stale) => {
                    tracing::debug!(%participant_id, "stale edit ignored");
                }
                Err(e) => {
                    let _ = outbox.send(ServerMessage::Error {
                        message: e.to_string(),
                    });
                }
            }
        }
        ClientMessage::Leave => {
            if let Some(exercise_id) = current.take() {
                state.registry.leave(&exercise_id, participant_id).await;
            }
        }
        ClientMessage::Ping => {
            let _ = outbox.send(ServerMessage::Pong);
        }
    }
}

/// Create WebSocket router.
///
/// # Example
/// ```ignore
/// let app = Router::new()
///     .merge(create_ws_router(Arc::new(WsState::new(registry))));
/// ```
#[must_use]
pub fn create_ws_router<C>(state: Arc<WsState<C>>) -> axum::Router
where
    C: ExerciseCatalog + 'static,
{
    axum::Router::new()
        .route("/ws", axum::routing::get(ws_handler::<C>))
        .with_state(state)
}
