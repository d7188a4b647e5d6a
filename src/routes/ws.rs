//! WebSocket handler — the session gateway.
//!
//! DESIGN
//! ======
//! The handshake authenticates before the upgrade: no token, bad token, or
//! expired token means the connection is refused with 401 and never touches
//! card data. On success the user id is bound to the connection for its
//! lifetime and can never change.
//!
//! LIFECYCLE
//! =========
//! 1. Upgrade → register connection → send `load-cards` snapshot
//! 2. Client sends intents → sync engine validates + persists → fan-out
//! 3. Rejections go to the originator only, as `rejected` events
//! 4. Close → connection removed from the registry immediately
//!
//! The `select!` loop reads one inbound message and handles it to completion
//! (including the awaited store operation) before reading the next, so
//! intents from one connection are processed in receipt order. A client that
//! disconnects mid-intent does not abort an issued store write; surviving
//! sessions still receive the fan-out.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::event::{Intent, ServerEvent};
use crate::services::{session, sync};
use crate::state::{AppState, CONNECTION_CHANNEL_CAPACITY};

// =============================================================================
// UPGRADE
// =============================================================================

pub async fn handle_ws(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
    ws: WebSocketUpgrade,
) -> Response {
    let Some(token) = params.get("token") else {
        return (StatusCode::UNAUTHORIZED, "token required").into_response();
    };

    let user_id = match session::validate_session(&state.pool, token).await {
        Ok(Some(user)) => user.id,
        Ok(None) => return (StatusCode::UNAUTHORIZED, "invalid or expired token").into_response(),
        Err(e) => {
            error!(error = %e, "ws token validation failed");
            return (StatusCode::INTERNAL_SERVER_ERROR, "token validation error").into_response();
        }
    };

    ws.on_upgrade(move |socket| run_ws(socket, state, user_id))
}

// =============================================================================
// CONNECTION
// =============================================================================

async fn run_ws(mut socket: WebSocket, state: AppState, user_id: Uuid) {
    let connection_id = Uuid::new_v4();

    // Register before loading the snapshot: events that land in the gap
    // buffer in the channel, and the client reducer applies them idempotently.
    let (client_tx, mut client_rx) = mpsc::channel::<ServerEvent>(CONNECTION_CHANNEL_CAPACITY);
    sync::register_connection(&state, user_id, connection_id, client_tx).await;

    let snapshot = match state.store.list_by_owner(user_id).await {
        Ok(cards) => cards,
        Err(e) => {
            error!(error = %e, %user_id, "snapshot load failed; closing connection");
            sync::remove_connection(&state, user_id, connection_id).await;
            return;
        }
    };

    if send_event(&mut socket, &ServerEvent::LoadCards { cards: snapshot }).await.is_err() {
        sync::remove_connection(&state, user_id, connection_id).await;
        return;
    }

    info!(%connection_id, %user_id, "ws: client connected");

    loop {
        tokio::select! {
            msg = socket.recv() => {
                let Some(Ok(msg)) = msg else { break };
                match msg {
                    Message::Text(text) => {
                        for event in process_inbound_text(&state, connection_id, user_id, &text).await {
                            let _ = send_event(&mut socket, &event).await;
                        }
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            Some(event) = client_rx.recv() => {
                if send_event(&mut socket, &event).await.is_err() {
                    break;
                }
            }
        }
    }

    sync::remove_connection(&state, user_id, connection_id).await;
    info!(%connection_id, "ws: client disconnected");
}

// =============================================================================
// INTENT DISPATCH
// =============================================================================

/// Parse and process one inbound text message, returning events destined for
/// the sender only (nacks). Confirmed events reach the sender through the
/// fan-out channel like every other session.
///
/// Kept free of socket concerns so tests can exercise dispatch end-to-end.
async fn process_inbound_text(
    state: &AppState,
    connection_id: Uuid,
    user_id: Uuid,
    text: &str,
) -> Vec<ServerEvent> {
    let intent: Intent = match serde_json::from_str(text) {
        Ok(i) => i,
        Err(e) => {
            warn!(%connection_id, error = %e, "ws: malformed intent");
            return vec![ServerEvent::Rejected {
                code: "E_MALFORMED".into(),
                message: format!("invalid intent: {e}"),
            }];
        }
    };

    info!(%connection_id, %user_id, intent = intent.name(), "ws: recv intent");

    match sync::apply_intent(state.store.as_ref(), user_id, intent).await {
        Ok(Some(event)) => {
            sync::fan_out(state, user_id, &event).await;
            vec![]
        }
        // Idempotent no-op (e.g. delete of an already-deleted card).
        Ok(None) => vec![],
        Err(e) => {
            warn!(%connection_id, %user_id, error = %e, "ws: intent rejected");
            vec![ServerEvent::rejected(&e)]
        }
    }
}

// =============================================================================
// HELPERS
// =============================================================================

async fn send_event(socket: &mut WebSocket, event: &ServerEvent) -> Result<(), ()> {
    let json = match serde_json::to_string(event) {
        Ok(j) => j,
        Err(e) => {
            warn!(error = %e, "ws: failed to serialize event");
            return Err(());
        }
    };
    socket.send(Message::Text(json.into())).await.map_err(|_| ())
}

#[cfg(test)]
#[path = "ws_test.rs"]
mod tests;
