//! Synchronization engine — validate → persist → fan out.
//!
//! DESIGN
//! ======
//! Every mutation intent takes the same shape: [`apply_intent`] validates it
//! against the connection's bound user, persists through the card store, and
//! returns the canonical event for fan-out. The gateway then delivers that
//! event to every live connection of the same user, originator included, so
//! optimistic client state is always overwritten by the authoritative echo.
//!
//! The engine holds no durable card state of its own; the registry is the
//! only shared in-memory structure and is scoped to process lifetime.
//!
//! ERROR HANDLING
//! ==============
//! A failed intent is terminal for that intent only: peers see nothing, the
//! originator gets a `rejected` nack, and the connection stays up. A store
//! failure aborts before any fan-out — there is no partial event.

use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::event::{ErrorCode, Intent, ServerEvent};
use crate::services::store::{CardStore, StoreError};
use crate::state::AppState;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("content must not be empty")]
    EmptyContent,
    /// Covers both missing cards and cards owned by someone else; the two
    /// are deliberately indistinguishable.
    #[error("card not found: {0}")]
    NotFound(Uuid),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ErrorCode for SyncError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyContent => "E_VALIDATION",
            Self::NotFound(_) => "E_NOT_FOUND",
            Self::Store(e) => e.error_code(),
        }
    }
}

// =============================================================================
// INTENT APPLICATION
// =============================================================================

/// Validate one intent against the bound user and persist it.
///
/// Returns the canonical event to fan out, or `None` when the intent was a
/// no-op (deleting an already-deleted card is idempotent: no fan-out, no
/// error).
///
/// # Errors
///
/// `EmptyContent` on blank create/update content, `NotFound` when the target
/// card is missing or not owned by `user_id`, `Store` when the card store is
/// unavailable (the intent is aborted, not retried).
pub async fn apply_intent(
    store: &dyn CardStore,
    user_id: Uuid,
    intent: Intent,
) -> Result<Option<ServerEvent>, SyncError> {
    match intent {
        Intent::CreateCard { content, column, correlation_id } => {
            if content.trim().is_empty() {
                return Err(SyncError::EmptyContent);
            }
            let card = store.create(user_id, &content, column).await?;
            info!(%user_id, card_id = %card.id, column = card.column.as_str(), "card created");
            Ok(Some(ServerEvent::CreateCard { card, correlation_id }))
        }
        Intent::MoveCard { id, column } => {
            let card = store
                .set_column(user_id, id, column)
                .await?
                .ok_or(SyncError::NotFound(id))?;
            info!(%user_id, card_id = %id, column = column.as_str(), "card moved");
            Ok(Some(ServerEvent::MoveCard { card }))
        }
        Intent::UpdateCard { id, content } => {
            if content.trim().is_empty() {
                return Err(SyncError::EmptyContent);
            }
            let card = store
                .set_content(user_id, id, &content)
                .await?
                .ok_or(SyncError::NotFound(id))?;
            info!(%user_id, card_id = %id, "card content updated");
            Ok(Some(ServerEvent::UpdateCard { card }))
        }
        Intent::DeleteCard { id } => {
            if store.delete(user_id, id).await? {
                info!(%user_id, card_id = %id, "card deleted");
                Ok(Some(ServerEvent::DeleteCard { id }))
            } else {
                debug!(%user_id, card_id = %id, "delete of absent card ignored");
                Ok(None)
            }
        }
    }
}

// =============================================================================
// CONNECTION REGISTRY
// =============================================================================

/// Register a freshly authenticated connection for fan-out.
pub async fn register_connection(
    state: &AppState,
    user_id: Uuid,
    connection_id: Uuid,
    tx: mpsc::Sender<ServerEvent>,
) {
    let mut connections = state.connections.write().await;
    let user_connections = connections.entry(user_id).or_default();
    user_connections.insert(connection_id, tx);
    info!(%user_id, %connection_id, sessions = user_connections.len(), "connection registered");
}

/// Remove a connection. Evicts the user's registry entry when the last
/// connection is gone; no event after this point targets the connection.
pub async fn remove_connection(state: &AppState, user_id: Uuid, connection_id: Uuid) {
    let mut connections = state.connections.write().await;
    let Some(user_connections) = connections.get_mut(&user_id) else {
        return;
    };
    user_connections.remove(&connection_id);
    info!(%user_id, %connection_id, remaining = user_connections.len(), "connection removed");

    if user_connections.is_empty() {
        connections.remove(&user_id);
    }
}

/// Deliver a confirmed event to every live connection of `user_id`,
/// originator included. The registry snapshot is taken under the read lock,
/// so connections that have fully torn down are never targeted.
pub async fn fan_out(state: &AppState, user_id: Uuid, event: &ServerEvent) {
    let connections = state.connections.read().await;
    let Some(user_connections) = connections.get(&user_id) else {
        return;
    };

    for (connection_id, tx) in user_connections {
        // Best-effort: a connection with a full channel is skipped.
        if tx.try_send(event.clone()).is_err() {
            warn!(%user_id, %connection_id, "fan-out dropped for lagging connection");
        }
    }
}

#[cfg(test)]
#[path = "sync_test.rs"]
mod tests;
