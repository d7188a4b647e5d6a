//! Wire protocol for the realtime card channel.
//!
//! DESIGN
//! ======
//! Everything on the websocket is JSON. Clients send [`Intent`]s (internally
//! tagged on `"intent"`), the server sends [`ServerEvent`]s (tagged on
//! `"event"`). Both use kebab-case names: `create-card`, `move-card`,
//! `update-card`, `delete-card`, plus the server-only `load-cards` snapshot
//! and `rejected` nack.
//!
//! Create intents may carry a client-generated `correlation_id`. The server
//! echoes it on the confirmation event so the client can replace its
//! provisional card by correlation, never by guessing at id equality.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::services::store::{Card, Column};

// =============================================================================
// CLIENT → SERVER
// =============================================================================

/// A client-originated mutation request, not yet validated or persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "intent", rename_all = "kebab-case")]
pub enum Intent {
    CreateCard {
        content: String,
        #[serde(default)]
        column: Column,
        /// Client-side reconciliation key, echoed on the confirmation.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        correlation_id: Option<Uuid>,
    },
    MoveCard {
        id: Uuid,
        column: Column,
    },
    UpdateCard {
        id: Uuid,
        content: String,
    },
    DeleteCard {
        id: Uuid,
    },
}

impl Intent {
    /// Kebab-case intent name, for log lines.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Intent::CreateCard { .. } => "create-card",
            Intent::MoveCard { .. } => "move-card",
            Intent::UpdateCard { .. } => "update-card",
            Intent::DeleteCard { .. } => "delete-card",
        }
    }
}

// =============================================================================
// SERVER → CLIENT
// =============================================================================

/// A server-confirmed event, fanned out to every connection of the owning
/// user. `Rejected` is the exception: it goes to the originator only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// Full snapshot in creation order, sent once at handshake.
    LoadCards { cards: Vec<Card> },
    CreateCard {
        card: Card,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        correlation_id: Option<Uuid>,
    },
    MoveCard { card: Card },
    UpdateCard { card: Card },
    DeleteCard { id: Uuid },
    /// Per-intent nack to the originating connection. Terminal for that
    /// intent only; the connection stays up.
    Rejected { code: String, message: String },
}

impl ServerEvent {
    /// Build a nack from a typed error.
    pub fn rejected(err: &(impl ErrorCode + ?Sized)) -> Self {
        ServerEvent::Rejected { code: err.error_code().to_string(), message: err.to_string() }
    }
}

// =============================================================================
// ERROR CODES
// =============================================================================

/// Grepable error code carried on `rejected` events.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;
}

// =============================================================================
// TESTS
// =============================================================================
