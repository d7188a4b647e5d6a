//! Client-side board reducer — optimistic state reconciliation.
//!
//! DESIGN
//! ======
//! The visible board is a pure function of (a) the last snapshot and (b) all
//! events applied since, in receipt order. Local mutations render
//! immediately; the server echo (every originator is included in fan-out)
//! re-applies the same values, so client and server converge without
//! flicker.
//!
//! A locally created card has no id yet. It is keyed by a client-generated
//! correlation id which the server echoes on the confirmation; the
//! provisional entry is replaced by correlation, never merged by id, so the
//! board ends up with exactly one card per create.
//!
//! Events patch at field level: a `move-card` touches only the column and an
//! `update-card` only the content, so an inline edit draft is never
//! destroyed by a concurrent move of the same card.

use uuid::Uuid;

use crate::event::{Intent, ServerEvent};
use crate::services::store::{Card, Column};

// =============================================================================
// TYPES
// =============================================================================

/// A locally rendered card whose creation has not been confirmed yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionalCard {
    pub correlation_id: Uuid,
    pub content: String,
    pub column: Column,
}

/// One entry of the rendered board: confirmed or still provisional.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VisibleCard {
    Confirmed(Card),
    Provisional(ProvisionalCard),
}

impl VisibleCard {
    #[must_use]
    pub fn content(&self) -> &str {
        match self {
            VisibleCard::Confirmed(card) => &card.content,
            VisibleCard::Provisional(card) => &card.content,
        }
    }

    #[must_use]
    pub fn column(&self) -> Column {
        match self {
            VisibleCard::Confirmed(card) => card.column,
            VisibleCard::Provisional(card) => card.column,
        }
    }
}

/// An inline edit in progress, held apart from confirmed state so incoming
/// events cannot clobber the user's typing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    pub card_id: Uuid,
    pub text: String,
}

/// Client reconciliation state machine.
#[derive(Debug, Default)]
pub struct BoardReducer {
    cards: Vec<Card>,
    provisional: Vec<ProvisionalCard>,
    draft: Option<Draft>,
    last_rejection: Option<(String, String)>,
}

// =============================================================================
// LOCAL MUTATIONS (optimistic)
// =============================================================================

impl BoardReducer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Render a provisional card and produce the intent to send. The
    /// returned intent carries the correlation id the server will echo.
    pub fn create_local(&mut self, content: &str, column: Column) -> Intent {
        let correlation_id = Uuid::new_v4();
        self.provisional.push(ProvisionalCard {
            correlation_id,
            content: content.to_string(),
            column,
        });
        Intent::CreateCard { content: content.to_string(), column, correlation_id: Some(correlation_id) }
    }

    /// Optimistically move a card. `None` when the card is unknown or
    /// already in the target column (nothing to send).
    pub fn move_local(&mut self, id: Uuid, column: Column) -> Option<Intent> {
        let card = self.cards.iter_mut().find(|c| c.id == id)?;
        if card.column == column {
            return None;
        }
        card.column = column;
        Some(Intent::MoveCard { id, column })
    }

    /// Optimistically rewrite a card's content.
    pub fn update_local(&mut self, id: Uuid, content: &str) -> Option<Intent> {
        let card = self.cards.iter_mut().find(|c| c.id == id)?;
        card.content = content.to_string();
        Some(Intent::UpdateCard { id, content: content.to_string() })
    }

    /// Optimistically remove a card.
    pub fn delete_local(&mut self, id: Uuid) -> Option<Intent> {
        let before = self.cards.len();
        self.cards.retain(|c| c.id != id);
        if self.cards.len() == before {
            return None;
        }
        if self.draft.as_ref().is_some_and(|d| d.card_id == id) {
            self.draft = None;
        }
        Some(Intent::DeleteCard { id })
    }

    /// Start an inline edit of a confirmed card.
    pub fn begin_edit(&mut self, id: Uuid) -> bool {
        let Some(card) = self.cards.iter().find(|c| c.id == id) else {
            return false;
        };
        self.draft = Some(Draft { card_id: id, text: card.content.clone() });
        true
    }

    pub fn edit_text(&mut self, text: &str) {
        if let Some(draft) = &mut self.draft {
            draft.text = text.to_string();
        }
    }

    /// Commit the inline edit: applies it locally and returns the intent.
    pub fn commit_edit(&mut self) -> Option<Intent> {
        let draft = self.draft.take()?;
        self.update_local(draft.card_id, &draft.text)
    }

    pub fn cancel_edit(&mut self) {
        self.draft = None;
    }
}

// =============================================================================
// SERVER EVENTS
// =============================================================================

impl BoardReducer {
    /// Replace all state with a fresh snapshot. Provisional and draft state
    /// is stale by definition after a reconnect.
    pub fn snapshot(&mut self, cards: Vec<Card>) {
        self.cards = cards;
        self.provisional.clear();
        self.draft = None;
    }

    /// Apply one server event in receipt order.
    pub fn apply(&mut self, event: ServerEvent) {
        match event {
            ServerEvent::LoadCards { cards } => self.snapshot(cards),
            ServerEvent::CreateCard { card, correlation_id } => self.apply_create(card, correlation_id),
            ServerEvent::MoveCard { card } => {
                // Column only: never clobbers content (or an open draft).
                if let Some(local) = self.cards.iter_mut().find(|c| c.id == card.id) {
                    local.column = card.column;
                }
            }
            ServerEvent::UpdateCard { card } => {
                if let Some(local) = self.cards.iter_mut().find(|c| c.id == card.id) {
                    local.content = card.content;
                }
            }
            ServerEvent::DeleteCard { id } => {
                self.cards.retain(|c| c.id != id);
                if self.draft.as_ref().is_some_and(|d| d.card_id == id) {
                    self.draft = None;
                }
            }
            ServerEvent::Rejected { code, message } => {
                self.last_rejection = Some((code, message));
            }
        }
    }

    fn apply_create(&mut self, card: Card, correlation_id: Option<Uuid>) {
        // Replace-by-correlation: our own create coming back.
        if let Some(correlation_id) = correlation_id {
            if let Some(pos) = self.provisional.iter().position(|p| p.correlation_id == correlation_id) {
                self.provisional.remove(pos);
                self.cards.push(card);
                return;
            }
        }
        // Replay of a create already in the snapshot: patch, don't duplicate.
        if let Some(local) = self.cards.iter_mut().find(|c| c.id == card.id) {
            *local = card;
            return;
        }
        // A peer session created it.
        self.cards.push(card);
    }
}

// =============================================================================
// VIEW
// =============================================================================

impl BoardReducer {
    /// Confirmed cards in render order.
    #[must_use]
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    /// The rendered board: confirmed cards, then pending provisional ones.
    #[must_use]
    pub fn visible(&self) -> Vec<VisibleCard> {
        self.cards
            .iter()
            .cloned()
            .map(VisibleCard::Confirmed)
            .chain(self.provisional.iter().cloned().map(VisibleCard::Provisional))
            .collect()
    }

    #[must_use]
    pub fn draft(&self) -> Option<&Draft> {
        self.draft.as_ref()
    }

    /// Most recent per-intent rejection, if any.
    #[must_use]
    pub fn last_rejection(&self) -> Option<&(String, String)> {
        self.last_rejection.as_ref()
    }
}

#[cfg(test)]
#[path = "reconcile_test.rs"]
mod tests;
