//! Card store — the durable keyed collection of cards.
//!
//! ARCHITECTURE
//! ============
//! The store is an external collaborator behind the [`CardStore`] trait: the
//! sync engine only ever sees create / list-by-owner / set-column /
//! set-content / delete. [`PgCardStore`] is the production implementation.
//!
//! Ownership is enforced inside every operation (`WHERE id = $1 AND
//! owner_id = $2`), so a mutation against another user's card is
//! indistinguishable from a mutation against a card that never existed.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::event::ErrorCode;

// =============================================================================
// TYPES
// =============================================================================

/// Board column a card sits in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Column {
    #[default]
    Todo,
    InProgress,
    Done,
}

impl Column {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Column::Todo => "todo",
            Column::InProgress => "inprogress",
            Column::Done => "done",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "todo" => Some(Column::Todo),
            "inprogress" => Some(Column::InProgress),
            "done" => Some(Column::Done),
            _ => None,
        }
    }
}

/// The unit of work tracked on the board. Mirrors the `cards` table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Card {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub content: String,
    pub column: Column,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("card store unavailable: {0}")]
    Unavailable(#[from] sqlx::Error),
}

impl ErrorCode for StoreError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Unavailable(_) => "E_STORE_UNAVAILABLE",
        }
    }
}

// =============================================================================
// TRAIT
// =============================================================================

/// Keyed document store for cards. `None` / `false` returns mean
/// not-found-or-not-yours, never an infrastructure failure.
#[async_trait]
pub trait CardStore: Send + Sync {
    /// Insert a new card owned by `owner_id`. The store assigns the id;
    /// creation is atomic.
    async fn create(&self, owner_id: Uuid, content: &str, column: Column) -> Result<Card, StoreError>;

    /// All cards owned by `owner_id`, in creation order (stable).
    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<Card>, StoreError>;

    /// Update the column field only.
    async fn set_column(&self, owner_id: Uuid, card_id: Uuid, column: Column) -> Result<Option<Card>, StoreError>;

    /// Update the content field only.
    async fn set_content(&self, owner_id: Uuid, card_id: Uuid, content: &str) -> Result<Option<Card>, StoreError>;

    /// Delete by id. Returns whether a card was actually removed.
    async fn delete(&self, owner_id: Uuid, card_id: Uuid) -> Result<bool, StoreError>;
}

// =============================================================================
// POSTGRES IMPLEMENTATION
// =============================================================================

pub struct PgCardStore {
    pool: PgPool,
}

impl PgCardStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

type CardRow = (Uuid, Uuid, String, String);

fn row_to_card((id, owner_id, content, column): CardRow) -> Result<Card, StoreError> {
    let column = Column::parse(&column)
        .ok_or_else(|| sqlx::Error::Decode(format!("unknown card column: {column}").into()))?;
    Ok(Card { id, owner_id, content, column })
}

#[async_trait]
impl CardStore for PgCardStore {
    async fn create(&self, owner_id: Uuid, content: &str, column: Column) -> Result<Card, StoreError> {
        let id = Uuid::new_v4();
        sqlx::query(r#"INSERT INTO cards (id, owner_id, content, "column") VALUES ($1, $2, $3, $4)"#)
            .bind(id)
            .bind(owner_id)
            .bind(content)
            .bind(column.as_str())
            .execute(&self.pool)
            .await?;

        Ok(Card { id, owner_id, content: content.to_string(), column })
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<Card>, StoreError> {
        let rows = sqlx::query_as::<_, CardRow>(
            r#"SELECT id, owner_id, content, "column"
               FROM cards
               WHERE owner_id = $1
               ORDER BY created_at ASC, id ASC"#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_card).collect()
    }

    async fn set_column(&self, owner_id: Uuid, card_id: Uuid, column: Column) -> Result<Option<Card>, StoreError> {
        let row = sqlx::query_as::<_, CardRow>(
            r#"UPDATE cards SET "column" = $3, updated_at = now()
               WHERE id = $1 AND owner_id = $2
               RETURNING id, owner_id, content, "column""#,
        )
        .bind(card_id)
        .bind(owner_id)
        .bind(column.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(row_to_card).transpose()
    }

    async fn set_content(&self, owner_id: Uuid, card_id: Uuid, content: &str) -> Result<Option<Card>, StoreError> {
        let row = sqlx::query_as::<_, CardRow>(
            r#"UPDATE cards SET content = $3, updated_at = now()
               WHERE id = $1 AND owner_id = $2
               RETURNING id, owner_id, content, "column""#,
        )
        .bind(card_id)
        .bind(owner_id)
        .bind(content)
        .fetch_optional(&self.pool)
        .await?;

        row.map(row_to_card).transpose()
    }

    async fn delete(&self, owner_id: Uuid, card_id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM cards WHERE id = $1 AND owner_id = $2")
            .bind(card_id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

// =============================================================================
// IN-MEMORY IMPLEMENTATION (tests)
// =============================================================================


#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
