use super::*;
use super::memory::MemoryStore;

// =============================================================================
// Column
// =============================================================================

#[test]
fn column_round_trips_through_str() {
    for column in [Column::Todo, Column::InProgress, Column::Done] {
        assert_eq!(Column::parse(column.as_str()), Some(column));
    }
}

#[test]
fn column_parse_rejects_unknown() {
    assert_eq!(Column::parse("archived"), None);
    assert_eq!(Column::parse(""), None);
    assert_eq!(Column::parse("Todo"), None);
}

#[test]
fn column_serde_names_match_wire_format() {
    assert_eq!(serde_json::to_value(Column::Todo).unwrap(), "todo");
    assert_eq!(serde_json::to_value(Column::InProgress).unwrap(), "inprogress");
    assert_eq!(serde_json::to_value(Column::Done).unwrap(), "done");
}

#[test]
fn column_default_is_todo() {
    assert_eq!(Column::default(), Column::Todo);
}

// =============================================================================
// Card serde
// =============================================================================

#[test]
fn card_serde_round_trip() {
    let card = Card {
        id: Uuid::new_v4(),
        owner_id: Uuid::new_v4(),
        content: "ship it".into(),
        column: Column::InProgress,
    };
    let json = serde_json::to_string(&card).unwrap();
    let restored: Card = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, card);
}

// =============================================================================
// MemoryStore (exercises the trait contract the engine relies on)
// =============================================================================

#[tokio::test]
async fn create_assigns_distinct_ids() {
    let store = MemoryStore::new();
    let owner = Uuid::new_v4();
    let a = store.create(owner, "a", Column::Todo).await.unwrap();
    let b = store.create(owner, "b", Column::Todo).await.unwrap();
    assert_ne!(a.id, b.id);
    assert_eq!(a.owner_id, owner);
}

#[tokio::test]
async fn list_by_owner_preserves_creation_order() {
    let store = MemoryStore::new();
    let owner = Uuid::new_v4();
    for content in ["first", "second", "third"] {
        store.create(owner, content, Column::Todo).await.unwrap();
    }
    let cards = store.list_by_owner(owner).await.unwrap();
    let contents: Vec<&str> = cards.iter().map(|c| c.content.as_str()).collect();
    assert_eq!(contents, ["first", "second", "third"]);
}

#[tokio::test]
async fn list_by_owner_is_owner_scoped() {
    let store = MemoryStore::new();
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();
    store.create(alice, "hers", Column::Todo).await.unwrap();
    store.create(bob, "his", Column::Done).await.unwrap();

    let cards = store.list_by_owner(alice).await.unwrap();
    assert_eq!(cards.len(), 1);
    assert_eq!(cards[0].content, "hers");
}

#[tokio::test]
async fn set_column_updates_column_only() {
    let store = MemoryStore::new();
    let owner = Uuid::new_v4();
    let card = store.create(owner, "move me", Column::Todo).await.unwrap();

    let updated = store.set_column(owner, card.id, Column::Done).await.unwrap().unwrap();
    assert_eq!(updated.column, Column::Done);
    assert_eq!(updated.content, "move me");
}

#[tokio::test]
async fn set_column_on_foreign_card_is_none() {
    let store = MemoryStore::new();
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();
    let card = store.create(alice, "hers", Column::Todo).await.unwrap();

    let result = store.set_column(bob, card.id, Column::Done).await.unwrap();
    assert!(result.is_none());

    // Untouched for the real owner.
    let cards = store.list_by_owner(alice).await.unwrap();
    assert_eq!(cards[0].column, Column::Todo);
}

#[tokio::test]
async fn set_content_updates_content_only() {
    let store = MemoryStore::new();
    let owner = Uuid::new_v4();
    let card = store.create(owner, "old", Column::InProgress).await.unwrap();

    let updated = store.set_content(owner, card.id, "new").await.unwrap().unwrap();
    assert_eq!(updated.content, "new");
    assert_eq!(updated.column, Column::InProgress);
}

#[tokio::test]
async fn delete_reports_whether_removed() {
    let store = MemoryStore::new();
    let owner = Uuid::new_v4();
    let card = store.create(owner, "gone soon", Column::Todo).await.unwrap();

    assert!(store.delete(owner, card.id).await.unwrap());
    assert!(!store.delete(owner, card.id).await.unwrap());
    assert!(store.list_by_owner(owner).await.unwrap().is_empty());
}

#[tokio::test]
async fn unavailable_store_fails_every_operation() {
    let store = MemoryStore::new();
    let owner = Uuid::new_v4();
    store.set_unavailable(true);

    assert!(matches!(
        store.create(owner, "x", Column::Todo).await,
        Err(StoreError::Unavailable(_))
    ));
    assert!(matches!(store.list_by_owner(owner).await, Err(StoreError::Unavailable(_))));
    assert!(matches!(
        store.delete(owner, Uuid::new_v4()).await,
        Err(StoreError::Unavailable(_))
    ));
}

#[test]
fn store_error_code_is_grepable() {
    use crate::event::ErrorCode;
    let err = StoreError::Unavailable(sqlx::Error::PoolClosed);
    assert_eq!(err.error_code(), "E_STORE_UNAVAILABLE");
}
