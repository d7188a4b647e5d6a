use super::*;

// =============================================================================
// bytes_to_hex
// =============================================================================

#[test]
fn bytes_to_hex_empty() {
    assert_eq!(bytes_to_hex(&[]), "");
}

#[test]
fn bytes_to_hex_leading_zero() {
    assert_eq!(bytes_to_hex(&[0x0a]), "0a");
}

#[test]
fn bytes_to_hex_multi_byte() {
    assert_eq!(bytes_to_hex(&[0xde, 0xad, 0xbe, 0xef]), "deadbeef");
}

// =============================================================================
// generate_token
// =============================================================================

#[test]
fn generate_token_is_64_hex_chars() {
    let token = generate_token();
    assert_eq!(token.len(), 64);
    assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn generate_token_two_calls_differ() {
    assert_ne!(generate_token(), generate_token());
}

// =============================================================================
// SessionUser
// =============================================================================

#[test]
fn session_user_serializes_expected_fields() {
    let user = SessionUser { id: Uuid::new_v4(), name: "Ada".into(), email: "ada@example.com".into() };
    let json = serde_json::to_value(&user).unwrap();
    assert_eq!(json["name"], "Ada");
    assert_eq!(json["email"], "ada@example.com");
    assert!(json.get("id").is_some());
}

// =============================================================================
// live DB paths
// =============================================================================

#[cfg(feature = "live-db-tests")]
mod live {
    use sqlx::postgres::PgPoolOptions;

    use super::*;

    async fn live_pool() -> PgPool {
        let url = std::env::var("TEST_DATABASE_URL").expect("TEST_DATABASE_URL required for live-db-tests");
        let pool = PgPoolOptions::new().connect(&url).await.expect("connect test db");
        sqlx::migrate!("src/db/migrations").run(&pool).await.expect("migrations");
        pool
    }

    async fn seed_user(pool: &PgPool) -> Uuid {
        let id = Uuid::new_v4();
        sqlx::query("INSERT INTO users (id, name, email, password_hash) VALUES ($1, $2, $3, $4)")
            .bind(id)
            .bind("Test User")
            .bind(format!("{id}@example.com"))
            .bind("x$y")
            .execute(pool)
            .await
            .expect("seed user");
        id
    }

    #[tokio::test]
    async fn session_round_trip() {
        let pool = live_pool().await;
        let user_id = seed_user(&pool).await;

        let token = create_session(&pool, user_id).await.unwrap();
        let user = validate_session(&pool, &token).await.unwrap().expect("valid session");
        assert_eq!(user.id, user_id);

        delete_session(&pool, &token).await.unwrap();
        assert!(validate_session(&pool, &token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn expired_session_is_invalid() {
        let pool = live_pool().await;
        let user_id = seed_user(&pool).await;
        let token = create_session(&pool, user_id).await.unwrap();

        sqlx::query("UPDATE sessions SET expires_at = now() - interval '1 minute' WHERE token = $1")
            .bind(&token)
            .execute(&pool)
            .await
            .unwrap();

        assert!(validate_session(&pool, &token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unknown_token_is_invalid() {
        let pool = live_pool().await;
        assert!(validate_session(&pool, "not-a-token").await.unwrap().is_none());
    }
}
