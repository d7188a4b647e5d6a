//! Credential service — signup, login, password hashing.
//!
//! DESIGN
//! ======
//! Passwords are stored as `"<salt_hex>$<sha256(salt || password)_hex>"` with
//! a per-user random 16-byte salt. Login failures never reveal whether the
//! email exists: unknown email and wrong password produce the same error.

use rand::Rng;
use sha2::{Digest, Sha256};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::services::session::{SessionUser, bytes_to_hex};

const SALT_LEN: usize = 16;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("invalid email")]
    InvalidEmail,
    #[error("email already registered")]
    EmailTaken,
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
}

// =============================================================================
// VALIDATION + HASHING
// =============================================================================

#[must_use]
pub fn normalize_email(email: &str) -> Option<String> {
    let normalized = email.trim().to_ascii_lowercase();
    if normalized.is_empty() || !normalized.contains('@') {
        return None;
    }
    let parts = normalized.split('@').collect::<Vec<_>>();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        return None;
    }
    Some(normalized)
}

#[must_use]
pub fn hash_password(password: &str) -> String {
    let salt: [u8; SALT_LEN] = rand::rng().random();
    let salt_hex = bytes_to_hex(&salt);
    format!("{salt_hex}${}", digest_hex(&salt_hex, password))
}

/// Check a password against a stored `"salt$hash"` value.
#[must_use]
pub fn verify_password(stored: &str, password: &str) -> bool {
    let Some((salt_hex, expected)) = stored.split_once('$') else {
        return false;
    };
    digest_hex(salt_hex, password) == expected
}

fn digest_hex(salt_hex: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt_hex.as_bytes());
    hasher.update(password.as_bytes());
    bytes_to_hex(hasher.finalize().as_slice())
}

// =============================================================================
// SIGNUP / LOGIN
// =============================================================================

/// Register a new user.
///
/// # Errors
///
/// `MissingField` on blank input, `InvalidEmail` on a malformed address,
/// `EmailTaken` if the email is already registered.
pub async fn signup(pool: &PgPool, name: &str, email: &str, password: &str) -> Result<SessionUser, AuthError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AuthError::MissingField("name"));
    }
    if email.trim().is_empty() {
        return Err(AuthError::MissingField("email"));
    }
    if password.is_empty() {
        return Err(AuthError::MissingField("password"));
    }
    let email = normalize_email(email).ok_or(AuthError::InvalidEmail)?;

    let id = Uuid::new_v4();
    let row = sqlx::query(
        r"INSERT INTO users (id, name, email, password_hash)
          VALUES ($1, $2, $3, $4)
          ON CONFLICT (email) DO NOTHING
          RETURNING id",
    )
    .bind(id)
    .bind(name)
    .bind(&email)
    .bind(hash_password(password))
    .fetch_optional(pool)
    .await?;

    if row.is_none() {
        return Err(AuthError::EmailTaken);
    }

    Ok(SessionUser { id, name: name.to_string(), email })
}

/// Authenticate by email and password.
///
/// # Errors
///
/// `InvalidCredentials` for unknown email and wrong password alike.
pub async fn login(pool: &PgPool, email: &str, password: &str) -> Result<SessionUser, AuthError> {
    let email = normalize_email(email).ok_or(AuthError::InvalidCredentials)?;

    let row = sqlx::query("SELECT id, name, email, password_hash FROM users WHERE email = $1")
        .bind(&email)
        .fetch_optional(pool)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    let stored: String = row.get("password_hash");
    if !verify_password(&stored, password) {
        return Err(AuthError::InvalidCredentials);
    }

    Ok(SessionUser { id: row.get("id"), name: row.get("name"), email: row.get("email") })
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
