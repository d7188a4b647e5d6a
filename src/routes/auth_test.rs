use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, HeaderValue, Request, header};

use super::*;
use crate::state::test_helpers;

fn headers_with_auth(value: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
    headers
}

// =============================================================================
// bearer_token
// =============================================================================

#[test]
fn bearer_token_extracts_value() {
    let headers = headers_with_auth("Bearer abc123");
    assert_eq!(bearer_token(&headers), Some("abc123"));
}

#[test]
fn bearer_token_missing_header() {
    assert_eq!(bearer_token(&HeaderMap::new()), None);
}

#[test]
fn bearer_token_wrong_scheme() {
    let headers = headers_with_auth("Basic abc123");
    assert_eq!(bearer_token(&headers), None);
}

#[test]
fn bearer_token_empty_value() {
    let headers = headers_with_auth("Bearer ");
    assert_eq!(bearer_token(&headers), None);
}

#[test]
fn bearer_token_trims_whitespace() {
    let headers = headers_with_auth("Bearer  spaced  ");
    assert_eq!(bearer_token(&headers), Some("spaced"));
}

// =============================================================================
// AuthUser extractor
// =============================================================================

#[tokio::test]
async fn extractor_rejects_missing_token_without_db() {
    let (state, _store) = test_helpers::test_app_state();
    let (mut parts, ()) = Request::builder().uri("/auth/logout").body(()).unwrap().into_parts();

    let result = AuthUser::from_request_parts(&mut parts, &state).await;
    assert_eq!(result.err(), Some(StatusCode::UNAUTHORIZED));
}

// =============================================================================
// error → status mapping
// =============================================================================

#[test]
fn auth_error_statuses_match_rest_contract() {
    assert_eq!(auth_error_status(&AuthError::MissingField("name")), StatusCode::BAD_REQUEST);
    assert_eq!(auth_error_status(&AuthError::InvalidEmail), StatusCode::BAD_REQUEST);
    assert_eq!(auth_error_status(&AuthError::EmailTaken), StatusCode::CONFLICT);
    assert_eq!(auth_error_status(&AuthError::InvalidCredentials), StatusCode::UNAUTHORIZED);
    assert_eq!(
        auth_error_status(&AuthError::Db(sqlx::Error::PoolClosed)),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

// =============================================================================
// request shapes
// =============================================================================

#[test]
fn signup_request_defaults_missing_fields_to_empty() {
    let req: SignupRequest = serde_json::from_str(r#"{"email":"a@b.c"}"#).unwrap();
    assert_eq!(req.name, "");
    assert_eq!(req.email, "a@b.c");
    assert_eq!(req.password, "");
}

#[test]
fn login_request_parses() {
    let req: LoginRequest = serde_json::from_str(r#"{"email":"a@b.c","password":"pw"}"#).unwrap();
    assert_eq!(req.email, "a@b.c");
    assert_eq!(req.password, "pw");
}
