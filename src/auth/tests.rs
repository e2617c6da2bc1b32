//! Unit tests for authentication module

use actix_web::test::TestRequest;
use jsonwebtoken::{encode, EncodingKey, Header};

use super::{validate_request_token, Claims, ClaimsExt, JwtKeys};

const SECRET: &str = "test-secret";

fn token(secret: &str, token_type: &str, ttl: i64) -> String {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: "user-1".to_string(),
        username: "uzman".to_string(),
        exp: (now + ttl) as usize,
        iat: now as usize,
        token_type: token_type.to_string(),
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes()))
        .expect("Failed to encode token")
}

#[test]
fn test_validate_access_token() {
    let keys = JwtKeys::from_secret(SECRET);
    let claims = keys
        .validate_token(&token(SECRET, "access", 900))
        .expect("Failed to validate token");

    assert_eq!(claims.sub, "user-1");
    assert_eq!(claims.username, "uzman");
    assert!(claims.exp > claims.iat);
}

#[test]
fn test_invalid_token_returns_error() {
    let keys = JwtKeys::from_secret(SECRET);
    assert!(keys.validate_token("invalid.token.here").is_err());
    assert!(keys.validate_token(&token("other-secret", "access", 900)).is_err());
}

#[test]
fn test_expired_token_returns_error() {
    let keys = JwtKeys::from_secret(SECRET);
    assert!(keys.validate_token(&token(SECRET, "access", -3600)).is_err());
}

#[test]
fn test_request_gate_requires_bearer_access_token() {
    let keys = JwtKeys::from_secret(SECRET);

    let missing = TestRequest::default().to_http_request();
    assert!(validate_request_token(&missing, &keys).is_err());

    let refresh = TestRequest::default()
        .insert_header(("Authorization", format!("Bearer {}", token(SECRET, "refresh", 900))))
        .to_http_request();
    assert!(validate_request_token(&refresh, &keys).is_err());

    let valid = TestRequest::default()
        .insert_header(("Authorization", format!("Bearer {}", token(SECRET, "access", 900))))
        .to_http_request();
    let claims = validate_request_token(&valid, &keys).expect("Failed to validate request");
    assert_eq!(claims.username, "uzman");
    assert_eq!(valid.claims().map(|c| c.sub), Some("user-1".to_string()));
}
