use actix_web::error::ErrorUnauthorized;
use actix_web::{Error, HttpMessage, HttpRequest};

use super::jwt::JwtKeys;
use super::model::Claims;

/// Extract token from Authorization header
fn extract_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|auth| auth.strip_prefix("Bearer "))
}

/// Validate token from HttpRequest and return claims
pub fn validate_request_token(req: &HttpRequest, keys: &JwtKeys) -> Result<Claims, Error> {
    let token = extract_token(req).ok_or_else(|| ErrorUnauthorized("Missing authorization token"))?;

    let claims = keys.validate_token(token).map_err(|e| {
        log::warn!("Token validation failed: {:?}", e);
        ErrorUnauthorized("Invalid or expired token")
    })?;

    if claims.token_type != "access" {
        return Err(ErrorUnauthorized("Invalid token type"));
    }

    req.extensions_mut().insert(claims.clone());
    Ok(claims)
}

/// Claims stored on the request by [`validate_request_token`].
pub trait ClaimsExt {
    fn claims(&self) -> Option<Claims>;
}

impl<T: HttpMessage> ClaimsExt for T {
    fn claims(&self) -> Option<Claims> {
        self.extensions().get::<Claims>().cloned()
    }
}
