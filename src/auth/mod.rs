use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config;
use crate::error::ApiError;

/// Role tags allowed to verify channels.
pub const ELEVATED_ROLES: &[&str] = &["maxsuperuser", "superuser", "superadmin", "admin"];

pub fn is_elevated(user_type: &str) -> bool {
    ELEVATED_ROLES.contains(&user_type)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: String,
    pub tenant_id: String,
    pub user_type: String,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(user_id: String, tenant_id: String, user_type: String) -> Self {
        let now = Utc::now();
        let expiry_hours = config::config().security.jwt_expiry_hours;
        let exp = (now + Duration::hours(expiry_hours as i64)).timestamp();

        Self { user_id, tenant_id, user_type, exp, iat: now.timestamp() }
    }
}

/// Tokens are minted by the platform's auth service; this issuer exists for
/// tests and operational tooling that share the secret.
pub fn generate_token(claims: &Claims, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
    encode(&Header::default(), claims, &EncodingKey::from_secret(secret.as_bytes()))
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, String> {
    if secret.is_empty() {
        return Err("JWT secret not configured".to_string());
    }

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let token_data = decode::<Claims>(token, &decoding_key, &Validation::default())
        .map_err(|e| format!("Invalid bearer token: {}", e))?;

    Ok(token_data.claims)
}

/// Caller identity resolved from the bearer token. Handlers that mutate data
/// take this as an argument; its absence short-circuits into the standard
/// UNAUTHORIZED envelope before the service runs.
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: String,
    pub tenant_id: String,
    pub user_type: String,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.user_id,
            tenant_id: claims.tenant_id,
            user_type: claims.user_type,
        }
    }
}

fn extract_bearer(parts: &Parts) -> Result<String, String> {
    let auth_header = parts
        .headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| "Missing Authorization header".to_string())?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    if let Some(token) = auth_str.strip_prefix("Bearer ") {
        if token.trim().is_empty() {
            return Err("Empty bearer token".to_string());
        }
        Ok(token.to_string())
    } else {
        Err("Authorization header must use Bearer token format".to_string())
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = extract_bearer(parts).map_err(ApiError::Unauthorized)?;
        let claims = verify_token(&token, &config::config().security.jwt_secret)
            .map_err(ApiError::Unauthorized)?;

        Ok(AuthUser::from(claims))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elevated_roles_allow_list() {
        for role in ["maxsuperuser", "superuser", "superadmin", "admin"] {
            assert!(is_elevated(role), "{} should be elevated", role);
        }
        assert!(!is_elevated("listener"));
        assert!(!is_elevated("Admin"));
    }

    #[test]
    fn token_round_trip() {
        let claims = Claims::new("user-1".into(), "tenant-1".into(), "publisher".into());
        let token = generate_token(&claims, "unit-test-secret").unwrap();

        let decoded = verify_token(&token, "unit-test-secret").unwrap();
        assert_eq!(decoded.user_id, "user-1");
        assert_eq!(decoded.tenant_id, "tenant-1");
        assert_eq!(decoded.user_type, "publisher");
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let claims = Claims::new("user-1".into(), "tenant-1".into(), "publisher".into());
        let token = generate_token(&claims, "unit-test-secret").unwrap();
        assert!(verify_token(&token, "other-secret").is_err());
    }

    #[test]
    fn empty_secret_is_rejected() {
        assert!(verify_token("whatever", "").is_err());
    }
}
