use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
};
use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: Option<String>,
    pub exp: usize,
}

/// HS256 secret used to verify bearer tokens, installed as a request extension.
#[derive(Clone)]
pub struct AuthConfig {
    decoding_key: Arc<DecodingKey>,
}

impl AuthConfig {
    pub fn new(jwt_secret: &str) -> Self {
        Self {
            decoding_key: Arc::new(DecodingKey::from_secret(jwt_secret.as_bytes())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: Option<String>,
}

/// Caller identity when a token is present. A missing header means anonymous; a bad
/// token is still rejected.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<AuthUser>);

impl MaybeAuthUser {
    pub fn user_id(&self) -> Option<Uuid> {
        self.0.as_ref().map(|user| user.user_id)
    }
}

type Rejection = (StatusCode, String);

pub fn validate_jwt(token: &str, config: &AuthConfig) -> anyhow::Result<Claims> {
    let validation = Validation::new(jsonwebtoken::Algorithm::HS256);

    let token_data = decode::<Claims>(token, &config.decoding_key, &validation)
        .map_err(|e| anyhow::anyhow!("JWT validation failed: {}", e))?;

    Ok(token_data.claims)
}

fn unauthorized(message: &str) -> Rejection {
    (StatusCode::UNAUTHORIZED, message.to_string())
}

fn user_from_header(header: &str, config: &AuthConfig) -> Result<AuthUser, Rejection> {
    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| unauthorized("Invalid Authorization header format"))?;

    let claims = validate_jwt(token, config)
        .map_err(|e| (StatusCode::UNAUTHORIZED, e.to_string()))?;

    let user_id =
        Uuid::parse_str(&claims.sub).map_err(|_| unauthorized("Invalid user ID in token"))?;

    Ok(AuthUser {
        user_id,
        email: claims.email,
    })
}

#[async_trait]
impl<S> FromRequestParts<S> for MaybeAuthUser
where
    S: Send + Sync,
{
    type Rejection = Rejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(auth_header) = parts.headers.get(AUTHORIZATION) else {
            return Ok(MaybeAuthUser(None));
        };

        let auth_str = auth_header
            .to_str()
            .map_err(|_| unauthorized("Invalid Authorization header"))?;

        let config = parts.extensions.get::<AuthConfig>().ok_or((
            StatusCode::INTERNAL_SERVER_ERROR,
            "Authentication is not configured".to_string(),
        ))?;

        user_from_header(auth_str, config).map(|user| MaybeAuthUser(Some(user)))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = Rejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        MaybeAuthUser::from_request_parts(parts, state)
            .await?
            .0
            .ok_or_else(|| unauthorized("Missing Authorization header"))
    }
}
