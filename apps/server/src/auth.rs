//! Bearer-token authentication.
//!
//! Tokens are HS256 JWTs signed with the configured secret. `sub` carries
//! the numeric user id; `roles` (array) or `role` (string) carries roles.
//! Requests without a token stay anonymous; an invalid token is rejected.

use axum::{
    extract::{FromRequestParts, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use crate::{models::UserId, state::AppState, Config};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: UserId,
    pub roles: Vec<String>,
}

impl Principal {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r.eq_ignore_ascii_case(role))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    MissingToken,
    InvalidToken(String),
    Misconfigured(String),
}

impl AuthError {
    fn status(&self) -> StatusCode {
        match self {
            Self::MissingToken | Self::InvalidToken(_) => StatusCode::UNAUTHORIZED,
            Self::Misconfigured(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            Self::MissingToken => "Missing bearer token".to_string(),
            Self::InvalidToken(msg) => format!("Invalid bearer token: {msg}"),
            Self::Misconfigured(msg) => format!("Authentication misconfigured: {msg}"),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.message(), "Authentication failure");
        }
        let body = axum::Json(json!({
            "error": {
                "status": status.as_u16(),
                "message": self.message(),
            }
        }));

        let mut response = (status, body).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                header::HeaderValue::from_static("Bearer"),
            );
        }
        response
    }
}

#[derive(Clone)]
pub struct AuthManager {
    config: Arc<Config>,
    key: Option<DecodingKey>,
}

impl AuthManager {
    pub fn new(config: Arc<Config>) -> Result<Self, AuthError> {
        let key = if config.auth.enabled {
            let secret = config
                .auth
                .jwt_secret
                .as_deref()
                .filter(|s| !s.is_empty())
                .ok_or_else(|| AuthError::Misconfigured("auth.jwt_secret is not set".to_string()))?;
            Some(DecodingKey::from_secret(secret.as_bytes()))
        } else {
            None
        };

        Ok(Self { config, key })
    }

    pub fn enabled(&self) -> bool {
        self.config.auth.enabled
    }

    pub fn admin_role(&self) -> &str {
        &self.config.auth.admin_role
    }

    /// `Ok(None)` when no Authorization header is present.
    pub fn authenticate_headers(
        &self,
        headers: &HeaderMap,
    ) -> Result<Option<Principal>, AuthError> {
        let Some(key) = &self.key else {
            return Ok(None);
        };

        let Some(authz) = headers.get(header::AUTHORIZATION) else {
            return Ok(None);
        };

        let authz = authz.to_str().map_err(|_| {
            AuthError::InvalidToken("Authorization header is not valid UTF-8".to_string())
        })?;

        let token = authz
            .strip_prefix("Bearer ")
            .or_else(|| authz.strip_prefix("bearer "))
            .ok_or_else(|| {
                AuthError::InvalidToken("Authorization header must be 'Bearer <token>'".to_string())
            })?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 60;
        if let Some(issuer) = &self.config.auth.issuer {
            validation.set_issuer(&[issuer]);
        }
        match &self.config.auth.audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        let token_data = decode::<serde_json::Value>(token, key, &validation)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        principal_from_claims(&token_data.claims).map(Some)
    }
}

fn principal_from_claims(claims: &serde_json::Value) -> Result<Principal, AuthError> {
    let user_id = match claims.get("sub") {
        Some(serde_json::Value::String(s)) => s.trim().parse::<i64>().ok(),
        Some(serde_json::Value::Number(n)) => n.as_i64(),
        _ => None,
    }
    .ok_or_else(|| AuthError::InvalidToken("'sub' must be a numeric user id".to_string()))?;

    let roles = if let Some(arr) = claims.get("roles").and_then(|v| v.as_array()) {
        arr.iter()
            .filter_map(|v| v.as_str().map(|s| s.to_string()))
            .collect()
    } else if let Some(role) = claims.get("role").and_then(|v| v.as_str()) {
        vec![role.to_string()]
    } else {
        Vec::new()
    };

    Ok(Principal {
        user_id: UserId(user_id),
        roles,
    })
}

/// Extractor for the authenticated principal attached by middleware.
///
/// Use `Option<AuthenticatedPrincipal>` in handlers for optional auth.
#[derive(Debug, Clone)]
pub struct AuthenticatedPrincipal(pub Principal);

#[async_trait::async_trait]
impl<S> FromRequestParts<S> for AuthenticatedPrincipal
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .map(AuthenticatedPrincipal)
            .ok_or_else(|| AuthError::MissingToken.into_response())
    }
}

/// Attach a `Principal` for valid tokens and reject invalid ones.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: axum::extract::Request,
    next: axum::middleware::Next,
) -> Response {
    if !state.auth.enabled() || req.method() == axum::http::Method::OPTIONS {
        return next.run(req).await;
    }

    match state.auth.authenticate_headers(req.headers()) {
        Ok(Some(principal)) => {
            tracing::debug!(user_id = principal.user_id.0, "Request authenticated");
            req.extensions_mut().insert::<Principal>(principal);
            next.run(req).await
        }
        Ok(None) => next.run(req).await,
        Err(err) => {
            tracing::info!(error = %err.message(), "Rejected bearer token");
            err.into_response()
        }
    }
}
