//! Authentication middleware
//!
//! Protected requests carry `timestamp` and `hash` query parameters; the
//! hash signs the method, path and timestamp with the shared secret.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use burialdb_common::api::auth::{validate_hash, validate_timestamp, ApiAuthError, AuthQuery};
use serde_json::json;
use tracing::warn;

use crate::AppState;

/// Authentication middleware
///
/// Secret 0 disables checking. Applied to `/api` routes only.
pub async fn auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    if state.shared_secret == 0 {
        return Ok(next.run(request).await);
    }

    let query = request.uri().query().unwrap_or("");
    let auth: AuthQuery = auth_params(query).ok_or(AuthError::MissingCredentials)?;

    validate_timestamp(auth.timestamp).map_err(|e| match e {
        ApiAuthError::InvalidTimestamp { reason, .. } => AuthError::InvalidTimestamp(reason),
        other => AuthError::Other(other.to_string()),
    })?;

    let method = request.method().as_str().to_string();
    let path = request.uri().path().to_string();
    validate_hash(&auth.hash, &method, &path, auth.timestamp, state.shared_secret).map_err(
        |e| match e {
            ApiAuthError::InvalidHash { provided, calculated } => {
                warn!(
                    %method,
                    %path,
                    "Hash validation failed: provided={}, calculated={}",
                    provided,
                    calculated
                );
                AuthError::InvalidHash
            }
            other => AuthError::Other(other.to_string()),
        },
    )?;

    Ok(next.run(request).await)
}

/// Pull `timestamp` and `hash` out of a raw query string, ignoring every
/// other parameter
fn auth_params(query: &str) -> Option<AuthQuery> {
    let mut timestamp = None;
    let mut hash = None;

    for pair in query.split('&') {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        match key {
            "timestamp" => timestamp = value.parse::<i64>().ok(),
            "hash" => hash = Some(value.to_string()),
            _ => {}
        }
    }

    Some(AuthQuery {
        timestamp: timestamp?,
        hash: hash.filter(|h| !h.is_empty())?,
    })
}

/// Authentication error types for HTTP responses
#[derive(Debug)]
pub enum AuthError {
    InvalidTimestamp(String),
    InvalidHash,
    MissingCredentials,
    Other(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AuthError::InvalidTimestamp(reason) => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                format!("Invalid timestamp: {}", reason),
            ),
            AuthError::InvalidHash => {
                (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", "Invalid hash".to_string())
            }
            AuthError::MissingCredentials => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Missing timestamp or hash query parameter".to_string(),
            ),
            AuthError::Other(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                format!("Authentication error: {}", msg),
            ),
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}
