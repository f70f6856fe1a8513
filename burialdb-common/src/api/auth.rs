//! API authentication via timestamp and hash validation
//!
//! # Scheme
//!
//! - Protected requests carry `timestamp` (Unix epoch ms) and `hash` (SHA-256)
//!   as query parameters
//! - Timestamp must be within 30s past and 1s future of server time
//! - Hash is calculated from the canonical JSON of
//!   `{method, path, timestamp, hash: <64 zeros>}` followed by the shared secret
//! - Shared secret is stored in the settings table
//! - Setting the shared secret to 0 disables auth checking

use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::SqlitePool;
use thiserror::Error;

use crate::db::settings;
use crate::hash::{sha256_hex, to_canonical_json};

/// Settings key holding the shared secret
pub const SHARED_SECRET_KEY: &str = "api_shared_secret";

/// Oldest accepted timestamp, relative to server time
pub const MAX_PAST_MS: i64 = 30_000;

/// Clock drift allowance for timestamps ahead of server time
pub const MAX_FUTURE_MS: i64 = 1_000;

const DUMMY_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// Authentication parameters carried in the query string
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthQuery {
    /// Unix epoch time in milliseconds
    pub timestamp: i64,

    /// SHA-256 hash (64 hex chars)
    pub hash: String,
}

/// Authentication error types
#[derive(Debug, Clone, Error)]
pub enum ApiAuthError {
    /// Timestamp outside acceptable window
    #[error("Invalid timestamp: {reason}")]
    InvalidTimestamp {
        timestamp: i64,
        now: i64,
        reason: String,
    },

    /// Hash does not match calculated value
    #[error("Invalid hash")]
    InvalidHash { provided: String, calculated: String },

    /// Timestamp or hash missing from request
    #[error("Missing authentication parameters")]
    MissingCredentials,

    /// Database error loading shared secret
    #[error("Database error: {0}")]
    DatabaseError(String),
}

/// Load shared secret from database settings
///
/// A missing secret is generated and stored. The special value 0 disables
/// auth checking.
pub async fn load_shared_secret(db: &SqlitePool) -> Result<i64, ApiAuthError> {
    let stored = settings::get_setting(db, SHARED_SECRET_KEY)
        .await
        .map_err(|e| ApiAuthError::DatabaseError(e.to_string()))?;

    match stored {
        Some(value) => value
            .trim()
            .parse::<i64>()
            .map_err(|e| ApiAuthError::DatabaseError(format!("Invalid i64: {}", e))),
        None => initialize_shared_secret(db).await,
    }
}

/// Generate a random non-zero shared secret and store it
pub async fn initialize_shared_secret(db: &SqlitePool) -> Result<i64, ApiAuthError> {
    use rand::Rng;

    let mut rng = rand::thread_rng();
    let secret: i64 = loop {
        let val = rng.gen::<i64>();
        if val != 0 {
            break val;
        }
    };

    settings::set_setting(db, SHARED_SECRET_KEY, &secret.to_string())
        .await
        .map_err(|e| ApiAuthError::DatabaseError(e.to_string()))?;

    Ok(secret)
}

/// Validate timestamp against the current server time
pub fn validate_timestamp(timestamp: i64) -> Result<(), ApiAuthError> {
    validate_timestamp_at(timestamp, chrono::Utc::now().timestamp_millis())
}

/// Validate timestamp against an explicit `now`
///
/// # Examples
///
/// ```
/// use burialdb_common::api::auth::validate_timestamp_at;
///
/// let now = 1_730_000_000_000;
/// assert!(validate_timestamp_at(now - 500, now).is_ok());
/// assert!(validate_timestamp_at(now - 60_000, now).is_err());
/// ```
pub fn validate_timestamp_at(timestamp: i64, now: i64) -> Result<(), ApiAuthError> {
    let diff = now - timestamp;

    if diff > MAX_PAST_MS {
        return Err(ApiAuthError::InvalidTimestamp {
            timestamp,
            now,
            reason: format!("Timestamp {}ms too old (max {}ms past)", diff, MAX_PAST_MS),
        });
    }

    if diff < -MAX_FUTURE_MS {
        return Err(ApiAuthError::InvalidTimestamp {
            timestamp,
            now,
            reason: format!(
                "Timestamp {}ms in future (max {}ms future)",
                diff.abs(),
                MAX_FUTURE_MS
            ),
        });
    }

    Ok(())
}

/// Calculate the request hash
///
/// # Examples
///
/// ```
/// use burialdb_common::api::auth::calculate_hash;
///
/// let hash = calculate_hash("get", "/api/persons", 1730000000000, 123456789);
/// assert_eq!(hash.len(), 64);
/// assert_eq!(hash, calculate_hash("GET", "/api/persons", 1730000000000, 123456789));
/// ```
pub fn calculate_hash(method: &str, path: &str, timestamp: i64, shared_secret: i64) -> String {
    let value = json!({
        "method": method.to_ascii_uppercase(),
        "path": path,
        "timestamp": timestamp,
        "hash": DUMMY_HASH,
    });

    let to_hash = format!("{}{}", to_canonical_json(&value), shared_secret);
    sha256_hex(to_hash.as_bytes())
}

/// Validate hash matches calculated value
pub fn validate_hash(
    provided_hash: &str,
    method: &str,
    path: &str,
    timestamp: i64,
    shared_secret: i64,
) -> Result<(), ApiAuthError> {
    let calculated = calculate_hash(method, path, timestamp, shared_secret);

    if !provided_hash.eq_ignore_ascii_case(&calculated) {
        return Err(ApiAuthError::InvalidHash {
            provided: provided_hash.to_string(),
            calculated,
        });
    }

    Ok(())
}
