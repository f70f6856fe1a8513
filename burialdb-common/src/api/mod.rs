//! Shared HTTP API functionality
//!
//! Contains ONLY pure functions, database operations and shared types; the
//! axum middleware wrapping them lives in burialdb-web.

pub mod auth;

pub use auth::{
    calculate_hash, initialize_shared_secret, load_shared_secret, validate_hash,
    validate_timestamp, ApiAuthError, AuthQuery,
};
