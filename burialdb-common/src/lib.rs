//! # burialdb common library
//!
//! Shared code for the burialdb service and its tools:
//! - Error type
//! - Root folder and TOML configuration resolution
//! - Database initialization, schema and settings
//! - Canonical JSON hashing
//! - API request signing

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod hash;

pub use error::{Error, Result};
