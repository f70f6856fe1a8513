//! Cemeteries and hospitals

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Longest accepted cemetery or hospital name
pub const MAX_NAME_LEN: usize = 255;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Cemetery {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Hospital {
    pub id: i64,
    pub name: String,
    /// Import that created this hospital and has not been applied yet
    pub active_import: Option<i64>,
}

/// Create/edit payload for a named entity
#[derive(Debug, Clone, Deserialize)]
pub struct NamePayload {
    pub name: String,
}

impl NamePayload {
    /// Trimmed, non-empty name within [`MAX_NAME_LEN`] characters
    pub fn validated(&self) -> Result<String, String> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err("name must not be empty".to_string());
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(format!("name is longer than {} characters", MAX_NAME_LEN));
        }
        Ok(name.to_string())
    }
}
