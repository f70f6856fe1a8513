//! Person search filters and the content-hashed search cache
//!
//! A filter is a map of criterion name to raw value. Its canonical JSON is
//! hashed so equal filters always resolve to the same cached search id,
//! whatever the parameter order.

use burialdb_common::db::fields::{find_pair, FieldKind};
use burialdb_common::hash::{content_hash, to_canonical_json};
use burialdb_common::{Error, Result};
use chrono::NaiveDate;
use serde_json::{Map, Value};
use sqlx::SqlitePool;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::db::{search_data, BindValue, PersonFilter};
use crate::models::{Fate, PersonStatus};

/// Criterion filtering on the derived completeness status
pub const STATUS_CRITERION: &str = "status";

/// Query parameters that are not search criteria
const RESERVED_PARAMS: &[&str] = &["page", "timestamp", "hash"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    #[error("Unknown search criterion: {0}")]
    UnknownCriterion(String),

    #[error("Invalid value for {criterion}: {reason}")]
    InvalidValue { criterion: String, reason: String },
}

impl From<SearchError> for Error {
    fn from(err: SearchError) -> Self {
        Error::InvalidInput(err.to_string())
    }
}

/// Validated search criteria
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilter {
    criteria: BTreeMap<String, String>,
}

impl SearchFilter {
    /// Build a filter from query parameters
    ///
    /// Blank values are ignored, reserved parameters skipped, and a
    /// repeated parameter keeps its last value.
    pub fn from_params<I>(params: I) -> std::result::Result<Self, SearchError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut criteria = BTreeMap::new();

        for (key, value) in params {
            if RESERVED_PARAMS.contains(&key.as_str()) {
                continue;
            }
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            validate_criterion(&key, value)?;
            criteria.insert(key, value.to_string());
        }

        Ok(Self { criteria })
    }

    /// Rebuild a filter from its cached JSON form
    pub fn from_json(fields: &str) -> std::result::Result<Self, SearchError> {
        let map: Map<String, Value> = serde_json::from_str(fields).map_err(|e| {
            SearchError::InvalidValue {
                criterion: "cached search".to_string(),
                reason: e.to_string(),
            }
        })?;

        Self::from_params(map.into_iter().map(|(k, v)| {
            let value = match v {
                Value::String(s) => s,
                other => other.to_string(),
            };
            (k, value)
        }))
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }

    pub fn criteria(&self) -> &BTreeMap<String, String> {
        &self.criteria
    }

    pub fn to_json(&self) -> Value {
        Value::Object(
            self.criteria
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect(),
        )
    }

    /// Deterministic hash of the canonical JSON form
    pub fn content_hash(&self) -> String {
        content_hash(&self.to_json())
    }

    /// WHERE clause over persons not linked to an import
    pub fn to_person_filter(&self) -> PersonFilter {
        let mut filter = PersonFilter::unlinked();

        for (key, value) in &self.criteria {
            if key == STATUS_CRITERION {
                if let Some(status) = PersonStatus::parse(value) {
                    filter.push_status(status);
                }
                continue;
            }

            let Some(pair) = find_pair(key) else {
                continue;
            };
            match pair.kind {
                FieldKind::Text => filter.push_pair_contains(pair.name, value),
                FieldKind::Date => {
                    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
                        filter.push_pair_equals(pair.name, BindValue::Date(date));
                    }
                }
                FieldKind::Fate => {
                    if let Some(fate) = Fate::parse(value) {
                        filter.push_pair_equals(pair.name, BindValue::Text(fate.as_str().to_string()));
                    }
                }
                FieldKind::Hospital | FieldKind::Cemetery => {
                    if let Ok(id) = value.parse::<i64>() {
                        filter.push_pair_equals(pair.name, BindValue::Int(id));
                    }
                }
            }
        }

        filter
    }
}

fn validate_criterion(key: &str, value: &str) -> std::result::Result<(), SearchError> {
    let invalid = |reason: &str| SearchError::InvalidValue {
        criterion: key.to_string(),
        reason: reason.to_string(),
    };

    if key == STATUS_CRITERION {
        return PersonStatus::parse(value)
            .map(|_| ())
            .ok_or_else(|| invalid("expected incomplete, partial or complete"));
    }

    let pair = find_pair(key).ok_or_else(|| SearchError::UnknownCriterion(key.to_string()))?;
    match pair.kind {
        FieldKind::Text => Ok(()),
        FieldKind::Date => NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map(|_| ())
            .map_err(|_| invalid("expected YYYY-MM-DD")),
        FieldKind::Fate => Fate::parse(value)
            .map(|_| ())
            .ok_or_else(|| invalid("unknown fate code")),
        FieldKind::Hospital | FieldKind::Cemetery => value
            .parse::<i64>()
            .map(|_| ())
            .map_err(|_| invalid("expected an integer id")),
    }
}

/// Cached search id for a filter, stored on first use
pub async fn cache_search(pool: &SqlitePool, filter: &SearchFilter) -> Result<i64> {
    let fields = to_canonical_json(&filter.to_json());
    search_data::find_or_insert(pool, &filter.content_hash(), &fields).await
}

/// Filter of a cached search
pub async fn load_search(pool: &SqlitePool, id: i64) -> Result<SearchFilter> {
    let fields = search_data::get_fields(pool, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Search {} not found", id)))?;
    SearchFilter::from_json(&fields).map_err(|e| Error::Internal(e.to_string()))
}
