//! Core types for sift-core.
//!
//! This module defines the data shared across every layer: the filter
//! [`Chip`], the fuzzy [`MatchResult`], the [`SortOrder`] of a paged query,
//! and the normalised [`PaginatedResponse`] handed back by the fetcher.

use serde::{Deserialize, Serialize};

/// An atomic `field:value` filter.
///
/// Identity is the `(field, value)` pair; `label` is display-only and does
/// not take part in equality or hashing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chip {
    /// Id of the registered field this chip filters on.
    pub field: String,
    /// Filter value. Canonical for enumerated fields.
    pub value: String,
    /// Human-readable text shown on the chip.
    pub label: String,
}

impl Chip {
    pub fn new(field: impl Into<String>, value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
            label: label.into(),
        }
    }

    /// `true` if this chip filters `field` on `value`.
    pub fn is(&self, field: &str, value: &str) -> bool {
        self.field == field && self.value == value
    }

    /// `field:value`, the form used in query keys and URL serialisation.
    pub fn key(&self) -> String {
        format!("{}:{}", self.field, self.value)
    }
}

impl PartialEq for Chip {
    fn eq(&self, other: &Self) -> bool {
        self.field == other.field && self.value == other.value
    }
}

impl Eq for Chip {}

impl std::hash::Hash for Chip {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.field.hash(state);
        self.value.hash(state);
    }
}

impl std::fmt::Display for Chip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.field, self.value)
    }
}

/// Outcome of resolving free text against a closed enumeration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    /// Resolved canonical value, set only on an unambiguous full-confidence match.
    pub status: Option<String>,
    /// Token coverage of the best candidate, always within `[0, 1]`.
    pub confidence: f64,
    /// Surviving candidates, best first.
    pub candidates: Vec<String>,
}

impl MatchResult {
    /// The failed match: no status, zero confidence, no candidates.
    pub fn none() -> Self {
        Self {
            status: None,
            confidence: 0.0,
            candidates: Vec::new(),
        }
    }

    /// A verbatim hit on `value`.
    pub fn exact(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            status: Some(value.clone()),
            confidence: 1.0,
            candidates: vec![value],
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.status.is_some()
    }
}

/// Sort direction passed to the remote collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

impl std::fmt::Display for SortOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortOrder::Asc),
            "desc" | "descending" => Ok(SortOrder::Desc),
            other => Err(format!("unknown sort order `{other}` (expected asc or desc)")),
        }
    }
}

/// One normalised page of a remote collection.
///
/// A malformed upstream payload is represented as an empty page with `error`
/// set; it is never an `Err`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub has_more: bool,
    /// Offset of the next page, present iff `has_more`.
    pub next_offset: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filtered_total: Option<u64>,
    /// Upstream error reported while normalising the payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> PaginatedResponse<T> {
    /// An empty page carrying an upstream error.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            items: Vec::new(),
            has_more: false,
            next_offset: None,
            total: None,
            filtered_total: None,
            error: Some(error.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}
