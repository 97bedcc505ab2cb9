//! Test builders — ergonomic constructors for jobs and chip lists.
//!
//! These builders are designed for readability in test assertions, not for
//! production use. They panic on invalid input rather than returning `Result`.

use chrono::{DateTime, TimeZone, Utc};
use sift_core::models::{job_registry, Job};
use sift_core::{Chip, ChipCompiler, ChipList};

// ---------------------------------------------------------------------------
// JobBuilder
// ---------------------------------------------------------------------------

/// Fluent builder for [`Job`] test fixtures.
///
/// # Example
///
/// ```rust
/// let job = JobBuilder::new("job-1")
///     .status("FAILED")
///     .user("alice")
///     .machine("gpu-07")
///     .build();
/// ```
pub struct JobBuilder {
    id: String,
    name: String,
    user: String,
    status: String,
    machine: Option<String>,
    created_at: DateTime<Utc>,
}

impl JobBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: format!("{id}-name"),
            id,
            user: "test-user".to_string(),
            status: "PENDING".to_string(),
            machine: None,
            created_at: Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap(),
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    pub fn status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    pub fn machine(mut self, machine: impl Into<String>) -> Self {
        self.machine = Some(machine.into());
        self
    }

    pub fn created_minutes_after(mut self, minutes: i64) -> Self {
        self.created_at += chrono::Duration::minutes(minutes);
        self
    }

    pub fn build(self) -> Job {
        Job {
            id: self.id,
            name: self.name,
            user: self.user,
            status: self.status,
            machine: self.machine,
            created_at: self.created_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Chip helpers
// ---------------------------------------------------------------------------

/// A chip with an empty label; equality ignores labels anyway.
pub fn chip(field: &str, value: &str) -> Chip {
    Chip::new(field, value, "")
}

/// Build a chip list from `(field, value)` pairs without validation.
pub fn chips(pairs: &[(&str, &str)]) -> ChipList {
    pairs.iter().map(|(f, v)| chip(f, v)).collect()
}

/// Compile raw chip texts against the job registry, panicking on error.
pub fn compiled(raw: &[&str]) -> ChipList {
    let registry = job_registry();
    let compiler = ChipCompiler::new(&registry).with_default_field("name");
    raw.iter().fold(ChipList::new(), |acc, text| {
        compiler
            .commit(&acc, text, None)
            .unwrap_or_else(|e| panic!("compiling {text:?} failed: {e}"))
    })
}
