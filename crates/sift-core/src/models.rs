//! Operational record types and their built-in field registries.
//!
//! The status enumerations are injected into the matcher as plain data, so
//! nothing here depends on how the remote service generates its own enums.

use crate::matcher::{Enumeration, StatusMatcher};
use crate::registry::{FieldRegistry, RemoteParam, SearchField};
use chrono::{DateTime, Utc};
use phf::phf_map;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

// ---------------------------------------------------------------------------
// Enumerations
// ---------------------------------------------------------------------------

/// Job lifecycle states, in display order.
pub const JOB_STATUSES: &[&str] = &[
    "PENDING",
    "WAITING",
    "RUNNING",
    "COMPLETED",
    "FAILED",
    "FAILED_IMAGE_PULL",
    "FAILED_EVICTED",
    "CANCELLED",
];

static JOB_STATUS_LABELS: phf::Map<&'static str, &'static str> = phf_map! {
    "PENDING" => "pending",
    "WAITING" => "waiting",
    "RUNNING" => "running",
    "COMPLETED" => "completed",
    "FAILED" => "failed",
    "FAILED_IMAGE_PULL" => "failed: image pull",
    "FAILED_EVICTED" => "failed: evicted",
    "CANCELLED" => "cancelled",
};

/// Machine availability states, in display order.
pub const MACHINE_STATES: &[&str] = &["ONLINE", "OFFLINE", "DRAINING", "MAINTENANCE"];

static MACHINE_STATE_LABELS: phf::Map<&'static str, &'static str> = phf_map! {
    "ONLINE" => "online",
    "OFFLINE" => "offline",
    "DRAINING" => "draining",
    "MAINTENANCE" => "in maintenance",
};

static JOB_STATUS_MATCHER: LazyLock<StatusMatcher> = LazyLock::new(|| {
    StatusMatcher::new(Enumeration::from_static(JOB_STATUSES, &JOB_STATUS_LABELS))
        .expect("built-in job status enumeration must be valid")
});

static MACHINE_STATE_MATCHER: LazyLock<StatusMatcher> = LazyLock::new(|| {
    StatusMatcher::new(Enumeration::from_static(MACHINE_STATES, &MACHINE_STATE_LABELS))
        .expect("built-in machine state enumeration must be valid")
});

static JOB_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9-]{0,63}$").expect("job id pattern must compile"));

static HOSTNAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]([a-z0-9-]*[a-z0-9])?(\.[a-z0-9]([a-z0-9-]*[a-z0-9])?)*$")
        .expect("hostname pattern must compile")
});

pub fn job_status_matcher() -> StatusMatcher {
    JOB_STATUS_MATCHER.clone()
}

pub fn machine_state_matcher() -> StatusMatcher {
    MACHINE_STATE_MATCHER.clone()
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A scheduled job as listed by the remote collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub name: String,
    pub user: String,
    pub status: String,
    #[serde(default)]
    pub machine: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A worker machine as listed by the remote collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Machine {
    pub hostname: String,
    pub pool: String,
    pub state: String,
    #[serde(default)]
    pub last_seen: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Registries
// ---------------------------------------------------------------------------

/// Searchable fields of [`Job`].
///
/// `machine` has no client predicate: job placement is only known to the
/// scheduler, so that filter always runs remotely.
pub fn job_registry() -> FieldRegistry<Job> {
    let fields = vec![
        SearchField::enumerated("status", "Status", job_status_matcher())
            .values(|jobs: &[Job]| jobs.iter().map(|j| j.status.clone()).collect())
            .matches(|job: &Job, value| job.status == value)
            .remote(RemoteParam::list("status")),
        SearchField::free_form("user", "User")
            .prefix("owner")
            .values(|jobs: &[Job]| jobs.iter().map(|j| j.user.clone()).collect())
            .matches(|job: &Job, value| job.user.eq_ignore_ascii_case(value))
            .remote(RemoteParam::list("user").include_all("all_users")),
        SearchField::free_form("machine", "Machine")
            .values(|jobs: &[Job]| jobs.iter().filter_map(|j| j.machine.clone()).collect())
            .remote(RemoteParam::scalar("machine")),
        SearchField::free_form("name", "Name")
            .values(|jobs: &[Job]| jobs.iter().map(|j| j.name.clone()).collect())
            .matches(|job: &Job, value| job.name.to_lowercase().contains(&value.to_lowercase()))
            .remote(RemoteParam::scalar("q")),
        SearchField::free_form("id", "Job id")
            .values(|jobs: &[Job]| jobs.iter().map(|j| j.id.clone()).collect())
            .matches(|job: &Job, value| job.id == value)
            .validate(|value| {
                if JOB_ID.is_match(value) {
                    Ok(())
                } else {
                    Err(format!("`{value}` is not a job id (letters, digits and dashes)"))
                }
            })
            .require_valid_value(),
    ];
    FieldRegistry::new(fields).expect("built-in job registry must be valid")
}

/// Searchable fields of [`Machine`].
pub fn machine_registry() -> FieldRegistry<Machine> {
    let fields = vec![
        SearchField::enumerated("state", "State", machine_state_matcher())
            .values(|machines: &[Machine]| machines.iter().map(|m| m.state.clone()).collect())
            .matches(|machine: &Machine, value| machine.state == value)
            .remote(RemoteParam::list("state")),
        SearchField::free_form("pool", "Pool")
            .values(|machines: &[Machine]| machines.iter().map(|m| m.pool.clone()).collect())
            .matches(|machine: &Machine, value| machine.pool == value)
            .remote(RemoteParam::list("pool").include_all("all_pools")),
        SearchField::free_form("hostname", "Hostname")
            .prefix("host")
            .values(|machines: &[Machine]| machines.iter().map(|m| m.hostname.clone()).collect())
            .matches(|machine: &Machine, value| machine.hostname.contains(value))
            .validate(|value| {
                if HOSTNAME.is_match(value) {
                    Ok(())
                } else {
                    Err(format!("`{value}` is not a valid hostname"))
                }
            })
            .remote(RemoteParam::scalar("hostname")),
    ];
    FieldRegistry::new(fields).expect("built-in machine registry must be valid")
}
