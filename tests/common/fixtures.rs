//! Shared enumerations, job corpora and config files used across harnesses.

use super::builders::JobBuilder;
use fake::faker::name::en::FirstName;
use fake::Fake;
use sift_core::models::{Job, JOB_STATUSES};
use std::path::PathBuf;

/// The status enumeration used by the matcher scenarios.
pub const SCENARIO_STATUSES: &[&str] = &[
    "PENDING",
    "WAITING",
    "RUNNING",
    "COMPLETED",
    "FAILED",
    "FAILED_IMAGE_PULL",
    "FAILED_EVICTED",
];

/// A small, hand-written job corpus with every field populated.
pub fn sample_jobs() -> Vec<Job> {
    vec![
        JobBuilder::new("job-1").name("nightly-etl").user("alice").status("RUNNING").machine("gpu-01").build(),
        JobBuilder::new("job-2").name("nightly-report").user("alice").status("FAILED").machine("gpu-02").build(),
        JobBuilder::new("job-3").name("train-resnet").user("bob").status("FAILED_IMAGE_PULL").build(),
        JobBuilder::new("job-4").name("train-bert").user("bob").status("PENDING").build(),
        JobBuilder::new("job-5").name("backfill").user("carol").status("WAITING").build(),
        JobBuilder::new("job-6").name("cleanup").user("carol").status("COMPLETED").machine("cpu-11").build(),
    ]
}

/// `n` synthetic jobs cycling through every status, with random owners.
pub fn synthetic_jobs(n: usize) -> Vec<Job> {
    (0..n)
        .map(|i| {
            let user: String = FirstName().fake();
            JobBuilder::new(format!("job-{i:04}"))
                .user(user.to_lowercase())
                .status(JOB_STATUSES[i % JOB_STATUSES.len()])
                .created_minutes_after(i as i64)
                .build()
        })
        .collect()
}

/// Write `contents` to a `config.toml` inside a fresh temp dir.
///
/// Keep the returned [`tempfile::TempDir`] alive for as long as the path is
/// used.
pub fn config_file(contents: &str) -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("config.toml");
    std::fs::write(&path, contents).expect("write config");
    (dir, path)
}
