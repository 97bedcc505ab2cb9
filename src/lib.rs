//! sift — chip-based filtering and paged fetching over operational records.
//!
//! The binary is a thin shell over [`commands`]; the filter core lives in
//! `sift-core` and the remote collaborators in `sift-feeds`. Both are
//! re-exported so integration tests can import everything from one place.
//!
//! # Architecture
//!
//! ```text
//! raw text ──► sift-core (chips, presets, query plan) ──► sift-feeds (fetch, cache)
//!                                                              │
//!                                              remote collection (HTTP)
//! ```

pub mod commands;

pub use commands::{execute, Command};
pub use sift_core as core;
pub use sift_feeds as feeds;
