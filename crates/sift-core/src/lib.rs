//! sift-core — chip-based filtering over operational record collections.
//!
//! This crate holds everything that does not touch the network: the fuzzy
//! status matcher, the field registry, chip compilation, presets and the
//! query translator.
//!
//! # Architecture
//!
//! ```text
//! raw text ──► ChipCompiler ──► ChipList ──► QueryTranslator ──► client predicate
//!                  │               ▲                   └──────► server params
//!           FieldRegistry      PresetSet
//!                  │
//!            StatusMatcher
//! ```
//!
//! Every transition on a [`ChipList`] returns a new list; nothing here is
//! mutated in place, so the same list can be shared freely across tasks.

pub mod chips;
pub mod config;
pub mod error;
pub mod matcher;
pub mod models;
pub mod presets;
pub mod query;
pub mod registry;
pub mod types;

pub use chips::{ChipCompiler, ChipList};
pub use error::{MatcherError, PresetError, RegistryError, ValidationError};
pub use matcher::{Enumeration, StatusMatcher, Suggestion};
pub use presets::{CompiledPreset, Preset, PresetSet};
pub use query::{build_query_key, ParamValue, QueryPlan, QueryTranslator, RemoteCapabilities, ServerParams};
pub use registry::{FieldKind, FieldRegistry, ParamStyle, RemoteParam, SearchField};
pub use types::{Chip, MatchResult, PaginatedResponse, SortOrder};
