//! Error types for sift-core.

/// Why a piece of free text could not become a chip.
///
/// The `Display` output is the message shown to the operator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("unknown field `{0}`")]
    UnknownField(String),

    #[error("`{0}` needs a field prefix such as `status:`")]
    NoField(String),

    #[error("{field} needs a value")]
    Empty { field: String },

    #[error("`{value}` is not a known {field}")]
    NoMatch { field: String, value: String },

    #[error("`{value}` is not a complete {field}; did you mean {}?", .candidates.join(" or "))]
    Incomplete {
        field: String,
        value: String,
        candidates: Vec<String>,
    },

    #[error("`{value}` is ambiguous for {field}: could be {}", .candidates.join(", "))]
    Ambiguous {
        field: String,
        value: String,
        candidates: Vec<String>,
    },

    #[error("{message}")]
    Rejected { field: String, message: String },
}

/// A field registry that failed its one-time construction checks.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("a registry needs at least one field")]
    NoFields,

    #[error("field id `{0}` is registered twice")]
    DuplicateId(String),

    #[error("prefix `{prefix}` is shared by fields `{first}` and `{second}`")]
    DuplicatePrefix {
        prefix: String,
        first: String,
        second: String,
    },

    #[error("field `{0}` requires a valid value but has no validator")]
    MissingValidator(String),

    #[error("field `{0}` has an empty id or prefix")]
    Blank(String),
}

/// An enumeration that cannot back a [`StatusMatcher`](crate::matcher::StatusMatcher).
#[derive(Debug, thiserror::Error)]
pub enum MatcherError {
    #[error("enumeration is empty")]
    Empty,

    #[error("enumeration has {0} values; at most 64 are supported")]
    TooManyValues(usize),

    #[error("value `{0}` appears more than once")]
    DuplicateValue(String),

    #[error("label `{label}` is used by both `{first}` and `{second}`")]
    DuplicateLabel { label: String, first: String, second: String },

    #[error("value `{0}` has no tokens")]
    NoTokens(String),

    #[error("failed to build token index: {0}")]
    Index(#[from] fst::Error),
}

/// A preset that does not fit the registry it is compiled against.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PresetError {
    #[error("preset `{0}` is defined twice")]
    DuplicateId(String),

    #[error("preset `{0}` has no values")]
    NoValues(String),

    #[error("preset `{preset}`: {source}")]
    Invalid {
        preset: String,
        #[source]
        source: ValidationError,
    },
}
