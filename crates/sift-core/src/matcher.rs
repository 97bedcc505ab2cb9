//! Fuzzy status matcher — resolves free text to one value of a closed enumeration.
//!
//! Resolution is strictly ordered and the first hit wins:
//!
//! 1. **Exact**: the upper-cased input equals a canonical value.
//! 2. **Label**: the lower-cased input equals a value's human label.
//! 3. **Token intersection**: every input token must name at least one value;
//!    the candidate sets of all tokens are intersected. A single unknown token
//!    fails the whole match.
//! 4. **Coverage**: each survivor scores `input tokens / own tokens`, capped
//!    at 1.0. A value's *own* tokens are the ones it does not inherit from a
//!    parent value, the longest other value whose tokens prefix its own
//!    (`FAILED_IMAGE_PULL` owns `image` and `pull`, inheriting `failed`).
//!
//! The token index is an [`fst::Map`] from token to a bitmask of value
//! positions, so intersecting candidate sets is a bitwise AND. This caps an
//! enumeration at 64 values.

use crate::error::MatcherError;
use crate::types::MatchResult;
use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, LazyLock};

const MAX_VALUES: usize = u64::BITS as usize;

static SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s_:]+").expect("separator pattern must compile"));

/// Lowercase `input` and split it on whitespace, underscores and colons.
/// Empty and repeated tokens are dropped; first-seen order is kept.
pub fn tokenize(input: &str) -> Vec<String> {
    let lowered = input.to_lowercase();
    let mut tokens: Vec<String> = Vec::new();
    for token in SEPARATORS.split(&lowered).filter(|t| !t.is_empty()) {
        if !tokens.iter().any(|t| t == token) {
            tokens.push(token.to_string());
        }
    }
    tokens
}

// ---------------------------------------------------------------------------
// Enumeration
// ---------------------------------------------------------------------------

/// A frozen, ordered list of canonical values plus their human labels.
///
/// Values without an explicit label get one derived from the value itself
/// (`FAILED_EVICTED` → `failed evicted`).
#[derive(Debug, Clone, Default)]
pub struct Enumeration {
    values: Vec<String>,
    labels: HashMap<String, String>,
}

impl Enumeration {
    pub fn new<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            values: values.into_iter().map(Into::into).collect(),
            labels: HashMap::new(),
        }
    }

    /// Build from a static value list and a compile-time label map.
    pub fn from_static(values: &[&str], labels: &phf::Map<&'static str, &'static str>) -> Self {
        let mut enumeration = Self::new(values.iter().copied());
        for (value, label) in labels.entries() {
            enumeration.labels.insert((*value).to_string(), (*label).to_string());
        }
        enumeration
    }

    pub fn with_label(mut self, value: impl Into<String>, label: impl Into<String>) -> Self {
        self.labels.insert(value.into(), label.into());
        self
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    fn label_for(&self, value: &str) -> String {
        self.labels
            .get(value)
            .cloned()
            .unwrap_or_else(|| value.to_lowercase().replace('_', " "))
    }
}

// ---------------------------------------------------------------------------
// StatusMatcher
// ---------------------------------------------------------------------------

/// One autocomplete entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    pub value: String,
    pub label: String,
    pub score: f64,
}

struct Inner {
    values: Vec<String>,
    labels: Vec<String>,
    by_value: HashMap<String, usize>,
    by_label: HashMap<String, usize>,
    tokens: fst::Map<Vec<u8>>,
    own_tokens: Vec<usize>,
}

/// Matcher over a single enumeration. Cheap to clone.
#[derive(Clone)]
pub struct StatusMatcher {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for StatusMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusMatcher")
            .field("values", &self.inner.values)
            .finish_non_exhaustive()
    }
}

impl StatusMatcher {
    pub fn new(enumeration: Enumeration) -> Result<Self, MatcherError> {
        let count = enumeration.values.len();
        if count == 0 {
            return Err(MatcherError::Empty);
        }
        if count > MAX_VALUES {
            return Err(MatcherError::TooManyValues(count));
        }

        let mut by_value = HashMap::with_capacity(count);
        let mut by_label = HashMap::with_capacity(count);
        let mut labels = Vec::with_capacity(count);
        let mut value_tokens = Vec::with_capacity(count);
        // BTreeMap keeps keys sorted, which the fst builder requires.
        let mut index: BTreeMap<String, u64> = BTreeMap::new();

        for (pos, value) in enumeration.values.iter().enumerate() {
            if by_value.insert(value.to_uppercase(), pos).is_some() {
                return Err(MatcherError::DuplicateValue(value.clone()));
            }
            let label = enumeration.label_for(value);
            if let Some(first) = by_label.insert(label.to_lowercase(), pos) {
                return Err(MatcherError::DuplicateLabel {
                    label,
                    first: enumeration.values[first].clone(),
                    second: value.clone(),
                });
            }
            labels.push(label);

            let tokens = tokenize(value);
            if tokens.is_empty() {
                return Err(MatcherError::NoTokens(value.clone()));
            }
            for token in &tokens {
                *index.entry(token.clone()).or_insert(0) |= 1u64 << pos;
            }
            value_tokens.push(tokens);
        }

        let own_tokens = value_tokens
            .iter()
            .map(|tokens| {
                let inherited = value_tokens
                    .iter()
                    .filter(|other| other.len() < tokens.len() && tokens.starts_with(other))
                    .map(Vec::len)
                    .max()
                    .unwrap_or(0);
                tokens.len() - inherited
            })
            .collect();

        let tokens = fst::Map::from_iter(index.iter().map(|(token, mask)| (token.as_str(), *mask)))?;

        Ok(Self {
            inner: Arc::new(Inner {
                values: enumeration.values,
                labels,
                by_value,
                by_label,
                tokens,
                own_tokens,
            }),
        })
    }

    /// Canonical values in enumeration order.
    pub fn values(&self) -> &[String] {
        &self.inner.values
    }

    /// Human label for a canonical value.
    pub fn label(&self, value: &str) -> Option<&str> {
        self.position(value).map(|pos| self.inner.labels[pos].as_str())
    }

    /// The canonical spelling of `value`, if it is one (case-insensitive).
    pub fn canonical(&self, value: &str) -> Option<&str> {
        self.position(value).map(|pos| self.inner.values[pos].as_str())
    }

    fn position(&self, value: &str) -> Option<usize> {
        self.inner.by_value.get(&value.trim().to_uppercase()).copied()
    }

    /// Resolve free text to a canonical value.
    pub fn match_status(&self, input: &str) -> MatchResult {
        let input = input.trim();
        if input.is_empty() {
            return MatchResult::none();
        }

        if let Some(pos) = self.position(input) {
            return MatchResult::exact(&self.inner.values[pos]);
        }
        if let Some(&pos) = self.inner.by_label.get(&input.to_lowercase()) {
            return MatchResult::exact(&self.inner.values[pos]);
        }

        let tokens = tokenize(input);
        let Some(mask) = self.surviving(&tokens) else {
            tracing::debug!(input, "status match: no candidates");
            return MatchResult::none();
        };

        let ranked = self.rank(mask, tokens.len());
        let (best, confidence) = ranked[0];
        let full = ranked.iter().filter(|(_, score)| *score >= 1.0).count();
        let status = (confidence >= 1.0 && full == 1).then(|| self.inner.values[best].clone());

        tracing::debug!(
            input,
            status = ?status,
            confidence,
            candidates = ranked.len(),
            "status match"
        );

        MatchResult {
            status,
            confidence,
            candidates: ranked
                .into_iter()
                .map(|(pos, _)| self.inner.values[pos].clone())
                .collect(),
        }
    }

    /// Autocomplete entries for `input`, best first, at most `limit`.
    ///
    /// An empty input lists the enumeration in order.
    pub fn suggestions(&self, input: &str, limit: usize) -> Vec<Suggestion> {
        if limit == 0 {
            return Vec::new();
        }
        let tokens = tokenize(input);
        if tokens.is_empty() {
            return (0..self.inner.values.len())
                .take(limit)
                .map(|pos| self.suggestion(pos, 1.0))
                .collect();
        }
        let Some(mask) = self.surviving(&tokens) else {
            return Vec::new();
        };
        self.rank(mask, tokens.len())
            .into_iter()
            .take(limit)
            .map(|(pos, score)| self.suggestion(pos, score))
            .collect()
    }

    /// The value Tab should complete to, only when exactly one candidate survives.
    pub fn tab_complete(&self, input: &str) -> Option<String> {
        let result = self.match_status(input);
        if result.candidates.len() == 1 && result.confidence > 0.0 {
            result.candidates.into_iter().next()
        } else {
            None
        }
    }

    fn suggestion(&self, pos: usize, score: f64) -> Suggestion {
        Suggestion {
            value: self.inner.values[pos].clone(),
            label: self.inner.labels[pos].clone(),
            score,
        }
    }

    /// Bitmask of values containing every token, or `None` if any token is
    /// unknown or the intersection is empty.
    fn surviving(&self, tokens: &[String]) -> Option<u64> {
        if tokens.is_empty() {
            return None;
        }
        let mut mask = u64::MAX;
        for token in tokens {
            mask &= self.inner.tokens.get(token)?;
        }
        (mask != 0).then_some(mask)
    }

    /// Survivors with their coverage, best first, ties broken alphabetically.
    fn rank(&self, mask: u64, input_tokens: usize) -> Vec<(usize, f64)> {
        let mut ranked: Vec<(usize, f64)> = (0..self.inner.values.len())
            .filter(|pos| mask & (1u64 << pos) != 0)
            .map(|pos| {
                let coverage = input_tokens as f64 / self.inner.own_tokens[pos] as f64;
                (pos, coverage.min(1.0))
            })
            .collect();
        ranked.sort_by(|a, b| {
            b.1.total_cmp(&a.1)
                .then_with(|| self.inner.values[a.0].cmp(&self.inner.values[b.0]))
        });
        ranked
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn matcher() -> StatusMatcher {
        StatusMatcher::new(
            Enumeration::new([
                "PENDING",
                "WAITING",
                "RUNNING",
                "COMPLETED",
                "FAILED",
                "FAILED_IMAGE_PULL",
                "FAILED_EVICTED",
            ])
            .with_label("FAILED_IMAGE_PULL", "failed: image pull"),
        )
        .unwrap()
    }

    #[test]
    fn tokenize_splits_and_dedups() {
        assert_eq!(tokenize("  Failed:Image__pull image "), vec!["failed", "image", "pull"]);
        assert!(tokenize(" :_ ").is_empty());
    }

    #[test]
    fn full_phrase_resolves() {
        let r = matcher().match_status("failed image pull");
        assert_eq!(r.status.as_deref(), Some("FAILED_IMAGE_PULL"));
        assert_eq!(r.confidence, 1.0);
        assert_eq!(r.candidates, vec!["FAILED_IMAGE_PULL"]);
    }

    #[test]
    fn single_own_token_is_half_confident() {
        let r = matcher().match_status("image");
        assert_eq!(r.status, None);
        assert_eq!(r.confidence, 0.5);
        assert_eq!(r.candidates, vec!["FAILED_IMAGE_PULL"]);
    }

    #[test]
    fn unknown_token_fails_everything() {
        assert_eq!(matcher().match_status("xyz"), MatchResult::none());
        assert_eq!(matcher().match_status("failed xyz"), MatchResult::none());
    }

    #[test]
    fn disjoint_tokens_fail() {
        assert_eq!(matcher().match_status("image evicted"), MatchResult::none());
    }

    #[test]
    fn label_match_is_exact() {
        let r = matcher().match_status("Failed: Image Pull");
        assert_eq!(r, MatchResult::exact("FAILED_IMAGE_PULL"));
    }

    #[test]
    fn two_full_candidates_stay_unresolved() {
        // "failed:" is not verbatim, so it goes through tokens; FAILED and
        // FAILED_EVICTED both cover their own tokens fully.
        let r = matcher().match_status("failed:");
        assert_eq!(r.status, None);
        assert_eq!(r.confidence, 1.0);
        assert_eq!(r.candidates, vec!["FAILED", "FAILED_EVICTED", "FAILED_IMAGE_PULL"]);
    }

    #[rstest]
    #[case("pending", "PENDING")]
    #[case("Running", "RUNNING")]
    #[case(" completed ", "COMPLETED")]
    #[case("failed_evicted", "FAILED_EVICTED")]
    #[case("evicted", "FAILED_EVICTED")]
    #[case("image pull", "FAILED_IMAGE_PULL")]
    fn resolves(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(matcher().match_status(input).status.as_deref(), Some(expected));
    }

    #[test]
    fn suggestions_rank_by_score_then_name() {
        let values: Vec<String> = matcher()
            .suggestions("failed", 10)
            .into_iter()
            .map(|s| s.value)
            .collect();
        assert_eq!(values, vec!["FAILED", "FAILED_EVICTED", "FAILED_IMAGE_PULL"]);
    }

    #[test]
    fn suggestions_respect_limit() {
        assert_eq!(matcher().suggestions("failed", 2).len(), 2);
        assert!(matcher().suggestions("failed", 0).is_empty());
        assert_eq!(matcher().suggestions("", 3).len(), 3);
    }

    #[test]
    fn tab_completes_only_unique_candidates() {
        let m = matcher();
        assert_eq!(m.tab_complete("image").as_deref(), Some("FAILED_IMAGE_PULL"));
        assert_eq!(m.tab_complete("failed:"), None);
        assert_eq!(m.tab_complete("xyz"), None);
    }

    #[test]
    fn rejects_bad_enumerations() {
        assert!(matches!(
            StatusMatcher::new(Enumeration::default()),
            Err(MatcherError::Empty)
        ));
        assert!(matches!(
            StatusMatcher::new(Enumeration::new(["A", "a"])),
            Err(MatcherError::DuplicateValue(_))
        ));
        assert!(matches!(
            StatusMatcher::new(Enumeration::new((0..65).map(|i| format!("V{i}")))),
            Err(MatcherError::TooManyValues(65))
        ));
        assert!(matches!(
            StatusMatcher::new(Enumeration::new(["__"])),
            Err(MatcherError::NoTokens(_))
        ));
    }

    #[test]
    fn rejects_labels_shared_by_two_values() {
        let shared = Enumeration::new(["RUNNING", "ACTIVE"]).with_label("ACTIVE", "Running");
        match StatusMatcher::new(shared) {
            Err(MatcherError::DuplicateLabel { label, first, second }) => {
                assert_eq!(label, "Running");
                assert_eq!(first, "RUNNING");
                assert_eq!(second, "ACTIVE");
            }
            other => panic!("expected a duplicate label error, got {:?}", other.err()),
        }

        // A value's default label may match its own explicit one.
        assert!(StatusMatcher::new(Enumeration::new(["RUNNING"]).with_label("RUNNING", "running")).is_ok());
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn words() -> impl Strategy<Value = String> {
            prop::collection::vec(
                prop::sample::select(vec!["failed", "image", "pull", "evicted", "run", "pend", "xyz", "waiting"]),
                0..4,
            )
            .prop_map(|w| w.join(" "))
        }

        proptest! {
            #[test]
            fn canonical_values_match_exactly(idx in 0usize..7) {
                let m = matcher();
                let value = m.values()[idx].clone();
                let result = m.match_status(&value.to_uppercase());
                prop_assert_eq!(result.status.as_deref(), Some(value.as_str()));
                prop_assert_eq!(result.confidence, 1.0);
            }

            #[test]
            fn confidence_stays_in_range(input in words()) {
                let result = matcher().match_status(&input);
                prop_assert!((0.0..=1.0).contains(&result.confidence));
            }
        }
    }
}
