//! Field registry — the static description of which entity attributes are
//! searchable, and how.
//!
//! Each [`SearchField`] is an explicit record of capabilities: a value
//! extractor that drives autocomplete, an optional client-side predicate, an
//! optional validator and a description of the remote parameter it maps to.
//! A field without a predicate is filtered remotely.
//!
//! [`FieldRegistry::new`] checks the whole set once, so later lookups never
//! have to second-guess a field.

use crate::error::{RegistryError, ValidationError};
use crate::matcher::StatusMatcher;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

type ValuesFn<E> = Arc<dyn Fn(&[E]) -> Vec<String> + Send + Sync>;
type MatchFn<E> = Arc<dyn Fn(&E, &str) -> bool + Send + Sync>;
type ValidateFn = Arc<dyn Fn(&str) -> Result<(), String> + Send + Sync>;

// ---------------------------------------------------------------------------
// Remote parameter description
// ---------------------------------------------------------------------------

/// How chips on one field are sent to the remote collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamStyle {
    /// Every value is sent, as a repeated parameter.
    List,
    /// Only one value is sent.
    Scalar,
}

/// The remote query parameter behind a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteParam {
    pub name: String,
    pub style: ParamStyle,
    /// Boolean parameter that is `true` only while no chip restricts this
    /// field, e.g. `all_users`.
    pub include_all: Option<String>,
}

impl RemoteParam {
    pub fn list(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            style: ParamStyle::List,
            include_all: None,
        }
    }

    pub fn scalar(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            style: ParamStyle::Scalar,
            include_all: None,
        }
    }

    pub fn include_all(mut self, toggle: impl Into<String>) -> Self {
        self.include_all = Some(toggle.into());
        self
    }
}

// ---------------------------------------------------------------------------
// SearchField
// ---------------------------------------------------------------------------

/// Whether a field accepts only enumerated values.
#[derive(Debug, Clone)]
pub enum FieldKind {
    /// Closed enumeration resolved through a [`StatusMatcher`].
    Enumerated(StatusMatcher),
    /// Any non-empty string.
    FreeForm,
}

/// A registered, searchable entity attribute (a facet).
pub struct SearchField<E> {
    pub id: String,
    pub label: String,
    pub prefix: String,
    pub kind: FieldKind,
    pub requires_valid_value: bool,
    pub remote: Option<RemoteParam>,
    values: ValuesFn<E>,
    matches: Option<MatchFn<E>>,
    validate: Option<ValidateFn>,
}

impl<E> Clone for SearchField<E> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            label: self.label.clone(),
            prefix: self.prefix.clone(),
            kind: self.kind.clone(),
            requires_valid_value: self.requires_valid_value,
            remote: self.remote.clone(),
            values: Arc::clone(&self.values),
            matches: self.matches.clone(),
            validate: self.validate.clone(),
        }
    }
}

impl<E> std::fmt::Debug for SearchField<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchField")
            .field("id", &self.id)
            .field("prefix", &self.prefix)
            .field("kind", &self.kind)
            .field("client_match", &self.matches.is_some())
            .field("remote", &self.remote)
            .finish()
    }
}

impl<E> SearchField<E> {
    fn new(id: impl Into<String>, label: impl Into<String>, kind: FieldKind) -> Self {
        let id = id.into();
        Self {
            prefix: id.clone(),
            id,
            label: label.into(),
            kind,
            requires_valid_value: false,
            remote: None,
            values: Arc::new(|_| Vec::new()),
            matches: None,
            validate: None,
        }
    }

    /// A field restricted to the values of `matcher`'s enumeration.
    pub fn enumerated(id: impl Into<String>, label: impl Into<String>, matcher: StatusMatcher) -> Self {
        let mut field = Self::new(id, label, FieldKind::Enumerated(matcher));
        field.requires_valid_value = true;
        field
    }

    /// A field accepting any non-empty value.
    pub fn free_form(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(id, label, FieldKind::FreeForm)
    }

    /// Chip prefix typed before the colon. Defaults to the id.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn values(mut self, f: impl Fn(&[E]) -> Vec<String> + Send + Sync + 'static) -> Self {
        self.values = Arc::new(f);
        self
    }

    pub fn matches(mut self, f: impl Fn(&E, &str) -> bool + Send + Sync + 'static) -> Self {
        self.matches = Some(Arc::new(f));
        self
    }

    pub fn validate(mut self, f: impl Fn(&str) -> Result<(), String> + Send + Sync + 'static) -> Self {
        self.validate = Some(Arc::new(f));
        self
    }

    /// Refuse chips whose value fails validation instead of only logging it.
    pub fn require_valid_value(mut self) -> Self {
        self.requires_valid_value = true;
        self
    }

    pub fn remote(mut self, param: RemoteParam) -> Self {
        self.remote = Some(param);
        self
    }

    /// Only enumerated values are legal.
    pub fn is_exhaustive(&self) -> bool {
        matches!(self.kind, FieldKind::Enumerated(_))
    }

    pub fn matcher(&self) -> Option<&StatusMatcher> {
        match &self.kind {
            FieldKind::Enumerated(matcher) => Some(matcher),
            FieldKind::FreeForm => None,
        }
    }

    /// `false` when filtering on this field is delegated to the remote side.
    pub fn has_client_match(&self) -> bool {
        self.matches.is_some()
    }

    /// Distinct candidate values present in `entities`, sorted.
    pub fn get_values(&self, entities: &[E]) -> Vec<String> {
        let distinct: BTreeSet<String> = (self.values)(entities)
            .into_iter()
            .filter(|v| !v.trim().is_empty())
            .collect();
        distinct.into_iter().collect()
    }

    /// Client-side test of one value. Always `true` without a predicate.
    pub fn match_entity(&self, entity: &E, value: &str) -> bool {
        match &self.matches {
            Some(f) => f(entity, value),
            None => true,
        }
    }

    /// Check `value` and return the form a chip should store.
    ///
    /// Enumerated fields return the canonical value and only accept a
    /// full-confidence, unambiguous match. A custom validator's message
    /// rejects the value when the field requires valid values; otherwise it is
    /// only logged.
    pub fn validate_value(&self, value: &str) -> Result<String, ValidationError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(ValidationError::Empty {
                field: self.label.clone(),
            });
        }

        let normalized = match &self.kind {
            FieldKind::Enumerated(matcher) => resolve(matcher, &self.label, value)?,
            FieldKind::FreeForm => value.to_string(),
        };

        if let Some(validate) = &self.validate {
            if let Err(message) = validate(&normalized) {
                if self.requires_valid_value {
                    return Err(ValidationError::Rejected {
                        field: self.label.clone(),
                        message,
                    });
                }
                tracing::debug!(field = %self.id, value = %normalized, %message, "accepting value that failed validation");
            }
        }
        Ok(normalized)
    }

    /// Text shown on a chip holding `value`.
    pub fn chip_label(&self, value: &str) -> String {
        let shown = self
            .matcher()
            .and_then(|m| m.label(value))
            .unwrap_or(value);
        format!("{}: {}", self.label, shown)
    }
}

fn resolve(matcher: &StatusMatcher, field: &str, value: &str) -> Result<String, ValidationError> {
    let result = matcher.match_status(value);
    if let Some(status) = result.status {
        return Ok(status);
    }
    let field = field.to_lowercase();
    let value = value.to_string();
    match result.candidates.len() {
        0 => Err(ValidationError::NoMatch { field, value }),
        // Several candidates cover the input fully; only the operator can pick.
        n if n > 1 && result.confidence >= 1.0 => Err(ValidationError::Ambiguous {
            field,
            value,
            candidates: result.candidates,
        }),
        _ => Err(ValidationError::Incomplete {
            field,
            value,
            candidates: result.candidates,
        }),
    }
}

// ---------------------------------------------------------------------------
// FieldRegistry
// ---------------------------------------------------------------------------

/// The validated set of searchable fields for one entity type.
pub struct FieldRegistry<E> {
    fields: Vec<SearchField<E>>,
    by_id: HashMap<String, usize>,
    by_prefix: HashMap<String, usize>,
}

impl<E> Clone for FieldRegistry<E> {
    fn clone(&self) -> Self {
        Self {
            fields: self.fields.clone(),
            by_id: self.by_id.clone(),
            by_prefix: self.by_prefix.clone(),
        }
    }
}

impl<E> std::fmt::Debug for FieldRegistry<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.fields.iter()).finish()
    }
}

impl<E> FieldRegistry<E> {
    pub fn new(fields: Vec<SearchField<E>>) -> Result<Self, RegistryError> {
        if fields.is_empty() {
            return Err(RegistryError::NoFields);
        }

        let mut by_id = HashMap::with_capacity(fields.len());
        let mut by_prefix: HashMap<String, usize> = HashMap::with_capacity(fields.len());

        for (pos, field) in fields.iter().enumerate() {
            if field.id.trim().is_empty() || field.prefix.trim().is_empty() {
                return Err(RegistryError::Blank(field.id.clone()));
            }
            if by_id.insert(field.id.clone(), pos).is_some() {
                return Err(RegistryError::DuplicateId(field.id.clone()));
            }
            let prefix = field.prefix.to_lowercase();
            if let Some(&other) = by_prefix.get(&prefix) {
                return Err(RegistryError::DuplicatePrefix {
                    prefix,
                    first: fields[other].id.clone(),
                    second: field.id.clone(),
                });
            }
            by_prefix.insert(prefix, pos);
            if field.requires_valid_value && !field.is_exhaustive() && field.validate.is_none() {
                return Err(RegistryError::MissingValidator(field.id.clone()));
            }
        }

        Ok(Self {
            fields,
            by_id,
            by_prefix,
        })
    }

    pub fn get(&self, id: &str) -> Option<&SearchField<E>> {
        self.by_id.get(id).map(|&pos| &self.fields[pos])
    }

    /// Look a field up by the text typed before a colon: its prefix first,
    /// then its id, both case-insensitive.
    pub fn resolve_prefix(&self, typed: &str) -> Option<&SearchField<E>> {
        let typed = typed.trim().to_lowercase();
        self.by_prefix
            .get(&typed)
            .map(|&pos| &self.fields[pos])
            .or_else(|| self.fields.iter().find(|f| f.id.to_lowercase() == typed))
    }

    pub fn iter(&self) -> impl Iterator<Item = &SearchField<E>> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Autocomplete values for `field` given what has been typed so far.
    ///
    /// Enumerated fields rank through their matcher; free-form fields offer
    /// the loaded entities' values containing `input`, case-insensitively.
    pub fn suggest(&self, field: &str, input: &str, entities: &[E], limit: usize) -> Vec<String> {
        let Some(field) = self.get(field) else {
            return Vec::new();
        };
        match &field.kind {
            FieldKind::Enumerated(matcher) => matcher
                .suggestions(input, limit)
                .into_iter()
                .map(|s| s.value)
                .collect(),
            FieldKind::FreeForm => {
                let needle = input.trim().to_lowercase();
                field
                    .get_values(entities)
                    .into_iter()
                    .filter(|v| v.to_lowercase().contains(&needle))
                    .take(limit)
                    .collect()
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
