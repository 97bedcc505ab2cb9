//! Chips — compiling free text into validated `field:value` filters, and the
//! immutable list that holds them.
//!
//! Every [`ChipList`] transition returns a new list; the old one is never
//! touched, so a render pass and an in-flight fetch can each hold their own
//! snapshot without coordination.

use crate::error::ValidationError;
use crate::registry::{FieldRegistry, SearchField};
use crate::types::Chip;
use serde::{Serialize, Serializer};
use std::sync::Arc;

// ---------------------------------------------------------------------------
// ChipList
// ---------------------------------------------------------------------------

/// An ordered, duplicate-free list of chips. Cheap to clone.
///
/// Order only matters for display and removal, never for filtering.
#[derive(Clone, PartialEq, Eq)]
pub struct ChipList(Arc<[Chip]>);

impl Default for ChipList {
    fn default() -> Self {
        Self(Arc::from(Vec::new()))
    }
}

impl std::fmt::Debug for ChipList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.0.iter().map(Chip::key)).finish()
    }
}

impl Serialize for ChipList {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.iter())
    }
}

impl FromIterator<Chip> for ChipList {
    fn from_iter<I: IntoIterator<Item = Chip>>(iter: I) -> Self {
        let mut chips: Vec<Chip> = Vec::new();
        for chip in iter {
            if !chips.contains(&chip) {
                chips.push(chip);
            }
        }
        Self(Arc::from(chips))
    }
}

impl<'a> IntoIterator for &'a ChipList {
    type Item = &'a Chip;
    type IntoIter = std::slice::Iter<'a, Chip>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl ChipList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_slice(&self) -> &[Chip] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Chip> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str, value: &str) -> bool {
        self.0.iter().any(|c| c.is(field, value))
    }

    /// Append `chip` unless an identical one exists, in which case the list is
    /// returned unchanged and the existing chip keeps its position.
    pub fn with_chip(&self, chip: Chip) -> Self {
        if self.0.contains(&chip) {
            tracing::debug!(chip = %chip, "chip already present");
            return self.clone();
        }
        tracing::debug!(chip = %chip, "chip added");
        self.0.iter().cloned().chain(std::iter::once(chip)).collect()
    }

    pub fn with_chips(&self, chips: impl IntoIterator<Item = Chip>) -> Self {
        self.0.iter().cloned().chain(chips).collect()
    }

    pub fn without(&self, field: &str, value: &str) -> Self {
        self.retain(|c| !c.is(field, value))
    }

    pub fn without_field(&self, field: &str) -> Self {
        self.retain(|c| c.field != field)
    }

    /// Remove the chip at `index` (e.g. backspace on the last chip).
    pub fn without_index(&self, index: usize) -> Self {
        self.0
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != index)
            .map(|(_, c)| c.clone())
            .collect()
    }

    pub fn retain(&self, keep: impl Fn(&Chip) -> bool) -> Self {
        Self(self.0.iter().filter(|c| keep(c)).cloned().collect::<Vec<_>>().into())
    }

    pub fn clear(&self) -> Self {
        Self::default()
    }

    /// Distinct field ids in order of first appearance.
    pub fn fields(&self) -> Vec<&str> {
        let mut fields: Vec<&str> = Vec::new();
        for chip in self.0.iter() {
            if !fields.contains(&chip.field.as_str()) {
                fields.push(&chip.field);
            }
        }
        fields
    }

    pub fn values_for(&self, field: &str) -> Vec<&str> {
        self.0
            .iter()
            .filter(|c| c.field == field)
            .map(|c| c.value.as_str())
            .collect()
    }

    /// Plain `(field, value)` pairs, the form a URL serializer needs.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        self.0
            .iter()
            .map(|c| (c.field.clone(), c.value.clone()))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// ChipCompiler
// ---------------------------------------------------------------------------

/// Turns raw text into validated chips against a [`FieldRegistry`].
pub struct ChipCompiler<'a, E> {
    registry: &'a FieldRegistry<E>,
    default_field: Option<String>,
}

impl<'a, E> ChipCompiler<'a, E> {
    pub fn new(registry: &'a FieldRegistry<E>) -> Self {
        Self {
            registry,
            default_field: None,
        }
    }

    /// Field used for text that has no prefix and resolves in no enumeration.
    pub fn with_default_field(mut self, field: impl Into<String>) -> Self {
        self.default_field = Some(field.into());
        self
    }

    pub fn registry(&self) -> &'a FieldRegistry<E> {
        self.registry
    }

    /// Compile `raw` into a chip.
    ///
    /// The field is taken from an explicit `prefix:` if one names a registered
    /// field, otherwise from `context` (the field the operator is typing in),
    /// otherwise from the only enumerated field that resolves the whole text,
    /// otherwise from the default field.
    pub fn compile(&self, raw: &str, context: Option<&str>) -> Result<Chip, ValidationError> {
        let (field, value) = self.target(raw, context)?;
        self.build(field, value)
    }

    /// Build a chip for a known field, e.g. from an autocomplete selection.
    pub fn chip(&self, field: &str, value: &str) -> Result<Chip, ValidationError> {
        let field = self
            .registry
            .get(field)
            .ok_or_else(|| ValidationError::UnknownField(field.to_string()))?;
        self.build(field, value)
    }

    /// Compile `raw` and add it to `chips`.
    pub fn commit(&self, chips: &ChipList, raw: &str, context: Option<&str>) -> Result<ChipList, ValidationError> {
        Ok(chips.with_chip(self.compile(raw, context)?))
    }

    /// Rebuild a chip list from `(field, value)` pairs, validating each.
    pub fn from_pairs<I, F, V>(&self, pairs: I) -> Result<ChipList, ValidationError>
    where
        I: IntoIterator<Item = (F, V)>,
        F: AsRef<str>,
        V: AsRef<str>,
    {
        pairs
            .into_iter()
            .map(|(field, value)| self.chip(field.as_ref(), value.as_ref()))
            .collect()
    }

    /// Completed raw text for Tab, only when an enumerated field has exactly
    /// one candidate for what was typed.
    pub fn tab_complete(&self, raw: &str, context: Option<&str>) -> Option<String> {
        let (field, value) = self.target(raw, context).ok()?;
        let completed = field.matcher()?.tab_complete(value)?;
        Some(format!("{}:{}", field.prefix, completed))
    }

    fn build(&self, field: &SearchField<E>, value: &str) -> Result<Chip, ValidationError> {
        let value = field.validate_value(value)?;
        let label = field.chip_label(&value);
        Ok(Chip::new(field.id.clone(), value, label))
    }

    fn target<'s>(&'s self, raw: &'s str, context: Option<&str>) -> Result<(&'a SearchField<E>, &'s str), ValidationError> {
        if let Some((head, tail)) = raw.split_once(':') {
            if let Some(field) = self.registry.resolve_prefix(head) {
                return Ok((field, tail));
            }
        }

        if let Some(id) = context {
            let field = self
                .registry
                .get(id)
                .ok_or_else(|| ValidationError::UnknownField(id.to_string()))?;
            return Ok((field, raw));
        }

        let mut resolving = self
            .registry
            .iter()
            .filter(|f| f.matcher().is_some_and(|m| m.match_status(raw).is_resolved()));
        if let (Some(field), None) = (resolving.next(), resolving.next()) {
            tracing::debug!(field = %field.id, raw, "field inferred from enumeration");
            return Ok((field, raw));
        }

        match &self.default_field {
            Some(id) => {
                let field = self
                    .registry
                    .get(id)
                    .ok_or_else(|| ValidationError::UnknownField(id.clone()))?;
                Ok((field, raw))
            }
            None => Err(ValidationError::NoField(raw.trim().to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
