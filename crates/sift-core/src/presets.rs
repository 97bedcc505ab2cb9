//! Presets — named groups of chips on one field, toggled as a unit.
//!
//! A preset is active only when *every* one of its values is present; one
//! missing member makes it inactive. Toggling an inactive preset adds just the
//! missing members, so a partially-satisfied preset is completed rather than
//! reset. Toggling an active one removes its members and nothing else.

use crate::chips::{ChipCompiler, ChipList};
use crate::error::PresetError;
use crate::registry::FieldRegistry;
use crate::types::Chip;
use serde::Deserialize;
use std::collections::HashSet;

/// A named bundle of values for one field.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Preset {
    pub id: String,
    #[serde(default)]
    pub label: String,
    pub field: String,
    pub values: Vec<String>,
}

impl Preset {
    pub fn new<I, S>(id: impl Into<String>, field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let id = id.into();
        Self {
            label: id.clone(),
            id,
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// `true` iff every value of the preset is present as a chip on its field.
    pub fn is_active(&self, chips: &ChipList) -> bool {
        self.values.iter().all(|v| chips.contains(&self.field, v))
    }
}

/// A preset whose values have been validated into chips.
#[derive(Debug, Clone)]
pub struct CompiledPreset {
    preset: Preset,
    chips: Vec<Chip>,
}

impl CompiledPreset {
    pub fn compile<E>(registry: &FieldRegistry<E>, preset: Preset) -> Result<Self, PresetError> {
        if preset.values.is_empty() {
            return Err(PresetError::NoValues(preset.id));
        }
        let compiler = ChipCompiler::new(registry);
        let mut chips: Vec<Chip> = Vec::with_capacity(preset.values.len());
        for value in &preset.values {
            let chip = compiler
                .chip(&preset.field, value)
                .map_err(|source| PresetError::Invalid {
                    preset: preset.id.clone(),
                    source,
                })?;
            if !chips.contains(&chip) {
                chips.push(chip);
            }
        }
        // Keep the canonical spellings so activity checks compare like with like.
        let preset = Preset {
            values: chips.iter().map(|c| c.value.clone()).collect(),
            ..preset
        };
        Ok(Self { preset, chips })
    }

    pub fn preset(&self) -> &Preset {
        &self.preset
    }

    pub fn id(&self) -> &str {
        &self.preset.id
    }

    /// The chips this preset stands for, in preset order.
    pub fn create_chips(&self) -> ChipList {
        self.chips.iter().cloned().collect()
    }

    pub fn is_active(&self, chips: &ChipList) -> bool {
        self.preset.is_active(chips)
    }

    /// Switch the preset off if it is active, on otherwise.
    pub fn toggle(&self, chips: &ChipList) -> ChipList {
        if self.is_active(chips) {
            let members: HashSet<&str> = self.preset.values.iter().map(String::as_str).collect();
            tracing::debug!(preset = %self.preset.id, "preset off");
            chips.retain(|c| !(c.field == self.preset.field && members.contains(c.value.as_str())))
        } else {
            tracing::debug!(preset = %self.preset.id, "preset on");
            chips.with_chips(self.chips.iter().cloned())
        }
    }
}

/// Every preset known to a view, validated against its registry.
#[derive(Debug, Clone, Default)]
pub struct PresetSet {
    presets: Vec<CompiledPreset>,
}

impl PresetSet {
    pub fn compile<E>(
        registry: &FieldRegistry<E>,
        presets: impl IntoIterator<Item = Preset>,
    ) -> Result<Self, PresetError> {
        let mut compiled: Vec<CompiledPreset> = Vec::new();
        for preset in presets {
            if compiled.iter().any(|p| p.id() == preset.id) {
                return Err(PresetError::DuplicateId(preset.id));
            }
            compiled.push(CompiledPreset::compile(registry, preset)?);
        }
        Ok(Self { presets: compiled })
    }

    pub fn get(&self, id: &str) -> Option<&CompiledPreset> {
        self.presets.iter().find(|p| p.id() == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CompiledPreset> {
        self.presets.iter()
    }

    /// Ids of the presets currently active on `chips`.
    pub fn active_ids(&self, chips: &ChipList) -> Vec<&str> {
        self.presets
            .iter()
            .filter(|p| p.is_active(chips))
            .map(CompiledPreset::id)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
