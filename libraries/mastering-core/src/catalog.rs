//! Preset catalog
//!
//! Built once at startup and shared read-only between jobs. Lookups never
//! fail: an unknown id resolves to the default preset.

use crate::builtin::{self, DEFAULT_PRESET_ID};
use crate::error::{PresetError, Result};
use crate::preset::Preset;
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub struct PresetCatalog {
    presets: BTreeMap<String, Preset>,
    default_id: String,
}

impl PresetCatalog {
    /// Create a catalog holding only `default`
    pub fn new(default: Preset) -> Result<Self> {
        default.validate()?;
        let default_id = default.id.clone();
        let mut presets = BTreeMap::new();
        presets.insert(default_id.clone(), default);
        Ok(Self {
            presets,
            default_id,
        })
    }

    /// Catalog with every built-in preset, `balanced` as default
    pub fn builtin() -> Self {
        let presets = builtin::presets()
            .into_iter()
            .map(|preset| (preset.id.clone(), preset))
            .collect();
        Self {
            presets,
            default_id: DEFAULT_PRESET_ID.to_string(),
        }
    }

    /// Register a preset, replacing any preset with the same id
    pub fn insert(&mut self, preset: Preset) -> Result<()> {
        preset.validate()?;
        if self.presets.contains_key(&preset.id) {
            tracing::info!("Overriding preset '{}'", preset.id);
        }
        self.presets.insert(preset.id.clone(), preset);
        Ok(())
    }

    pub fn with_preset(mut self, preset: Preset) -> Result<Self> {
        self.insert(preset)?;
        Ok(self)
    }

    /// Change which preset unknown ids resolve to
    pub fn set_default(&mut self, id: &str) -> Result<()> {
        if !self.presets.contains_key(id) {
            return Err(PresetError::UnknownDefault(id.to_string()));
        }
        self.default_id = id.to_string();
        Ok(())
    }

    /// Resolve `id`, falling back to the default preset
    pub fn lookup(&self, id: &str) -> &Preset {
        match self.presets.get(id) {
            Some(preset) => preset,
            None => {
                tracing::warn!(
                    "Unknown preset '{}', using default '{}'",
                    id,
                    self.default_id
                );
                self.default_preset()
            }
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.presets.contains_key(id)
    }

    pub fn default_preset(&self) -> &Preset {
        // The default id is only ever set to a registered key and presets are never removed
        &self.presets[&self.default_id]
    }

    /// Preset ids in sorted order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.presets.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Preset> {
        self.presets.values()
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }
}

impl Default for PresetCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
