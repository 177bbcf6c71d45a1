//! Read-only parameter registry
//!
//! Static catalog of every known monitoring parameter and the asset types
//! each applies to. Loaded once at startup and owned by the application
//! state; nothing mutates it afterwards.

use std::path::Path;
use thiserror::Error;
use tracing::info;

use crate::payload::ParameterEntry;

const BUILTIN_REGISTRY: &str = include_str!("../data/parameter_registry.json");

/// Error type for registry loading
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed registry file: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// The loaded parameter catalog
#[derive(Debug, Clone)]
pub struct ParameterRegistry {
    entries: Vec<ParameterEntry>,
}

impl ParameterRegistry {
    /// Load a registry from a JSON file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let entries: Vec<ParameterEntry> = serde_json::from_str(&raw)?;
        info!(
            path = %path.as_ref().display(),
            count = entries.len(),
            "parameter registry loaded"
        );
        Ok(Self { entries })
    }

    /// The compiled-in default catalog
    pub fn builtin() -> Self {
        let entries = serde_json::from_str(BUILTIN_REGISTRY)
            .expect("builtin parameter registry is valid JSON");
        Self { entries }
    }

    /// The full catalog
    pub fn all(&self) -> &[ParameterEntry] {
        &self.entries
    }

    /// Parameters applicable to the given asset type tag, case-insensitive
    pub fn for_asset_type(&self, asset_type: &str) -> Vec<ParameterEntry> {
        self.entries
            .iter()
            .filter(|entry| {
                entry
                    .applicable_asset_types
                    .iter()
                    .any(|tag| tag.eq_ignore_ascii_case(asset_type))
            })
            .cloned()
            .collect()
    }
}
