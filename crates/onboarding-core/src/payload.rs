//! Typed payload and submission models
//!
//! One typed shape at the service boundary: a request deserializes into
//! `OnboardingPayload` exactly once, and every later step works on the typed
//! form. Validation produces the normalized `ValidatedPayload`, which is the
//! `data` section of a persisted submission.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// ASSET TYPES
// =============================================================================

/// Kinds of plant asset the registry knows about
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum AssetType {
    Boiler,
    Turbine,
    Product,
    Kiln,
    Other,
}

impl AssetType {
    /// The lowercase wire tag for this asset type
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetType::Boiler => "boiler",
            AssetType::Turbine => "turbine",
            AssetType::Product => "product",
            AssetType::Kiln => "kiln",
            AssetType::Other => "other",
        }
    }
}

// =============================================================================
// PAYLOAD MODELS
// =============================================================================

/// Plant-level metadata from the first wizard step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlantInfo {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub address: String,
    pub manager_email: String,
}

/// A single plant asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub name: String,
    pub display_name: String,
    #[serde(rename = "type")]
    pub asset_type: AssetType,
}

/// A parameter from the registry (read-only shape)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterEntry {
    pub name: String,
    pub display_name: String,
    pub unit: String,
    pub category: String,
    pub section: String,
    pub applicable_asset_types: Vec<String>,
}

/// A parameter the user has enabled for this submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnabledParameter {
    pub name: String,
    pub display_name: String,
    pub unit: String,
    pub category: String,
    pub section: String,
    #[serde(default)]
    pub applicable_asset_types: Vec<String>,
    /// Concrete asset names this parameter applies to. Recomputed at
    /// validation time from the submission's assets; incoming values are
    /// overwritten.
    #[serde(default)]
    pub applicable_assets: Vec<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

/// A derived-value formula tied to a calculated parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormulaEntry {
    pub parameter_name: String,
    pub expression: String,
    /// Derived from `expression` at validation time; incoming values are
    /// overwritten, never trusted.
    #[serde(default)]
    pub depends_on: Vec<String>,
}

/// Complete onboarding submission payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnboardingPayload {
    pub plant: PlantInfo,
    #[serde(default)]
    pub template_name: String,
    pub assets: Vec<Asset>,
    #[serde(default)]
    pub parameters: Vec<EnabledParameter>,
    #[serde(default)]
    pub formulas: Vec<FormulaEntry>,
}

/// Normalized payload produced by validation
///
/// This is the `data` section of a persisted submission record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatedPayload {
    pub plant: PlantInfo,
    pub template_name: String,
    pub assets: Vec<Asset>,
    pub parameters: Vec<EnabledParameter>,
    pub formulas: Vec<FormulaEntry>,
}

impl ValidatedPayload {
    /// Asset names grouped by asset type, in asset-list encounter order
    /// within each group
    pub fn assets_by_type(&self) -> BTreeMap<AssetType, Vec<String>> {
        let mut groups: BTreeMap<AssetType, Vec<String>> = BTreeMap::new();
        for asset in &self.assets {
            groups
                .entry(asset.asset_type)
                .or_default()
                .push(asset.name.clone());
        }
        groups
    }
}
