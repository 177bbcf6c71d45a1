//! Submission payload validation
//!
//! Structural checks (assets present, names unique) abort the whole
//! submission. Per-formula parse failures are tolerated: dependency
//! recomputation is skipped for that one formula and strict formula
//! correctness stays with the ad-hoc validate endpoint.

use std::collections::{BTreeMap, HashSet};
use thiserror::Error;
use tracing::{debug, info};

use formula_core::extract_identifiers;

use crate::payload::{Asset, AssetType, OnboardingPayload, ValidatedPayload};

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Structural payload failures - these abort the whole submission
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PayloadError {
    #[error("At least one asset is required")]
    MissingAssets,

    #[error("Duplicate asset names found: {0}")]
    DuplicateAssets(String),
}

// =============================================================================
// VALIDATOR
// =============================================================================

/// Asset names whose trimmed, lowercased form was already seen, reported in
/// re-encounter order
pub fn duplicate_asset_names(assets: &[Asset]) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut duplicates = Vec::new();

    for asset in assets {
        let key = asset.name.trim().to_lowercase();
        if !seen.insert(key) {
            duplicates.push(asset.name.clone());
        }
    }

    duplicates
}

/// Validate and normalize a complete onboarding payload
///
/// Steps run in order and validation is all-or-nothing up to the failure
/// point: once a structural check fails, no later step runs.
pub fn validate_payload(payload: OnboardingPayload) -> Result<ValidatedPayload, PayloadError> {
    if payload.assets.is_empty() {
        return Err(PayloadError::MissingAssets);
    }

    let duplicates = duplicate_asset_names(&payload.assets);
    if !duplicates.is_empty() {
        return Err(PayloadError::DuplicateAssets(duplicates.join(", ")));
    }

    let OnboardingPayload {
        plant,
        template_name,
        assets,
        mut parameters,
        mut formulas,
    } = payload;

    // Asset names grouped by type, consumed by the applicable-asset
    // resolution below and re-exposed via ValidatedPayload::assets_by_type.
    let mut names_by_type: BTreeMap<AssetType, Vec<String>> = BTreeMap::new();
    for asset in &assets {
        names_by_type
            .entry(asset.asset_type)
            .or_default()
            .push(asset.name.clone());
    }

    for parameter in &mut parameters {
        let mut resolved = Vec::new();
        for (asset_type, names) in &names_by_type {
            let applies = parameter
                .applicable_asset_types
                .iter()
                .any(|tag| tag.eq_ignore_ascii_case(asset_type.as_str()));
            if applies {
                resolved.extend(names.iter().cloned());
            }
        }
        parameter.applicable_assets = resolved;
    }

    for formula in &mut formulas {
        if formula.expression.trim().is_empty() {
            continue;
        }
        match extract_identifiers(&formula.expression) {
            Ok(depends_on) => formula.depends_on = depends_on,
            Err(e) => {
                // Keep the previous depends_on; strict formula correctness
                // is the validate endpoint's job, not the submission path's.
                debug!(
                    parameter = %formula.parameter_name,
                    error = %e,
                    "skipping dependency recomputation for unparseable formula"
                );
            }
        }
    }

    let validated = ValidatedPayload {
        plant,
        template_name,
        assets,
        parameters,
        formulas,
    };

    info!(
        plant = %validated.plant.name,
        assets = validated.assets.len(),
        parameters = validated.parameters.len(),
        formulas = validated.formulas.len(),
        "onboarding payload validated"
    );

    Ok(validated)
}
