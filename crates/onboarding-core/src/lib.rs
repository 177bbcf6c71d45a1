//! onboarding-core: plant onboarding validation and persistence
//!
//! Service layer for the onboarding wizard, with no HTTP dependencies:
//! - Typed payload models (one typed shape at the boundary)
//! - Submission validation and dependency enrichment
//! - Read-only parameter registry, loaded once at startup
//! - Named template store for wizard drafts
//! - JSON file submission store with upsert-by-plant-name

pub mod payload;
pub mod registry;
pub mod store;
pub mod templates;
pub mod validate;

// Re-export commonly used types
pub use payload::{
    Asset, AssetType, EnabledParameter, FormulaEntry, OnboardingPayload, ParameterEntry,
    PlantInfo, ValidatedPayload,
};
pub use registry::{ParameterRegistry, RegistryError};
pub use store::{SaveOutcome, StoreError, SubmissionMeta, SubmissionRecord, SubmissionStore};
pub use templates::TemplateStore;
pub use validate::{duplicate_asset_names, validate_payload, PayloadError};
