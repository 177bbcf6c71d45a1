//! Submission persistence
//!
//! One JSON file per plant under the store directory, named
//! `{id}_{plant name with spaces replaced by underscores, lowercased}.json`.
//! Saving is an upsert keyed by case-insensitive plant name: the record set
//! is scanned,
//! an existing record keeps its id and submitted_at, a new one mints a
//! second-resolution timestamp id.
//!
//! No locking around the find-then-write sequence; concurrent saves for the
//! same plant can lose an update. Accepted for a single-operator tool.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use crate::payload::ValidatedPayload;

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Error type for submission storage operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed submission record: {0}")]
    Malformed(#[from] serde_json::Error),
}

// =============================================================================
// RECORD TYPES
// =============================================================================

/// A persisted submission, one per plant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    pub id: String,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub plant_name: String,
    pub template_name: String,
    pub data: ValidatedPayload,
}

/// Listing metadata for one stored submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionMeta {
    pub id: String,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub plant_name: String,
    pub template_name: String,
    pub filename: String,
}

/// Result of an upsert
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveOutcome {
    pub id: String,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub plant_name: String,
    pub is_update: bool,
}

// =============================================================================
// STORE
// =============================================================================

/// File-backed submission store
#[derive(Debug, Clone)]
pub struct SubmissionStore {
    base_dir: PathBuf,
}

impl SubmissionStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Save or update a submission; same plant name means the same record
    pub fn save(&self, payload: &ValidatedPayload) -> Result<SaveOutcome, StoreError> {
        self.ensure_dir()?;
        let plant_name = payload.plant.name.clone();
        let plant_key = plant_name.to_lowercase();
        let now = Utc::now();

        // One scan resolves both the upsert target and the set of taken ids.
        let mut existing_ids = Vec::new();
        let mut found: Option<(PathBuf, SubmissionRecord)> = None;
        for path in self.record_paths()? {
            match self.read_record(&path) {
                Ok(record) => {
                    if found.is_none() && record.plant_name.to_lowercase() == plant_key {
                        found = Some((path, record));
                    } else {
                        existing_ids.push(record.id);
                    }
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping unreadable submission record");
                }
            }
        }

        if let Some((path, old)) = found {
            let record = SubmissionRecord {
                id: old.id,
                submitted_at: old.submitted_at,
                updated_at: Some(now),
                plant_name,
                template_name: payload.template_name.clone(),
                data: payload.clone(),
            };
            self.write_record(&path, &record)?;
            info!(id = %record.id, plant = %record.plant_name, "submission updated");
            Ok(SaveOutcome {
                id: record.id,
                submitted_at: record.submitted_at,
                updated_at: record.updated_at,
                plant_name: record.plant_name,
                is_update: true,
            })
        } else {
            let record = SubmissionRecord {
                id: mint_id(&existing_ids, now),
                submitted_at: now,
                updated_at: None,
                plant_name,
                template_name: payload.template_name.clone(),
                data: payload.clone(),
            };
            let path = self
                .base_dir
                .join(filename_for(&record.id, &record.plant_name));
            self.write_record(&path, &record)?;
            info!(id = %record.id, plant = %record.plant_name, "submission saved");
            Ok(SaveOutcome {
                id: record.id,
                submitted_at: record.submitted_at,
                updated_at: None,
                plant_name: record.plant_name,
                is_update: false,
            })
        }
    }

    /// Metadata for every stored submission, newest id first
    pub fn list(&self) -> Result<Vec<SubmissionMeta>, StoreError> {
        let mut metas = Vec::new();
        for path in self.record_paths()? {
            match self.read_record(&path) {
                Ok(record) => metas.push(SubmissionMeta {
                    id: record.id,
                    submitted_at: record.submitted_at,
                    updated_at: record.updated_at,
                    plant_name: record.plant_name,
                    template_name: record.template_name,
                    filename: file_name_of(&path),
                }),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping unreadable submission record");
                }
            }
        }
        Ok(metas)
    }

    /// Load a submission addressed by id prefix; first match wins
    pub fn get(&self, id: &str) -> Result<Option<SubmissionRecord>, StoreError> {
        for path in self.record_paths()? {
            if matches_id(&path, id) {
                return self.read_record(&path).map(Some);
            }
        }
        Ok(None)
    }

    /// Delete a submission addressed by id prefix; reports whether anything
    /// was actually removed
    pub fn delete(&self, id: &str) -> Result<bool, StoreError> {
        for path in self.record_paths()? {
            if matches_id(&path, id) {
                fs::remove_file(&path)?;
                info!(path = %path.display(), "submission deleted");
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn ensure_dir(&self) -> Result<(), StoreError> {
        fs::create_dir_all(&self.base_dir)?;
        Ok(())
    }

    /// Paths of every record file, reverse lexicographic (newest id first)
    fn record_paths(&self) -> Result<Vec<PathBuf>, StoreError> {
        self.ensure_dir()?;
        let mut paths: Vec<PathBuf> = fs::read_dir(&self.base_dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().map_or(false, |ext| ext == "json"))
            .collect();
        paths.sort();
        paths.reverse();
        Ok(paths)
    }

    fn read_record(&self, path: &Path) -> Result<SubmissionRecord, StoreError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    fn write_record(&self, path: &Path, record: &SubmissionRecord) -> Result<(), StoreError> {
        let raw = serde_json::to_string_pretty(record)?;
        fs::write(path, raw)?;
        Ok(())
    }
}

// =============================================================================
// HELPERS
// =============================================================================

fn filename_for(id: &str, plant_name: &str) -> String {
    format!("{}_{}.json", id, plant_name.replace(' ', "_").to_lowercase())
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// True when the filename's id component starts with `id` at an underscore
/// boundary, so a partial id like `20260315` still addresses the record
fn matches_id(path: &Path, id: &str) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .and_then(|name| name.strip_prefix(id))
        .map_or(false, |rest| rest.starts_with('_'))
}

/// Second-resolution timestamp id. Two distinct plants created within the
/// same second would collide, so taken ids get a numeric suffix probe.
fn mint_id(existing: &[String], now: DateTime<Utc>) -> String {
    let base = now.format("%Y%m%d_%H%M%S").to_string();
    if !existing.iter().any(|id| *id == base) {
        return base;
    }
    let mut n = 2u32;
    loop {
        let candidate = format!("{}_{}", base, n);
        if !existing.iter().any(|id| *id == candidate) {
            return candidate;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::{Asset, AssetType, PlantInfo};
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn payload(plant_name: &str) -> ValidatedPayload {
        ValidatedPayload {
            plant: PlantInfo {
                name: plant_name.to_string(),
                description: None,
                address: "1 Plant Rd".to_string(),
                manager_email: "ops@example.test".to_string(),
            },
            template_name: String::new(),
            assets: vec![Asset {
                name: "boiler_1".to_string(),
                display_name: "Main Boiler".to_string(),
                asset_type: AssetType::Boiler,
            }],
            parameters: vec![],
            formulas: vec![],
        }
    }

    fn store() -> (TempDir, SubmissionStore) {
        let dir = TempDir::new().unwrap();
        let store = SubmissionStore::new(dir.path());
        (dir, store)
    }

    #[test]
    fn test_create_then_update_preserves_identity() {
        let (_dir, store) = store();

        let first = store.save(&payload("Acme")).unwrap();
        assert!(!first.is_update);
        assert!(first.updated_at.is_none());

        let mut changed = payload("Acme");
        changed.plant.address = "2 Plant Rd".to_string();
        let second = store.save(&changed).unwrap();

        assert!(second.is_update);
        assert_eq!(second.id, first.id);
        assert_eq!(second.submitted_at, first.submitted_at);
        assert!(second.updated_at.is_some());

        let records = store.list().unwrap();
        assert_eq!(records.len(), 1);

        let record = store.get(&first.id).unwrap().unwrap();
        assert_eq!(record.data.plant.address, "2 Plant Rd");
    }

    #[test]
    fn test_upsert_is_case_insensitive_on_plant_name() {
        let (_dir, store) = store();
        let first = store.save(&payload("Acme Plant")).unwrap();
        let second = store.save(&payload("ACME plant")).unwrap();
        assert!(second.is_update);
        assert_eq!(second.id, first.id);
        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[test]
    fn test_same_second_creations_get_distinct_ids() {
        let (_dir, store) = store();
        let a = store.save(&payload("Plant A")).unwrap();
        let b = store.save(&payload("Plant B")).unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(store.list().unwrap().len(), 2);
    }

    #[test]
    fn test_mint_id_suffix_probe() {
        let now = Utc.with_ymd_and_hms(2026, 3, 15, 10, 15, 30).unwrap();
        assert_eq!(mint_id(&[], now), "20260315_101530");

        let taken = vec!["20260315_101530".to_string()];
        assert_eq!(mint_id(&taken, now), "20260315_101530_2");

        let taken = vec![
            "20260315_101530".to_string(),
            "20260315_101530_2".to_string(),
        ];
        assert_eq!(mint_id(&taken, now), "20260315_101530_3");
    }

    #[test]
    fn test_filename_convention() {
        assert_eq!(
            filename_for("20260315_101530", "Acme Steel Works"),
            "20260315_101530_acme_steel_works.json"
        );
    }

    #[test]
    fn test_list_is_newest_id_first() {
        let (dir, store) = store();

        // Two records written directly with controlled ids.
        for (id, plant) in [("20240101_000000", "Old Plant"), ("20250101_000000", "New Plant")] {
            let mut data = payload(plant);
            data.plant.name = plant.to_string();
            let record = SubmissionRecord {
                id: id.to_string(),
                submitted_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
                updated_at: None,
                plant_name: plant.to_string(),
                template_name: String::new(),
                data,
            };
            let path = dir.path().join(filename_for(id, plant));
            std::fs::write(&path, serde_json::to_string_pretty(&record).unwrap()).unwrap();
        }

        let metas = store.list().unwrap();
        assert_eq!(metas.len(), 2);
        assert_eq!(metas[0].id, "20250101_000000");
        assert_eq!(metas[1].id, "20240101_000000");
    }

    #[test]
    fn test_get_by_id_prefix() {
        let (_dir, store) = store();
        let outcome = store.save(&payload("Acme")).unwrap();

        // Full id and the date prefix both address the record.
        assert!(store.get(&outcome.id).unwrap().is_some());
        let date_prefix = &outcome.id[..8];
        assert!(store.get(date_prefix).unwrap().is_some());

        assert!(store.get("19990101").unwrap().is_none());
    }

    #[test]
    fn test_delete_reports_whether_removed() {
        let (_dir, store) = store();
        let outcome = store.save(&payload("Acme")).unwrap();

        assert!(store.delete(&outcome.id).unwrap());
        assert!(!store.delete(&outcome.id).unwrap());
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_unreadable_record_is_skipped() {
        let (dir, store) = store();
        store.save(&payload("Acme")).unwrap();
        std::fs::write(dir.path().join("zzz_broken.json"), "not json").unwrap();

        // Corrupt files are ignored by the scan paths.
        assert_eq!(store.list().unwrap().len(), 1);
        let outcome = store.save(&payload("Acme")).unwrap();
        assert!(outcome.is_update);
    }
}
