//! Named template storage
//!
//! Wizard drafts saved under a user-chosen name. In-memory for the process
//! lifetime; the store is owned by the application state, not a module-level
//! global.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory named template store
#[derive(Debug, Default)]
pub struct TemplateStore {
    templates: RwLock<HashMap<String, Value>>,
}

impl TemplateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the template stored under `name`
    pub fn save(&self, name: &str, data: Value) {
        let mut templates = self.templates.write().expect("template store lock poisoned");
        templates.insert(name.to_string(), data);
    }

    /// Look up a template by name
    pub fn load(&self, name: &str) -> Option<Value> {
        let templates = self.templates.read().expect("template store lock poisoned");
        templates.get(name).cloned()
    }

    /// All stored template names, sorted
    pub fn names(&self) -> Vec<String> {
        let templates = self.templates.read().expect("template store lock poisoned");
        let mut names: Vec<String> = templates.keys().cloned().collect();
        names.sort();
        names
    }
}
