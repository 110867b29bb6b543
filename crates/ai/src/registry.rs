//! Model registry.
//!
//! The catalog is static and embedded at compile time. Prompt overrides live
//! in memory for the lifetime of the registry and are shared by every request
//! that holds it.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Static model catalog loaded from embedded JSON.
static MODEL_CATALOG: Lazy<ModelCatalog> = Lazy::new(|| {
    let json = include_str!("models.json");
    serde_json::from_str(json).expect("Failed to parse models.json")
});

#[derive(Debug, Deserialize)]
struct ModelCatalog {
    models: Vec<ModelEntry>,
}

/// One catalog entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ModelEntry {
    pub id: String,
    pub name: String,
    pub provider: String,
    /// Upstream model string sent to the provider.
    pub model: String,
    pub default_prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Default)]
pub struct ModelRegistry {
    prompt_overrides: RwLock<HashMap<String, String>>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog entries in their declared order.
    pub fn list_models(&self) -> &'static [ModelEntry] {
        &MODEL_CATALOG.models
    }

    pub fn get_model(&self, id: &str) -> Option<&'static ModelEntry> {
        MODEL_CATALOG.models.iter().find(|m| m.id == id)
    }

    /// Override first, then the entry's default, then an empty string.
    pub fn get_prompt_for_model(&self, id: &str) -> String {
        let overrides = self
            .prompt_overrides
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(prompt) = overrides.get(id) {
            return prompt.clone();
        }
        self.get_model(id)
            .map(|m| m.default_prompt.clone())
            .unwrap_or_default()
    }

    pub fn set_prompt_for_model(&self, id: &str, prompt: impl Into<String>) {
        let prompt = prompt.into();
        log::debug!("Overriding prompt for model {}", id);
        self.prompt_overrides
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.to_string(), prompt);
    }
}
