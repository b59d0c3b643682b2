#[cfg(test)]
#[path = "manager_test.rs"]
mod tests;

pub mod ollama;
pub mod openai;

use anyhow::Result;
use dashmap::DashMap;
use once_cell::sync::Lazy;

use crate::domain::models::Backend;
use crate::domain::models::BackendName;

pub type BackendBox = Box<dyn Backend + Send + Sync>;

// The hosted allow-list. Model names are routed by prefix; anything that
// matches no entry is served by the local backend.
static MODEL_ROUTES: Lazy<DashMap<String, BackendName>> = Lazy::new(|| {
    let routes = DashMap::new();
    routes.insert("gpt-".to_string(), BackendName::OpenAI);
    return routes;
});

/// Extends the route table. Longest matching prefix wins, so narrower
/// entries can carve exceptions out of broader ones.
pub fn register_model_route(prefix: &str, backend: BackendName) {
    MODEL_ROUTES.insert(prefix.to_string(), backend);
}

pub fn backend_for_model(model: &str) -> BackendName {
    let mut best = BackendName::Ollama;
    let mut best_len = 0;

    for entry in MODEL_ROUTES.iter() {
        if model.starts_with(entry.key().as_str()) && entry.key().len() > best_len {
            best = *entry.value();
            best_len = entry.key().len();
        }
    }

    return best;
}

pub struct BackendManager {}

impl BackendManager {
    pub fn get(model: &str) -> Result<BackendBox> {
        match backend_for_model(model) {
            BackendName::OpenAI => return Ok(Box::<openai::OpenAI>::default()),
            BackendName::Ollama => return Ok(Box::<ollama::Ollama>::default()),
        }
    }
}
