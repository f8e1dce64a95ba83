//! Model registry with public lookup API.

use crate::Model;

/// Default Anthropic API base URL
pub const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";

/// Model used when nothing else is configured
pub const DEFAULT_MODEL_ID: &str = "claude-sonnet-4-20250514";

struct ModelEntry {
    id: &'static str,
    name: &'static str,
    max_tokens: u32,
}

const MODEL_ENTRIES: &[ModelEntry] = &[
    ModelEntry {
        id: "claude-sonnet-4-20250514",
        name: "Claude Sonnet 4",
        max_tokens: 64_000,
    },
    ModelEntry {
        id: "claude-sonnet-4-5-20250929",
        name: "Claude Sonnet 4.5",
        max_tokens: 64_000,
    },
    ModelEntry {
        id: "claude-opus-4-1-20250805",
        name: "Claude Opus 4.1",
        max_tokens: 32_000,
    },
    ModelEntry {
        id: "claude-3-5-haiku-20241022",
        name: "Claude Haiku 3.5",
        max_tokens: 8_192,
    },
    ModelEntry {
        id: "claude-3-haiku-20240307",
        name: "Claude Haiku 3",
        max_tokens: 4_096,
    },
];

impl ModelEntry {
    fn to_model(&self) -> Model {
        Model {
            id: self.id.to_string(),
            name: self.name.to_string(),
            base_url: ANTHROPIC_BASE_URL.to_string(),
            max_tokens: self.max_tokens,
        }
    }
}

/// Look up a model by ID.
pub fn get_model_by_id(id: &str) -> Option<Model> {
    MODEL_ENTRIES
        .iter()
        .find(|e| e.id == id)
        .map(|e| e.to_model())
}

/// Get all registered models.
pub fn get_all_models() -> Vec<Model> {
    MODEL_ENTRIES.iter().map(|e| e.to_model()).collect()
}

/// Resolve a model ID, constructing a default entry for unknown IDs.
pub fn resolve_model(id: &str, base_url: Option<&str>) -> Model {
    let mut model = get_model_by_id(id).unwrap_or_else(|| Model {
        id: id.to_string(),
        name: id.to_string(),
        base_url: ANTHROPIC_BASE_URL.to_string(),
        max_tokens: 8_192,
    });
    if let Some(url) = base_url {
        model.base_url = url.trim_end_matches('/').to_string();
    }
    model
}
