//! Default model selection
//!
//! The catalog queries the backend for installed models and picks a default
//! from a fixed preference order. It only refreshes when asked.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{error, info};

use agentchat_llm::{LlmError, LlmService};

/// Preferred models, best first
pub const PREFERRED_MODELS: [&str; 7] = [
    "deepseek-coder:14b",
    "deepseek-coder:6.7b",
    "deepseek-chat:6.7b",
    "llama2:7b",
    "llama2:13b",
    "mistral:7b",
    "codellama:7b",
];

/// Reported default when the backend has no models
pub const NO_MODEL: &str = "none";

/// Pick the first preferred model present, else the first reported one
pub fn select_default(available: &[String]) -> Option<String> {
    PREFERRED_MODELS
        .iter()
        .find(|preferred| available.iter().any(|name| name == *preferred))
        .map(|preferred| preferred.to_string())
        .or_else(|| available.first().cloned())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ModelSnapshot {
    pub available_models: Vec<String>,
    pub default_model: Option<String>,
}

pub struct ModelCatalog {
    llm: Arc<dyn LlmService>,
    snapshot: RwLock<ModelSnapshot>,
}

impl ModelCatalog {
    /// Empty catalog; call [`refresh`](Self::refresh) to populate it
    pub fn new(llm: Arc<dyn LlmService>) -> Self {
        Self {
            llm,
            snapshot: RwLock::new(ModelSnapshot::default()),
        }
    }

    /// Re-query the backend. A failed query leaves the catalog empty.
    pub async fn refresh(&self) -> Result<ModelSnapshot, LlmError> {
        let result = self.llm.list_models().await;
        let mut snapshot = self.snapshot.write().await;

        match result {
            Ok(models) => {
                let available: Vec<String> = models.into_iter().map(|m| m.name).collect();
                let default_model = select_default(&available);
                match &default_model {
                    Some(model) => info!(model = %model, available = ?available, "Selected default model"),
                    None => info!("Backend reports no installed models"),
                }
                *snapshot = ModelSnapshot {
                    available_models: available,
                    default_model,
                };
                Ok(snapshot.clone())
            }
            Err(e) => {
                error!(error = %e, "Failed to list models from generation backend");
                *snapshot = ModelSnapshot::default();
                Err(e)
            }
        }
    }

    pub async fn snapshot(&self) -> ModelSnapshot {
        self.snapshot.read().await.clone()
    }

    /// Current default, or `"none"`
    pub async fn default_model(&self) -> String {
        self.snapshot
            .read()
            .await
            .default_model
            .clone()
            .unwrap_or_else(|| NO_MODEL.to_string())
    }
}

impl std::fmt::Debug for ModelCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelCatalog").finish_non_exhaustive()
    }
}
