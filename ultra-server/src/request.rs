use serde::Deserialize;

use crate::error::ServerError;

const MAX_PROMPT_CHARS: usize = 32_768;

fn default_true() -> bool {
    true
}

/// Wire shape of `POST /api/orchestrator/analyze`'s request body.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalyzeRequestWire {
    pub prompt: String,
    pub selected_models: Vec<String>,
    #[serde(default = "default_true")]
    pub include_initial_responses: bool,
    #[serde(default = "default_true")]
    pub include_meta_responses: bool,
    pub correlation_id: Option<String>,
}

impl AnalyzeRequestWire {
    /// Validate this request against the configured bounds, returning
    /// the first violation found.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Validation`] if `prompt` is empty or too
    /// long, or `selected_models` is empty, too large, or contains
    /// duplicates.
    pub fn validate(&self, max_selected_models: usize) -> Result<(), ServerError> {
        if self.prompt.is_empty() {
            return Err(ServerError::Validation("prompt must not be empty".to_owned()));
        }
        if self.prompt.chars().count() > MAX_PROMPT_CHARS {
            return Err(ServerError::Validation(format!("prompt exceeds {MAX_PROMPT_CHARS} characters")));
        }
        if self.selected_models.is_empty() {
            return Err(ServerError::Validation("selected_models must contain at least one model id".to_owned()));
        }
        if self.selected_models.len() > max_selected_models {
            return Err(ServerError::Validation(format!("selected_models must contain at most {max_selected_models} model ids")));
        }

        let mut seen = std::collections::HashSet::with_capacity(self.selected_models.len());
        for model_id in &self.selected_models {
            if model_id.is_empty() {
                return Err(ServerError::Validation("selected_models entries must not be empty".to_owned()));
            }
            if !seen.insert(model_id.as_str()) {
                return Err(ServerError::Validation(format!("selected_models contains a duplicate entry: `{model_id}`")));
            }
        }

        Ok(())
    }
}
