//! LLM integration for outreach content.
//!
//! The rest of the crate only sees the `LlmProvider` capability: given a
//! prompt, return text or fail, plus a model listing for availability checks.
//! The concrete backend is Ollama over HTTP.

pub mod ollama;
pub mod provider;

pub use ollama::{OllamaConfig, OllamaProvider};
pub use provider::{GenerationRequest, LlmProvider};

use std::sync::Arc;

use crate::error::LlmError;

/// Create the generation provider from configuration.
pub fn create_provider(config: &OllamaConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
    Ok(Arc::new(OllamaProvider::new(config.clone())?))
}
