//! Ollama backend over its HTTP API.
//!
//! Requests without an explicit model try the configured model, then each
//! fallback model in order; the first success wins.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::error::LlmError;

use super::provider::{GenerationRequest, LlmProvider};

const PROVIDER: &str = "ollama";

/// Ollama connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    pub base_url: String,
    pub model: String,
    /// Tried in order when the default model fails.
    pub fallback_models: Vec<String>,
    pub temperature: f32,
    /// Sampling temperature when personalizing a template.
    pub personalize_temperature: f32,
    /// Per-model request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "llama2".to_string(),
            fallback_models: Vec::new(),
            temperature: 0.8,
            personalize_temperature: 0.6,
            timeout_secs: 60,
        }
    }
}

impl OllamaConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Fallback models that will actually be tried.
    pub fn fallback_count(&self) -> usize {
        self.fallback_models
            .iter()
            .filter(|m| !m.trim().is_empty())
            .count()
    }
}

#[derive(Debug, Serialize)]
struct GenerateBody<'a> {
    model: &'a str,
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagEntry>,
}

#[derive(Debug, Deserialize)]
struct TagEntry {
    #[serde(default)]
    name: String,
}

/// Ollama generation provider.
pub struct OllamaProvider {
    client: reqwest::Client,
    config: OllamaConfig,
}

impl OllamaProvider {
    pub fn new(config: OllamaConfig) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| LlmError::RequestFailed {
                provider: PROVIDER.into(),
                reason: format!("Failed to build HTTP client: {e}"),
            })?;
        info!(model = %config.model, base_url = %config.base_url, "Initialized Ollama provider");
        Ok(Self { client, config })
    }

    /// Models to try for a request, in order.
    fn models_for(&self, request: &GenerationRequest) -> Vec<String> {
        match &request.model {
            Some(model) => vec![model.clone()],
            None => std::iter::once(self.config.model.clone())
                .chain(self.config.fallback_models.iter().cloned())
                .filter(|m| !m.trim().is_empty())
                .collect(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn generate_with_model(
        &self,
        request: &GenerationRequest,
        model: &str,
    ) -> Result<String, LlmError> {
        let body = GenerateBody {
            model,
            prompt: &request.prompt,
            system: request.system.as_deref(),
            stream: false,
            options: GenerateOptions {
                temperature: request.temperature,
            },
        };

        let response = self
            .client
            .post(self.endpoint("api/generate"))
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| self.map_transport_error(e))?;
        if !status.is_success() {
            return Err(LlmError::RequestFailed {
                provider: PROVIDER.into(),
                reason: format!("HTTP {status}: {}", truncate(&text, 200)),
            });
        }

        parse_generate_response(&text)
    }

    fn map_transport_error(&self, e: reqwest::Error) -> LlmError {
        if e.is_timeout() {
            LlmError::Timeout {
                provider: PROVIDER.into(),
                timeout: self.config.timeout(),
            }
        } else {
            LlmError::RequestFailed {
                provider: PROVIDER.into(),
                reason: e.to_string(),
            }
        }
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    fn provider_name(&self) -> &str {
        PROVIDER
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }

    async fn generate(&self, request: GenerationRequest) -> Result<String, LlmError> {
        let mut last_error = None;
        for model in self.models_for(&request) {
            match self.generate_with_model(&request, &model).await {
                Ok(text) => {
                    debug!(model = %model, chars = text.len(), "Generation succeeded");
                    return Ok(text);
                }
                Err(e) => {
                    error!(model = %model, error = %e, "Ollama generation failed");
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| LlmError::RequestFailed {
            provider: PROVIDER.into(),
            reason: "no model configured".into(),
        }))
    }

    async fn list_models(&self) -> Result<Vec<String>, LlmError> {
        let response = self
            .client
            .get(self.endpoint("api/tags"))
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?
            .error_for_status()
            .map_err(|e| self.map_transport_error(e))?;
        let text = response
            .text()
            .await
            .map_err(|e| self.map_transport_error(e))?;
        parse_tags_response(&text)
    }
}

/// Extract the generated text from an `/api/generate` response body.
fn parse_generate_response(body: &str) -> Result<String, LlmError> {
    let parsed: GenerateResponse =
        serde_json::from_str(body).map_err(|e| LlmError::InvalidResponse {
            provider: PROVIDER.into(),
            reason: format!("Malformed generate response: {e}"),
        })?;
    Ok(parsed.response.trim().to_string())
}

/// Extract model names from an `/api/tags` response body.
fn parse_tags_response(body: &str) -> Result<Vec<String>, LlmError> {
    let parsed: TagsResponse = serde_json::from_str(body)?;
    Ok(parsed
        .models
        .into_iter()
        .map(|m| m.name)
        .filter(|n| !n.is_empty())
        .collect())
}

fn truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(fallbacks: &[&str]) -> OllamaProvider {
        OllamaProvider::new(OllamaConfig {
            base_url: "http://127.0.0.1:1/".into(),
            fallback_models: fallbacks.iter().map(|s| s.to_string()).collect(),
            timeout_secs: 2,
            ..OllamaConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn default_request_tries_fallback_chain_in_order() {
        let p = provider(&["mistral", " ", "phi"]);
        let models = p.models_for(&GenerationRequest::new("x"));
        assert_eq!(models, vec!["llama2", "mistral", "phi"]);
    }

    #[test]
    fn blank_fallbacks_are_not_counted() {
        let config = OllamaConfig {
            fallback_models: vec!["mistral".into(), "".into(), "phi".into()],
            ..OllamaConfig::default()
        };
        assert_eq!(config.fallback_count(), 2);
        assert_eq!(OllamaConfig::default().personalize_temperature, 0.6);
    }

    #[test]
    fn explicit_model_is_used_alone() {
        let p = provider(&["mistral"]);
        let models = p.models_for(&GenerationRequest::new("x").with_model("qwen"));
        assert_eq!(models, vec!["qwen"]);
    }

    #[test]
    fn endpoint_joins_without_double_slash() {
        let p = provider(&[]);
        assert_eq!(p.endpoint("api/tags"), "http://127.0.0.1:1/api/tags");
    }

    #[test]
    fn request_body_nests_temperature_in_options() {
        let body = GenerateBody {
            model: "llama2",
            prompt: "hello",
            system: None,
            stream: false,
            options: GenerateOptions { temperature: 0.5 },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["options"]["temperature"], 0.5);
        assert_eq!(json["stream"], false);
        assert!(json.get("system").is_none());
    }

    #[test]
    fn parses_generate_response() {
        let text = parse_generate_response(r#"{"model":"llama2","response":"  hi there \n","done":true}"#)
            .unwrap();
        assert_eq!(text, "hi there");
    }

    #[test]
    fn malformed_generate_response_is_invalid() {
        let err = parse_generate_response("not json").unwrap_err();
        assert!(matches!(err, LlmError::InvalidResponse { .. }));
    }

    #[test]
    fn parses_tags_response() {
        let models =
            parse_tags_response(r#"{"models":[{"name":"llama2:latest"},{"name":"mistral"}]}"#)
                .unwrap();
        assert_eq!(models, vec!["llama2:latest", "mistral"]);
    }

    #[tokio::test]
    async fn unreachable_backend_fails_instead_of_hanging() {
        let p = provider(&["mistral"]);
        let result = p.generate(GenerationRequest::new("hello")).await;
        assert!(result.is_err());
        assert!(!p.check_model_availability().await);
    }
}
