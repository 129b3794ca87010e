//! Generation capability — given a prompt, return text or fail.

use async_trait::async_trait;

use crate::error::LlmError;

/// A single text-generation request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    /// Optional system instruction.
    pub system: Option<String>,
    pub temperature: f32,
    /// Model to use. `None` lets the provider pick (and fall back).
    pub model: Option<String>,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system: None,
            temperature: 0.7,
            model: None,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

/// Text-generation backend.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name used in logs and errors.
    fn provider_name(&self) -> &str;

    /// Default model for requests that don't name one.
    fn model_name(&self) -> &str;

    /// Generate text for a request.
    async fn generate(&self, request: GenerationRequest) -> Result<String, LlmError>;

    /// Models the backend can serve.
    async fn list_models(&self) -> Result<Vec<String>, LlmError>;

    /// Confirm the default model is listed by the backend.
    async fn ensure_model_available(&self) -> Result<(), LlmError> {
        let models = self.list_models().await?;
        let wanted = self.model_name();
        // Tags like `llama2:latest` count as `llama2`.
        if models
            .iter()
            .any(|m| m == wanted || m.split(':').next() == Some(wanted))
        {
            tracing::info!(model = wanted, "Model is available");
            Ok(())
        } else {
            tracing::warn!(model = wanted, available = ?models, "Model not found on backend");
            Err(LlmError::ModelNotAvailable {
                provider: self.provider_name().to_string(),
                model: wanted.to_string(),
            })
        }
    }

    /// Whether the default model is listed by the backend.
    async fn check_model_availability(&self) -> bool {
        match self.ensure_model_available().await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(provider = self.provider_name(), error = %e, "Model availability check failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Listing(Result<Vec<String>, ()>);

    #[async_trait]
    impl LlmProvider for Listing {
        fn provider_name(&self) -> &str {
            "listing"
        }
        fn model_name(&self) -> &str {
            "llama2"
        }
        async fn generate(&self, _request: GenerationRequest) -> Result<String, LlmError> {
            Ok(String::new())
        }
        async fn list_models(&self) -> Result<Vec<String>, LlmError> {
            self.0.clone().map_err(|_| LlmError::RequestFailed {
                provider: "listing".into(),
                reason: "down".into(),
            })
        }
    }

    #[test]
    fn request_builder_sets_fields() {
        let req = GenerationRequest::new("hi")
            .with_system("be brief")
            .with_temperature(0.2)
            .with_model("mistral");
        assert_eq!(req.prompt, "hi");
        assert_eq!(req.system.as_deref(), Some("be brief"));
        assert_eq!(req.temperature, 0.2);
        assert_eq!(req.model.as_deref(), Some("mistral"));
    }

    #[tokio::test]
    async fn availability_checks_listing() {
        assert!(Listing(Ok(vec!["llama2".into()])).check_model_availability().await);
        assert!(Listing(Ok(vec!["llama2:latest".into()])).check_model_availability().await);
        assert!(!Listing(Ok(vec!["mistral".into()])).check_model_availability().await);
        assert!(!Listing(Err(())).check_model_availability().await);
    }

    #[tokio::test]
    async fn unlisted_model_is_reported_by_name() {
        let err = Listing(Ok(vec!["mistral".into()]))
            .ensure_model_available()
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LlmError::ModelNotAvailable { ref model, .. } if model == "llama2"
        ));
        assert!(matches!(
            Listing(Err(())).ensure_model_available().await,
            Err(LlmError::RequestFailed { .. })
        ));
    }
}
