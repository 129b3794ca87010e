//! Content selection for one recipient.
//!
//! Priority: a configured literal template, then AI generation (multi-model
//! when configured), then a deterministic static message. Once a generation
//! or personalization call fails, the AI capability stays off for the rest
//! of the run.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::config::{CampaignConfig, SenderProfile};
use crate::error::LlmError;
use crate::llm::provider::{GenerationRequest, LlmProvider};
use crate::recipients::Recipient;

use super::prompts::{
    COLD_EMAIL_SYSTEM, PERSONALIZE_SYSTEM, cold_email_prompt, parse_candidate, personalize_prompt,
};
use super::scoring::select_best;
use super::template::{default_subject, lookup, render, with_defaults};
use super::types::{ContentCandidate, ContentOrigin, MessageContent};

/// Run-scoped availability of the AI capability.
#[derive(Debug, Clone)]
pub struct AiAvailability {
    available: bool,
    reason: Option<String>,
}

impl AiAvailability {
    pub fn new(enabled: bool) -> Self {
        Self {
            available: enabled,
            reason: (!enabled).then(|| "disabled by configuration".to_string()),
        }
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    /// Why the capability is off, if it is.
    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    /// Turn the capability off for the remainder of the run.
    pub fn mark_unavailable(&mut self, reason: impl Into<String>) {
        if !self.available {
            return;
        }
        let reason = reason.into();
        warn!(reason = %reason, "AI generation unavailable, using fallback content for the rest of the run");
        self.available = false;
        self.reason = Some(reason);
    }
}

/// Settings for content selection.
#[derive(Debug, Clone)]
pub struct SelectorConfig {
    pub custom_message: Option<String>,
    pub custom_subject: Option<String>,
    /// Send the template through the personalization capability.
    pub personalize: bool,
    pub use_multi_model: bool,
    pub multi_models: Vec<String>,
    pub temperature: f32,
    pub personalize_temperature: f32,
    /// Upper bound on one model attempt.
    pub timeout: Duration,
    /// Extra models the provider tries after its default one.
    pub fallback_attempts: usize,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            custom_message: None,
            custom_subject: None,
            personalize: true,
            use_multi_model: false,
            multi_models: Vec::new(),
            temperature: 0.8,
            personalize_temperature: 0.6,
            timeout: Duration::from_secs(60),
            fallback_attempts: 0,
        }
    }
}

impl SelectorConfig {
    pub fn from_campaign(config: &CampaignConfig) -> Self {
        Self {
            custom_message: config.custom_message.clone(),
            custom_subject: config.custom_subject.clone(),
            personalize: config.personalize_custom_message,
            use_multi_model: config.use_multi_model,
            multi_models: config.multi_models.clone(),
            temperature: config.ollama.temperature,
            personalize_temperature: config.ollama.personalize_temperature,
            timeout: config.ollama.timeout(),
            fallback_attempts: config.ollama.fallback_count(),
        }
    }

    /// Bound for a whole call. Requests on the provider's default model may
    /// walk the fallback chain, one attempt per model.
    pub fn call_timeout(&self, request: &GenerationRequest) -> Duration {
        match request.model {
            Some(_) => self.timeout,
            None => self.timeout * (1 + self.fallback_attempts) as u32,
        }
    }
}

/// Picks the subject and body sent to each recipient.
pub struct ContentSelector {
    llm: Option<Arc<dyn LlmProvider>>,
    config: SelectorConfig,
    profile: SenderProfile,
}

impl ContentSelector {
    /// `llm` is `None` when AI generation is disabled.
    pub fn new(
        llm: Option<Arc<dyn LlmProvider>>,
        config: SelectorConfig,
        profile: SenderProfile,
    ) -> Self {
        Self {
            llm,
            config,
            profile,
        }
    }

    pub fn profile(&self) -> &SenderProfile {
        &self.profile
    }

    /// Choose content for a recipient. Never fails; the static message is the floor.
    pub async fn select(&self, recipient: &Recipient, ai: &mut AiAvailability) -> MessageContent {
        if let Some(template) = self.template() {
            return self.from_template(template, recipient, ai).await;
        }
        if let Some(content) = self.generate(recipient, ai).await {
            return content;
        }
        self.static_message(recipient)
    }

    fn template(&self) -> Option<&str> {
        self.config
            .custom_message
            .as_deref()
            .filter(|t| !t.trim().is_empty())
    }

    fn template_subject(&self, recipient: &Recipient, vars: &BTreeMap<String, String>) -> String {
        match self
            .config
            .custom_subject
            .as_deref()
            .filter(|s| !s.trim().is_empty())
        {
            Some(subject) => render(subject, vars),
            None => default_subject(recipient),
        }
    }

    async fn from_template(
        &self,
        template: &str,
        recipient: &Recipient,
        ai: &mut AiAvailability,
    ) -> MessageContent {
        let vars = with_defaults(recipient, &self.profile);
        let subject = self.template_subject(recipient, &vars);

        if self.config.personalize
            && let Some(llm) = &self.llm
        {
            if ai.is_available() {
                let request = GenerationRequest::new(personalize_prompt(template, &vars))
                    .with_system(PERSONALIZE_SYSTEM)
                    .with_temperature(self.config.personalize_temperature);
                match self.call(llm, request).await {
                    Ok(text) if !text.trim().is_empty() => {
                        return MessageContent {
                            subject,
                            body: text.trim().to_string(),
                            origin: ContentOrigin::PersonalizedTemplate,
                        };
                    }
                    Ok(_) => ai.mark_unavailable("empty personalization response"),
                    Err(e) => ai.mark_unavailable(e.to_string()),
                }
            }
            debug!(recipient = %recipient.email, "Personalization unavailable, sending template as written");
            return MessageContent {
                subject,
                body: template.to_string(),
                origin: ContentOrigin::RawTemplate,
            };
        }

        MessageContent {
            subject,
            body: render(template, &vars),
            origin: ContentOrigin::Template,
        }
    }

    async fn generate(&self, recipient: &Recipient, ai: &mut AiAvailability) -> Option<MessageContent> {
        let llm = self.llm.as_ref()?;
        if !ai.is_available() {
            return None;
        }

        if self.config.use_multi_model && !self.config.multi_models.is_empty() {
            let candidates = self.multi_model_candidates(llm, recipient).await;
            if let Some(best) = select_best(candidates, recipient) {
                info!(
                    recipient = %recipient.email,
                    model = %best.candidate.model_label,
                    score = best.score,
                    "Selected best candidate"
                );
                return Some(self.finish(best.candidate, Some(best.score), recipient));
            }
            debug!(recipient = %recipient.email, "No multi-model candidates, falling back to single model");
        }

        let request = self.cold_email_request(recipient);
        match self.call(llm, request).await {
            Ok(text) => match parse_candidate(&text, llm.model_name()) {
                Some(candidate) => Some(self.finish(candidate, None, recipient)),
                None => {
                    ai.mark_unavailable("empty generation response");
                    None
                }
            },
            Err(e) => {
                ai.mark_unavailable(e.to_string());
                None
            }
        }
    }

    /// One candidate per configured model; failures are logged and skipped.
    async fn multi_model_candidates(
        &self,
        llm: &Arc<dyn LlmProvider>,
        recipient: &Recipient,
    ) -> Vec<ContentCandidate> {
        let request = self.cold_email_request(recipient);
        let calls = self.config.multi_models.iter().map(|model| {
            let request = request.clone().with_model(model.clone());
            async move { (model, self.call(llm, request).await) }
        });

        let mut candidates = Vec::new();
        for (model, result) in join_all(calls).await {
            match result {
                Ok(text) => match parse_candidate(&text, model) {
                    Some(candidate) => candidates.push(candidate),
                    None => debug!(model = %model, "Model returned empty candidate"),
                },
                Err(e) => warn!(model = %model, error = %e, "Model failed to produce candidate"),
            }
        }
        candidates
    }

    fn cold_email_request(&self, recipient: &Recipient) -> GenerationRequest {
        GenerationRequest::new(cold_email_prompt(recipient, &self.profile))
            .with_system(COLD_EMAIL_SYSTEM)
            .with_temperature(self.config.temperature)
    }

    async fn call(
        &self,
        llm: &Arc<dyn LlmProvider>,
        request: GenerationRequest,
    ) -> Result<String, LlmError> {
        let timeout = self.config.call_timeout(&request);
        match tokio::time::timeout(timeout, llm.generate(request)).await {
            Ok(result) => result,
            Err(_) => Err(LlmError::Timeout {
                provider: llm.provider_name().to_string(),
                timeout,
            }),
        }
    }

    fn finish(&self, candidate: ContentCandidate, score: Option<i32>, recipient: &Recipient) -> MessageContent {
        let subject = if candidate.subject.trim().is_empty() {
            default_subject(recipient)
        } else {
            candidate.subject
        };
        let body = if candidate.body.trim().is_empty() {
            self.static_message(recipient).body
        } else {
            candidate.body
        };
        MessageContent {
            subject,
            body,
            origin: ContentOrigin::Generated {
                model: candidate.model_label,
                score,
            },
        }
    }

    /// Deterministic message built from recipient and sender fields.
    pub fn static_message(&self, recipient: &Recipient) -> MessageContent {
        let vars = with_defaults(recipient, &self.profile);
        let var = |key| lookup(&vars, key);

        let mut body = format!(
            "Hi {},\n\nI'm reaching out because I'm interested in {} opportunities at {}.",
            var("name"),
            var("position_type"),
            var("company"),
        );
        if !var("my_skills").is_empty() {
            body.push_str(&format!(" My background includes {}", var("my_skills")));
            if !var("my_experience").is_empty() {
                body.push_str(&format!(", with {}", var("my_experience")));
            }
            body.push('.');
        }
        body.push_str(
            "\n\nI'd welcome the chance to discuss how I could contribute to your team. \
             Would you be open to a brief conversation?\n\nBest regards",
        );
        if !var("my_name").is_empty() {
            body.push_str(&format!(",\n{}", var("my_name")));
        }

        MessageContent {
            subject: default_subject(recipient),
            body,
            origin: ContentOrigin::Static,
        }
    }
}
