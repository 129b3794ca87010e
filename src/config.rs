//! Configuration types.
//!
//! `CampaignConfig` is read-only for the duration of a run. It can be
//! deserialized by an embedding application (every field has a default) or
//! built from environment variables with [`CampaignConfig::from_env`].

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::llm::ollama::OllamaConfig;
use crate::recipients::filter::MatchMode;
use crate::transport::smtp::SmtpConfig;

/// Default recipients file for the primary source.
pub const DEFAULT_RECIPIENTS_CSV: &str = "config/recipients.csv";

/// Directory the onboarding flow uploads resumes into.
pub const DEFAULT_RESUME_UPLOAD_DIR: &str = "uploads/resume";

/// Label attached to recipients from the primary source.
pub const PRIMARY_SOURCE_LABEL: &str = "primary";

/// Campaign configuration consumed by the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CampaignConfig {
    /// Maximum successful sends per run.
    pub daily_limit: u32,
    /// Seconds to wait between successful sends.
    pub delay_between_sends: u64,
    /// Upper bound in seconds on one delivery attempt.
    pub send_timeout_secs: u64,
    /// Tags a recipient must carry to be targeted.
    pub target_tags: Vec<String>,
    /// How `target_tags` are compared against a recipient's tags.
    pub tag_match_mode: MatchMode,
    /// Ask several models for candidates and keep the best-scoring one.
    pub use_multi_model: bool,
    /// Models queried when `use_multi_model` is set.
    pub multi_models: Vec<String>,
    /// Attach the most recent upload when no explicit resume resolves.
    pub auto_attach_resume: bool,
    /// Run the literal template through the AI personalization capability.
    pub personalize_custom_message: bool,
    /// Literal message template. Takes priority over AI generation.
    pub custom_message: Option<String>,
    /// Explicit subject used with `custom_message`.
    pub custom_subject: Option<String>,
    /// Whether AI generation may be used at all.
    pub ai_enabled: bool,
    /// Use the log-only transport instead of SMTP.
    pub dry_run: bool,
    pub sources: SourcesConfig,
    pub resume_path: Option<PathBuf>,
    pub resume_upload_dir: PathBuf,
    pub attachment_paths: Vec<PathBuf>,
    /// Append-only record of successful sends.
    pub audit_log_path: PathBuf,
    pub log_dir: PathBuf,
    pub sender: SenderProfile,
    pub smtp: SmtpConfig,
    pub ollama: OllamaConfig,
}

impl Default for CampaignConfig {
    fn default() -> Self {
        Self {
            daily_limit: 50,
            delay_between_sends: 60,
            send_timeout_secs: 120,
            target_tags: Vec::new(),
            tag_match_mode: MatchMode::Any,
            use_multi_model: false,
            multi_models: Vec::new(),
            auto_attach_resume: true,
            personalize_custom_message: true,
            custom_message: None,
            custom_subject: None,
            ai_enabled: true,
            dry_run: false,
            sources: SourcesConfig::default(),
            resume_path: None,
            resume_upload_dir: PathBuf::from(DEFAULT_RESUME_UPLOAD_DIR),
            attachment_paths: Vec::new(),
            audit_log_path: PathBuf::from("logs/sent_emails.csv"),
            log_dir: PathBuf::from("logs"),
            sender: SenderProfile::default(),
            smtp: SmtpConfig::default(),
            ollama: OllamaConfig::default(),
        }
    }
}

/// Where recipients are loaded from, in merge priority order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub primary: PathBuf,
    /// Supplementary sources, folded in after the primary one in this order.
    pub supplementary: Vec<SourceSpec>,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            primary: PathBuf::from(DEFAULT_RECIPIENTS_CSV),
            supplementary: Vec::new(),
        }
    }
}

impl SourcesConfig {
    /// All sources as `(label, path)` pairs, primary first.
    pub fn ordered(&self) -> Vec<SourceSpec> {
        let mut specs = vec![SourceSpec {
            label: PRIMARY_SOURCE_LABEL.to_string(),
            path: self.primary.clone(),
        }];
        specs.extend(self.supplementary.iter().cloned());
        specs
    }
}

/// One labelled recipient source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpec {
    pub label: String,
    pub path: PathBuf,
}

/// The person sending the campaign.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SenderProfile {
    pub name: String,
    pub title: String,
    pub email: String,
    pub phone: String,
    pub linkedin: String,
    pub portfolio: String,
    pub skills: String,
    pub experience: String,
}

impl SenderProfile {
    /// Template variables contributed by the sender (`my_name`, `my_skills`, ...).
    pub fn variables(&self) -> BTreeMap<String, String> {
        [
            ("my_name", &self.name),
            ("my_title", &self.title),
            ("my_email", &self.email),
            ("my_phone", &self.phone),
            ("my_linkedin", &self.linkedin),
            ("my_portfolio", &self.portfolio),
            ("my_skills", &self.skills),
            ("my_experience", &self.experience),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
    }
}

impl CampaignConfig {
    /// Pause inserted between successful sends.
    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.delay_between_sends)
    }

    pub fn send_timeout(&self) -> Duration {
        Duration::from_secs(self.send_timeout_secs)
    }

    /// Build config from environment variables, starting from the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup (the environment in production).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Lookup(lookup);
        let mut config = Self::default();

        if let Some(v) = env.parse("OUTREACH_DAILY_LIMIT")? {
            config.daily_limit = v;
        }
        if let Some(v) = env.parse("OUTREACH_DELAY_SECS")? {
            config.delay_between_sends = v;
        }
        if let Some(v) = env.parse("OUTREACH_SEND_TIMEOUT_SECS")? {
            config.send_timeout_secs = v;
        }
        if let Some(v) = env.list("OUTREACH_TARGET_TAGS") {
            config.target_tags = v;
        }
        if let Some(v) = env.string("OUTREACH_TAG_MATCH_MODE") {
            config.tag_match_mode =
                MatchMode::from_str(&v).map_err(|message| ConfigError::InvalidValue {
                    key: "OUTREACH_TAG_MATCH_MODE".into(),
                    message,
                })?;
        }
        if let Some(v) = env.flag("OUTREACH_USE_MULTI_MODEL")? {
            config.use_multi_model = v;
        }
        if let Some(v) = env.list("OUTREACH_MULTI_MODELS") {
            config.multi_models = v;
        }
        if let Some(v) = env.flag("OUTREACH_AUTO_ATTACH_RESUME")? {
            config.auto_attach_resume = v;
        }
        if let Some(v) = env.flag("OUTREACH_PERSONALIZE_CUSTOM_MESSAGE")? {
            config.personalize_custom_message = v;
        }
        config.custom_message = env.string("OUTREACH_CUSTOM_MESSAGE");
        config.custom_subject = env.string("OUTREACH_CUSTOM_SUBJECT");
        if let Some(v) = env.flag("OUTREACH_AI_ENABLED")? {
            config.ai_enabled = v;
        }
        if let Some(v) = env.flag("OUTREACH_DRY_RUN")? {
            config.dry_run = v;
        }

        if let Some(v) = env.string("OUTREACH_RECIPIENTS_CSV") {
            config.sources.primary = PathBuf::from(v);
        }
        if let Some(entries) = env.list("OUTREACH_EXTRA_SOURCES") {
            config.sources.supplementary = entries
                .iter()
                .map(|entry| parse_source_spec(entry))
                .collect::<Result<_, _>>()?;
        }

        config.resume_path = env.string("OUTREACH_RESUME_PATH").map(PathBuf::from);
        if let Some(v) = env.string("OUTREACH_RESUME_UPLOAD_DIR") {
            config.resume_upload_dir = PathBuf::from(v);
        }
        if let Some(v) = env.list("OUTREACH_ATTACHMENTS") {
            config.attachment_paths = v.into_iter().map(PathBuf::from).collect();
        }
        if let Some(v) = env.string("OUTREACH_AUDIT_LOG") {
            config.audit_log_path = PathBuf::from(v);
        }
        if let Some(v) = env.string("OUTREACH_LOG_DIR") {
            config.log_dir = PathBuf::from(v);
        }

        let sender = &mut config.sender;
        sender.name = env.string("SENDER_NAME").unwrap_or_default();
        sender.title = env.string("SENDER_TITLE").unwrap_or_default();
        sender.email = env.string("SENDER_EMAIL").unwrap_or_default();
        sender.phone = env.string("SENDER_PHONE").unwrap_or_default();
        sender.linkedin = env.string("SENDER_LINKEDIN").unwrap_or_default();
        sender.portfolio = env.string("SENDER_PORTFOLIO").unwrap_or_default();
        sender.skills = env.string("SENDER_SKILLS").unwrap_or_default();
        sender.experience = env.string("SENDER_EXPERIENCE").unwrap_or_default();

        if let Some(v) = env.string("SMTP_HOST") {
            config.smtp.host = v;
        }
        if let Some(v) = env.parse("SMTP_PORT")? {
            config.smtp.port = v;
        }
        config.smtp.username = env.string("SMTP_USERNAME");
        config.smtp.password = env.string("SMTP_PASSWORD").map(secrecy::SecretString::from);
        if let Some(v) = env.parse("SMTP_TIMEOUT_SECS")? {
            config.smtp.timeout_secs = v;
        }

        if let Some(v) = env.string("OLLAMA_BASE_URL") {
            config.ollama.base_url = v;
        }
        if let Some(v) = env.string("OLLAMA_MODEL") {
            config.ollama.model = v;
        }
        if let Some(v) = env.list("OLLAMA_FALLBACK_MODELS") {
            config.ollama.fallback_models = v;
        }
        if let Some(v) = env.parse("OLLAMA_TEMPERATURE")? {
            config.ollama.temperature = v;
        }
        if let Some(v) = env.parse("OLLAMA_PERSONALIZE_TEMPERATURE")? {
            config.ollama.personalize_temperature = v;
        }
        if let Some(v) = env.parse("OLLAMA_TIMEOUT_SECS")? {
            config.ollama.timeout_secs = v;
        }

        Ok(config)
    }

    /// Check the fields a run cannot start without.
    ///
    /// Called before any recipient is contacted; a failure here is fatal.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.daily_limit == 0 {
            return Err(ConfigError::InvalidValue {
                key: "daily_limit".into(),
                message: "must be greater than zero".into(),
            });
        }
        if self.send_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "send_timeout_secs".into(),
                message: "must be greater than zero".into(),
            });
        }
        if self.use_multi_model && self.multi_models.iter().all(|m| m.trim().is_empty()) {
            tracing::warn!("use_multi_model is set but no multi_models are configured");
        }
        if self.dry_run {
            return Ok(());
        }
        if self.sender.email.trim().is_empty() {
            return Err(ConfigError::MissingRequired {
                key: "sender.email".into(),
                hint: "Set SENDER_EMAIL to the address campaigns are sent from.".into(),
            });
        }
        if self.smtp.password.is_none() {
            return Err(ConfigError::MissingRequired {
                key: "smtp.password".into(),
                hint: "Set SMTP_PASSWORD (for Gmail, an app password).".into(),
            });
        }
        Ok(())
    }
}

/// Parse a `label=path` supplementary source entry.
fn parse_source_spec(entry: &str) -> Result<SourceSpec, ConfigError> {
    match entry.split_once('=') {
        Some((label, path)) if !label.trim().is_empty() && !path.trim().is_empty() => {
            Ok(SourceSpec {
                label: label.trim().to_string(),
                path: PathBuf::from(path.trim()),
            })
        }
        _ => Err(ConfigError::InvalidValue {
            key: "OUTREACH_EXTRA_SOURCES".into(),
            message: format!("expected label=path, got '{entry}'"),
        }),
    }
}

struct Lookup<F>(F);

impl<F> Lookup<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn string(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn list(&self, key: &str) -> Option<Vec<String>> {
        self.string(key).map(|v| {
            v.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
    }

    fn parse<T>(&self, key: &str) -> Result<Option<T>, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.string(key)
            .map(|v| {
                v.parse::<T>().map_err(|e| ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: format!("'{v}': {e}"),
                })
            })
            .transpose()
    }

    fn flag(&self, key: &str) -> Result<Option<bool>, ConfigError> {
        let Some(v) = self.string(key) else {
            return Ok(None);
        };
        match v.to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(Some(true)),
            "0" | "false" | "no" | "off" => Ok(Some(false)),
            _ => Err(ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("'{v}' is not a boolean"),
            }),
        }
    }
}
