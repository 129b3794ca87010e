//! Error types for the outreach campaign pipeline.

use std::path::PathBuf;
use std::time::Duration;

use crate::campaign::state::CampaignStats;

/// Top-level error type for a campaign run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Campaign error: {0}")]
    Campaign(#[from] CampaignError),
}

/// Configuration-related errors. Always fatal for the run.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required configuration: {key}. {hint}")]
    MissingRequired { key: String, hint: String },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Recipient source errors. The loader degrades these to an empty contribution.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Recipient source not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to parse recipient source: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Generation backend errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Model {model} not available on provider {provider}")]
    ModelNotAvailable { provider: String, model: String },

    #[error("Provider {provider} timed out after {timeout:?}")]
    Timeout { provider: String, timeout: Duration },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Transport errors for a single message (or for opening the transport).
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("Transport {name} failed to connect: {reason}")]
    ConnectionFailed { name: String, reason: String },

    #[error("Transport {name} failed to send: {reason}")]
    SendFailed { name: String, reason: String },

    #[error("Invalid address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("Attachment {} could not be added: {reason}", path.display())]
    Attachment { path: PathBuf, reason: String },

    #[error("Transport {name} timed out after {timeout:?}")]
    Timeout { name: String, timeout: Duration },
}

/// Run-level failures. These abort the run and carry the statistics gathered so far.
#[derive(Debug, thiserror::Error)]
pub enum CampaignError {
    #[error("Campaign aborted after {} sent / {} failed: {reason}", stats.sent, stats.failed)]
    Aborted { stats: CampaignStats, reason: String },

    #[error("Audit log {} could not be written: {reason}", path.display())]
    Audit { path: PathBuf, reason: String },
}

/// Result type alias for the crate.
pub type Result<T> = std::result::Result<T, Error>;
