//! Shared types for content selection.

use serde::{Deserialize, Serialize};

/// One proposed message, from a template or a generation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentCandidate {
    pub subject: String,
    pub body: String,
    /// Model (or "template") that produced the candidate.
    pub model_label: String,
}

impl ContentCandidate {
    pub fn new(
        subject: impl Into<String>,
        body: impl Into<String>,
        model_label: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
            model_label: model_label.into(),
        }
    }

    /// A candidate with neither subject nor body carries nothing to send.
    pub fn is_empty(&self) -> bool {
        self.subject.trim().is_empty() && self.body.trim().is_empty()
    }
}

/// Where the final message content came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContentOrigin {
    /// Literal template with local variable substitution.
    Template,
    /// Literal template rewritten by the personalization capability.
    PersonalizedTemplate,
    /// Literal template sent as-is because personalization was unavailable.
    RawTemplate,
    /// Generated by a model; `score` is set when several candidates competed.
    Generated { model: String, score: Option<i32> },
    /// Deterministic message built from recipient and sender fields.
    Static,
}

impl ContentOrigin {
    pub fn label(&self) -> &str {
        match self {
            ContentOrigin::Template => "template",
            ContentOrigin::PersonalizedTemplate => "personalized_template",
            ContentOrigin::RawTemplate => "raw_template",
            ContentOrigin::Generated { .. } => "generated",
            ContentOrigin::Static => "static",
        }
    }
}

/// The subject/body pair chosen for one recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageContent {
    pub subject: String,
    pub body: String,
    pub origin: ContentOrigin,
}
