//! Delivery transports.
//!
//! A transport accepts a fully composed message and reports success or
//! failure. It is opened once per run and reused across sends; retries, if
//! any, are the transport's own concern.

pub mod dry_run;
pub mod smtp;

pub use dry_run::DryRunTransport;
pub use smtp::{SmtpConfig, SmtpMailer};

use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::DeliveryError;

/// A message ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub to: String,
    pub to_name: Option<String>,
    pub subject: String,
    /// Plain-text body.
    pub body: String,
    /// Optional HTML alternative.
    pub html_body: Option<String>,
    pub attachments: Vec<PathBuf>,
}

impl OutgoingMessage {
    pub fn new(to: impl Into<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            to_name: None,
            subject: subject.into(),
            body: body.into(),
            html_body: None,
            attachments: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.to_name = Some(name.into());
        self
    }

    pub fn with_html(mut self, html: impl Into<String>) -> Self {
        self.html_body = Some(html.into());
        self
    }

    pub fn with_attachments(mut self, attachments: Vec<PathBuf>) -> Self {
        self.attachments = attachments;
        self
    }
}

/// Outbound delivery capability.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Transport name used in logs and errors.
    fn name(&self) -> &str;

    /// Open (or verify) the session before the first send.
    async fn connect(&self) -> Result<(), DeliveryError>;

    /// Deliver one message.
    async fn send(&self, message: &OutgoingMessage) -> Result<(), DeliveryError>;

    /// Release the session after the last send.
    async fn close(&self) -> Result<(), DeliveryError> {
        Ok(())
    }
}
