//! SMTP delivery via lettre.
//!
//! lettre's `SmtpTransport` is blocking, so connection checks and sends run
//! on the blocking pool. The pooled transport is built once and reused for
//! every message of the run.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, Message, SmtpTransport, Transport as _};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::SenderProfile;
use crate::error::DeliveryError;

use super::{OutgoingMessage, Transport};

const NAME: &str = "smtp";

/// SMTP connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    /// Login name; defaults to the sender address.
    pub username: Option<String>,
    #[serde(skip)]
    pub password: Option<SecretString>,
    pub timeout_secs: u64,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: "smtp.gmail.com".to_string(),
            port: 587,
            username: None,
            password: None,
            timeout_secs: 30,
        }
    }
}

impl SmtpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Mail transport over an authenticated STARTTLS relay.
pub struct SmtpMailer {
    transport: SmtpTransport,
    from: Mailbox,
    host: String,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig, sender: &SenderProfile) -> Result<Self, DeliveryError> {
        let from = mailbox(&sender.email, Some(&sender.name))?;
        let password = config
            .password
            .as_ref()
            .ok_or_else(|| DeliveryError::ConnectionFailed {
                name: NAME.into(),
                reason: "SMTP password not configured".into(),
            })?;
        let username = config
            .username
            .clone()
            .unwrap_or_else(|| sender.email.clone());
        let creds = Credentials::new(username, password.expose_secret().to_string());

        let transport = SmtpTransport::starttls_relay(&config.host)
            .map_err(|e| DeliveryError::ConnectionFailed {
                name: NAME.into(),
                reason: format!("SMTP relay error: {e}"),
            })?
            .port(config.port)
            .credentials(creds)
            .timeout(Some(config.timeout()))
            .build();

        Ok(Self {
            transport,
            from,
            host: config.host.clone(),
        })
    }

    /// Compose a lettre message, reading attachments from disk.
    pub fn build_message(&self, message: &OutgoingMessage) -> Result<Message, DeliveryError> {
        compose(&self.from, message)
    }
}

#[async_trait]
impl Transport for SmtpMailer {
    fn name(&self) -> &str {
        NAME
    }

    async fn connect(&self) -> Result<(), DeliveryError> {
        let transport = self.transport.clone();
        let ok = tokio::task::spawn_blocking(move || transport.test_connection())
            .await
            .map_err(|e| DeliveryError::ConnectionFailed {
                name: NAME.into(),
                reason: format!("connection task failed: {e}"),
            })?
            .map_err(|e| DeliveryError::ConnectionFailed {
                name: NAME.into(),
                reason: e.to_string(),
            })?;

        if !ok {
            return Err(DeliveryError::ConnectionFailed {
                name: NAME.into(),
                reason: format!("server {} did not accept the connection", self.host),
            });
        }
        info!(host = %self.host, "SMTP connection verified");
        Ok(())
    }

    async fn send(&self, message: &OutgoingMessage) -> Result<(), DeliveryError> {
        let email = self.build_message(message)?;
        let transport = self.transport.clone();
        tokio::task::spawn_blocking(move || transport.send(&email))
            .await
            .map_err(|e| DeliveryError::SendFailed {
                name: NAME.into(),
                reason: format!("send task failed: {e}"),
            })?
            .map_err(|e| DeliveryError::SendFailed {
                name: NAME.into(),
                reason: format!("SMTP send failed: {e}"),
            })?;

        debug!(to = %message.to, attachments = message.attachments.len(), "Email sent");
        Ok(())
    }
}

fn mailbox(address: &str, name: Option<&str>) -> Result<Mailbox, DeliveryError> {
    let email: Address = address
        .trim()
        .parse()
        .map_err(|e| DeliveryError::InvalidAddress {
            address: address.to_string(),
            reason: format!("{e}"),
        })?;
    let name = name
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string);
    Ok(Mailbox::new(name, email))
}

fn compose(from: &Mailbox, message: &OutgoingMessage) -> Result<Message, DeliveryError> {
    let to = mailbox(&message.to, message.to_name.as_deref())?;

    let text = match &message.html_body {
        Some(html) => MultiPart::alternative_plain_html(message.body.clone(), html.clone()),
        None => MultiPart::alternative().singlepart(SinglePart::plain(message.body.clone())),
    };

    let mut body = MultiPart::mixed().multipart(text);
    for path in &message.attachments {
        body = body.singlepart(attachment(path)?);
    }

    Message::builder()
        .from(from.clone())
        .to(to)
        .subject(message.subject.as_str())
        .multipart(body)
        .map_err(|e| DeliveryError::SendFailed {
            name: NAME.into(),
            reason: format!("Failed to build email: {e}"),
        })
}

fn attachment(path: &Path) -> Result<SinglePart, DeliveryError> {
    let fail = |reason: String| DeliveryError::Attachment {
        path: path.to_path_buf(),
        reason,
    };
    let bytes = std::fs::read(path).map_err(|e| fail(e.to_string()))?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "attachment".to_string());
    let content_type = ContentType::parse(mime_type(path)).map_err(|e| fail(e.to_string()))?;
    Ok(Attachment::new(filename).body(bytes, content_type))
}

fn mime_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "txt" => "text/plain",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        _ => "application/octet-stream",
    }
}
