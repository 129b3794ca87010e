//! Log-only transport for rehearsing a campaign without sending mail.

use std::sync::Mutex;

use async_trait::async_trait;
use tracing::info;

use crate::error::DeliveryError;

use super::{OutgoingMessage, Transport};

/// Accepts every message and records it instead of delivering.
#[derive(Debug, Default)]
pub struct DryRunTransport {
    delivered: Mutex<Vec<OutgoingMessage>>,
}

impl DryRunTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages accepted so far, in send order.
    pub fn delivered(&self) -> Vec<OutgoingMessage> {
        self.delivered
            .lock()
            .map(|d| d.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Transport for DryRunTransport {
    fn name(&self) -> &str {
        "dry-run"
    }

    async fn connect(&self) -> Result<(), DeliveryError> {
        info!("Dry run: no mail will be sent");
        Ok(())
    }

    async fn send(&self, message: &OutgoingMessage) -> Result<(), DeliveryError> {
        info!(
            to = %message.to,
            subject = %message.subject,
            attachments = message.attachments.len(),
            "Dry run: would send email"
        );
        if let Ok(mut delivered) = self.delivered.lock() {
            delivered.push(message.clone());
        }
        Ok(())
    }
}
