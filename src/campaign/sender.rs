//! Campaign sender — walks the recipient list one at a time.
//!
//! The daily limit is checked before every attempt. Delivery failures are
//! counted and skipped; only transport connection and audit-log failures end
//! the run early, and those carry the statistics gathered so far.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::attachments::{self, AttachmentResolver};
use crate::content::{ContentSelector, html};
use crate::error::{CampaignError, DeliveryError};
use crate::recipients::Recipient;
use crate::transport::{OutgoingMessage, Transport};

use super::audit::{AuditLog, AuditRecord};
use super::pacing::{NoDelay, Pacer};
use super::state::{CampaignReport, CampaignStats, RunContext, RunState};

/// Upper bound on one delivery, including attachment reads.
///
/// Expiry stops waiting but cannot recall a message already handed to the
/// transport's blocking worker, so at most one send timed out this way may
/// still be delivered. It is counted as failed and gets no audit row.
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(120);

/// Sends one campaign run through a transport.
pub struct CampaignSender {
    transport: Arc<dyn Transport>,
    selector: ContentSelector,
    audit: AuditLog,
    attachments: Option<AttachmentResolver>,
    pacer: Arc<dyn Pacer>,
    daily_limit: u32,
    send_timeout: Duration,
}

impl CampaignSender {
    pub fn new(transport: Arc<dyn Transport>, selector: ContentSelector, audit: AuditLog) -> Self {
        Self {
            transport,
            selector,
            audit,
            attachments: None,
            pacer: Arc::new(NoDelay),
            daily_limit: 50,
            send_timeout: DEFAULT_SEND_TIMEOUT,
        }
    }

    pub fn with_attachments(mut self, resolver: AttachmentResolver) -> Self {
        self.attachments = Some(resolver);
        self
    }

    pub fn with_pacer(mut self, pacer: Arc<dyn Pacer>) -> Self {
        self.pacer = pacer;
        self
    }

    pub fn with_daily_limit(mut self, limit: u32) -> Self {
        self.daily_limit = limit;
        self
    }

    pub fn with_send_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout = timeout;
        self
    }

    /// Run the send loop over `recipients`.
    pub async fn send_campaign(
        &self,
        recipients: Vec<Recipient>,
        ctx: &mut RunContext,
    ) -> Result<CampaignReport, CampaignError> {
        let mut stats = CampaignStats::default();

        if recipients.is_empty() {
            info!(run_id = %ctx.run_id, "No recipients to contact");
            return Ok(self.report(ctx, RunState::Completed, stats, 0));
        }

        self.transport
            .connect()
            .await
            .map_err(|e| CampaignError::Aborted {
                stats,
                reason: e.to_string(),
            })?;

        let attachments = self
            .attachments
            .as_ref()
            .map(AttachmentResolver::resolve)
            .unwrap_or_default();

        let total = recipients.len();
        let mut state = RunState::Sending;
        let mut skipped = 0;
        info!(
            run_id = %ctx.run_id,
            recipients = total,
            daily_limit = self.daily_limit,
            transport = self.transport.name(),
            attachments = attachments.len(),
            "Campaign started"
        );

        for (index, recipient) in recipients.iter().enumerate() {
            if ctx.is_cancelled() {
                state = RunState::Cancelled;
                skipped = total - index;
                warn!(run_id = %ctx.run_id, remaining = skipped, "Campaign cancelled");
                break;
            }
            if stats.sent >= self.daily_limit {
                state = RunState::LimitReached;
                skipped = total - index;
                info!(
                    run_id = %ctx.run_id,
                    daily_limit = self.daily_limit,
                    remaining = skipped,
                    "Daily limit reached"
                );
                break;
            }

            match self.send_one(recipient, &attachments, ctx).await {
                Ok(subject) => {
                    stats.sent += 1;
                    if let Err(e) = self.audit.append(&AuditRecord::new(recipient, &subject)) {
                        self.close_transport().await;
                        return Err(CampaignError::Aborted {
                            stats,
                            reason: e.to_string(),
                        });
                    }
                    info!(
                        recipient = %recipient.email,
                        sent = stats.sent,
                        daily_limit = self.daily_limit,
                        "Email sent"
                    );

                    let is_last = index + 1 == total;
                    if !is_last && stats.sent < self.daily_limit {
                        self.pacer.pause().await;
                    }
                }
                Err(e) => {
                    stats.failed += 1;
                    error!(recipient = %recipient.email, error = %e, "Failed to send email");
                }
            }
        }

        if state == RunState::Sending {
            state = RunState::Completed;
        }
        self.close_transport().await;

        let report = self.report(ctx, state, stats, skipped);
        info!(
            run_id = %report.run_id,
            state = %report.state,
            attempted = report.stats.attempted(),
            sent = report.stats.sent,
            failed = report.stats.failed,
            skipped = report.skipped,
            "Campaign finished"
        );
        Ok(report)
    }

    /// Compose and deliver one message; returns the subject on success.
    async fn send_one(
        &self,
        recipient: &Recipient,
        attachments: &[PathBuf],
        ctx: &mut RunContext,
    ) -> Result<String, DeliveryError> {
        let content = self.selector.select(recipient, &mut ctx.ai).await;
        debug!(
            recipient = %recipient.email,
            origin = content.origin.label(),
            "Content selected"
        );

        let html = html::render(&content.body, self.selector.profile());
        let mut message = OutgoingMessage::new(&recipient.email, &content.subject, &content.body)
            .with_html(html)
            .with_attachments(attachments::verify(attachments));
        if let Some(name) = recipient.name() {
            message = message.with_name(name);
        }

        match tokio::time::timeout(self.send_timeout, self.transport.send(&message)).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(DeliveryError::Timeout {
                    name: self.transport.name().to_string(),
                    timeout: self.send_timeout,
                });
            }
        }
        Ok(content.subject)
    }

    async fn close_transport(&self) {
        if let Err(e) = self.transport.close().await {
            warn!(transport = self.transport.name(), error = %e, "Failed to close transport");
        }
    }

    fn report(
        &self,
        ctx: &RunContext,
        state: RunState,
        stats: CampaignStats,
        skipped: usize,
    ) -> CampaignReport {
        CampaignReport {
            run_id: ctx.run_id,
            state,
            stats,
            skipped,
            ai_unavailable: if ctx.ai.is_available() {
                None
            } else {
                ctx.ai.reason().map(str::to_string)
            },
            started_at: ctx.started_at,
            finished_at: Utc::now(),
        }
    }
}
