//! Campaign runs.
//!
//! `run_campaign` is the whole pipeline: validate configuration, load and
//! merge sources, apply the tag filter, then hand the list to the sender.

pub mod audit;
pub mod pacing;
pub mod sender;
pub mod state;

pub use audit::{AuditLog, AuditRecord};
pub use pacing::{NoDelay, Pacer, TokioPacer};
pub use sender::CampaignSender;
pub use state::{CampaignReport, CampaignStats, RunContext, RunState};

use std::sync::Arc;

use tracing::{info, warn};

use crate::attachments::AttachmentResolver;
use crate::config::CampaignConfig;
use crate::content::{ContentSelector, SelectorConfig};
use crate::error::Result;
use crate::llm::LlmProvider;
use crate::recipients::{Recipient, filter_by_tags, load_all, merge_sources};
use crate::transport::Transport;

/// Load, merge and filter the configured sources.
pub fn prepare_recipients(config: &CampaignConfig) -> Vec<Recipient> {
    let sources = load_all(&config.sources.ordered());
    let merged = merge_sources(sources);
    info!(recipients = merged.len(), "Merged recipient sources");
    filter_by_tags(merged, &config.target_tags, config.tag_match_mode)
}

/// Build a sender wired from configuration.
pub fn build_sender(
    config: &CampaignConfig,
    transport: Arc<dyn Transport>,
    llm: Option<Arc<dyn LlmProvider>>,
) -> CampaignSender {
    let selector = ContentSelector::new(
        llm,
        SelectorConfig::from_campaign(config),
        config.sender.clone(),
    );
    CampaignSender::new(transport, selector, AuditLog::new(&config.audit_log_path))
        .with_attachments(AttachmentResolver::from_config(config))
        .with_pacer(Arc::new(TokioPacer::new(config.delay())))
        .with_daily_limit(config.daily_limit)
        .with_send_timeout(config.send_timeout())
}

/// Run one campaign end to end.
///
/// Configuration errors surface before any recipient is contacted. `llm` is
/// ignored when AI is disabled in the configuration.
pub async fn run_campaign(
    config: &CampaignConfig,
    transport: Arc<dyn Transport>,
    llm: Option<Arc<dyn LlmProvider>>,
    ctx: &mut RunContext,
) -> Result<CampaignReport> {
    config.validate()?;

    let llm = llm.filter(|_| config.ai_enabled);
    if !config.ai_enabled {
        ctx.ai.mark_unavailable("disabled by configuration");
    }
    if let Some(provider) = &llm
        && let Err(e) = provider.ensure_model_available().await
    {
        warn!(error = %e, "Generation may fall back to other models or static content");
    }

    let recipients = prepare_recipients(config);
    let sender = build_sender(config, transport, llm);
    Ok(sender.send_campaign(recipients, ctx).await?)
}
