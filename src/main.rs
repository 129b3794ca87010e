use std::sync::Arc;
use std::sync::atomic::Ordering;

use anyhow::Context;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use outreach_campaign::campaign::{RunContext, run_campaign};
use outreach_campaign::config::CampaignConfig;
use outreach_campaign::llm::{LlmProvider, create_provider};
use outreach_campaign::transport::{DryRunTransport, SmtpMailer, Transport};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Install rustls crypto provider before any TLS usage
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    let config = CampaignConfig::from_env().context("Failed to read configuration")?;

    // ── Logging: stderr + daily file ─────────────────────────────────────
    std::fs::create_dir_all(&config.log_dir)
        .with_context(|| format!("Failed to create log directory {}", config.log_dir.display()))?;
    let file_appender = tracing_appender::rolling::daily(&config.log_dir, "outreach.log");
    let (file_writer, _log_guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(fmt::layer().with_ansi(false).with_writer(file_writer))
        .init();

    config.validate().context("Invalid configuration")?;

    eprintln!("📧 Outreach Campaign v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Primary source: {}", config.sources.primary.display());
    eprintln!("   Extra sources: {}", config.sources.supplementary.len());
    eprintln!("   Daily limit: {}", config.daily_limit);
    eprintln!("   Delay: {}s", config.delay_between_sends);
    eprintln!(
        "   Mode: {}",
        if config.dry_run { "dry run" } else { "smtp" }
    );
    eprintln!(
        "   AI: {}\n",
        if config.ai_enabled {
            config.ollama.model.as_str()
        } else {
            "disabled"
        }
    );

    let transport: Arc<dyn Transport> = if config.dry_run {
        Arc::new(DryRunTransport::new())
    } else {
        Arc::new(
            SmtpMailer::new(&config.smtp, &config.sender)
                .context("Failed to set up SMTP transport")?,
        )
    };

    let llm: Option<Arc<dyn LlmProvider>> = if config.ai_enabled {
        Some(create_provider(&config.ollama).context("Failed to create LLM provider")?)
    } else {
        None
    };

    // ── Cancellation on Ctrl-C ───────────────────────────────────────────
    let mut ctx = RunContext::new(config.ai_enabled);
    let cancel = ctx.cancel_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping after the current recipient");
            cancel.store(true, Ordering::Relaxed);
        }
    });

    let report = run_campaign(&config, transport, llm, &mut ctx).await?;

    eprintln!("\n   Run: {}", report.run_id);
    eprintln!("   Result: {}", report.state);
    eprintln!("   Sent: {}", report.sent());
    eprintln!("   Failed: {}", report.failed());
    if report.skipped > 0 {
        eprintln!("   Not contacted: {}", report.skipped);
    }
    if let Some(reason) = &report.ai_unavailable {
        eprintln!("   AI fallback: {reason}");
    }
    eprintln!("   Audit log: {}", config.audit_log_path.display());

    Ok(())
}
