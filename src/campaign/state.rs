//! Run state, statistics and the per-run context.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::content::AiAvailability;

/// Campaign sender state machine.
///
/// `Idle → Sending → {Completed, LimitReached, Cancelled}`; an empty
/// recipient list goes straight from `Idle` to `Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Idle,
    Sending,
    Completed,
    LimitReached,
    Cancelled,
}

impl RunState {
    pub fn as_str(self) -> &'static str {
        match self {
            RunState::Idle => "idle",
            RunState::Sending => "sending",
            RunState::Completed => "completed",
            RunState::LimitReached => "limit_reached",
            RunState::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Success and failure counts of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignStats {
    pub sent: u32,
    pub failed: u32,
}

impl CampaignStats {
    pub fn attempted(&self) -> u32 {
        self.sent + self.failed
    }
}

/// State threaded through one run.
#[derive(Debug)]
pub struct RunContext {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    /// AI capability for this run only.
    pub ai: AiAvailability,
    cancel: Arc<AtomicBool>,
}

impl RunContext {
    pub fn new(ai_enabled: bool) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            ai: AiAvailability::new(ai_enabled),
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Share an externally owned cancellation flag.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = flag;
        self
    }

    /// Handle that requests cancellation when set to `true`.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }
}

/// Outcome of a run, returned whichever terminal state was reached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignReport {
    pub run_id: Uuid,
    pub state: RunState,
    pub stats: CampaignStats,
    /// Recipients left untouched because the limit was reached or the run was cancelled.
    pub skipped: usize,
    /// Why AI generation was turned off during the run, if it was.
    pub ai_unavailable: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl CampaignReport {
    pub fn sent(&self) -> u32 {
        self.stats.sent
    }

    pub fn failed(&self) -> u32 {
        self.stats.failed
    }
}
