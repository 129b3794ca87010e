//! Pacing between sends.

use std::time::Duration;

use async_trait::async_trait;

/// Decides how long the sender waits between successful sends.
#[async_trait]
pub trait Pacer: Send + Sync {
    async fn pause(&self);
}

/// Waits a fixed interval on the tokio timer.
#[derive(Debug, Clone, Copy)]
pub struct TokioPacer {
    delay: Duration,
}

impl TokioPacer {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

#[async_trait]
impl Pacer for TokioPacer {
    async fn pause(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

/// Never waits.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

#[async_trait]
impl Pacer for NoDelay {
    async fn pause(&self) {}
}
