// src/infrastructure/gc.rs
use std::{sync::Arc, time::Duration};

use tokio::{sync::watch, task::JoinHandle, time::MissedTickBehavior};

use crate::{
    application::{
        error::ApplicationResult,
        ports::{session::SessionRepository, time::Clock},
    },
    domain::oauth::TokenStore,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub codes: u64,
    pub tokens: u64,
    pub sessions: u64,
}

impl SweepReport {
    pub fn is_empty(&self) -> bool {
        self.codes == 0 && self.tokens == 0 && self.sessions == 0
    }
}

/// Periodically deletes expired codes, tokens and sessions.
pub struct GarbageCollector {
    tokens: Arc<dyn TokenStore>,
    sessions: Arc<dyn SessionRepository>,
    clock: Arc<dyn Clock>,
    interval: Duration,
    batch_size: u32,
}

impl GarbageCollector {
    pub fn new(
        tokens: Arc<dyn TokenStore>,
        sessions: Arc<dyn SessionRepository>,
        clock: Arc<dyn Clock>,
        interval: Duration,
        batch_size: u32,
    ) -> Self {
        Self {
            tokens,
            sessions,
            clock,
            interval,
            batch_size,
        }
    }

    pub async fn sweep(&self) -> ApplicationResult<SweepReport> {
        let now = self.clock.now();
        let purged = self.tokens.purge_expired(now, self.batch_size).await?;
        let sessions = self.sessions.purge_expired(now).await?;
        Ok(SweepReport {
            codes: purged.codes,
            tokens: purged.tokens,
            sessions,
        })
    }

    /// Runs `sweep` every interval until `shutdown` flips to true or its sender is dropped.
    pub fn spawn(self, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // the first tick completes immediately
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => self.run_once().await,
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                }
            }
            tracing::info!("garbage collector stopped");
        })
    }

    async fn run_once(&self) {
        match self.sweep().await {
            Ok(report) if report.is_empty() => tracing::debug!("gc sweep found nothing to delete"),
            Ok(report) => tracing::info!(
                codes = report.codes,
                tokens = report.tokens,
                sessions = report.sessions,
                "gc sweep deleted expired records"
            ),
            Err(err) => tracing::warn!(error = %err, "gc sweep failed"),
        }
    }
}
