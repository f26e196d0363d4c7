//! Background overdue sweep.
//!
//! A single long-lived task owned by `main`: on each tick it marks every
//! BORROWED loan past its due date as OVERDUE (system actor, `changed_by =
//! NULL` in history) and prunes expired blacklisted tokens. The two
//! operations are isolated; one failing never stops the other. A failed
//! tick is logged and retried after a shorter backoff, it never takes the
//! process down. Shutdown is cooperative via the watch channel, and the
//! per-operation transactions guarantee no loan is left half-updated.

use std::time::Duration;

use tokio::sync::watch;

use crate::repository::Repository;

pub struct OverdueSweeper {
    repository: Repository,
    interval: Duration,
    retry_backoff: Duration,
    shutdown: watch::Receiver<bool>,
}

impl OverdueSweeper {
    pub fn new(
        repository: Repository,
        interval: Duration,
        retry_backoff: Duration,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            repository,
            interval,
            retry_backoff,
            shutdown,
        }
    }

    /// Run until shutdown is signalled.
    pub async fn run(mut self) {
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            "overdue sweeper started"
        );

        // First pass happens one interval after startup; a failed pass
        // is retried after the backoff.
        let mut wait = self.interval;
        loop {
            tokio::select! {
                _ = self.shutdown.changed() => {
                    tracing::info!("overdue sweeper stopping");
                    break;
                }
                _ = tokio::time::sleep(wait) => {}
            }

            wait = if self.tick().await {
                self.interval
            } else {
                self.retry_backoff
            };
        }
    }

    /// One maintenance pass. Returns false if anything failed so the loop
    /// retries sooner than the regular interval.
    async fn tick(&self) -> bool {
        let mut ok = true;

        match self.repository.loans.mark_overdue_loans().await {
            Ok(0) => {}
            Ok(count) => {
                tracing::info!(count, "overdue check completed");
            }
            Err(e) => {
                tracing::error!(error = %e, "overdue check failed");
                ok = false;
            }
        }

        match self.repository.tokens.prune_expired().await {
            Ok(0) => {}
            Ok(count) => {
                tracing::info!(count, "expired blacklisted tokens pruned");
            }
            Err(e) => {
                tracing::error!(error = %e, "token pruning failed");
                ok = false;
            }
        }

        ok
    }
}
