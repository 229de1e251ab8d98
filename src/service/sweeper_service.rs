// service/sweeper_service.rs
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    config::MarketSettings,
    db::db::MarketStore,
    service::{
        auction_service::{AuctionService, CloseOutcome},
        error::ServiceError,
    },
};

#[derive(Debug, Default, Clone, Serialize, PartialEq)]
pub struct SweepReport {
    pub expired_found: usize,
    pub closed: usize,
    pub failed: usize,
    pub drafts_purged: u64,
    pub audit_purged: u64,
}

/// Out-of-band closing of auctions whose window has passed, plus retention
/// cleanup. One job failing never blocks the rest of the batch.
#[derive(Clone)]
pub struct SweeperService {
    store: Arc<dyn MarketStore>,
    auction_service: Arc<AuctionService>,
    settings: MarketSettings,
}

impl SweeperService {
    pub fn new(
        store: Arc<dyn MarketStore>,
        auction_service: Arc<AuctionService>,
        settings: MarketSettings,
    ) -> Self {
        Self {
            store,
            auction_service,
            settings,
        }
    }

    pub async fn sweep(&self) -> Result<SweepReport, ServiceError> {
        self.sweep_at(Utc::now()).await
    }

    pub async fn sweep_at(&self, now: DateTime<Utc>) -> Result<SweepReport, ServiceError> {
        let unanswered_before = now - chrono_duration(self.settings.no_bid_timeout);
        let due = self
            .store
            .get_expired_auctions(now, unanswered_before)
            .await?;

        let mut report = SweepReport {
            expired_found: due.len(),
            ..SweepReport::default()
        };

        for job in due {
            match self.auction_service.close_auction(job.id).await {
                Ok(CloseOutcome::AlreadyClosed) => {}
                Ok(_) => report.closed += 1,
                Err(e) => {
                    tracing::error!("Failed to close auction for job {}: {}", job.id, e);
                    report.failed += 1;
                }
            }
        }

        report.drafts_purged = self
            .purge("stale drafts", || {
                self.store
                    .purge_stale_drafts(now - chrono_duration(self.settings.draft_retention))
            })
            .await;
        report.audit_purged = self
            .purge("audit records", || {
                self.store
                    .purge_audit_logs(now - chrono_duration(self.settings.audit_retention))
            })
            .await;

        tracing::info!(
            "Sweep finished: {} due, {} closed, {} failed, {} drafts and {} audit records purged",
            report.expired_found,
            report.closed,
            report.failed,
            report.drafts_purged,
            report.audit_purged
        );

        Ok(report)
    }

    async fn purge<F, Fut>(&self, what: &str, run: F) -> u64
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<u64, sqlx::Error>>,
    {
        match run().await {
            Ok(purged) => purged,
            Err(e) => {
                tracing::warn!("Retention cleanup of {} failed: {}", what, e);
                0
            }
        }
    }
}

fn chrono_duration(duration: std::time::Duration) -> chrono::Duration {
    chrono::Duration::from_std(duration).unwrap_or_else(|_| chrono::Duration::zero())
}
