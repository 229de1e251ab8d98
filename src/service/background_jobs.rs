// service/background_jobs.rs
use std::sync::Arc;

use chrono::Utc;
use tokio::time::interval;

use crate::AppState;

/// In-process auction expiry loop, used when a sweep interval is configured.
pub async fn start_auction_expiry_job(app_state: Arc<AppState>) {
    let mut interval = interval(app_state.env.sweep_interval);

    loop {
        interval.tick().await;

        tracing::info!("Running auction expiry sweep at {}", Utc::now());

        match app_state.sweeper_service.sweep().await {
            Ok(report) => tracing::info!(
                "Auction expiry sweep completed: {} closed, {} failed",
                report.closed,
                report.failed
            ),
            Err(e) => tracing::error!("Auction expiry sweep failed: {}", e),
        }
    }
}
