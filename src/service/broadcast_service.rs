// service/broadcast_service.rs
use std::sync::Arc;

use serde::Serialize;

use crate::{
    config::MarketSettings, models::jobmodel::Job,
    service::notification_service::NotificationService,
};

#[derive(Debug, Default, Clone, Serialize)]
pub struct BroadcastReport {
    pub delivered: Vec<String>,
    pub failed: Vec<(String, String)>,
}

impl BroadcastReport {
    pub fn attempted(&self) -> usize {
        self.delivered.len() + self.failed.len()
    }
}

/// Fans a job offer out to matched providers in bounded batches. Providers
/// are already routed to the job when it was scheduled.
#[derive(Clone)]
pub struct BroadcastService {
    notification_service: Arc<NotificationService>,
    settings: MarketSettings,
}

impl BroadcastService {
    pub fn new(notification_service: Arc<NotificationService>, settings: MarketSettings) -> Self {
        Self {
            notification_service,
            settings,
        }
    }

    /// Sends the offer batch by batch. Per-recipient failures are captured in
    /// the report and never abort the remaining sends.
    pub async fn dispatch(&self, job: &Job, providers: &[String]) -> BroadcastReport {
        let mut report = BroadcastReport::default();
        if providers.is_empty() {
            return report;
        }

        let offer = self.notification_service.job_offer(job);
        let sender = self.notification_service.sender();
        let batch_size = self.settings.broadcast_batch_size.max(1);

        for (index, batch) in providers.chunks(batch_size).enumerate() {
            if index > 0 && !self.settings.broadcast_pause.is_zero() {
                tokio::time::sleep(self.settings.broadcast_pause).await;
            }

            let results = futures::future::join_all(batch.iter().map(|phone| {
                let sender = sender.clone();
                let offer = &offer;
                async move { (phone.clone(), sender.send(phone, offer).await) }
            }))
            .await;

            for (phone, result) in results {
                match result {
                    Ok(()) => report.delivered.push(phone),
                    Err(e) => {
                        tracing::warn!("Job offer {} not delivered to {}: {}", job.id, phone, e);
                        report.failed.push((phone, e.to_string()));
                    }
                }
            }
        }

        tracing::info!(
            "Broadcast job {} to {} providers ({} delivered, {} failed)",
            job.id,
            report.attempted(),
            report.delivered.len(),
            report.failed.len()
        );

        report
    }
}
