// service/audit_service.rs
use std::sync::Arc;

use sqlx::types::BigDecimal;
use uuid::Uuid;

use crate::{
    db::db::MarketStore,
    models::jobmodel::{AuditEvent, Job},
};

#[derive(Clone)]
pub struct AuditService {
    store: Arc<dyn MarketStore>,
}

impl AuditService {
    pub fn new(store: Arc<dyn MarketStore>) -> Self {
        Self { store }
    }

    pub async fn log_job_creation(&self, job: &Job) {
        self.log_audit_event(
            "job_creation",
            Some(job.id),
            Some(&job.client_phone),
            Some(serde_json::json!({ "area": job.area })),
            "Draft job created",
        )
        .await
    }

    pub async fn log_job_broadcast(&self, job: &Job, delivered: usize, failed: usize) {
        self.log_audit_event(
            "job_broadcast",
            Some(job.id),
            Some(&job.client_phone),
            Some(serde_json::json!({
                "scheduled_date": job.scheduled_date,
                "scheduled_time": job.scheduled_time,
                "delivered": delivered,
                "failed": failed,
            })),
            "Job scheduled and offered to providers",
        )
        .await
    }

    pub async fn log_bid(&self, job_id: Uuid, provider_phone: &str, price: &BigDecimal, bid_count: i64) {
        self.log_audit_event(
            "bid_submitted",
            Some(job_id),
            Some(provider_phone),
            Some(serde_json::json!({ "price": price.to_string(), "bid_count": bid_count })),
            "Bid accepted",
        )
        .await
    }

    pub async fn log_auction_closed(&self, job_id: Uuid, bid_count: i64, outcome: &str) {
        self.log_audit_event(
            "auction_closed",
            Some(job_id),
            None,
            Some(serde_json::json!({ "bid_count": bid_count, "outcome": outcome })),
            "Bidding closed",
        )
        .await
    }

    pub async fn log_winner_selected(&self, job: &Job, bid_id: Uuid, provider_phone: &str) {
        self.log_audit_event(
            "winner_selected",
            Some(job.id),
            Some(&job.client_phone),
            Some(serde_json::json!({ "bid_id": bid_id, "provider": provider_phone })),
            "Client confirmed a provider",
        )
        .await
    }

    pub async fn log_job_completed(&self, job: &Job, provider_phone: &str) {
        self.log_audit_event(
            "job_completed",
            Some(job.id),
            Some(provider_phone),
            None,
            "Provider marked the job completed",
        )
        .await
    }

    async fn log_audit_event(
        &self,
        event_type: &str,
        job_id: Option<Uuid>,
        actor_phone: Option<&str>,
        metadata: Option<serde_json::Value>,
        description: &str,
    ) {
        let event = AuditEvent {
            event_type: event_type.to_string(),
            job_id,
            actor_phone: actor_phone.map(str::to_string),
            metadata,
            description: description.to_string(),
        };

        if let Err(e) = self.store.record_audit_event(&event).await {
            tracing::warn!("Failed to record audit event {}: {}", event_type, e);
        }
    }
}
