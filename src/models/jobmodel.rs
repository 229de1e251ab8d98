use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::BigDecimal;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "job_status", rename_all = "snake_case")]
pub enum JobStatus {
    Draft,
    Pending,
    CollectingBids,
    AwaitingSelection,
    Confirmed,
    Completed,
    Cancelled,
}

impl JobStatus {
    pub fn to_str(&self) -> &str {
        match self {
            JobStatus::Draft => "draft",
            JobStatus::Pending => "pending",
            JobStatus::CollectingBids => "collecting_bids",
            JobStatus::AwaitingSelection => "awaiting_selection",
            JobStatus::Confirmed => "confirmed",
            JobStatus::Completed => "completed",
            JobStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Cancelled)
    }

    pub fn accepts_bids(&self) -> bool {
        matches!(self, JobStatus::Pending | JobStatus::CollectingBids)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Job {
    pub id: Uuid,
    pub client_phone: String,
    pub area: String,
    pub scheduled_date: Option<NaiveDate>,
    pub scheduled_time: Option<NaiveTime>,
    pub status: JobStatus,
    pub broadcast_at: Option<DateTime<Utc>>,
    pub bid_deadline: Option<DateTime<Utc>>,
    pub winning_bid_id: Option<Uuid>,
    pub rating: Option<i16>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    pub fn schedule_label(&self) -> (String, String) {
        let date = self
            .scheduled_date
            .map(|d| d.format("%d/%m/%Y").to_string())
            .unwrap_or_default();
        let time = self
            .scheduled_time
            .map(|t| t.format("%H:%M").to_string())
            .unwrap_or_default();
        (date, time)
    }
}

/// Bid joined with the bidding provider's public fields, as shown to the client.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct BidView {
    pub id: Uuid,
    pub job_id: Uuid,
    pub provider_phone: String,
    pub price: BigDecimal,
    pub submitted_at: DateTime<Utc>,
    pub provider_name: Option<String>,
    pub provider_bio: Option<String>,
}

/// Result of the atomic `submit_bid` store operation.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BidSubmission {
    pub accepted: bool,
    pub bid_count: i64,
    pub job_status: Option<JobStatus>,
}

/// Result of the atomic `close_auction` store operation. `closed` is true only
/// for the call that performed the transition.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AuctionClosing {
    pub closed: bool,
    pub bid_count: i64,
    pub job_status: Option<JobStatus>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    pub event_type: String,
    pub job_id: Option<Uuid>,
    pub actor_phone: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub description: String,
}
