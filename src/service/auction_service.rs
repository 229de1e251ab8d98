// service/auction_service.rs
use std::sync::Arc;

use chrono::NaiveDate;
use sqlx::types::BigDecimal;
use uuid::Uuid;

use crate::{
    config::MarketSettings,
    db::db::MarketStore,
    models::{
        jobmodel::{BidView, Job, JobStatus},
        profilemodel::ConversationStage,
    },
    service::{
        audit_service::AuditService,
        broadcast_service::{BroadcastReport, BroadcastService},
        error::ServiceError,
        notification_service::NotificationService,
        prompts,
    },
    utils::input::{parse_price, parse_time},
};

#[derive(Debug)]
pub enum ScheduleOutcome {
    Broadcast { job: Job, report: BroadcastReport },
    NoProviders { job: Job },
}

#[derive(Debug)]
pub enum CloseOutcome {
    /// Another caller already moved the job out of bidding.
    AlreadyClosed,
    Cancelled,
    AwaitingSelection { bids: Vec<BidView> },
}

#[derive(Debug)]
pub struct BidOutcome {
    pub price: BigDecimal,
    pub bid_count: i64,
    /// Set when this bid reached the limit and closed the auction.
    pub closed: Option<CloseOutcome>,
}

#[derive(Debug)]
pub enum SelectionOutcome {
    Confirmed { job: Job, winner: BidView },
    /// Job not awaiting selection, not owned by the caller, or already decided.
    Ignored,
}

/// Owns every job-status transition. Status-critical writes go through the
/// store's atomic operations only; reads here drive messaging, never decisions.
#[derive(Clone)]
pub struct AuctionService {
    store: Arc<dyn MarketStore>,
    notification_service: Arc<NotificationService>,
    broadcast_service: Arc<BroadcastService>,
    audit_service: Arc<AuditService>,
    settings: MarketSettings,
}

impl AuctionService {
    pub fn new(
        store: Arc<dyn MarketStore>,
        notification_service: Arc<NotificationService>,
        broadcast_service: Arc<BroadcastService>,
        audit_service: Arc<AuditService>,
        settings: MarketSettings,
    ) -> Self {
        Self {
            store,
            notification_service,
            broadcast_service,
            audit_service,
            settings,
        }
    }

    pub async fn start_job(&self, client_phone: &str, area: &str) -> Result<Job, ServiceError> {
        let job = self
            .store
            .create_draft_job(client_phone, area)
            .await?
            .ok_or_else(|| {
                ServiceError::Conflict("Client already has an active job".to_string())
            })?;

        tracing::info!("Draft job {} created for {} in {}", job.id, client_phone, area);
        self.audit_service.log_job_creation(&job).await;
        Ok(job)
    }

    pub async fn set_job_date(&self, job_id: Uuid, date: NaiveDate) -> Result<Job, ServiceError> {
        self.store
            .set_job_date(job_id, date)
            .await?
            .ok_or(ServiceError::ClosedAuction(job_id))
    }

    /// Captures the time, moves `draft -> pending` and broadcasts. Scheduling,
    /// provider routing and the client's return to the menu commit together,
    /// so a store failure leaves the draft untouched for a resend. The client
    /// is acknowledged only after the dispatch attempt has finished.
    pub async fn attach_schedule(
        &self,
        job_id: Uuid,
        date: NaiveDate,
        raw_time: &str,
    ) -> Result<ScheduleOutcome, ServiceError> {
        let time = parse_time(raw_time).map_err(ServiceError::Validation)?;

        let draft = self
            .store
            .get_job_by_id(job_id)
            .await?
            .filter(|job| job.status == JobStatus::Draft)
            .ok_or(ServiceError::ClosedAuction(job_id))?;

        let providers: Vec<String> = self
            .store
            .find_providers_for_area(&draft.area)
            .await?
            .into_iter()
            .map(|profile| profile.phone_number)
            .filter(|phone| phone != &draft.client_phone)
            .collect();

        let job = self
            .store
            .schedule_job(job_id, date, time, &providers)
            .await?
            .ok_or(ServiceError::ClosedAuction(job_id))?;

        if providers.is_empty() {
            tracing::info!("Job {} has no providers in {}", job.id, job.area);
            self.notification_service
                .reply(&job.client_phone, prompts::no_providers_in_area(&job.area))
                .await;
            self.audit_service.log_job_broadcast(&job, 0, 0).await;
            return Ok(ScheduleOutcome::NoProviders { job });
        }

        let report = self.broadcast_service.dispatch(&job, &providers).await;

        self.notification_service
            .reply(
                &job.client_phone,
                prompts::request_received(report.delivered.len()),
            )
            .await;
        self.audit_service
            .log_job_broadcast(&job, report.delivered.len(), report.failed.len())
            .await;

        Ok(ScheduleOutcome::Broadcast { job, report })
    }

    pub async fn submit_bid(
        &self,
        job_id: Uuid,
        provider_phone: &str,
        raw_price: &str,
    ) -> Result<BidOutcome, ServiceError> {
        let price = parse_price(raw_price).map_err(ServiceError::Validation)?;
        let wait_secs = self.settings.auction_wait.as_secs() as i64;

        let submission = self
            .store
            .submit_bid(
                job_id,
                provider_phone,
                &price,
                wait_secs,
                self.settings.bids_limit,
            )
            .await?;

        if !submission.accepted {
            return Err(match submission.job_status {
                None => ServiceError::JobNotFound(job_id),
                Some(status) if !status.accepts_bids() => ServiceError::ClosedAuction(job_id),
                Some(_) => ServiceError::Conflict(format!(
                    "Provider {} already bid on job {}",
                    provider_phone, job_id
                )),
            });
        }

        tracing::info!(
            "Bid {} from {} accepted for job {} ({} so far)",
            price,
            provider_phone,
            job_id,
            submission.bid_count
        );
        self.audit_service
            .log_bid(job_id, provider_phone, &price, submission.bid_count)
            .await;

        let closed = match submission.job_status {
            Some(JobStatus::AwaitingSelection) => {
                tracing::info!("Job {} reached the bid limit, closed early", job_id);
                Some(
                    self.announce_closing(job_id, JobStatus::AwaitingSelection, submission.bid_count)
                        .await?,
                )
            }
            _ => None,
        };

        Ok(BidOutcome {
            price,
            bid_count: submission.bid_count,
            closed,
        })
    }

    /// Idempotent: only the caller that performs the transition notifies.
    pub async fn close_auction(&self, job_id: Uuid) -> Result<CloseOutcome, ServiceError> {
        let closing = self.store.close_auction(job_id).await?;

        if !closing.closed {
            tracing::debug!(
                "Job {} already closed ({:?})",
                job_id,
                closing.job_status.map(|s| s.to_str().to_string())
            );
            return Ok(CloseOutcome::AlreadyClosed);
        }

        let status = closing.job_status.unwrap_or(JobStatus::Cancelled);
        self.announce_closing(job_id, status, closing.bid_count).await
    }

    /// Notifies the parties of a transition the store already committed. If
    /// this fails the client recovers the bid list on their next message.
    async fn announce_closing(
        &self,
        job_id: Uuid,
        status: JobStatus,
        bid_count: i64,
    ) -> Result<CloseOutcome, ServiceError> {
        let job = self
            .store
            .get_job_by_id(job_id)
            .await?
            .ok_or(ServiceError::JobNotFound(job_id))?;

        match status {
            JobStatus::Cancelled => {
                self.notification_service.notify_no_bids(&job).await;
                self.audit_service
                    .log_auction_closed(job_id, 0, JobStatus::Cancelled.to_str())
                    .await;
                Ok(CloseOutcome::Cancelled)
            }
            _ => {
                let bids = self.store.get_bids_for_job(job_id).await?;
                self.store
                    .set_conversation_stage(&job.client_phone, ConversationStage::AwaitingSelection)
                    .await?;
                self.notification_service.notify_bids_ready(&job, &bids).await;
                self.audit_service
                    .log_auction_closed(job_id, bid_count, JobStatus::AwaitingSelection.to_str())
                    .await;
                Ok(CloseOutcome::AwaitingSelection { bids })
            }
        }
    }

    /// Re-sends the enumerated bid list for a job awaiting selection.
    pub async fn present_bids(&self, job_id: Uuid) -> Result<Vec<BidView>, ServiceError> {
        let job = self
            .store
            .get_job_by_id(job_id)
            .await?
            .ok_or(ServiceError::JobNotFound(job_id))?;
        let bids = self.store.get_bids_for_job(job_id).await?;
        self.notification_service.notify_bids_ready(&job, &bids).await;
        Ok(bids)
    }

    pub async fn select_winner(
        &self,
        job_id: Uuid,
        client_phone: &str,
        ordinal: usize,
    ) -> Result<SelectionOutcome, ServiceError> {
        let Some(job) = self.store.get_job_by_id(job_id).await? else {
            return Ok(SelectionOutcome::Ignored);
        };
        if job.status != JobStatus::AwaitingSelection || job.client_phone != client_phone {
            tracing::debug!("Selection on job {} by {} ignored", job_id, client_phone);
            return Ok(SelectionOutcome::Ignored);
        }

        let bids = self.store.get_bids_for_job(job_id).await?;
        if ordinal == 0 || ordinal > bids.len() {
            return Err(ServiceError::Validation(format!(
                "Selection must be between 1 and {}",
                bids.len()
            )));
        }
        let winner = bids[ordinal - 1].clone();

        if !self.store.select_winner(job_id, winner.id, client_phone).await? {
            tracing::info!("Job {} was decided concurrently, selection ignored", job_id);
            return Ok(SelectionOutcome::Ignored);
        }

        tracing::info!(
            "Job {} confirmed with provider {} at {}",
            job_id,
            winner.provider_phone,
            winner.price
        );

        self.store
            .set_conversation_stage(client_phone, ConversationStage::Ready)
            .await?;

        let job = self
            .store
            .get_job_by_id(job_id)
            .await?
            .ok_or(ServiceError::JobNotFound(job_id))?;

        match self.store.get_profile(client_phone).await? {
            Some(client) => {
                self.notification_service
                    .notify_contacts_exchanged(&job, &client, &winner)
                    .await;
            }
            None => tracing::warn!("Client profile {} missing for job {}", client_phone, job_id),
        }

        for bid in bids.iter().filter(|bid| bid.id != winner.id) {
            self.notification_service
                .notify_not_selected(&bid.provider_phone)
                .await;
        }

        self.audit_service
            .log_winner_selected(&job, winner.id, &winner.provider_phone)
            .await;

        Ok(SelectionOutcome::Confirmed { job, winner })
    }

    /// Only the winning provider may complete a confirmed job.
    pub async fn complete_job(&self, job_id: Uuid, provider_phone: &str) -> Result<Job, ServiceError> {
        let job = self
            .store
            .complete_job(job_id, provider_phone)
            .await?
            .ok_or_else(|| {
                ServiceError::Conflict(format!(
                    "{} cannot complete job {}",
                    provider_phone, job_id
                ))
            })?;

        tracing::info!("Job {} completed by {}", job.id, provider_phone);

        self.store
            .set_conversation_stage(&job.client_phone, ConversationStage::AwaitingRating)
            .await?;
        self.notification_service.notify_rating_request(&job).await;
        self.audit_service.log_job_completed(&job, provider_phone).await;

        Ok(job)
    }

    /// Completes the provider's confirmed job, if there is one.
    pub async fn complete_for_provider(&self, provider_phone: &str) -> Result<Option<Job>, ServiceError> {
        match self.store.get_confirmed_job_for_provider(provider_phone).await? {
            Some(job) => Ok(Some(self.complete_job(job.id, provider_phone).await?)),
            None => Ok(None),
        }
    }

    pub async fn rate_job(&self, client_phone: &str, rating: i16) -> Result<Option<Job>, ServiceError> {
        let job = self.store.rate_latest_job(client_phone, rating).await?;
        self.store
            .set_conversation_stage(client_phone, ConversationStage::Ready)
            .await?;
        if let Some(job) = &job {
            tracing::info!("Job {} rated {}", job.id, rating);
        }
        Ok(job)
    }

    /// Cancels the client's job only while it is still a draft.
    pub async fn reset_draft(&self, client_phone: &str) -> Result<Option<Job>, ServiceError> {
        let job = self.store.cancel_draft_job(client_phone).await?;
        self.store
            .set_conversation_stage(client_phone, ConversationStage::Ready)
            .await?;
        if let Some(job) = &job {
            tracing::info!("Draft job {} cancelled by {}", job.id, client_phone);
        }
        Ok(job)
    }
}
