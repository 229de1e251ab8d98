// db/memorydb.rs
//
// In-process store with the same contract as the Postgres functions. Each
// operation runs under one lock, standing in for the per-job row lock.
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use sqlx::{types::BigDecimal, Error};
use uuid::Uuid;

use super::{auditdb::AuditExt, biddb::BidExt, jobdb::JobExt, profiledb::ProfileExt};
use crate::models::{jobmodel::*, profilemodel::*};
use crate::utils::area::area_matches;

#[derive(Debug, Clone)]
struct StoredBid {
    id: Uuid,
    job_id: Uuid,
    provider_phone: String,
    price: BigDecimal,
    submitted_at: DateTime<Utc>,
    seq: u64,
}

#[derive(Default)]
struct MemoryState {
    profiles: HashMap<String, Profile>,
    jobs: HashMap<Uuid, Job>,
    bids: Vec<StoredBid>,
    audit: Vec<(DateTime<Utc>, AuditEvent)>,
    next_seq: u64,
    unavailable: bool,
    failing_jobs: HashSet<Uuid>,
    failing_bid_reads: HashSet<Uuid>,
    failing_area_search: bool,
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call fails as if the database were down.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.lock().unwrap().unavailable = unavailable;
    }

    /// Calls touching `job_id` through the bid ledger fail.
    pub fn fail_job(&self, job_id: Uuid) {
        self.state.lock().unwrap().failing_jobs.insert(job_id);
    }

    /// Bid list reads for `job_id` fail while `failing` is set.
    pub fn fail_bid_reads(&self, job_id: Uuid, failing: bool) {
        let mut state = self.state.lock().unwrap();
        if failing {
            state.failing_bid_reads.insert(job_id);
        } else {
            state.failing_bid_reads.remove(&job_id);
        }
    }

    /// Provider area searches fail while set.
    pub fn fail_area_search(&self, failing: bool) {
        self.state.lock().unwrap().failing_area_search = failing;
    }

    pub fn insert_profile(&self, profile: Profile) {
        self.state
            .lock()
            .unwrap()
            .profiles
            .insert(profile.phone_number.clone(), profile);
    }

    pub fn profile(&self, phone: &str) -> Option<Profile> {
        self.state.lock().unwrap().profiles.get(phone).cloned()
    }

    pub fn job(&self, job_id: Uuid) -> Option<Job> {
        self.state.lock().unwrap().jobs.get(&job_id).cloned()
    }

    pub fn jobs_for_client(&self, phone: &str) -> Vec<Job> {
        self.state
            .lock()
            .unwrap()
            .jobs
            .values()
            .filter(|job| job.client_phone == phone)
            .cloned()
            .collect()
    }

    pub fn bid_count(&self, job_id: Uuid) -> usize {
        self.state
            .lock()
            .unwrap()
            .bids
            .iter()
            .filter(|bid| bid.job_id == job_id)
            .count()
    }

    pub fn audit_events(&self) -> Vec<AuditEvent> {
        self.state
            .lock()
            .unwrap()
            .audit
            .iter()
            .map(|(_, event)| event.clone())
            .collect()
    }

    /// Shifts a job's timestamps into the past.
    pub fn age_job(&self, job_id: Uuid, by: Duration) {
        let mut state = self.state.lock().unwrap();
        if let Some(job) = state.jobs.get_mut(&job_id) {
            job.created_at -= by;
            job.updated_at -= by;
            job.broadcast_at = job.broadcast_at.map(|t| t - by);
            job.bid_deadline = job.bid_deadline.map(|t| t - by);
        }
    }

    pub fn age_audit(&self, by: Duration) {
        let mut state = self.state.lock().unwrap();
        for (at, _) in state.audit.iter_mut() {
            *at -= by;
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, MemoryState>, Error> {
        let state = self.state.lock().unwrap();
        if state.unavailable {
            return Err(Error::PoolTimedOut);
        }
        Ok(state)
    }
}

pub fn blank_profile(phone: &str, role: Role) -> Profile {
    let now = Utc::now();
    Profile {
        phone_number: phone.to_string(),
        role,
        full_name: None,
        service_areas: None,
        hourly_rate: None,
        travel_fee: None,
        bio: None,
        conversation_stage: ConversationStage::AwaitingName,
        active_job_id: None,
        created_at: now,
        updated_at: now,
    }
}

fn bid_count_for(state: &MemoryState, job_id: Uuid) -> i64 {
    state.bids.iter().filter(|bid| bid.job_id == job_id).count() as i64
}

fn release(state: &mut MemoryState, job_id: Uuid) {
    for profile in state.profiles.values_mut() {
        if profile.active_job_id == Some(job_id) {
            profile.active_job_id = None;
        }
    }
}

#[async_trait]
impl ProfileExt for MemoryStore {
    async fn get_profile(&self, phone: &str) -> Result<Option<Profile>, Error> {
        Ok(self.lock()?.profiles.get(phone).cloned())
    }

    async fn create_profile(&self, phone: &str, role: Role) -> Result<Profile, Error> {
        let mut state = self.lock()?;
        Ok(state
            .profiles
            .entry(phone.to_string())
            .or_insert_with(|| blank_profile(phone, role))
            .clone())
    }

    async fn apply_profile_update(
        &self,
        phone: &str,
        expected: ConversationStage,
        update: &ProfileUpdate,
        next: ConversationStage,
    ) -> Result<Option<Profile>, Error> {
        let mut state = self.lock()?;
        let Some(profile) = state.profiles.get_mut(phone) else {
            return Ok(None);
        };
        if profile.conversation_stage != expected {
            return Ok(None);
        }

        let unset = match update {
            ProfileUpdate::Name(_) => profile.full_name.is_none(),
            ProfileUpdate::Areas(_) => true,
            ProfileUpdate::HourlyRate(_) => profile.hourly_rate.is_none(),
            ProfileUpdate::TravelFee(_) => profile.travel_fee.is_none(),
            ProfileUpdate::Bio(_) => profile.bio.is_none(),
        };
        if !unset {
            return Ok(None);
        }

        match update {
            ProfileUpdate::Name(v) => profile.full_name = Some(v.clone()),
            ProfileUpdate::Areas(v) => profile.service_areas = Some(v.clone()),
            ProfileUpdate::HourlyRate(v) => profile.hourly_rate = Some(v.clone()),
            ProfileUpdate::TravelFee(v) => profile.travel_fee = Some(v.clone()),
            ProfileUpdate::Bio(v) => profile.bio = Some(v.clone()),
        }
        profile.conversation_stage = next;
        profile.updated_at = Utc::now();
        Ok(Some(profile.clone()))
    }

    async fn set_conversation_stage(
        &self,
        phone: &str,
        stage: ConversationStage,
    ) -> Result<(), Error> {
        if let Some(profile) = self.lock()?.profiles.get_mut(phone) {
            profile.conversation_stage = stage;
        }
        Ok(())
    }

    async fn find_providers_for_area(&self, area: &str) -> Result<Vec<Profile>, Error> {
        let state = self.lock()?;
        if state.failing_area_search {
            return Err(Error::PoolTimedOut);
        }
        let mut providers: Vec<Profile> = state
            .profiles
            .values()
            .filter(|p| p.role == Role::Provider && !p.conversation_stage.is_registration())
            .filter(|p| {
                p.service_areas
                    .as_deref()
                    .map(|areas| area_matches(area, areas))
                    .unwrap_or(false)
            })
            .cloned()
            .collect();
        providers.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.phone_number.cmp(&b.phone_number)));
        Ok(providers)
    }
}

#[async_trait]
impl JobExt for MemoryStore {
    async fn create_draft_job(&self, client_phone: &str, area: &str) -> Result<Option<Job>, Error> {
        let mut state = self.lock()?;
        let live = state
            .jobs
            .values()
            .any(|job| job.client_phone == client_phone && !job.status.is_terminal());
        if live {
            return Ok(None);
        }

        let now = Utc::now();
        let job = Job {
            id: Uuid::new_v4(),
            client_phone: client_phone.to_string(),
            area: area.to_string(),
            scheduled_date: None,
            scheduled_time: None,
            status: JobStatus::Draft,
            broadcast_at: None,
            bid_deadline: None,
            winning_bid_id: None,
            rating: None,
            created_at: now,
            updated_at: now,
        };
        state.jobs.insert(job.id, job.clone());
        Ok(Some(job))
    }

    async fn get_job_by_id(&self, job_id: Uuid) -> Result<Option<Job>, Error> {
        Ok(self.lock()?.jobs.get(&job_id).cloned())
    }

    async fn get_active_job_for_client(&self, client_phone: &str) -> Result<Option<Job>, Error> {
        Ok(self
            .lock()?
            .jobs
            .values()
            .filter(|job| job.client_phone == client_phone && !job.status.is_terminal())
            .max_by_key(|job| job.created_at)
            .cloned())
    }

    async fn set_job_date(&self, job_id: Uuid, date: NaiveDate) -> Result<Option<Job>, Error> {
        let mut state = self.lock()?;
        Ok(state
            .jobs
            .get_mut(&job_id)
            .filter(|job| job.status == JobStatus::Draft)
            .map(|job| {
                job.scheduled_date = Some(date);
                job.updated_at = Utc::now();
                job.clone()
            }))
    }

    async fn schedule_job(
        &self,
        job_id: Uuid,
        date: NaiveDate,
        time: NaiveTime,
        providers: &[String],
    ) -> Result<Option<Job>, Error> {
        let mut state = self.lock()?;
        let Some(job) = state
            .jobs
            .get_mut(&job_id)
            .filter(|job| job.status == JobStatus::Draft)
        else {
            return Ok(None);
        };

        let now = Utc::now();
        job.scheduled_date = Some(date);
        job.scheduled_time = Some(time);
        job.status = JobStatus::Pending;
        job.broadcast_at = Some(now);
        job.updated_at = now;
        let job = job.clone();

        for phone in providers {
            if let Some(profile) = state.profiles.get_mut(phone) {
                if profile.role == Role::Provider {
                    profile.active_job_id = Some(job.id);
                }
            }
        }
        if let Some(client) = state.profiles.get_mut(&job.client_phone) {
            client.conversation_stage = ConversationStage::Ready;
        }

        Ok(Some(job))
    }

    async fn cancel_draft_job(&self, client_phone: &str) -> Result<Option<Job>, Error> {
        let mut state = self.lock()?;
        Ok(state
            .jobs
            .values_mut()
            .find(|job| job.client_phone == client_phone && job.status == JobStatus::Draft)
            .map(|job| {
                job.status = JobStatus::Cancelled;
                job.updated_at = Utc::now();
                job.clone()
            }))
    }

    async fn get_expired_auctions(
        &self,
        now: DateTime<Utc>,
        unanswered_before: DateTime<Utc>,
    ) -> Result<Vec<Job>, Error> {
        let state = self.lock()?;
        let mut due: Vec<Job> = state
            .jobs
            .values()
            .filter(|job| match job.status {
                JobStatus::CollectingBids => job.bid_deadline.map(|d| d <= now).unwrap_or(false),
                JobStatus::Pending => job
                    .broadcast_at
                    .map(|b| b <= unanswered_before)
                    .unwrap_or(false),
                _ => false,
            })
            .cloned()
            .collect();
        due.sort_by_key(|job| job.bid_deadline.or(job.broadcast_at));
        Ok(due)
    }

    async fn get_confirmed_job_for_provider(
        &self,
        provider_phone: &str,
    ) -> Result<Option<Job>, Error> {
        let state = self.lock()?;
        Ok(state
            .jobs
            .values()
            .filter(|job| job.status == JobStatus::Confirmed)
            .find(|job| {
                state.bids.iter().any(|bid| {
                    Some(bid.id) == job.winning_bid_id && bid.provider_phone == provider_phone
                })
            })
            .cloned())
    }

    async fn complete_job(&self, job_id: Uuid, provider_phone: &str) -> Result<Option<Job>, Error> {
        let mut state = self.lock()?;
        let winner = state
            .jobs
            .get(&job_id)
            .and_then(|job| job.winning_bid_id)
            .and_then(|bid_id| state.bids.iter().find(|bid| bid.id == bid_id))
            .map(|bid| bid.provider_phone.clone());

        if winner.as_deref() != Some(provider_phone) {
            return Ok(None);
        }

        Ok(state
            .jobs
            .get_mut(&job_id)
            .filter(|job| job.status == JobStatus::Confirmed)
            .map(|job| {
                job.status = JobStatus::Completed;
                job.updated_at = Utc::now();
                job.clone()
            }))
    }

    async fn rate_latest_job(&self, client_phone: &str, rating: i16) -> Result<Option<Job>, Error> {
        let mut state = self.lock()?;
        Ok(state
            .jobs
            .values_mut()
            .filter(|job| {
                job.client_phone == client_phone
                    && job.status == JobStatus::Completed
                    && job.rating.is_none()
            })
            .max_by_key(|job| job.updated_at)
            .map(|job| {
                job.rating = Some(rating);
                job.clone()
            }))
    }

    async fn purge_stale_drafts(&self, older_than: DateTime<Utc>) -> Result<u64, Error> {
        let mut state = self.lock()?;
        let before = state.jobs.len();
        state
            .jobs
            .retain(|_, job| !(job.status == JobStatus::Draft && job.updated_at < older_than));
        Ok((before - state.jobs.len()) as u64)
    }
}

#[async_trait]
impl BidExt for MemoryStore {
    async fn submit_bid(
        &self,
        job_id: Uuid,
        provider_phone: &str,
        price: &BigDecimal,
        wait_secs: i64,
        bids_limit: i64,
    ) -> Result<BidSubmission, Error> {
        let mut state = self.lock()?;
        if state.failing_jobs.contains(&job_id) {
            return Err(Error::PoolTimedOut);
        }

        let Some(status) = state.jobs.get(&job_id).map(|job| job.status) else {
            return Ok(BidSubmission { accepted: false, bid_count: 0, job_status: None });
        };

        if !status.accepts_bids() {
            return Ok(BidSubmission {
                accepted: false,
                bid_count: bid_count_for(&state, job_id),
                job_status: Some(status),
            });
        }

        let duplicate = state
            .bids
            .iter()
            .any(|bid| bid.job_id == job_id && bid.provider_phone == provider_phone);
        if duplicate {
            return Ok(BidSubmission {
                accepted: false,
                bid_count: bid_count_for(&state, job_id),
                job_status: Some(status),
            });
        }

        let now = Utc::now();
        state.next_seq += 1;
        let seq = state.next_seq;
        state.bids.push(StoredBid {
            id: Uuid::new_v4(),
            job_id,
            provider_phone: provider_phone.to_string(),
            price: price.clone(),
            submitted_at: now,
            seq,
        });

        let bid_count = bid_count_for(&state, job_id);
        let next = if bid_count >= bids_limit {
            JobStatus::AwaitingSelection
        } else {
            JobStatus::CollectingBids
        };

        let job = state.jobs.get_mut(&job_id).ok_or(Error::RowNotFound)?;
        job.status = next;
        if job.bid_deadline.is_none() {
            job.bid_deadline = Some(now + Duration::seconds(wait_secs));
        }
        job.updated_at = now;

        Ok(BidSubmission {
            accepted: true,
            bid_count,
            job_status: Some(next),
        })
    }

    async fn close_auction(&self, job_id: Uuid) -> Result<AuctionClosing, Error> {
        let mut state = self.lock()?;
        if state.failing_jobs.contains(&job_id) {
            return Err(Error::PoolTimedOut);
        }

        let count = bid_count_for(&state, job_id);
        let Some(status) = state.jobs.get(&job_id).map(|job| job.status) else {
            return Ok(AuctionClosing { closed: false, bid_count: count, job_status: None });
        };

        if !status.accepts_bids() {
            return Ok(AuctionClosing { closed: false, bid_count: count, job_status: Some(status) });
        }

        let next = if count == 0 {
            release(&mut state, job_id);
            JobStatus::Cancelled
        } else {
            JobStatus::AwaitingSelection
        };

        if let Some(job) = state.jobs.get_mut(&job_id) {
            job.status = next;
            job.updated_at = Utc::now();
        }

        Ok(AuctionClosing { closed: true, bid_count: count, job_status: Some(next) })
    }

    async fn get_bids_for_job(&self, job_id: Uuid) -> Result<Vec<BidView>, Error> {
        let state = self.lock()?;
        if state.failing_bid_reads.contains(&job_id) {
            return Err(Error::PoolTimedOut);
        }
        let mut bids: Vec<&StoredBid> = state.bids.iter().filter(|bid| bid.job_id == job_id).collect();
        bids.sort_by_key(|bid| bid.seq);

        Ok(bids
            .into_iter()
            .map(|bid| {
                let provider = state.profiles.get(&bid.provider_phone);
                BidView {
                    id: bid.id,
                    job_id: bid.job_id,
                    provider_phone: bid.provider_phone.clone(),
                    price: bid.price.clone(),
                    submitted_at: bid.submitted_at,
                    provider_name: provider.and_then(|p| p.full_name.clone()),
                    provider_bio: provider.and_then(|p| p.bio.clone()),
                }
            })
            .collect())
    }

    async fn select_winner(
        &self,
        job_id: Uuid,
        bid_id: Uuid,
        client_phone: &str,
    ) -> Result<bool, Error> {
        let mut state = self.lock()?;
        let bid_belongs = state.bids.iter().any(|bid| bid.id == bid_id && bid.job_id == job_id);

        let Some(job) = state.jobs.get_mut(&job_id) else {
            return Ok(false);
        };
        if job.status != JobStatus::AwaitingSelection || job.client_phone != client_phone || !bid_belongs {
            return Ok(false);
        }

        job.status = JobStatus::Confirmed;
        job.winning_bid_id = Some(bid_id);
        job.updated_at = Utc::now();
        release(&mut state, job_id);
        Ok(true)
    }
}

#[async_trait]
impl AuditExt for MemoryStore {
    async fn record_audit_event(&self, event: &AuditEvent) -> Result<(), Error> {
        self.lock()?.audit.push((Utc::now(), event.clone()));
        Ok(())
    }

    async fn purge_audit_logs(&self, older_than: DateTime<Utc>) -> Result<u64, Error> {
        let mut state = self.lock()?;
        let before = state.audit.len();
        state.audit.retain(|(at, _)| *at >= older_than);
        Ok((before - state.audit.len()) as u64)
    }
}
