// service/conversation_service.rs
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use crate::{
    db::db::MarketStore,
    models::{
        jobmodel::JobStatus,
        profilemodel::{ConversationStage, Profile, ProfileUpdate, Role},
    },
    service::{
        auction_service::{AuctionService, SelectionOutcome},
        error::ServiceError,
        notification_service::NotificationService,
        prompts,
    },
    utils::{
        area::{append_area, resolve_area},
        input::{
            bare_phone, matches_token, parse_date, parse_fee, parse_ordinal, parse_price,
            parse_rating, AREAS_DONE_TOKENS, BOOK_TOKENS, CLIENT_TOKENS, COMPLETE_TOKENS,
            PROVIDER_TOKENS, RESET_TOKENS,
        },
    },
};

/// What one inbound message asks for, decided from the persisted stage alone.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Welcome,
    Register(Role),
    Greet,
    Update {
        update: ProfileUpdate,
        next: ConversationStage,
        added_area: Option<&'static str>,
    },
    Reprompt,
    AreasRequired,
    StartJob,
    ResetDraft,
    JobDate(NaiveDate),
    JobTime(String),
    Bid { job_id: Uuid, price: String },
    NoOffer,
    Complete,
    Select(usize),
    Rate(i16),
}

pub fn plan(profile: Option<&Profile>, text: &str, today: NaiveDate) -> Step {
    let text = text.trim();

    let Some(profile) = profile else {
        return if matches_token(text, CLIENT_TOKENS) {
            Step::Register(Role::Client)
        } else if matches_token(text, PROVIDER_TOKENS) {
            Step::Register(Role::Provider)
        } else {
            Step::Welcome
        };
    };

    let stage = profile.conversation_stage;
    let role = profile.role;

    match stage {
        ConversationStage::AwaitingName => {
            if text.is_empty() {
                Step::Reprompt
            } else {
                Step::Update {
                    update: ProfileUpdate::Name(text.to_string()),
                    next: stage.next_for(role),
                    added_area: None,
                }
            }
        }
        ConversationStage::AwaitingArea => match role {
            Role::Client => match resolve_area(text) {
                Some(area) => Step::Update {
                    update: ProfileUpdate::Areas(area.to_string()),
                    next: stage.next_for(role),
                    added_area: Some(area),
                },
                None => Step::Reprompt,
            },
            Role::Provider => {
                if matches_token(text, AREAS_DONE_TOKENS) {
                    match profile.service_areas.as_deref() {
                        Some(areas) if !profile.areas().is_empty() => Step::Update {
                            update: ProfileUpdate::Areas(areas.to_string()),
                            next: stage.next_for(role),
                            added_area: None,
                        },
                        _ => Step::AreasRequired,
                    }
                } else {
                    match resolve_area(text) {
                        Some(area) => Step::Update {
                            update: ProfileUpdate::Areas(append_area(
                                profile.service_areas.as_deref(),
                                area,
                            )),
                            next: stage,
                            added_area: Some(area),
                        },
                        None => Step::Reprompt,
                    }
                }
            }
        },
        ConversationStage::AwaitingRate => match parse_price(text) {
            Ok(rate) => Step::Update {
                update: ProfileUpdate::HourlyRate(rate),
                next: stage.next_for(role),
                added_area: None,
            },
            Err(_) => Step::Reprompt,
        },
        ConversationStage::AwaitingFee => match parse_fee(text) {
            Ok(fee) => Step::Update {
                update: ProfileUpdate::TravelFee(fee),
                next: stage.next_for(role),
                added_area: None,
            },
            Err(_) => Step::Reprompt,
        },
        ConversationStage::AwaitingBio => {
            if text.is_empty() {
                Step::Reprompt
            } else {
                Step::Update {
                    update: ProfileUpdate::Bio(text.to_string()),
                    next: stage.next_for(role),
                    added_area: None,
                }
            }
        }
        ConversationStage::Ready => match role {
            Role::Client => {
                if matches_token(text, BOOK_TOKENS) {
                    Step::StartJob
                } else if matches_token(text, RESET_TOKENS) {
                    Step::ResetDraft
                } else if let Some(ordinal) = parse_ordinal(text) {
                    Step::Select(ordinal)
                } else {
                    Step::Greet
                }
            }
            Role::Provider => {
                if matches_token(text, COMPLETE_TOKENS) {
                    Step::Complete
                } else if let Some(job_id) = profile.active_job_id {
                    Step::Bid {
                        job_id,
                        price: text.to_string(),
                    }
                } else if parse_price(text).is_ok() {
                    Step::NoOffer
                } else {
                    Step::Greet
                }
            }
        },
        ConversationStage::BookingDate => {
            if matches_token(text, RESET_TOKENS) {
                Step::ResetDraft
            } else {
                match parse_date(text, today) {
                    Ok(date) => Step::JobDate(date),
                    Err(_) => Step::Reprompt,
                }
            }
        }
        ConversationStage::BookingTime => {
            if matches_token(text, RESET_TOKENS) {
                Step::ResetDraft
            } else {
                Step::JobTime(text.to_string())
            }
        }
        ConversationStage::AwaitingSelection => match parse_ordinal(text) {
            Some(ordinal) => Step::Select(ordinal),
            None => Step::Reprompt,
        },
        ConversationStage::AwaitingRating => match parse_rating(text) {
            Some(rating) => Step::Rate(rating),
            None => Step::Reprompt,
        },
    }
}

/// Drives both parties through registration and booking. Each inbound
/// message is planned from the persisted stage, then applied with a guarded
/// write so a redelivered message cannot apply twice.
#[derive(Clone)]
pub struct ConversationService {
    store: Arc<dyn MarketStore>,
    auction_service: Arc<AuctionService>,
    notification_service: Arc<NotificationService>,
}

impl ConversationService {
    pub fn new(
        store: Arc<dyn MarketStore>,
        auction_service: Arc<AuctionService>,
        notification_service: Arc<NotificationService>,
    ) -> Self {
        Self {
            store,
            auction_service,
            notification_service,
        }
    }

    /// Only `StoreUnavailable` escapes; every user-level error is answered here.
    pub async fn handle_inbound(&self, from: &str, body: &str) -> Result<(), ServiceError> {
        let phone = bare_phone(from);
        let profile = self.store.get_profile(&phone).await?;
        let step = plan(profile.as_ref(), body, Utc::now().date_naive());

        tracing::debug!(
            "Inbound from {} at stage {:?}: {:?}",
            phone,
            profile.as_ref().map(|p| p.conversation_stage.to_str().to_string()),
            step
        );

        let Some(profile) = profile else {
            return self.handle_unregistered(&phone, step).await;
        };

        match step {
            Step::Welcome | Step::Register(_) => Ok(()),
            Step::Greet => self.greet(&profile).await,
            Step::Update {
                update,
                next,
                added_area,
            } => self.apply_update(&profile, update, next, added_area).await,
            Step::Reprompt => self.reprompt(&profile).await,
            Step::AreasRequired => {
                self.reply(&phone, prompts::areas_required()).await;
                Ok(())
            }
            Step::StartJob => self.start_job(&profile).await,
            Step::ResetDraft => {
                let body = match self.auction_service.reset_draft(&phone).await? {
                    Some(_) => prompts::draft_cancelled(),
                    None => prompts::nothing_to_cancel(),
                };
                self.reply(&phone, format!("{}\n{}", body, prompts::main_menu(profile.role)))
                    .await;
                Ok(())
            }
            Step::JobDate(date) => self.capture_date(&profile, date).await,
            Step::JobTime(raw_time) => self.capture_time(&profile, &raw_time).await,
            Step::Bid { job_id, price } => self.bid(&phone, job_id, &price).await,
            Step::NoOffer => {
                self.reply(&phone, prompts::no_active_offer()).await;
                Ok(())
            }
            Step::Complete => {
                let body = match self.auction_service.complete_for_provider(&phone).await {
                    Ok(Some(_)) => prompts::completion_acknowledged(),
                    Ok(None) | Err(ServiceError::Conflict(_)) => prompts::no_confirmed_job(),
                    Err(e) => return Err(e),
                };
                self.reply(&phone, body).await;
                Ok(())
            }
            Step::Select(ordinal) => self.select(&profile, ordinal).await,
            Step::Rate(rating) => {
                self.auction_service.rate_job(&phone, rating).await?;
                self.reply(&phone, prompts::rating_thanks()).await;
                Ok(())
            }
        }
    }

    async fn handle_unregistered(&self, phone: &str, step: Step) -> Result<(), ServiceError> {
        match step {
            Step::Register(role) => {
                let profile = self.store.create_profile(phone, role).await?;
                tracing::info!("New {} profile for {}", role.to_str(), phone);
                self.reply(phone, prompts::stage_prompt(profile.conversation_stage, profile.role))
                    .await;
            }
            _ => {
                self.reply(phone, prompts::welcome()).await;
            }
        }
        Ok(())
    }

    async fn apply_update(
        &self,
        profile: &Profile,
        update: ProfileUpdate,
        next: ConversationStage,
        added_area: Option<&'static str>,
    ) -> Result<(), ServiceError> {
        let phone = &profile.phone_number;
        let applied = self
            .store
            .apply_profile_update(phone, profile.conversation_stage, &update, next)
            .await?;

        let Some(updated) = applied else {
            // Lost a race with another delivery; answer from the current stage.
            let current = self.store.get_profile(phone).await?;
            if let Some(current) = current {
                self.reply(
                    phone,
                    prompts::stage_prompt(current.conversation_stage, current.role),
                )
                .await;
            }
            return Ok(());
        };

        let body = match (added_area, updated.conversation_stage) {
            (Some(area), ConversationStage::AwaitingArea) => prompts::area_added(area),
            (_, ConversationStage::Ready) => prompts::registration_complete(updated.role),
            (_, stage) => prompts::stage_prompt(stage, updated.role),
        };

        if updated.conversation_stage == ConversationStage::Ready {
            tracing::info!("{} completed registration as {}", phone, updated.role.to_str());
        }
        self.reply(phone, body).await;
        Ok(())
    }

    async fn greet(&self, profile: &Profile) -> Result<(), ServiceError> {
        let phone = &profile.phone_number;
        if profile.role == Role::Client {
            // Bids whose announcement was lost after the auction closed.
            if let Some(job_id) = self.awaiting_selection_job(phone).await? {
                self.store
                    .set_conversation_stage(phone, ConversationStage::AwaitingSelection)
                    .await?;
                self.auction_service.present_bids(job_id).await?;
                return Ok(());
            }
        }
        self.reply(phone, prompts::greeting(profile)).await;
        Ok(())
    }

    async fn reprompt(&self, profile: &Profile) -> Result<(), ServiceError> {
        let phone = &profile.phone_number;

        if profile.conversation_stage == ConversationStage::AwaitingSelection {
            if let Some(job) = self.awaiting_selection_job(phone).await? {
                self.reply(phone, prompts::invalid_input()).await;
                self.auction_service.present_bids(job).await?;
                return Ok(());
            }
            return self.return_to_menu(profile).await;
        }

        self.reply(
            phone,
            format!(
                "{}\n{}",
                prompts::invalid_input(),
                prompts::stage_prompt(profile.conversation_stage, profile.role)
            ),
        )
        .await;
        Ok(())
    }

    async fn start_job(&self, profile: &Profile) -> Result<(), ServiceError> {
        let phone = &profile.phone_number;
        let Some(area) = profile.areas().first().map(|area| area.to_string()) else {
            self.store
                .set_conversation_stage(phone, ConversationStage::AwaitingArea)
                .await?;
            self.reply(phone, prompts::stage_prompt(ConversationStage::AwaitingArea, profile.role))
                .await;
            return Ok(());
        };

        match self.auction_service.start_job(phone, &area).await {
            Ok(_) => {
                self.store
                    .set_conversation_stage(phone, ConversationStage::BookingDate)
                    .await?;
                self.reply(
                    phone,
                    format!(
                        "{}\n{}",
                        prompts::booking_started(&area),
                        prompts::stage_prompt(ConversationStage::BookingDate, profile.role)
                    ),
                )
                .await;
                Ok(())
            }
            Err(ServiceError::Conflict(_)) => {
                self.reply(phone, prompts::active_job_exists()).await;
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn capture_date(&self, profile: &Profile, date: NaiveDate) -> Result<(), ServiceError> {
        let phone = &profile.phone_number;
        let Some(job) = self.draft_job(phone).await? else {
            return self.return_to_menu(profile).await;
        };

        match self.auction_service.set_job_date(job, date).await {
            Ok(_) => {
                self.store
                    .set_conversation_stage(phone, ConversationStage::BookingTime)
                    .await?;
                self.reply(
                    phone,
                    prompts::stage_prompt(ConversationStage::BookingTime, profile.role),
                )
                .await;
                Ok(())
            }
            Err(ServiceError::ClosedAuction(_)) => self.return_to_menu(profile).await,
            Err(e) => Err(e),
        }
    }

    async fn capture_time(&self, profile: &Profile, raw_time: &str) -> Result<(), ServiceError> {
        let phone = &profile.phone_number;
        let job = self
            .store
            .get_active_job_for_client(phone)
            .await?
            .filter(|job| job.status == JobStatus::Draft);

        let Some((job_id, date)) = job.and_then(|job| job.scheduled_date.map(|d| (job.id, d)))
        else {
            return self.return_to_menu(profile).await;
        };

        match self.auction_service.attach_schedule(job_id, date, raw_time).await {
            Ok(_) => Ok(()),
            Err(ServiceError::Validation(reason)) => {
                tracing::warn!("Rejected time {:?} from {}: {}", raw_time, phone, reason);
                self.reprompt(profile).await
            }
            Err(ServiceError::ClosedAuction(_)) => self.return_to_menu(profile).await,
            Err(e) => Err(e),
        }
    }

    async fn bid(&self, phone: &str, job_id: Uuid, raw_price: &str) -> Result<(), ServiceError> {
        let body = match self.auction_service.submit_bid(job_id, phone, raw_price).await {
            Ok(outcome) => prompts::bid_received(&outcome.price.to_string()),
            Err(ServiceError::Validation(reason)) => {
                let open = self
                    .store
                    .get_job_by_id(job_id)
                    .await?
                    .map(|job| job.status.accepts_bids())
                    .unwrap_or(false);
                if open {
                    tracing::warn!("Rejected bid {:?} from {}: {}", raw_price, phone, reason);
                    prompts::bid_invalid()
                } else {
                    prompts::auction_closed()
                }
            }
            Err(ServiceError::Conflict(_)) => prompts::bid_duplicate(),
            Err(ServiceError::ClosedAuction(_)) | Err(ServiceError::JobNotFound(_)) => {
                prompts::auction_closed()
            }
            Err(e) => return Err(e),
        };
        self.reply(phone, body).await;
        Ok(())
    }

    async fn select(&self, profile: &Profile, ordinal: usize) -> Result<(), ServiceError> {
        let phone = &profile.phone_number;
        let Some(job_id) = self.awaiting_selection_job(phone).await? else {
            return self.return_to_menu(profile).await;
        };

        match self.auction_service.select_winner(job_id, phone, ordinal).await {
            Ok(SelectionOutcome::Confirmed { .. }) => Ok(()),
            Ok(SelectionOutcome::Ignored) => self.return_to_menu(profile).await,
            Err(ServiceError::Validation(_)) => {
                let count = self.store.get_bids_for_job(job_id).await?.len();
                self.reply(phone, prompts::selection_out_of_range(count)).await;
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn draft_job(&self, client_phone: &str) -> Result<Option<Uuid>, ServiceError> {
        Ok(self
            .store
            .get_active_job_for_client(client_phone)
            .await?
            .filter(|job| job.status == JobStatus::Draft)
            .map(|job| job.id))
    }

    async fn awaiting_selection_job(&self, client_phone: &str) -> Result<Option<Uuid>, ServiceError> {
        Ok(self
            .store
            .get_active_job_for_client(client_phone)
            .await?
            .filter(|job| job.status == JobStatus::AwaitingSelection)
            .map(|job| job.id))
    }

    /// Drops a dialog whose job moved on without this party.
    async fn return_to_menu(&self, profile: &Profile) -> Result<(), ServiceError> {
        if profile.conversation_stage != ConversationStage::Ready {
            self.store
                .set_conversation_stage(&profile.phone_number, ConversationStage::Ready)
                .await?;
        }
        self.reply(&profile.phone_number, prompts::greeting(profile)).await;
        Ok(())
    }

    async fn reply(&self, phone: &str, body: String) {
        self.notification_service.reply(phone, body).await;
    }
}
