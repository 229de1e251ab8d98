// service/testkit.rs
//
// Fully wired application state over the in-memory store and a recording sender.
use std::sync::Arc;

use chrono::{Days, NaiveDate, Utc};
use sqlx::types::BigDecimal;

use crate::{
    config::Config,
    db::memorydb::{blank_profile, MemoryStore},
    models::profilemodel::{ConversationStage, Role},
    service::{
        auction_service::AuctionService, conversation_service::ConversationService,
        messaging::testing::RecordingSender, sweeper_service::SweeperService,
    },
    AppState,
};

pub const CLIENT: &str = "+972500000001";
pub const PROVIDER_A: &str = "+972520000001";
pub const PROVIDER_B: &str = "+972520000002";
pub const PROVIDER_C: &str = "+972520000003";

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub sender: Arc<RecordingSender>,
    pub state: AppState,
}

impl Harness {
    /// No profiles at all.
    pub fn empty() -> Self {
        let store = Arc::new(MemoryStore::new());
        let sender = Arc::new(RecordingSender::new());
        let state = AppState::new(store.clone(), sender.clone(), Config::for_tests());
        Self { store, sender, state }
    }

    /// A registered client in חולון and three registered providers covering it.
    pub fn new() -> Self {
        let harness = Self::empty();
        harness.add_client(CLIENT, "חולון");
        harness.add_provider(PROVIDER_A, "דנה", "חולון,בת ים");
        harness.add_provider(PROVIDER_B, "יוסי", "רמת גן,חולון");
        harness.add_provider(PROVIDER_C, "מיכל", "חולון");
        harness
    }

    pub fn add_client(&self, phone: &str, area: &str) {
        let mut profile = blank_profile(phone, Role::Client);
        profile.full_name = Some("נועה".to_string());
        profile.service_areas = Some(area.to_string());
        profile.conversation_stage = ConversationStage::Ready;
        self.store.insert_profile(profile);
    }

    pub fn add_provider(&self, phone: &str, name: &str, areas: &str) {
        let mut profile = blank_profile(phone, Role::Provider);
        profile.full_name = Some(name.to_string());
        profile.service_areas = Some(areas.to_string());
        profile.hourly_rate = Some(BigDecimal::from(60));
        profile.travel_fee = Some(BigDecimal::from(0));
        profile.bio = Some("ניסיון של 5 שנים".to_string());
        profile.conversation_stage = ConversationStage::Ready;
        self.store.insert_profile(profile);
    }

    pub fn auction(&self) -> &AuctionService {
        &self.state.auction_service
    }

    pub fn conversation(&self) -> &ConversationService {
        &self.state.conversation_service
    }

    pub fn sweeper(&self) -> &SweeperService {
        &self.state.sweeper_service
    }

    pub fn future_date(&self) -> NaiveDate {
        Utc::now().date_naive() + Days::new(7)
    }

    /// Delivers an inbound message the way the webhook does.
    pub async fn inbound(&self, phone: &str, body: &str) {
        self.conversation()
            .handle_inbound(&format!("whatsapp:{}", phone), body)
            .await
            .expect("inbound message handled");
    }

    pub fn last_text_to(&self, phone: &str) -> String {
        self.sender.texts_to(phone).pop().unwrap_or_default()
    }
}
