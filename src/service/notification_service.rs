// service/notification_service.rs
use std::sync::Arc;

use crate::{
    config::MarketSettings,
    models::{
        jobmodel::{BidView, Job},
        profilemodel::Profile,
    },
    service::{
        messaging::{MessageSender, OutboundMessage},
        prompts,
    },
};

/// Outbound notifications. Delivery is fire-and-forget: failures are logged
/// and reported as `false`, never raised to the caller.
#[derive(Clone)]
pub struct NotificationService {
    sender: Arc<dyn MessageSender>,
    settings: MarketSettings,
}

impl NotificationService {
    pub fn new(sender: Arc<dyn MessageSender>, settings: MarketSettings) -> Self {
        Self { sender, settings }
    }

    pub fn sender(&self) -> Arc<dyn MessageSender> {
        self.sender.clone()
    }

    pub async fn deliver(&self, to: &str, message: &OutboundMessage) -> bool {
        match self.sender.send(to, message).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Outbound delivery failed: {}", e);
                false
            }
        }
    }

    pub async fn reply(&self, to: &str, body: impl Into<String>) -> bool {
        self.deliver(to, &OutboundMessage::text(body)).await
    }

    /// Offer sent to each matched provider when a job is broadcast.
    pub fn job_offer(&self, job: &Job) -> OutboundMessage {
        let (date, time) = job.schedule_label();
        match &self.settings.job_offer_template {
            Some(template_id) => OutboundMessage::Template {
                template_id: template_id.clone(),
                variables: vec![
                    ("1".to_string(), job.area.clone()),
                    ("2".to_string(), date),
                    ("3".to_string(), time),
                ],
            },
            None => OutboundMessage::text(prompts::job_offer(&job.area, &date, &time)),
        }
    }

    pub async fn notify_bids_ready(&self, job: &Job, bids: &[BidView]) -> bool {
        tracing::info!("Presenting {} bids for job {} to client", bids.len(), job.id);
        self.reply(&job.client_phone, prompts::bid_list(bids)).await
    }

    pub async fn notify_no_bids(&self, job: &Job) -> bool {
        tracing::info!("Job {} closed without bids", job.id);
        self.reply(&job.client_phone, prompts::job_cancelled_no_bids()).await
    }

    /// Contact details are exchanged only once the client has confirmed.
    pub async fn notify_contacts_exchanged(
        &self,
        job: &Job,
        client: &Profile,
        winner: &BidView,
    ) -> (bool, bool) {
        let (date, time) = job.schedule_label();
        let provider_name = winner.provider_name.as_deref().unwrap_or(&winner.provider_phone);

        let to_client = self
            .reply(
                &client.phone_number,
                prompts::winner_contact_for_client(
                    provider_name,
                    &winner.provider_phone,
                    &winner.price.to_string(),
                ),
            )
            .await;

        let to_provider = self
            .reply(
                &winner.provider_phone,
                prompts::winner_contact_for_provider(
                    client.display_name(),
                    &client.phone_number,
                    &job.area,
                    &date,
                    &time,
                ),
            )
            .await;

        (to_client, to_provider)
    }

    pub async fn notify_not_selected(&self, provider_phone: &str) -> bool {
        self.reply(provider_phone, prompts::not_selected()).await
    }

    pub async fn notify_rating_request(&self, job: &Job) -> bool {
        let message = match &self.settings.rating_template {
            Some(template_id) => OutboundMessage::Template {
                template_id: template_id.clone(),
                variables: vec![("1".to_string(), job.area.clone())],
            },
            None => OutboundMessage::text(prompts::rating_request()),
        };
        self.deliver(&job.client_phone, &message).await
    }
}
