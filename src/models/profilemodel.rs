use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::BigDecimal;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
pub enum Role {
    Client,
    Provider,
}

impl Role {
    pub fn to_str(&self) -> &str {
        match self {
            Role::Client => "client",
            Role::Provider => "provider",
        }
    }
}

/// Persisted checkpoint of a party's dialog. Registration stages run in a
/// fixed order per role; booking stages loop back to `Ready`.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "conversation_stage", rename_all = "snake_case")]
pub enum ConversationStage {
    AwaitingName,
    AwaitingArea,
    AwaitingRate,
    AwaitingFee,
    AwaitingBio,
    Ready,
    BookingDate,
    BookingTime,
    AwaitingSelection,
    AwaitingRating,
}

impl ConversationStage {
    pub fn to_str(&self) -> &str {
        match self {
            ConversationStage::AwaitingName => "awaiting_name",
            ConversationStage::AwaitingArea => "awaiting_area",
            ConversationStage::AwaitingRate => "awaiting_rate",
            ConversationStage::AwaitingFee => "awaiting_fee",
            ConversationStage::AwaitingBio => "awaiting_bio",
            ConversationStage::Ready => "ready",
            ConversationStage::BookingDate => "booking_date",
            ConversationStage::BookingTime => "booking_time",
            ConversationStage::AwaitingSelection => "awaiting_selection",
            ConversationStage::AwaitingRating => "awaiting_rating",
        }
    }

    /// Stage that follows a completed registration step for `role`.
    pub fn next_for(&self, role: Role) -> ConversationStage {
        match (self, role) {
            (ConversationStage::AwaitingName, _) => ConversationStage::AwaitingArea,
            (ConversationStage::AwaitingArea, Role::Client) => ConversationStage::Ready,
            (ConversationStage::AwaitingArea, Role::Provider) => ConversationStage::AwaitingRate,
            (ConversationStage::AwaitingRate, _) => ConversationStage::AwaitingFee,
            (ConversationStage::AwaitingFee, _) => ConversationStage::AwaitingBio,
            (ConversationStage::AwaitingBio, _) => ConversationStage::Ready,
            (stage, _) => *stage,
        }
    }

    pub fn is_registration(&self) -> bool {
        matches!(
            self,
            ConversationStage::AwaitingName
                | ConversationStage::AwaitingArea
                | ConversationStage::AwaitingRate
                | ConversationStage::AwaitingFee
                | ConversationStage::AwaitingBio
        )
    }
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Profile {
    pub phone_number: String,
    pub role: Role,
    pub full_name: Option<String>,
    /// Comma-joined, normalized area names.
    pub service_areas: Option<String>,
    pub hourly_rate: Option<BigDecimal>,
    pub travel_fee: Option<BigDecimal>,
    pub bio: Option<String>,
    pub conversation_stage: ConversationStage,
    /// Job whose offer this provider's next price message answers.
    pub active_job_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    pub fn areas(&self) -> Vec<&str> {
        self.service_areas
            .as_deref()
            .map(|joined| {
                joined
                    .split(',')
                    .map(str::trim)
                    .filter(|area| !area.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn display_name(&self) -> &str {
        self.full_name.as_deref().unwrap_or(&self.phone_number)
    }
}

/// Field-level change produced by one registration answer.
#[derive(Debug, Clone, PartialEq)]
pub enum ProfileUpdate {
    Name(String),
    /// Full replacement value for `service_areas`.
    Areas(String),
    HourlyRate(BigDecimal),
    TravelFee(BigDecimal),
    Bio(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_registration_order() {
        let mut stage = ConversationStage::AwaitingName;
        let mut seen = vec![stage];
        while stage != ConversationStage::Ready {
            stage = stage.next_for(Role::Provider);
            seen.push(stage);
        }
        assert_eq!(
            seen,
            vec![
                ConversationStage::AwaitingName,
                ConversationStage::AwaitingArea,
                ConversationStage::AwaitingRate,
                ConversationStage::AwaitingFee,
                ConversationStage::AwaitingBio,
                ConversationStage::Ready,
            ]
        );
    }

    #[test]
    fn client_skips_provider_fields() {
        assert_eq!(
            ConversationStage::AwaitingArea.next_for(Role::Client),
            ConversationStage::Ready
        );
        assert_eq!(
            ConversationStage::Ready.next_for(Role::Client),
            ConversationStage::Ready
        );
    }
}
