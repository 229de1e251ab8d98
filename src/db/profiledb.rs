// db/profiledb.rs
use async_trait::async_trait;
use sqlx::Error;

use super::db::DBClient;
use crate::models::profilemodel::*;

const PROFILE_COLUMNS: &str = "phone_number, role, full_name, service_areas, hourly_rate, \
    travel_fee, bio, conversation_stage, active_job_id, created_at, updated_at";

#[async_trait]
pub trait ProfileExt: Send + Sync {
    async fn get_profile(&self, phone: &str) -> Result<Option<Profile>, Error>;

    /// Creates the profile on first role selection. An existing row is
    /// returned untouched.
    async fn create_profile(&self, phone: &str, role: Role) -> Result<Profile, Error>;

    /// Applies one registration answer if the profile is still at `expected`
    /// and the target field is unset. `None` when the guard did not hold.
    async fn apply_profile_update(
        &self,
        phone: &str,
        expected: ConversationStage,
        update: &ProfileUpdate,
        next: ConversationStage,
    ) -> Result<Option<Profile>, Error>;

    async fn set_conversation_stage(
        &self,
        phone: &str,
        stage: ConversationStage,
    ) -> Result<(), Error>;

    /// Registered providers whose area list contains `area`.
    async fn find_providers_for_area(&self, area: &str) -> Result<Vec<Profile>, Error>;
}

#[async_trait]
impl ProfileExt for DBClient {
    async fn get_profile(&self, phone: &str) -> Result<Option<Profile>, Error> {
        sqlx::query_as::<_, Profile>(&format!(
            "SELECT {} FROM profiles WHERE phone_number = $1",
            PROFILE_COLUMNS
        ))
        .bind(phone)
        .fetch_optional(&self.pool)
        .await
    }

    async fn create_profile(&self, phone: &str, role: Role) -> Result<Profile, Error> {
        sqlx::query(
            r#"
            INSERT INTO profiles (phone_number, role, conversation_stage)
            VALUES ($1, $2, 'awaiting_name')
            ON CONFLICT (phone_number) DO NOTHING
            "#,
        )
        .bind(phone)
        .bind(role)
        .execute(&self.pool)
        .await?;

        self.get_profile(phone).await?.ok_or(Error::RowNotFound)
    }

    async fn apply_profile_update(
        &self,
        phone: &str,
        expected: ConversationStage,
        update: &ProfileUpdate,
        next: ConversationStage,
    ) -> Result<Option<Profile>, Error> {
        // Areas are the one field that is appended to while the stage holds.
        let (assignment, guard) = match update {
            ProfileUpdate::Name(_) => ("full_name = $4", "full_name IS NULL"),
            ProfileUpdate::Areas(_) => ("service_areas = $4", "TRUE"),
            ProfileUpdate::HourlyRate(_) => ("hourly_rate = $4", "hourly_rate IS NULL"),
            ProfileUpdate::TravelFee(_) => ("travel_fee = $4", "travel_fee IS NULL"),
            ProfileUpdate::Bio(_) => ("bio = $4", "bio IS NULL"),
        };

        let sql = format!(
            r#"
            UPDATE profiles
            SET {}, conversation_stage = $3, updated_at = NOW()
            WHERE phone_number = $1 AND conversation_stage = $2 AND {}
            RETURNING {}
            "#,
            assignment, guard, PROFILE_COLUMNS
        );

        let query = sqlx::query_as::<_, Profile>(&sql)
            .bind(phone)
            .bind(expected)
            .bind(next);

        let query = match update {
            ProfileUpdate::Name(value) | ProfileUpdate::Areas(value) | ProfileUpdate::Bio(value) => {
                query.bind(value.clone())
            }
            ProfileUpdate::HourlyRate(value) | ProfileUpdate::TravelFee(value) => {
                query.bind(value.clone())
            }
        };

        query.fetch_optional(&self.pool).await
    }

    async fn set_conversation_stage(
        &self,
        phone: &str,
        stage: ConversationStage,
    ) -> Result<(), Error> {
        sqlx::query(
            "UPDATE profiles SET conversation_stage = $2, updated_at = NOW() WHERE phone_number = $1",
        )
        .bind(phone)
        .bind(stage)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_providers_for_area(&self, area: &str) -> Result<Vec<Profile>, Error> {
        sqlx::query_as::<_, Profile>(&format!(
            r#"
            SELECT {} FROM profiles
            WHERE role = 'provider'
            AND conversation_stage NOT IN ('awaiting_name', 'awaiting_area', 'awaiting_rate', 'awaiting_fee', 'awaiting_bio')
            AND service_areas IS NOT NULL
            AND POSITION($1 IN service_areas) > 0
            ORDER BY created_at
            "#,
            PROFILE_COLUMNS
        ))
        .bind(area)
        .fetch_all(&self.pool)
        .await
    }
}
