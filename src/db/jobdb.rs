// db/jobdb.rs
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::Error;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::jobmodel::*;

const JOB_COLUMNS: &str = "id, client_phone, area, scheduled_date, scheduled_time, status, \
    broadcast_at, bid_deadline, winning_bid_id, rating, created_at, updated_at";

#[async_trait]
pub trait JobExt: Send + Sync {
    /// Inserts a `draft` job. `None` when the client already holds a live job.
    async fn create_draft_job(&self, client_phone: &str, area: &str) -> Result<Option<Job>, Error>;

    async fn get_job_by_id(&self, job_id: Uuid) -> Result<Option<Job>, Error>;

    /// The client's single job in a non-terminal status, if any.
    async fn get_active_job_for_client(&self, client_phone: &str) -> Result<Option<Job>, Error>;

    async fn set_job_date(&self, job_id: Uuid, date: NaiveDate) -> Result<Option<Job>, Error>;

    /// `draft -> pending` with the schedule filled in, in one transaction with
    /// pointing every provider in `providers` at the job and returning the
    /// client to `ready`. `None` if the job left `draft`.
    async fn schedule_job(
        &self,
        job_id: Uuid,
        date: NaiveDate,
        time: NaiveTime,
        providers: &[String],
    ) -> Result<Option<Job>, Error>;

    /// Cancels the client's job only while it is still a `draft`.
    async fn cancel_draft_job(&self, client_phone: &str) -> Result<Option<Job>, Error>;

    /// Auctions due for closing at `now`: bidding windows that have elapsed, and
    /// broadcast jobs that drew no bid since `unanswered_before`.
    async fn get_expired_auctions(
        &self,
        now: DateTime<Utc>,
        unanswered_before: DateTime<Utc>,
    ) -> Result<Vec<Job>, Error>;

    async fn get_confirmed_job_for_provider(
        &self,
        provider_phone: &str,
    ) -> Result<Option<Job>, Error>;

    /// `confirmed -> completed`, only for the winning provider.
    async fn complete_job(&self, job_id: Uuid, provider_phone: &str) -> Result<Option<Job>, Error>;

    /// Stores a rating on the client's most recent unrated completed job.
    async fn rate_latest_job(&self, client_phone: &str, rating: i16) -> Result<Option<Job>, Error>;

    async fn purge_stale_drafts(&self, older_than: DateTime<Utc>) -> Result<u64, Error>;
}

#[async_trait]
impl JobExt for DBClient {
    async fn create_draft_job(&self, client_phone: &str, area: &str) -> Result<Option<Job>, Error> {
        sqlx::query_as::<_, Job>(&format!(
            r#"
            INSERT INTO jobs (id, client_phone, area, status)
            VALUES ($1, $2, $3, 'draft')
            ON CONFLICT (client_phone)
                WHERE status IN ('draft', 'pending', 'collecting_bids', 'awaiting_selection', 'confirmed')
                DO NOTHING
            RETURNING {}
            "#,
            JOB_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(client_phone)
        .bind(area)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_job_by_id(&self, job_id: Uuid) -> Result<Option<Job>, Error> {
        sqlx::query_as::<_, Job>(&format!("SELECT {} FROM jobs WHERE id = $1", JOB_COLUMNS))
            .bind(job_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_active_job_for_client(&self, client_phone: &str) -> Result<Option<Job>, Error> {
        sqlx::query_as::<_, Job>(&format!(
            r#"
            SELECT {} FROM jobs
            WHERE client_phone = $1
            AND status NOT IN ('completed', 'cancelled')
            ORDER BY created_at DESC
            LIMIT 1
            "#,
            JOB_COLUMNS
        ))
        .bind(client_phone)
        .fetch_optional(&self.pool)
        .await
    }

    async fn set_job_date(&self, job_id: Uuid, date: NaiveDate) -> Result<Option<Job>, Error> {
        sqlx::query_as::<_, Job>(&format!(
            r#"
            UPDATE jobs SET scheduled_date = $2, updated_at = NOW()
            WHERE id = $1 AND status = 'draft'
            RETURNING {}
            "#,
            JOB_COLUMNS
        ))
        .bind(job_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await
    }

    async fn schedule_job(
        &self,
        job_id: Uuid,
        date: NaiveDate,
        time: NaiveTime,
        providers: &[String],
    ) -> Result<Option<Job>, Error> {
        let mut tx = self.pool.begin().await?;

        let job = sqlx::query_as::<_, Job>(&format!(
            r#"
            UPDATE jobs
            SET scheduled_date = $2, scheduled_time = $3, status = 'pending',
                broadcast_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND status = 'draft'
            RETURNING {}
            "#,
            JOB_COLUMNS
        ))
        .bind(job_id)
        .bind(date)
        .bind(time)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(job) = job else {
            tx.rollback().await?;
            return Ok(None);
        };

        sqlx::query(
            r#"
            UPDATE profiles
            SET active_job_id = $2, updated_at = NOW()
            WHERE phone_number = ANY($1) AND role = 'provider'
            "#,
        )
        .bind(providers)
        .bind(job.id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE profiles SET conversation_stage = 'ready', updated_at = NOW() WHERE phone_number = $1",
        )
        .bind(&job.client_phone)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(job))
    }

    async fn cancel_draft_job(&self, client_phone: &str) -> Result<Option<Job>, Error> {
        sqlx::query_as::<_, Job>(&format!(
            r#"
            UPDATE jobs SET status = 'cancelled', updated_at = NOW()
            WHERE client_phone = $1 AND status = 'draft'
            RETURNING {}
            "#,
            JOB_COLUMNS
        ))
        .bind(client_phone)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_expired_auctions(
        &self,
        now: DateTime<Utc>,
        unanswered_before: DateTime<Utc>,
    ) -> Result<Vec<Job>, Error> {
        sqlx::query_as::<_, Job>(&format!(
            r#"
            SELECT {} FROM jobs
            WHERE (status = 'collecting_bids' AND bid_deadline IS NOT NULL AND bid_deadline <= $1)
            OR (status = 'pending' AND broadcast_at IS NOT NULL AND broadcast_at <= $2)
            ORDER BY COALESCE(bid_deadline, broadcast_at)
            "#,
            JOB_COLUMNS
        ))
        .bind(now)
        .bind(unanswered_before)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_confirmed_job_for_provider(
        &self,
        provider_phone: &str,
    ) -> Result<Option<Job>, Error> {
        sqlx::query_as::<_, Job>(
            r#"
            SELECT j.id, j.client_phone, j.area, j.scheduled_date, j.scheduled_time, j.status,
                j.broadcast_at, j.bid_deadline, j.winning_bid_id, j.rating, j.created_at, j.updated_at
            FROM jobs j
            JOIN bids b ON b.id = j.winning_bid_id
            WHERE j.status = 'confirmed' AND b.provider_phone = $1
            ORDER BY j.scheduled_date NULLS LAST, j.scheduled_time NULLS LAST
            LIMIT 1
            "#,
        )
        .bind(provider_phone)
        .fetch_optional(&self.pool)
        .await
    }

    async fn complete_job(&self, job_id: Uuid, provider_phone: &str) -> Result<Option<Job>, Error> {
        sqlx::query_as::<_, Job>(&format!(
            r#"
            UPDATE jobs SET status = 'completed', updated_at = NOW()
            WHERE id = $1 AND status = 'confirmed'
            AND winning_bid_id IN (SELECT id FROM bids WHERE job_id = $1 AND provider_phone = $2)
            RETURNING {}
            "#,
            JOB_COLUMNS
        ))
        .bind(job_id)
        .bind(provider_phone)
        .fetch_optional(&self.pool)
        .await
    }

    async fn rate_latest_job(&self, client_phone: &str, rating: i16) -> Result<Option<Job>, Error> {
        sqlx::query_as::<_, Job>(&format!(
            r#"
            UPDATE jobs SET rating = $2, updated_at = NOW()
            WHERE id = (
                SELECT id FROM jobs
                WHERE client_phone = $1 AND status = 'completed' AND rating IS NULL
                ORDER BY updated_at DESC
                LIMIT 1
            )
            RETURNING {}
            "#,
            JOB_COLUMNS
        ))
        .bind(client_phone)
        .bind(rating)
        .fetch_optional(&self.pool)
        .await
    }

    async fn purge_stale_drafts(&self, older_than: DateTime<Utc>) -> Result<u64, Error> {
        let result = sqlx::query("DELETE FROM jobs WHERE status = 'draft' AND updated_at < $1")
            .bind(older_than)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
