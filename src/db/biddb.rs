// db/biddb.rs
//
// Bid ledger. `submit_bid`, `close_auction` and `select_winner` are stored
// functions that lock the job row, so concurrent callers serialise per job.
use async_trait::async_trait;
use sqlx::{types::BigDecimal, Error};
use uuid::Uuid;

use super::db::DBClient;
use crate::models::jobmodel::*;

#[async_trait]
pub trait BidExt: Send + Sync {
    /// Records one bid per (job, provider). On the first accepted bid the job
    /// moves to `collecting_bids` and its deadline is set `wait_secs` ahead.
    /// The bid that brings the count to `bids_limit` closes the auction to
    /// `awaiting_selection` under the same lock.
    async fn submit_bid(
        &self,
        job_id: Uuid,
        provider_phone: &str,
        price: &BigDecimal,
        wait_secs: i64,
        bids_limit: i64,
    ) -> Result<BidSubmission, Error>;

    /// Moves an open auction to `awaiting_selection`, or `cancelled` if it
    /// has no bids. A no-op for any other status.
    async fn close_auction(&self, job_id: Uuid) -> Result<AuctionClosing, Error>;

    /// Bids for the job in submission order.
    async fn get_bids_for_job(&self, job_id: Uuid) -> Result<Vec<BidView>, Error>;

    async fn select_winner(
        &self,
        job_id: Uuid,
        bid_id: Uuid,
        client_phone: &str,
    ) -> Result<bool, Error>;
}

#[async_trait]
impl BidExt for DBClient {
    async fn submit_bid(
        &self,
        job_id: Uuid,
        provider_phone: &str,
        price: &BigDecimal,
        wait_secs: i64,
        bids_limit: i64,
    ) -> Result<BidSubmission, Error> {
        sqlx::query_as::<_, BidSubmission>(
            "SELECT accepted, bid_count, job_status FROM submit_bid($1, $2, $3, $4, $5)",
        )
        .bind(job_id)
        .bind(provider_phone)
        .bind(price)
        .bind(wait_secs)
        .bind(bids_limit)
        .fetch_one(&self.pool)
        .await
    }

    async fn close_auction(&self, job_id: Uuid) -> Result<AuctionClosing, Error> {
        sqlx::query_as::<_, AuctionClosing>(
            "SELECT closed, bid_count, job_status FROM close_auction($1)",
        )
        .bind(job_id)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_bids_for_job(&self, job_id: Uuid) -> Result<Vec<BidView>, Error> {
        sqlx::query_as::<_, BidView>(
            r#"
            SELECT b.id, b.job_id, b.provider_phone, b.price, b.submitted_at,
                p.full_name AS provider_name, p.bio AS provider_bio
            FROM bids b
            JOIN profiles p ON p.phone_number = b.provider_phone
            WHERE b.job_id = $1
            ORDER BY b.submitted_at ASC, b.id ASC
            "#,
        )
        .bind(job_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn select_winner(
        &self,
        job_id: Uuid,
        bid_id: Uuid,
        client_phone: &str,
    ) -> Result<bool, Error> {
        let success: (bool,) = sqlx::query_as("SELECT success FROM select_winner($1, $2, $3)")
            .bind(job_id)
            .bind(bid_id)
            .bind(client_phone)
            .fetch_one(&self.pool)
            .await?;
        Ok(success.0)
    }
}
