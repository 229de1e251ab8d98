// db/db.rs
use sqlx::{Pool, Postgres};

use super::{auditdb::AuditExt, biddb::BidExt, jobdb::JobExt, profiledb::ProfileExt};

#[derive(Clone)]
pub struct DBClient {
    pub pool: Pool<Postgres>,
}

impl std::fmt::Debug for DBClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DBClient")
            .field("pool", &"Pool<Postgres>")
            .field("size", &self.pool.size())
            .finish()
    }
}

impl DBClient {
    pub fn new(pool: Pool<Postgres>) -> Self {
        DBClient { pool }
    }
}

/// Everything the marketplace services need from persistence.
pub trait MarketStore: ProfileExt + JobExt + BidExt + AuditExt {}

impl<T> MarketStore for T where T: ProfileExt + JobExt + BidExt + AuditExt {}
