// db/auditdb.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Error;

use super::db::DBClient;
use crate::models::jobmodel::AuditEvent;

#[async_trait]
pub trait AuditExt: Send + Sync {
    async fn record_audit_event(&self, event: &AuditEvent) -> Result<(), Error>;

    async fn purge_audit_logs(&self, older_than: DateTime<Utc>) -> Result<u64, Error>;
}

#[async_trait]
impl AuditExt for DBClient {
    async fn record_audit_event(&self, event: &AuditEvent) -> Result<(), Error> {
        sqlx::query(
            r#"
            INSERT INTO audit_logs
            (event_type, job_id, actor_phone, metadata, description, created_at)
            VALUES ($1, $2, $3, $4, $5, NOW())
            "#,
        )
        .bind(&event.event_type)
        .bind(event.job_id)
        .bind(&event.actor_phone)
        .bind(&event.metadata)
        .bind(&event.description)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn purge_audit_logs(&self, older_than: DateTime<Utc>) -> Result<u64, Error> {
        let result = sqlx::query("DELETE FROM audit_logs WHERE created_at < $1")
            .bind(older_than)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
