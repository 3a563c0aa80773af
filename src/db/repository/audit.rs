use chrono::Utc;

use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::models::*;
use crate::error::{AppError, AppResult};

// ============================================================================
// Audit Log Repository
// ============================================================================

const AUDIT_COLUMNS: &str = "id, user_id, action, entity_type, entity_id, details, created_at";

fn audit_from_row(r: &SqliteRow) -> AuditLog {
    AuditLog {
        id: r.get("id"),
        user_id: r.get("user_id"),
        action: r.get("action"),
        entity_type: r.get("entity_type"),
        entity_id: r.get("entity_id"),
        details: r.get("details"),
        created_at: r.get("created_at"),
    }
}

pub struct AuditLogRepository;

impl AuditLogRepository {
    pub async fn create<'e, E>(executor: E, new: CreateAuditLog) -> AppResult<AuditLog>
    where
        E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
    {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().naive_utc();

        let sql = format!(
            "INSERT INTO audit_logs (id, user_id, action, entity_type, entity_id, details, \
             created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?) \
             RETURNING {AUDIT_COLUMNS}"
        );

        let row = sqlx::query(&sql)
            .bind(&id)
            .bind(&new.user_id)
            .bind(&new.action)
            .bind(&new.entity_type)
            .bind(&new.entity_id)
            .bind(new.details.as_deref())
            .bind(now)
            .fetch_one(executor)
            .await
            .map_err(AppError::Database)?;

        Ok(audit_from_row(&row))
    }

    pub async fn list(pool: &SqlitePool, limit: i64, offset: i64) -> AppResult<Vec<AuditLog>> {
        let sql = format!(
            "SELECT {AUDIT_COLUMNS} FROM audit_logs \
             ORDER BY created_at DESC \
             LIMIT ? OFFSET ?"
        );

        let rows = sqlx::query(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
            .map_err(AppError::Database)?;

        Ok(rows.iter().map(audit_from_row).collect())
    }

    pub async fn count(pool: &SqlitePool) -> AppResult<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM audit_logs")
            .fetch_one(pool)
            .await
            .map_err(AppError::Database)?;

        Ok(row.get("n"))
    }
}
