use chrono::Utc;

use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::models::*;
use crate::error::{AppError, AppResult};

// ============================================================================
// Notification Repository
// ============================================================================

const NOTIFICATION_COLUMNS: &str =
    "id, user_id, type, title, message, related_entity_type, related_entity_id, is_read, \
     created_at";

fn notification_from_row(r: &SqliteRow) -> Notification {
    Notification {
        id: r.get("id"),
        user_id: r.get("user_id"),
        kind: r.get("type"),
        title: r.get("title"),
        message: r.get("message"),
        related_entity_type: r.get("related_entity_type"),
        related_entity_id: r.get("related_entity_id"),
        is_read: r.get("is_read"),
        created_at: r.get("created_at"),
    }
}

pub struct NotificationRepository;

impl NotificationRepository {
    pub async fn create<'e, E>(executor: E, new: CreateNotification) -> AppResult<Notification>
    where
        E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
    {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().naive_utc();

        let sql = format!(
            "INSERT INTO notifications (id, user_id, type, title, message, related_entity_type, \
             related_entity_id, is_read, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, 0, ?) \
             RETURNING {NOTIFICATION_COLUMNS}"
        );

        let row = sqlx::query(&sql)
            .bind(&id)
            .bind(&new.user_id)
            .bind(new.kind.as_str())
            .bind(&new.title)
            .bind(&new.message)
            .bind(new.related_entity_type.as_deref())
            .bind(new.related_entity_id.as_deref())
            .bind(now)
            .fetch_one(executor)
            .await
            .map_err(AppError::Database)?;

        Ok(notification_from_row(&row))
    }

    pub async fn list_for_user(
        pool: &SqlitePool,
        user_id: &str,
        unread_only: bool,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<Notification>> {
        let sql = format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications \
             WHERE user_id = ? AND (? = 0 OR is_read = 0) \
             ORDER BY created_at DESC \
             LIMIT ? OFFSET ?"
        );

        let rows = sqlx::query(&sql)
            .bind(user_id)
            .bind(unread_only)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
            .map_err(AppError::Database)?;

        Ok(rows.iter().map(notification_from_row).collect())
    }

    pub async fn count_for_user(pool: &SqlitePool, user_id: &str) -> AppResult<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM notifications WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(pool)
            .await
            .map_err(AppError::Database)?;

        Ok(row.get("n"))
    }

    pub async fn unread_count(pool: &SqlitePool, user_id: &str) -> AppResult<i64> {
        let row =
            sqlx::query("SELECT COUNT(*) AS n FROM notifications WHERE user_id = ? AND is_read = 0")
                .bind(user_id)
                .fetch_one(pool)
                .await
                .map_err(AppError::Database)?;

        Ok(row.get("n"))
    }

    /// Mark one notification read; scoped to the owner. Returns false when the
    /// notification does not exist or belongs to someone else.
    pub async fn mark_read(pool: &SqlitePool, id: &str, user_id: &str) -> AppResult<bool> {
        let result = sqlx::query("UPDATE notifications SET is_read = 1 WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await
            .map_err(AppError::Database)?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn mark_all_read(pool: &SqlitePool, user_id: &str) -> AppResult<u64> {
        let result =
            sqlx::query("UPDATE notifications SET is_read = 1 WHERE user_id = ? AND is_read = 0")
                .bind(user_id)
                .execute(pool)
                .await
                .map_err(AppError::Database)?;

        Ok(result.rows_affected())
    }
}
