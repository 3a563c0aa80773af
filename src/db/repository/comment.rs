use chrono::Utc;

use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::models::*;
use crate::error::{AppError, AppResult};

// ============================================================================
// Comment Repository
// ============================================================================

const COMMENT_COLUMNS: &str = "id, feedback_id, user_id, comment, is_internal, created_at";

fn comment_from_row(r: &SqliteRow) -> FeedbackComment {
    FeedbackComment {
        id: r.get("id"),
        feedback_id: r.get("feedback_id"),
        user_id: r.get("user_id"),
        comment: r.get("comment"),
        is_internal: r.get("is_internal"),
        created_at: r.get("created_at"),
    }
}

pub struct CommentRepository;

impl CommentRepository {
    pub async fn create<'e, E>(executor: E, new: CreateComment) -> AppResult<FeedbackComment>
    where
        E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
    {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().naive_utc();

        let sql = format!(
            "INSERT INTO feedback_comments (id, feedback_id, user_id, comment, is_internal, \
             created_at) \
             VALUES (?, ?, ?, ?, ?, ?) \
             RETURNING {COMMENT_COLUMNS}"
        );

        let row = sqlx::query(&sql)
            .bind(&id)
            .bind(&new.feedback_id)
            .bind(&new.user_id)
            .bind(&new.comment)
            .bind(new.is_internal)
            .bind(now)
            .fetch_one(executor)
            .await
            .map_err(AppError::Database)?;

        Ok(comment_from_row(&row))
    }

    /// Comments on a feedback item, oldest first. Internal comments are
    /// omitted unless the caller may see them.
    pub async fn list_for_feedback(
        pool: &SqlitePool,
        feedback_id: &str,
        include_internal: bool,
    ) -> AppResult<Vec<FeedbackComment>> {
        let sql = format!(
            "SELECT {COMMENT_COLUMNS} FROM feedback_comments \
             WHERE feedback_id = ? AND (? OR is_internal = 0) \
             ORDER BY created_at ASC"
        );

        let rows = sqlx::query(&sql)
            .bind(feedback_id)
            .bind(include_internal)
            .fetch_all(pool)
            .await
            .map_err(AppError::Database)?;

        Ok(rows.iter().map(comment_from_row).collect())
    }

    /// The internal-only conversation (the vendor/superadmin thread).
    pub async fn list_internal(
        pool: &SqlitePool,
        feedback_id: &str,
    ) -> AppResult<Vec<FeedbackComment>> {
        let sql = format!(
            "SELECT {COMMENT_COLUMNS} FROM feedback_comments \
             WHERE feedback_id = ? AND is_internal = 1 \
             ORDER BY created_at ASC"
        );

        let rows = sqlx::query(&sql)
            .bind(feedback_id)
            .fetch_all(pool)
            .await
            .map_err(AppError::Database)?;

        Ok(rows.iter().map(comment_from_row).collect())
    }
}
