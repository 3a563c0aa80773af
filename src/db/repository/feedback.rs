use std::collections::HashMap;

use chrono::{NaiveDateTime, Utc};

use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::models::*;
use crate::db::repository::parse_enum;
use crate::error::{AppError, AppResult};

// ============================================================================
// Feedback Repository
// ============================================================================

const FEEDBACK_COLUMNS: &str = "id, title, description, category, status, priority, is_anonymous, \
     ai_analysis, submitted_by, assigned_to, vendor_assigned_to, vendor_status, vendor_due_at, \
     vendor_last_response_at, created_at, updated_at";

fn feedback_from_row(r: &SqliteRow) -> AppResult<Feedback> {
    Ok(Feedback {
        id: r.get("id"),
        title: r.get("title"),
        description: r.get("description"),
        category: parse_enum(r.get("category"), "category")?,
        status: parse_enum(r.get("status"), "status")?,
        priority: parse_enum(r.get("priority"), "priority")?,
        is_anonymous: r.get("is_anonymous"),
        ai_analysis: r.get("ai_analysis"),
        submitted_by: r.get("submitted_by"),
        assigned_to: r.get("assigned_to"),
        vendor_assigned_to: r.get("vendor_assigned_to"),
        vendor_status: parse_enum(r.get("vendor_status"), "vendor_status")?,
        vendor_due_at: r.get("vendor_due_at"),
        vendor_last_response_at: r.get("vendor_last_response_at"),
        created_at: r.get("created_at"),
        updated_at: r.get("updated_at"),
    })
}

pub struct FeedbackRepository;

impl FeedbackRepository {
    pub async fn create(pool: &SqlitePool, new: CreateFeedback) -> AppResult<Feedback> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().naive_utc();

        let sql = format!(
            "INSERT INTO feedback (id, title, description, category, status, priority, \
             is_anonymous, submitted_by, assigned_to, vendor_status, created_at, updated_at) \
             VALUES (?, ?, ?, ?, 'SUBMITTED', ?, ?, ?, ?, 'NONE', ?, ?) \
             RETURNING {FEEDBACK_COLUMNS}"
        );

        let row = sqlx::query(&sql)
            .bind(&id)
            .bind(&new.title)
            .bind(&new.description)
            .bind(new.category.as_str())
            .bind(new.priority.as_str())
            .bind(new.is_anonymous)
            .bind(&new.submitted_by)
            .bind(new.assigned_to.as_deref())
            .bind(now)
            .bind(now)
            .fetch_one(pool)
            .await
            .map_err(AppError::Database)?;

        feedback_from_row(&row)
    }

    pub async fn find_by_id(pool: &SqlitePool, id: &str) -> AppResult<Option<Feedback>> {
        let sql = format!("SELECT {FEEDBACK_COLUMNS} FROM feedback WHERE id = ?");

        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(AppError::Database)?;

        row.as_ref().map(feedback_from_row).transpose()
    }

    /// Filtered, newest-first listing page.
    pub async fn list(
        pool: &SqlitePool,
        filter: &FeedbackFilter,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<Feedback>> {
        let status = filter.status.map(|s| s.as_str());
        let category = filter.category.map(|c| c.as_str());
        let priority = filter.priority.map(|p| p.as_str());

        let sql = format!(
            "SELECT {FEEDBACK_COLUMNS} FROM feedback \
             WHERE (? IS NULL OR status = ?) \
             AND (? IS NULL OR category = ?) \
             AND (? IS NULL OR priority = ?) \
             AND (? IS NULL OR submitted_by = ?) \
             AND (? IS NULL OR assigned_to = ?) \
             ORDER BY created_at DESC \
             LIMIT ? OFFSET ?"
        );

        let rows = sqlx::query(&sql)
            .bind(status)
            .bind(status)
            .bind(category)
            .bind(category)
            .bind(priority)
            .bind(priority)
            .bind(filter.submitted_by.as_deref())
            .bind(filter.submitted_by.as_deref())
            .bind(filter.assigned_to.as_deref())
            .bind(filter.assigned_to.as_deref())
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
            .map_err(AppError::Database)?;

        rows.iter().map(feedback_from_row).collect()
    }

    pub async fn count(pool: &SqlitePool, filter: &FeedbackFilter) -> AppResult<i64> {
        let status = filter.status.map(|s| s.as_str());
        let category = filter.category.map(|c| c.as_str());
        let priority = filter.priority.map(|p| p.as_str());

        let row = sqlx::query(
            "SELECT COUNT(*) AS n FROM feedback \
             WHERE (? IS NULL OR status = ?) \
             AND (? IS NULL OR category = ?) \
             AND (? IS NULL OR priority = ?) \
             AND (? IS NULL OR submitted_by = ?) \
             AND (? IS NULL OR assigned_to = ?)",
        )
        .bind(status)
        .bind(status)
        .bind(category)
        .bind(category)
        .bind(priority)
        .bind(priority)
        .bind(filter.submitted_by.as_deref())
        .bind(filter.submitted_by.as_deref())
        .bind(filter.assigned_to.as_deref())
        .bind(filter.assigned_to.as_deref())
        .fetch_one(pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row.get("n"))
    }

    /// Submitter content edit. Unset fields keep their current value.
    pub async fn update_content(
        pool: &SqlitePool,
        id: &str,
        title: Option<&str>,
        description: Option<&str>,
        category: Option<FeedbackCategory>,
    ) -> AppResult<Feedback> {
        let now = Utc::now().naive_utc();
        let category = category.map(|c| c.as_str());

        let sql = format!(
            "UPDATE feedback \
             SET title = COALESCE(?, title), \
                 description = COALESCE(?, description), \
                 category = COALESCE(?, category), \
                 updated_at = ? \
             WHERE id = ? \
             RETURNING {FEEDBACK_COLUMNS}"
        );

        let row = sqlx::query(&sql)
            .bind(title)
            .bind(description)
            .bind(category)
            .bind(now)
            .bind(id)
            .fetch_one(pool)
            .await
            .map_err(AppError::Database)?;

        feedback_from_row(&row)
    }

    /// HR status transition; optionally records a new assignee in the same
    /// statement. No transition table is enforced here.
    pub async fn set_status(
        pool: &SqlitePool,
        id: &str,
        status: FeedbackStatus,
        assigned_to: Option<&str>,
    ) -> AppResult<Feedback> {
        let now = Utc::now().naive_utc();

        let sql = format!(
            "UPDATE feedback \
             SET status = ?, assigned_to = COALESCE(?, assigned_to), updated_at = ? \
             WHERE id = ? \
             RETURNING {FEEDBACK_COLUMNS}"
        );

        let row = sqlx::query(&sql)
            .bind(status.as_str())
            .bind(assigned_to)
            .bind(now)
            .bind(id)
            .fetch_one(pool)
            .await
            .map_err(AppError::Database)?;

        feedback_from_row(&row)
    }

    /// Triage assignment: sets the assignee and moves the item to UNDER_REVIEW.
    pub async fn assign(pool: &SqlitePool, id: &str, assignee_id: &str) -> AppResult<Feedback> {
        let now = Utc::now().naive_utc();

        let sql = format!(
            "UPDATE feedback \
             SET assigned_to = ?, status = 'UNDER_REVIEW', updated_at = ? \
             WHERE id = ? \
             RETURNING {FEEDBACK_COLUMNS}"
        );

        let row = sqlx::query(&sql)
            .bind(assignee_id)
            .bind(now)
            .bind(id)
            .fetch_one(pool)
            .await
            .map_err(AppError::Database)?;

        feedback_from_row(&row)
    }

    pub async fn delete(pool: &SqlitePool, id: &str) -> AppResult<()> {
        sqlx::query("DELETE FROM feedback WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await
            .map_err(AppError::Database)?;

        Ok(())
    }

    /// Hand the item to a vendor. Overwrites any previous vendor assignment
    /// and due date; callers run this inside a transaction together with the
    /// instruction comment.
    pub async fn forward_to_vendor<'e, E>(
        executor: E,
        id: &str,
        vendor_id: &str,
        due_at: NaiveDateTime,
    ) -> AppResult<Feedback>
    where
        E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
    {
        let now = Utc::now().naive_utc();

        let sql = format!(
            "UPDATE feedback \
             SET vendor_assigned_to = ?, vendor_due_at = ?, vendor_status = 'FORWARDED', \
                 updated_at = ? \
             WHERE id = ? \
             RETURNING {FEEDBACK_COLUMNS}"
        );

        let row = sqlx::query(&sql)
            .bind(vendor_id)
            .bind(due_at)
            .bind(now)
            .bind(id)
            .fetch_one(executor)
            .await
            .map_err(AppError::Database)?;

        feedback_from_row(&row)
    }

    /// Move the escalation to a new vendor status, optionally stamping the
    /// last-response time.
    pub async fn set_vendor_status<'e, E>(
        executor: E,
        id: &str,
        status: VendorStatus,
        last_response_at: Option<NaiveDateTime>,
    ) -> AppResult<Feedback>
    where
        E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
    {
        let now = Utc::now().naive_utc();

        let sql = format!(
            "UPDATE feedback \
             SET vendor_status = ?, \
                 vendor_last_response_at = COALESCE(?, vendor_last_response_at), \
                 updated_at = ? \
             WHERE id = ? \
             RETURNING {FEEDBACK_COLUMNS}"
        );

        let row = sqlx::query(&sql)
            .bind(status.as_str())
            .bind(last_response_at)
            .bind(now)
            .bind(id)
            .fetch_one(executor)
            .await
            .map_err(AppError::Database)?;

        feedback_from_row(&row)
    }

    /// Sweep transition to PAST_DUE. Guarded so settled or already past-due
    /// items are left untouched; returns whether a row actually changed.
    pub async fn mark_past_due(pool: &SqlitePool, id: &str) -> AppResult<bool> {
        let now = Utc::now().naive_utc();

        let result = sqlx::query(
            "UPDATE feedback \
             SET vendor_status = 'PAST_DUE', updated_at = ? \
             WHERE id = ? AND vendor_status NOT IN ('APPROVED', 'REJECTED', 'PAST_DUE')",
        )
        .bind(now)
        .bind(id)
        .execute(pool)
        .await
        .map_err(AppError::Database)?;

        Ok(result.rows_affected() > 0)
    }

    /// All items currently tracked by the vendor SLA sweep.
    pub async fn list_vendor_tracked(pool: &SqlitePool) -> AppResult<Vec<Feedback>> {
        let sql = format!(
            "SELECT {FEEDBACK_COLUMNS} FROM feedback \
             WHERE vendor_due_at IS NOT NULL AND vendor_assigned_to IS NOT NULL"
        );

        let rows = sqlx::query(&sql)
            .fetch_all(pool)
            .await
            .map_err(AppError::Database)?;

        rows.iter().map(feedback_from_row).collect()
    }

    /// Items forwarded to the given vendor, newest first.
    pub async fn list_for_vendor(pool: &SqlitePool, vendor_id: &str) -> AppResult<Vec<Feedback>> {
        let sql = format!(
            "SELECT {FEEDBACK_COLUMNS} FROM feedback \
             WHERE vendor_assigned_to = ? \
             ORDER BY created_at DESC"
        );

        let rows = sqlx::query(&sql)
            .bind(vendor_id)
            .fetch_all(pool)
            .await
            .map_err(AppError::Database)?;

        rows.iter().map(feedback_from_row).collect()
    }

    pub async fn counts_by_status(pool: &SqlitePool) -> AppResult<HashMap<String, i64>> {
        let rows = sqlx::query("SELECT status, COUNT(*) AS n FROM feedback GROUP BY status")
            .fetch_all(pool)
            .await
            .map_err(AppError::Database)?;

        Ok(rows
            .into_iter()
            .map(|r| (r.get::<String, _>("status"), r.get::<i64, _>("n")))
            .collect())
    }

    /// Open vendor escalations (forwarded but not yet settled).
    pub async fn count_vendor_open(pool: &SqlitePool) -> AppResult<i64> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS n FROM feedback \
             WHERE vendor_due_at IS NOT NULL \
             AND vendor_status NOT IN ('APPROVED', 'REJECTED')",
        )
        .fetch_one(pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row.get("n"))
    }

    /// Open vendor escalations whose due date has already passed.
    pub async fn count_vendor_breached(pool: &SqlitePool, now: NaiveDateTime) -> AppResult<i64> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS n FROM feedback \
             WHERE vendor_due_at IS NOT NULL AND vendor_due_at < ? \
             AND vendor_status NOT IN ('APPROVED', 'REJECTED')",
        )
        .bind(now)
        .fetch_one(pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row.get("n"))
    }
}
