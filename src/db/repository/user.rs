use chrono::Utc;

use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::models::*;
use crate::db::repository::parse_enum;
use crate::error::{AppError, AppResult};

// ============================================================================
// User Repository
// ============================================================================

const USER_COLUMNS: &str = "id, email, password_hash, full_name, role, department, is_active, \
     created_at, updated_at";

fn user_from_row(r: &SqliteRow) -> AppResult<User> {
    Ok(User {
        id: r.get("id"),
        email: r.get("email"),
        password_hash: r.get("password_hash"),
        full_name: r.get("full_name"),
        role: parse_enum(r.get("role"), "role")?,
        department: r.get("department"),
        is_active: r.get("is_active"),
        created_at: r.get("created_at"),
        updated_at: r.get("updated_at"),
    })
}

pub struct UserRepository;

impl UserRepository {
    pub async fn create(pool: &SqlitePool, new: CreateUser) -> AppResult<User> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().naive_utc();

        let sql = format!(
            "INSERT INTO users (id, email, password_hash, full_name, role, department, is_active, \
             created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, 1, ?, ?) \
             RETURNING {USER_COLUMNS}"
        );

        let row = sqlx::query(&sql)
            .bind(&id)
            .bind(&new.email)
            .bind(&new.password_hash)
            .bind(&new.full_name)
            .bind(new.role.as_str())
            .bind(new.department.as_deref())
            .bind(now)
            .bind(now)
            .fetch_one(pool)
            .await
            .map_err(AppError::Database)?;

        user_from_row(&row)
    }

    pub async fn find_by_id(pool: &SqlitePool, id: &str) -> AppResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");

        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(AppError::Database)?;

        row.as_ref().map(user_from_row).transpose()
    }

    pub async fn find_by_email(pool: &SqlitePool, email: &str) -> AppResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?");

        let row = sqlx::query(&sql)
            .bind(email)
            .fetch_optional(pool)
            .await
            .map_err(AppError::Database)?;

        row.as_ref().map(user_from_row).transpose()
    }

    /// Deterministic pick for triage auto-assignment: the oldest active
    /// account holding the given role.
    pub async fn first_active_with_role(pool: &SqlitePool, role: Role) -> AppResult<Option<User>> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users \
             WHERE role = ? AND is_active = 1 \
             ORDER BY created_at ASC, id ASC \
             LIMIT 1"
        );

        let row = sqlx::query(&sql)
            .bind(role.as_str())
            .fetch_optional(pool)
            .await
            .map_err(AppError::Database)?;

        row.as_ref().map(user_from_row).transpose()
    }

    /// Ids of all active accounts with the given role (notification fan-out).
    pub async fn active_ids_with_role(pool: &SqlitePool, role: Role) -> AppResult<Vec<String>> {
        let rows = sqlx::query("SELECT id FROM users WHERE role = ? AND is_active = 1")
            .bind(role.as_str())
            .fetch_all(pool)
            .await
            .map_err(AppError::Database)?;

        Ok(rows.into_iter().map(|r| r.get("id")).collect())
    }
}
