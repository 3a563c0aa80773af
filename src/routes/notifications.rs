use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::db::{Notification, NotificationRepository};
use crate::error::{AppError, AppResult};
use crate::routes::auth::AuthUser;
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_notifications))
        .route("/:id/read", post(mark_read))
        .route("/mark-all-read", post(mark_all_read))
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ListNotificationsQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub unread_only: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct NotificationsListResponse {
    pub notifications: Vec<Notification>,
    pub total: i64,
    pub unread_count: i64,
    pub page: i64,
    pub per_page: i64,
}

// ============================================================================
// Handlers
// ============================================================================

/// List the caller's notifications, newest first.
async fn list_notifications(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Query(query): Query<ListNotificationsQuery>,
) -> AppResult<Json<NotificationsListResponse>> {
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1) * per_page;
    let unread_only = query.unread_only.unwrap_or(false);

    let notifications =
        NotificationRepository::list_for_user(&state.db, &user.id, unread_only, per_page, offset)
            .await?;

    let total = NotificationRepository::count_for_user(&state.db, &user.id).await?;
    let unread_count = NotificationRepository::unread_count(&state.db, &user.id).await?;

    Ok(Json(NotificationsListResponse {
        notifications,
        total,
        unread_count,
        page,
        per_page,
    }))
}

async fn mark_read(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    let updated = NotificationRepository::mark_read(&state.db, &id, &user.id).await?;
    if !updated {
        return Err(AppError::NotFound("Notification".to_string()));
    }

    Ok(Json(serde_json::json!({ "message": "Notification marked as read" })))
}

async fn mark_all_read(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> AppResult<Json<serde_json::Value>> {
    let updated = NotificationRepository::mark_all_read(&state.db, &user.id).await?;

    Ok(Json(serde_json::json!({ "message": "All notifications marked as read", "updated": updated })))
}
