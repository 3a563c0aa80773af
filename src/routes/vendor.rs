use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::db::{
    CommentRepository, CreateComment, FeedbackRepository, Role, VendorStatus,
};
use crate::error::{AppError, AppResult};
use crate::routes::auth::{require_role, AuthUser};
use crate::routes::feedback::FeedbackResponse;
use crate::services::notify::NotificationService;
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/feedback", get(list_assigned))
        .route("/feedback/:id/reply", post(reply))
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ReplyRequest {
    pub reply: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VendorFeedbackListResponse {
    pub feedback: Vec<FeedbackResponse>,
    pub total: usize,
}

// ============================================================================
// Handlers
// ============================================================================

/// Items forwarded to the calling vendor, with vendor SLA fields.
async fn list_assigned(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> AppResult<Json<VendorFeedbackListResponse>> {
    require_role(&user, Role::Vendor)?;

    let items = FeedbackRepository::list_for_vendor(&state.db, &user.id).await?;

    let feedback: Vec<FeedbackResponse> = items
        .iter()
        .map(|f| FeedbackResponse::build(f, &state.config.sla))
        .collect();

    let total = feedback.len();
    Ok(Json(VendorFeedbackListResponse { feedback, total }))
}

/// Vendor response on an assigned item. Marks the escalation VENDOR_REPLIED,
/// stamps the response time, appends the reply to the internal thread and
/// alerts all superadmins.
async fn reply(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Json(request): Json<ReplyRequest>,
) -> AppResult<Json<serde_json::Value>> {
    require_role(&user, Role::Vendor)?;

    let feedback = FeedbackRepository::find_by_id(&state.db, &id)
        .await?
        .ok_or_else(|| AppError::NotFound("Feedback".to_string()))?;

    if feedback.vendor_assigned_to.as_deref() != Some(user.id.as_str()) {
        return Err(AppError::forbidden("Not assigned to you"));
    }

    let reply_text = request
        .reply
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty());

    let now = Utc::now().naive_utc();
    let mut tx = state.db.begin().await.map_err(AppError::Database)?;

    let updated = FeedbackRepository::set_vendor_status(
        &mut *tx,
        &id,
        VendorStatus::VendorReplied,
        Some(now),
    )
    .await?;

    if let Some(reply_text) = reply_text {
        CommentRepository::create(
            &mut *tx,
            CreateComment {
                feedback_id: id.clone(),
                user_id: user.id.clone(),
                comment: reply_text.to_string(),
                is_internal: true,
            },
        )
        .await?;
    }

    tx.commit().await.map_err(AppError::Database)?;

    NotificationService::new(&state)
        .vendor_replied(&updated)
        .await?;

    Ok(Json(serde_json::json!({ "message": "Reply submitted" })))
}
