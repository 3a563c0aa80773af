use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::post,
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::db::{
    AuditLogRepository, CommentRepository, CreateAuditLog, CreateComment, FeedbackRepository,
    Role, VendorStatus,
};
use crate::error::{AppError, AppResult};
use crate::routes::auth::{require_role, AuthUser};
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/feedback/:id/vendor-approve", post(vendor_approve))
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct VendorApproveRequest {
    pub action: String,
    pub comment: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VendorApproveResponse {
    pub message: String,
    pub vendor_status: VendorStatus,
}

// ============================================================================
// Handlers
// ============================================================================

/// Superadmin decision on a vendor resolution. Only VENDOR_REPLIED and
/// AWAITING_SUPERADMIN items are decidable; there is no workflow transition
/// out of REJECTED beyond a fresh forward.
async fn vendor_approve(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Json(request): Json<VendorApproveRequest>,
) -> AppResult<Json<VendorApproveResponse>> {
    require_role(&user, Role::Superadmin)?;

    let decision = match request.action.to_ascii_lowercase().as_str() {
        "approve" => VendorStatus::Approved,
        "reject" => VendorStatus::Rejected,
        _ => return Err(AppError::validation("action", "must be approve or reject")),
    };

    let feedback = FeedbackRepository::find_by_id(&state.db, &id)
        .await?
        .ok_or_else(|| AppError::NotFound("Feedback".to_string()))?;

    if !matches!(
        feedback.vendor_status,
        VendorStatus::VendorReplied | VendorStatus::AwaitingSuperadmin
    ) {
        return Err(AppError::forbidden("Not awaiting superadmin decision"));
    }

    let comment = request
        .comment
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());

    let now = Utc::now().naive_utc();
    let mut tx = state.db.begin().await.map_err(AppError::Database)?;

    let updated =
        FeedbackRepository::set_vendor_status(&mut *tx, &id, decision, Some(now)).await?;

    let action = match decision {
        VendorStatus::Approved => "VENDOR_APPROVED",
        _ => "VENDOR_REJECTED",
    };
    AuditLogRepository::create(
        &mut *tx,
        CreateAuditLog::feedback(&user.id, action, &id, comment.map(str::to_string)),
    )
    .await?;

    if let Some(comment) = comment {
        CommentRepository::create(
            &mut *tx,
            CreateComment {
                feedback_id: id.clone(),
                user_id: user.id.clone(),
                comment: comment.to_string(),
                is_internal: true,
            },
        )
        .await?;
    }

    tx.commit().await.map_err(AppError::Database)?;

    let verdict = match decision {
        VendorStatus::Approved => "approved",
        _ => "rejected",
    };

    Ok(Json(VendorApproveResponse {
        message: format!("Vendor response {}", verdict),
        vendor_status: updated.vendor_status,
    }))
}
