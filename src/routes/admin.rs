use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    routing::{get, patch, post},
    Json, Router,
};
use chrono::{Duration, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::{
    AuditLog, AuditLogRepository, CommentRepository, CreateAuditLog, CreateComment,
    FeedbackRepository, Role, UserRepository, VendorStatus,
};
use crate::error::{AppError, AppResult, FieldError};
use crate::routes::auth::{require_role, AuthUser};
use crate::services::notify::NotificationService;
use crate::services::sweep::{self, SweepOutcome};
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/feedback/:id/assign", patch(assign_feedback))
        .route("/feedback/:id/forward-vendor", post(forward_vendor))
        .route("/feedback/:id/request-approval", post(request_approval))
        .route("/audit-logs", get(list_audit_logs))
        .route("/feedback-stats", get(feedback_stats))
        .route("/vendor-sla-sweep", post(trigger_sweep))
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct AssignRequest {
    pub assigned_to: String,
}

#[derive(Debug, Deserialize)]
pub struct ForwardVendorRequest {
    pub vendor_id: String,
    pub due_days: Option<i64>,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct RequestApprovalRequest {
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AuditLogsQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ForwardVendorResponse {
    pub message: &'static str,
    pub vendor_due_at: NaiveDateTime,
    pub vendor_status: VendorStatus,
}

#[derive(Debug, Serialize)]
pub struct VendorStatusResponse {
    pub message: &'static str,
    pub vendor_status: VendorStatus,
}

#[derive(Debug, Serialize)]
pub struct AuditLogsResponse {
    pub logs: Vec<AuditLog>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
}

#[derive(Debug, Serialize)]
pub struct FeedbackStatsResponse {
    pub by_status: HashMap<String, i64>,
    pub vendor_open: i64,
    pub vendor_breached: i64,
}

#[derive(Debug, Serialize)]
pub struct SweepResponse {
    pub message: &'static str,
    pub warnings: u64,
    pub overdue: u64,
}

// ============================================================================
// Handlers
// ============================================================================

/// Assign a triage owner and move the item to UNDER_REVIEW.
async fn assign_feedback(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Json(request): Json<AssignRequest>,
) -> AppResult<Json<serde_json::Value>> {
    require_role(&user, Role::Hr)?;

    FeedbackRepository::find_by_id(&state.db, &id)
        .await?
        .ok_or_else(|| AppError::NotFound("Feedback".to_string()))?;

    let assignee = UserRepository::find_by_id(&state.db, &request.assigned_to)
        .await?
        .ok_or_else(|| AppError::NotFound("Assignee user".to_string()))?;

    let updated = FeedbackRepository::assign(&state.db, &id, &assignee.id).await?;

    AuditLogRepository::create(
        &state.db,
        CreateAuditLog::feedback(
            &user.id,
            "ASSIGN_FEEDBACK",
            &updated.id,
            Some(format!("Assigned to {}", assignee.full_name)),
        ),
    )
    .await?;

    NotificationService::new(&state)
        .assigned(&updated, &assignee)
        .await?;

    Ok(Json(serde_json::json!({
        "message": "Feedback assigned successfully",
        "feedback": {
            "id": updated.id,
            "title": updated.title,
            "assigned_to": updated.assigned_to,
            "status": updated.status,
        },
    })))
}

/// Forward a feedback item to a vendor with a response deadline.
///
/// Not idempotent: repeating the call overwrites the previous vendor
/// assignment and due date. The status update and the instruction comment
/// are committed atomically.
async fn forward_vendor(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Json(request): Json<ForwardVendorRequest>,
) -> AppResult<Json<ForwardVendorResponse>> {
    require_role(&user, Role::Hr)?;

    let mut errors = Vec::new();
    if request.vendor_id.trim().is_empty() {
        errors.push(FieldError::new("vendor_id", "must not be empty"));
    }
    if request.message.trim().is_empty() {
        errors.push(FieldError::new("message", "must not be empty"));
    }
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    FeedbackRepository::find_by_id(&state.db, &id)
        .await?
        .ok_or_else(|| AppError::NotFound("Feedback".to_string()))?;

    let due_days = request.due_days.unwrap_or(7);
    let due_at = Utc::now().naive_utc() + Duration::days(due_days);

    let mut tx = state.db.begin().await.map_err(AppError::Database)?;

    let updated =
        FeedbackRepository::forward_to_vendor(&mut *tx, &id, request.vendor_id.trim(), due_at)
            .await?;

    // The instructions sent to the vendor become part of the internal thread.
    CommentRepository::create(
        &mut *tx,
        CreateComment {
            feedback_id: id.clone(),
            user_id: user.id.clone(),
            comment: request.message.trim().to_string(),
            is_internal: true,
        },
    )
    .await?;

    tx.commit().await.map_err(AppError::Database)?;

    tracing::info!(
        "Feedback {} forwarded to vendor {} (due {})",
        id,
        request.vendor_id.trim(),
        due_at
    );

    Ok(Json(ForwardVendorResponse {
        message: "Forwarded to vendor",
        vendor_due_at: due_at,
        vendor_status: updated.vendor_status,
    }))
}

/// Escalate a forwarded item to superadmin review.
async fn request_approval(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Json(request): Json<RequestApprovalRequest>,
) -> AppResult<Json<VendorStatusResponse>> {
    require_role(&user, Role::Hr)?;

    let feedback = FeedbackRepository::find_by_id(&state.db, &id)
        .await?
        .ok_or_else(|| AppError::NotFound("Feedback".to_string()))?;

    if !matches!(
        feedback.vendor_status,
        VendorStatus::Forwarded | VendorStatus::VendorReplied
    ) {
        return Err(AppError::forbidden(
            "Vendor reply required before superadmin review",
        ));
    }

    let message = request
        .message
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty());

    let now = Utc::now().naive_utc();
    let mut tx = state.db.begin().await.map_err(AppError::Database)?;

    let updated = FeedbackRepository::set_vendor_status(
        &mut *tx,
        &id,
        VendorStatus::AwaitingSuperadmin,
        Some(now),
    )
    .await?;

    AuditLogRepository::create(
        &mut *tx,
        CreateAuditLog::feedback(
            &user.id,
            "REQUEST_SUPERADMIN_REVIEW",
            &id,
            Some(match message {
                Some(m) => format!("Requested superadmin review with note: {}", m),
                None => "Requested superadmin review".to_string(),
            }),
        ),
    )
    .await?;

    if let Some(message) = message {
        CommentRepository::create(
            &mut *tx,
            CreateComment {
                feedback_id: id.clone(),
                user_id: user.id.clone(),
                comment: message.to_string(),
                is_internal: true,
            },
        )
        .await?;
    }

    tx.commit().await.map_err(AppError::Database)?;

    NotificationService::new(&state)
        .approval_requested(&updated)
        .await?;

    Ok(Json(VendorStatusResponse {
        message: "Sent for superadmin review",
        vendor_status: updated.vendor_status,
    }))
}

async fn list_audit_logs(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Query(query): Query<AuditLogsQuery>,
) -> AppResult<Json<AuditLogsResponse>> {
    require_role(&user, Role::Admin)?;

    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(50).clamp(1, 200);
    let offset = (page - 1) * per_page;

    let logs = AuditLogRepository::list(&state.db, per_page, offset).await?;
    let total = AuditLogRepository::count(&state.db).await?;

    Ok(Json(AuditLogsResponse {
        logs,
        total,
        page,
        per_page,
    }))
}

async fn feedback_stats(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> AppResult<Json<FeedbackStatsResponse>> {
    require_role(&user, Role::Admin)?;

    let now = Utc::now().naive_utc();

    let (by_status, vendor_open, vendor_breached) = tokio::try_join!(
        FeedbackRepository::counts_by_status(&state.db),
        FeedbackRepository::count_vendor_open(&state.db),
        FeedbackRepository::count_vendor_breached(&state.db, now),
    )?;

    Ok(Json(FeedbackStatsResponse {
        by_status,
        vendor_open,
        vendor_breached,
    }))
}

/// Trigger one sweep pass outside the background schedule.
async fn trigger_sweep(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> AppResult<Json<SweepResponse>> {
    require_role(&user, Role::Admin)?;

    let SweepOutcome { warnings, overdue } = sweep::run_vendor_sla_sweep(&state).await;

    Ok(Json(SweepResponse {
        message: "Vendor SLA sweep completed",
        warnings,
        overdue,
    }))
}
