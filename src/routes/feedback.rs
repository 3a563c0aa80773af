use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::SlaConfig;
use crate::db::{
    CreateComment, CreateFeedback, CommentRepository, Feedback, FeedbackCategory, FeedbackFilter,
    FeedbackRepository, FeedbackStatus, Priority, Role, User, UserRepository, VendorStatus,
};
use crate::error::{AppError, AppResult, FieldError};
use crate::routes::auth::{require_role, AuthUser};
use crate::services::notify::NotificationService;
use crate::services::sla::{self, SlaState};
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_feedback).post(create_feedback))
        .route(
            "/:id",
            get(get_feedback).patch(update_feedback).delete(delete_feedback),
        )
        .route("/:id/status", patch(update_status))
        .route("/:id/comments", get(list_comments).post(add_comment))
        .route("/:id/vendor-thread", get(vendor_thread).post(post_vendor_thread))
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ListFeedbackQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub status: Option<String>,
    pub category: Option<String>,
    pub priority: Option<String>,
    pub my_feedback: Option<bool>,
    pub my_assigned: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct CreateFeedbackRequest {
    pub title: String,
    pub description: String,
    pub category: Option<String>,
    pub priority: Option<String>,
    pub is_anonymous: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateFeedbackRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
    pub assigned_to: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddCommentRequest {
    pub comment: String,
    pub is_internal: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct FeedbackResponse {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: FeedbackCategory,
    pub status: FeedbackStatus,
    pub priority: Priority,
    pub ai_analysis: Option<String>,
    pub sla_status: SlaState,
    pub sla_seconds_to_breach: Option<i64>,
    pub sla_seconds_since_breach: Option<i64>,
    pub vendor_status: VendorStatus,
    pub vendor_sla_status: SlaState,
    pub vendor_due_at: Option<NaiveDateTime>,
    pub vendor_last_response_at: Option<NaiveDateTime>,
    pub vendor_assigned_to: Option<String>,
    pub is_anonymous: bool,
    pub submitted_by: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_by_name: Option<String>,
    pub assigned_to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to_name: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl FeedbackResponse {
    /// Project a feedback row plus its derived SLA signals.
    pub fn build(feedback: &Feedback, cfg: &SlaConfig) -> Self {
        let now = Utc::now().naive_utc();
        let meta = sla::feedback_sla(feedback, now, cfg);
        let vendor_sla_status = sla::vendor_sla(feedback, now, cfg);

        FeedbackResponse {
            id: feedback.id.clone(),
            title: feedback.title.clone(),
            description: feedback.description.clone(),
            category: feedback.category,
            status: feedback.status,
            priority: feedback.priority,
            ai_analysis: feedback.ai_analysis.clone(),
            sla_status: meta.status,
            sla_seconds_to_breach: meta.seconds_to_breach,
            sla_seconds_since_breach: meta.seconds_since_breach,
            vendor_status: feedback.vendor_status,
            vendor_sla_status,
            vendor_due_at: feedback.vendor_due_at,
            vendor_last_response_at: feedback.vendor_last_response_at,
            vendor_assigned_to: feedback.vendor_assigned_to.clone(),
            is_anonymous: feedback.is_anonymous,
            submitted_by: feedback.submitted_by.clone(),
            submitted_by_name: None,
            assigned_to: feedback.assigned_to.clone(),
            assigned_to_name: None,
            created_at: feedback.created_at,
            updated_at: feedback.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FeedbackListResponse {
    pub feedback: Vec<FeedbackResponse>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
}

#[derive(Debug, Serialize)]
pub struct CommentsResponse {
    pub comments: Vec<crate::db::FeedbackComment>,
    pub total: usize,
}

// ============================================================================
// Helpers
// ============================================================================

fn parse_field<T>(raw: Option<&str>, field: &str) -> AppResult<Option<T>>
where
    T: std::str::FromStr<Err = String>,
{
    raw.map(|s| {
        s.parse()
            .map_err(|_| AppError::validation(field, "unknown value"))
    })
    .transpose()
}

/// Submitter, HR+ staff, or the assigned vendor.
fn ensure_can_view(user: &User, feedback: &Feedback) -> AppResult<()> {
    if feedback.submitted_by == user.id || user.has_role(Role::Hr) {
        return Ok(());
    }
    if user.role == Role::Vendor
        && feedback.vendor_assigned_to.as_deref() == Some(user.id.as_str())
    {
        return Ok(());
    }
    Err(AppError::forbidden("Access denied"))
}

/// The internal vendor/superadmin conversation: HR+ staff or the assigned
/// vendor.
fn ensure_thread_access(user: &User, feedback: &Feedback) -> AppResult<()> {
    if user.has_role(Role::Hr) {
        return Ok(());
    }
    if user.role == Role::Vendor
        && feedback.vendor_assigned_to.as_deref() == Some(user.id.as_str())
    {
        return Ok(());
    }
    Err(AppError::forbidden("Not permitted"))
}

async fn load_feedback(state: &AppState, id: &str) -> AppResult<Feedback> {
    FeedbackRepository::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Feedback".to_string()))
}

// ============================================================================
// Handlers
// ============================================================================

/// Role-scoped feedback listing with derived SLA fields.
async fn list_feedback(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Query(query): Query<ListFeedbackQuery>,
) -> AppResult<Json<FeedbackListResponse>> {
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1) * per_page;

    let mut filter = FeedbackFilter {
        status: parse_field(query.status.as_deref(), "status")?,
        category: parse_field(query.category.as_deref(), "category")?,
        priority: parse_field(query.priority.as_deref(), "priority")?,
        ..Default::default()
    };

    // Visibility: explicit flags first, then the role default. Employees only
    // ever see their own items; HR/ADMIN default to their triage queue;
    // superadmins see everything.
    if query.my_feedback.unwrap_or(false) {
        filter.submitted_by = Some(user.id.clone());
    } else if query.my_assigned.unwrap_or(false) {
        filter.assigned_to = Some(user.id.clone());
    } else {
        match user.role {
            Role::Superadmin => {}
            Role::Hr | Role::Admin => filter.assigned_to = Some(user.id.clone()),
            _ => filter.submitted_by = Some(user.id.clone()),
        }
    }

    let items = FeedbackRepository::list(&state.db, &filter, per_page, offset).await?;
    let total = FeedbackRepository::count(&state.db, &filter).await?;

    let feedback = items
        .iter()
        .map(|f| FeedbackResponse::build(f, &state.config.sla))
        .collect();

    Ok(Json(FeedbackListResponse {
        feedback,
        total,
        page,
        per_page,
    }))
}

/// Submit a new feedback item; auto-assigns a triage owner.
async fn create_feedback(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(request): Json<CreateFeedbackRequest>,
) -> AppResult<(StatusCode, Json<FeedbackResponse>)> {
    let mut errors = Vec::new();
    if request.title.trim().is_empty() {
        errors.push(FieldError::new("title", "must not be empty"));
    }
    if request.title.len() > 255 {
        errors.push(FieldError::new("title", "must be at most 255 characters"));
    }
    if request.description.trim().is_empty() {
        errors.push(FieldError::new("description", "must not be empty"));
    }
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let category = parse_field(request.category.as_deref(), "category")?
        .unwrap_or(FeedbackCategory::General);
    let priority =
        parse_field(request.priority.as_deref(), "priority")?.unwrap_or(Priority::Medium);

    // Deterministic triage pick: the first active staff member, preferring HR.
    let mut assignee = None;
    for role in [Role::Hr, Role::Admin, Role::Superadmin] {
        assignee = UserRepository::first_active_with_role(&state.db, role).await?;
        if assignee.is_some() {
            break;
        }
    }

    let feedback = FeedbackRepository::create(
        &state.db,
        CreateFeedback {
            title: request.title.trim().to_string(),
            description: request.description.trim().to_string(),
            category,
            priority,
            is_anonymous: request.is_anonymous.unwrap_or(false),
            submitted_by: user.id.clone(),
            assigned_to: assignee.as_ref().map(|u| u.id.clone()),
        },
    )
    .await?;

    if let Some(assignee) = &assignee {
        NotificationService::new(&state)
            .assigned(&feedback, assignee)
            .await?;
    }

    tracing::info!("Feedback {} submitted by {}", feedback.id, user.id);

    Ok((
        StatusCode::CREATED,
        Json(FeedbackResponse::build(&feedback, &state.config.sla)),
    ))
}

async fn get_feedback(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<FeedbackResponse>> {
    let feedback = load_feedback(&state, &id).await?;
    ensure_can_view(&user, &feedback)?;

    let mut response = FeedbackResponse::build(&feedback, &state.config.sla);

    if !feedback.is_anonymous {
        response.submitted_by_name = UserRepository::find_by_id(&state.db, &feedback.submitted_by)
            .await?
            .map(|u| u.full_name);
    }
    if let Some(assignee_id) = &feedback.assigned_to {
        response.assigned_to_name = UserRepository::find_by_id(&state.db, assignee_id)
            .await?
            .map(|u| u.full_name);
    }

    Ok(Json(response))
}

/// Content edit by the submitter; blocked once the item is settled.
async fn update_feedback(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Json(request): Json<UpdateFeedbackRequest>,
) -> AppResult<Json<FeedbackResponse>> {
    let feedback = load_feedback(&state, &id).await?;

    if feedback.submitted_by != user.id {
        return Err(AppError::forbidden("Only submitter can update"));
    }
    if feedback.status.is_settled() {
        return Err(AppError::forbidden("Cannot update resolved or closed feedback"));
    }

    let mut errors = Vec::new();
    if matches!(&request.title, Some(t) if t.trim().is_empty() || t.len() > 255) {
        errors.push(FieldError::new("title", "must be 1-255 characters"));
    }
    if matches!(&request.description, Some(d) if d.trim().is_empty()) {
        errors.push(FieldError::new("description", "must not be empty"));
    }
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let category = parse_field(request.category.as_deref(), "category")?;

    let updated = FeedbackRepository::update_content(
        &state.db,
        &id,
        request.title.as_deref(),
        request.description.as_deref(),
        category,
    )
    .await?;

    Ok(Json(FeedbackResponse::build(&updated, &state.config.sla)))
}

async fn delete_feedback(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    let feedback = load_feedback(&state, &id).await?;

    if feedback.submitted_by != user.id && !user.has_role(Role::Admin) {
        return Err(AppError::forbidden("Insufficient permissions"));
    }

    FeedbackRepository::delete(&state.db, &id).await?;

    Ok(Json(serde_json::json!({ "message": "Feedback deleted successfully" })))
}

/// HR status transition. Arbitrary jumps are allowed; the submitter is
/// notified, and an explicitly supplied assignee is notified and emailed.
async fn update_status(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Json(request): Json<UpdateStatusRequest>,
) -> AppResult<Json<FeedbackResponse>> {
    require_role(&user, Role::Hr)?;

    let status: FeedbackStatus = request
        .status
        .parse()
        .map_err(|_| AppError::validation("status", "unknown value"))?;

    load_feedback(&state, &id).await?;

    let updated =
        FeedbackRepository::set_status(&state.db, &id, status, request.assigned_to.as_deref())
            .await?;

    let notifier = NotificationService::new(&state);
    notifier.status_changed(&updated).await?;

    if let Some(assignee_id) = &request.assigned_to {
        if let Some(assignee) = UserRepository::find_by_id(&state.db, assignee_id).await? {
            notifier.assigned(&updated, &assignee).await?;
        }
    }

    Ok(Json(FeedbackResponse::build(&updated, &state.config.sla)))
}

/// Comments visible to the caller: the submitter sees the public thread, HR+
/// see everything.
async fn list_comments(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<CommentsResponse>> {
    let feedback = load_feedback(&state, &id).await?;

    if feedback.submitted_by != user.id && !user.has_role(Role::Hr) {
        return Err(AppError::forbidden("Access denied"));
    }

    let include_internal = user.has_role(Role::Hr);
    let comments =
        CommentRepository::list_for_feedback(&state.db, &id, include_internal).await?;

    let total = comments.len();
    Ok(Json(CommentsResponse { comments, total }))
}

async fn add_comment(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Json(request): Json<AddCommentRequest>,
) -> AppResult<(StatusCode, Json<crate::db::FeedbackComment>)> {
    let feedback = load_feedback(&state, &id).await?;

    if feedback.submitted_by != user.id && !user.has_role(Role::Hr) {
        return Err(AppError::forbidden("Access denied"));
    }

    if request.comment.trim().is_empty() {
        return Err(AppError::validation("comment", "must not be empty"));
    }

    // Only staff may hide a comment from the submitter.
    let is_internal = request.is_internal.unwrap_or(false) && user.has_role(Role::Hr);

    let comment = CommentRepository::create(
        &state.db,
        CreateComment {
            feedback_id: id,
            user_id: user.id,
            comment: request.comment.trim().to_string(),
            is_internal,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(comment)))
}

/// The internal-comment conversation between HR, the vendor and superadmins.
async fn vendor_thread(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<CommentsResponse>> {
    let feedback = load_feedback(&state, &id).await?;
    ensure_thread_access(&user, &feedback)?;

    let comments = CommentRepository::list_internal(&state.db, &id).await?;

    let total = comments.len();
    Ok(Json(CommentsResponse { comments, total }))
}

async fn post_vendor_thread(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Json(request): Json<AddCommentRequest>,
) -> AppResult<(StatusCode, Json<crate::db::FeedbackComment>)> {
    let feedback = load_feedback(&state, &id).await?;
    ensure_thread_access(&user, &feedback)?;

    if request.comment.trim().is_empty() {
        return Err(AppError::validation("comment", "must not be empty"));
    }

    let comment = CommentRepository::create(
        &state.db,
        CreateComment {
            feedback_id: id,
            user_id: user.id,
            comment: request.comment.trim().to_string(),
            is_internal: true,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(comment)))
}
