use chrono::NaiveDateTime;
use serde::Serialize;

/// A comment on a feedback item. Internal comments are hidden from the
/// submitter and carry the HR/vendor/superadmin conversation.
#[derive(Debug, Clone, Serialize)]
pub struct FeedbackComment {
    pub id: String,
    pub feedback_id: String,
    pub user_id: String,
    pub comment: String,
    pub is_internal: bool,
    pub created_at: NaiveDateTime,
}

pub struct CreateComment {
    pub feedback_id: String,
    pub user_id: String,
    pub comment: String,
    pub is_internal: bool,
}
