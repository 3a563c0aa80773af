use chrono::NaiveDateTime;
use serde::Serialize;

/// Append-only audit trail entry. Written on assignment and on every
/// superadmin approval-workflow event.
#[derive(Debug, Clone, Serialize)]
pub struct AuditLog {
    pub id: String,
    pub user_id: String,
    pub action: String,
    pub entity_type: String,
    pub entity_id: String,
    pub details: Option<String>,
    pub created_at: NaiveDateTime,
}

pub struct CreateAuditLog {
    pub user_id: String,
    pub action: String,
    pub entity_type: String,
    pub entity_id: String,
    pub details: Option<String>,
}

impl CreateAuditLog {
    pub fn feedback(user_id: &str, action: &str, feedback_id: &str, details: Option<String>) -> Self {
        CreateAuditLog {
            user_id: user_id.to_string(),
            action: action.to_string(),
            entity_type: "feedback".to_string(),
            entity_id: feedback_id.to_string(),
            details,
        }
    }
}
