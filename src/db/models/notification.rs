use chrono::NaiveDateTime;
use serde::Serialize;

/// Notification categories surfaced to the SPA.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Feedback,
    VendorReply,
    SuperadminReview,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Feedback => "FEEDBACK",
            NotificationKind::VendorReply => "VENDOR_REPLY",
            NotificationKind::SuperadminReview => "SUPERADMIN_REVIEW",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub id: String,
    pub user_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub message: String,
    pub related_entity_type: Option<String>,
    pub related_entity_id: Option<String>,
    pub is_read: bool,
    pub created_at: NaiveDateTime,
}

pub struct CreateNotification {
    pub user_id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub related_entity_type: Option<String>,
    pub related_entity_id: Option<String>,
}

impl CreateNotification {
    /// Notification attached to a feedback item.
    pub fn feedback(user_id: &str, kind: NotificationKind, title: &str, message: String) -> Self {
        CreateNotification {
            user_id: user_id.to_string(),
            kind,
            title: title.to_string(),
            message,
            related_entity_type: Some("feedback".to_string()),
            related_entity_id: None,
        }
    }

    pub fn entity_id(mut self, id: &str) -> Self {
        self.related_entity_id = Some(id.to_string());
        self
    }
}
