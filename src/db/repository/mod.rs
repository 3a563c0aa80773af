pub mod audit;
pub mod comment;
pub mod feedback;
pub mod notification;
pub mod user;

pub use audit::AuditLogRepository;
pub use comment::CommentRepository;
pub use feedback::FeedbackRepository;
pub use notification::NotificationRepository;
pub use user::UserRepository;

use crate::error::{AppError, AppResult};

/// Decode a TEXT enum column, surfacing corrupt values as internal errors.
pub(crate) fn parse_enum<T>(raw: String, column: &str) -> AppResult<T>
where
    T: std::str::FromStr<Err = String>,
{
    raw.parse()
        .map_err(|e: String| AppError::Internal(anyhow::anyhow!("column {}: {}", column, e)))
}
