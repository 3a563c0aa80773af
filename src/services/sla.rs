//! Derived SLA state.
//!
//! Both breach signals — the general feedback SLA and the vendor escalation
//! SLA — are computed through the same deadline-window evaluator and share one
//! tagged state instead of duplicating threshold logic per call site. Nothing
//! here is persisted; callers evaluate against the current clock.

use chrono::{Duration, NaiveDateTime};
use serde::Serialize;

use crate::config::SlaConfig;
use crate::db::models::{Feedback, FeedbackStatus, Priority};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SlaState {
    Normal,
    #[serde(rename = "WARNING")]
    WarningWindow,
    Breached,
}

impl SlaState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlaState::Normal => "NORMAL",
            SlaState::WarningWindow => "WARNING",
            SlaState::Breached => "BREACHED",
        }
    }
}

/// SLA state plus countdown metadata for the API surface.
#[derive(Debug, Clone, Serialize)]
pub struct SlaMeta {
    pub status: SlaState,
    pub seconds_to_breach: Option<i64>,
    pub seconds_since_breach: Option<i64>,
}

impl SlaMeta {
    fn normal() -> Self {
        SlaMeta {
            status: SlaState::Normal,
            seconds_to_breach: None,
            seconds_since_breach: None,
        }
    }
}

/// Core evaluator: a hard breach deadline, an optional earlier warning
/// threshold, or both. Breach wins over warning.
fn deadline_state(
    now: NaiveDateTime,
    breach_at: Option<NaiveDateTime>,
    warn_at: Option<NaiveDateTime>,
) -> SlaState {
    if let Some(breach_at) = breach_at {
        if now >= breach_at {
            return SlaState::Breached;
        }
    }
    if let Some(warn_at) = warn_at {
        if now >= warn_at {
            return SlaState::WarningWindow;
        }
    }
    SlaState::Normal
}

fn meta_against(now: NaiveDateTime, deadline: NaiveDateTime, status: SlaState) -> SlaMeta {
    let elapsed = (now - deadline).num_seconds();
    if status == SlaState::Normal {
        SlaMeta {
            status,
            seconds_to_breach: Some((-elapsed).max(0)),
            seconds_since_breach: Some(0),
        }
    } else {
        SlaMeta {
            status,
            seconds_to_breach: Some(0),
            seconds_since_breach: Some(elapsed.max(0)),
        }
    }
}

/// General feedback SLA. Two windows are tracked: URGENT items still sitting
/// in SUBMITTED breach after `urgent_response_hours`; UNDER_REVIEW items with
/// no update for `under_review_days` enter the warning window.
pub fn feedback_sla(feedback: &Feedback, now: NaiveDateTime, cfg: &SlaConfig) -> SlaMeta {
    if feedback.priority == Priority::Urgent && feedback.status == FeedbackStatus::Submitted {
        let breach_at = feedback.created_at + Duration::hours(cfg.urgent_response_hours);
        let status = deadline_state(now, Some(breach_at), None);
        return meta_against(now, breach_at, status);
    }

    if feedback.status == FeedbackStatus::UnderReview {
        let warn_at = feedback.updated_at + Duration::days(cfg.under_review_days);
        let status = deadline_state(now, None, Some(warn_at));
        return meta_against(now, warn_at, status);
    }

    SlaMeta::normal()
}

/// Vendor escalation SLA. Normal until a vendor and due date are set or once
/// a superadmin decision settles the escalation; breached past the due date;
/// in the warning window when the due date is near and the vendor has not
/// responded yet.
pub fn vendor_sla(feedback: &Feedback, now: NaiveDateTime, cfg: &SlaConfig) -> SlaState {
    let due_at = match (feedback.vendor_due_at, feedback.vendor_assigned_to.as_deref()) {
        (Some(due_at), Some(_)) => due_at,
        _ => return SlaState::Normal,
    };

    if feedback.vendor_status.is_settled() {
        return SlaState::Normal;
    }

    let warn_at = feedback
        .vendor_last_response_at
        .is_none()
        .then(|| due_at - Duration::days(cfg.vendor_warn_days));

    deadline_state(now, Some(due_at), warn_at)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{FeedbackCategory, VendorStatus};
    use chrono::Utc;

    fn cfg() -> SlaConfig {
        SlaConfig {
            urgent_response_hours: 12,
            under_review_days: 3,
            vendor_warn_days: 5,
            sweep_interval_seconds: 3600,
        }
    }

    fn item(created_hours_ago: i64) -> Feedback {
        let now = Utc::now().naive_utc();
        let created = now - Duration::hours(created_hours_ago);
        Feedback {
            id: "f1".to_string(),
            title: "Broken chair".to_string(),
            description: "The chair in room 4 is broken".to_string(),
            category: FeedbackCategory::Workplace,
            status: FeedbackStatus::Submitted,
            priority: Priority::Medium,
            is_anonymous: false,
            ai_analysis: None,
            submitted_by: "u1".to_string(),
            assigned_to: None,
            vendor_assigned_to: None,
            vendor_status: VendorStatus::None,
            vendor_due_at: None,
            vendor_last_response_at: None,
            created_at: created,
            updated_at: created,
        }
    }

    #[test]
    fn urgent_submitted_breaches_after_threshold() {
        let now = Utc::now().naive_utc();
        let mut f = item(13);
        f.priority = Priority::Urgent;

        let meta = feedback_sla(&f, now, &cfg());
        assert_eq!(meta.status, SlaState::Breached);
        assert_eq!(meta.seconds_to_breach, Some(0));
        assert!(meta.seconds_since_breach.unwrap() >= 3600);
    }

    #[test]
    fn urgent_submitted_counts_down_before_breach() {
        let now = Utc::now().naive_utc();
        let mut f = item(10);
        f.priority = Priority::Urgent;

        let meta = feedback_sla(&f, now, &cfg());
        assert_eq!(meta.status, SlaState::Normal);
        let to_breach = meta.seconds_to_breach.unwrap();
        assert!(to_breach > 0 && to_breach <= 2 * 3600);
    }

    #[test]
    fn stale_review_enters_warning_window() {
        let now = Utc::now().naive_utc();
        let mut f = item(4 * 24);
        f.status = FeedbackStatus::UnderReview;

        let meta = feedback_sla(&f, now, &cfg());
        assert_eq!(meta.status, SlaState::WarningWindow);
    }

    #[test]
    fn non_urgent_submitted_has_no_window() {
        let now = Utc::now().naive_utc();
        let f = item(100 * 24);

        let meta = feedback_sla(&f, now, &cfg());
        assert_eq!(meta.status, SlaState::Normal);
        assert_eq!(meta.seconds_to_breach, None);
        assert_eq!(meta.seconds_since_breach, None);
    }

    #[test]
    fn vendor_overdue_is_breached() {
        let now = Utc::now().naive_utc();
        let mut f = item(48);
        f.vendor_assigned_to = Some("v1".to_string());
        f.vendor_status = VendorStatus::Forwarded;
        f.vendor_due_at = Some(now - Duration::hours(1));

        assert_eq!(vendor_sla(&f, now, &cfg()), SlaState::Breached);
    }

    #[test]
    fn vendor_near_due_without_response_warns() {
        let now = Utc::now().naive_utc();
        let mut f = item(48);
        f.vendor_assigned_to = Some("v1".to_string());
        f.vendor_status = VendorStatus::Forwarded;
        f.vendor_due_at = Some(now + Duration::days(2));

        assert_eq!(vendor_sla(&f, now, &cfg()), SlaState::WarningWindow);
    }

    #[test]
    fn vendor_near_due_with_response_stays_normal() {
        let now = Utc::now().naive_utc();
        let mut f = item(48);
        f.vendor_assigned_to = Some("v1".to_string());
        f.vendor_status = VendorStatus::VendorReplied;
        f.vendor_due_at = Some(now + Duration::days(2));
        f.vendor_last_response_at = Some(now - Duration::hours(3));

        assert_eq!(vendor_sla(&f, now, &cfg()), SlaState::Normal);
    }

    #[test]
    fn settled_vendor_status_is_never_breached() {
        let now = Utc::now().naive_utc();
        for status in [VendorStatus::Approved, VendorStatus::Rejected] {
            let mut f = item(48);
            f.vendor_assigned_to = Some("v1".to_string());
            f.vendor_status = status;
            f.vendor_due_at = Some(now - Duration::days(2));

            assert_eq!(vendor_sla(&f, now, &cfg()), SlaState::Normal);
        }
    }

    #[test]
    fn unassigned_vendor_fields_are_normal() {
        let now = Utc::now().naive_utc();
        let f = item(48);
        assert_eq!(vendor_sla(&f, now, &cfg()), SlaState::Normal);
    }
}
