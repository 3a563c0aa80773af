use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeedbackStatus {
    Submitted,
    UnderReview,
    InProgress,
    Resolved,
    Closed,
}

impl FeedbackStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackStatus::Submitted => "SUBMITTED",
            FeedbackStatus::UnderReview => "UNDER_REVIEW",
            FeedbackStatus::InProgress => "IN_PROGRESS",
            FeedbackStatus::Resolved => "RESOLVED",
            FeedbackStatus::Closed => "CLOSED",
        }
    }

    /// Content edits by the submitter are blocked once the item is settled.
    pub fn is_settled(&self) -> bool {
        matches!(self, FeedbackStatus::Resolved | FeedbackStatus::Closed)
    }
}

impl std::str::FromStr for FeedbackStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SUBMITTED" => Ok(FeedbackStatus::Submitted),
            "UNDER_REVIEW" => Ok(FeedbackStatus::UnderReview),
            "IN_PROGRESS" => Ok(FeedbackStatus::InProgress),
            "RESOLVED" => Ok(FeedbackStatus::Resolved),
            "CLOSED" => Ok(FeedbackStatus::Closed),
            other => Err(format!("unknown feedback status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeedbackCategory {
    General,
    Workplace,
    Management,
    Benefits,
    Culture,
    Other,
}

impl FeedbackCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackCategory::General => "GENERAL",
            FeedbackCategory::Workplace => "WORKPLACE",
            FeedbackCategory::Management => "MANAGEMENT",
            FeedbackCategory::Benefits => "BENEFITS",
            FeedbackCategory::Culture => "CULTURE",
            FeedbackCategory::Other => "OTHER",
        }
    }
}

impl std::str::FromStr for FeedbackCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GENERAL" => Ok(FeedbackCategory::General),
            "WORKPLACE" => Ok(FeedbackCategory::Workplace),
            "MANAGEMENT" => Ok(FeedbackCategory::Management),
            "BENEFITS" => Ok(FeedbackCategory::Benefits),
            "CULTURE" => Ok(FeedbackCategory::Culture),
            "OTHER" => Ok(FeedbackCategory::Other),
            other => Err(format!("unknown feedback category: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "LOW",
            Priority::Medium => "MEDIUM",
            Priority::High => "HIGH",
            Priority::Urgent => "URGENT",
        }
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LOW" => Ok(Priority::Low),
            "MEDIUM" => Ok(Priority::Medium),
            "HIGH" => Ok(Priority::High),
            "URGENT" => Ok(Priority::Urgent),
            other => Err(format!("unknown priority: {}", other)),
        }
    }
}

/// Vendor escalation state of a feedback item.
///
/// NONE until the item is forwarded; APPROVED and REJECTED are terminal for
/// SLA purposes (the sweep and the derived vendor SLA ignore settled items).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VendorStatus {
    None,
    Forwarded,
    VendorReplied,
    AwaitingSuperadmin,
    Approved,
    Rejected,
    PastDue,
}

impl VendorStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VendorStatus::None => "NONE",
            VendorStatus::Forwarded => "FORWARDED",
            VendorStatus::VendorReplied => "VENDOR_REPLIED",
            VendorStatus::AwaitingSuperadmin => "AWAITING_SUPERADMIN",
            VendorStatus::Approved => "APPROVED",
            VendorStatus::Rejected => "REJECTED",
            VendorStatus::PastDue => "PAST_DUE",
        }
    }

    /// A superadmin decision closes the escalation.
    pub fn is_settled(&self) -> bool {
        matches!(self, VendorStatus::Approved | VendorStatus::Rejected)
    }
}

impl std::str::FromStr for VendorStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NONE" => Ok(VendorStatus::None),
            "FORWARDED" => Ok(VendorStatus::Forwarded),
            "VENDOR_REPLIED" => Ok(VendorStatus::VendorReplied),
            "AWAITING_SUPERADMIN" => Ok(VendorStatus::AwaitingSuperadmin),
            "APPROVED" => Ok(VendorStatus::Approved),
            "REJECTED" => Ok(VendorStatus::Rejected),
            "PAST_DUE" => Ok(VendorStatus::PastDue),
            other => Err(format!("unknown vendor status: {}", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Feedback {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: FeedbackCategory,
    pub status: FeedbackStatus,
    pub priority: Priority,
    pub is_anonymous: bool,
    /// Populated by the external AI pipeline; never written by this service.
    pub ai_analysis: Option<String>,
    pub submitted_by: String,
    pub assigned_to: Option<String>,
    pub vendor_assigned_to: Option<String>,
    pub vendor_status: VendorStatus,
    pub vendor_due_at: Option<NaiveDateTime>,
    pub vendor_last_response_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Fields required to insert a new feedback row.
pub struct CreateFeedback {
    pub title: String,
    pub description: String,
    pub category: FeedbackCategory,
    pub priority: Priority,
    pub is_anonymous: bool,
    pub submitted_by: String,
    pub assigned_to: Option<String>,
}

/// Optional listing filters; unset fields are ignored.
#[derive(Default)]
pub struct FeedbackFilter {
    pub status: Option<FeedbackStatus>,
    pub category: Option<FeedbackCategory>,
    pub priority: Option<Priority>,
    pub submitted_by: Option<String>,
    pub assigned_to: Option<String>,
}
