mod common;

use chrono::{Duration, Utc};

use common::{create_user, test_state};
use staffpulse::db::{
    CreateFeedback, FeedbackCategory, FeedbackRepository, NotificationRepository, Priority, Role,
    VendorStatus,
};
use staffpulse::services::sweep::run_vendor_sla_sweep;

async fn seed_forwarded_item(
    state: &staffpulse::AppState,
    due_offset: Duration,
) -> (staffpulse::db::Feedback, String, String) {
    let employee = create_user(state, "emp@example.com", "Emp One", Role::Employee).await;
    let hr = create_user(state, "hr@example.com", "HR One", Role::Hr).await;
    let vendor = create_user(state, "vendor@example.com", "Vendor One", Role::Vendor).await;

    let feedback = FeedbackRepository::create(
        &state.db,
        CreateFeedback {
            title: "Server room AC".to_string(),
            description: "Temperature alarms every night".to_string(),
            category: FeedbackCategory::Workplace,
            priority: Priority::High,
            is_anonymous: false,
            submitted_by: employee.id.clone(),
            assigned_to: Some(hr.id.clone()),
        },
    )
    .await
    .unwrap();

    let due_at = Utc::now().naive_utc() + due_offset;
    let forwarded =
        FeedbackRepository::forward_to_vendor(&state.db, &feedback.id, &vendor.id, due_at)
            .await
            .unwrap();

    (forwarded, vendor.id, hr.id)
}

/// Overdue item: one sweep flips it to PAST_DUE and notifies the vendor and
/// the assignee; a second sweep is a no-op.
#[tokio::test]
async fn overdue_item_is_flagged_once() {
    let state = test_state().await;
    let (feedback, vendor_id, assignee_id) =
        seed_forwarded_item(&state, Duration::hours(-1)).await;

    let outcome = run_vendor_sla_sweep(&state).await;
    assert_eq!(outcome.overdue, 1);
    assert_eq!(outcome.warnings, 0);

    let updated = FeedbackRepository::find_by_id(&state.db, &feedback.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.vendor_status, VendorStatus::PastDue);

    for user_id in [&vendor_id, &assignee_id] {
        let notifications = NotificationRepository::list_for_user(&state.db, user_id, false, 50, 0)
            .await
            .unwrap();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].title, "Vendor task overdue");
    }

    // Re-running must not duplicate the breach notifications.
    let outcome = run_vendor_sla_sweep(&state).await;
    assert_eq!(outcome.overdue, 0);

    for user_id in [&vendor_id, &assignee_id] {
        let count = NotificationRepository::count_for_user(&state.db, user_id)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }
}

/// Near-due item with no vendor response: warned, but no status change.
#[tokio::test]
async fn near_due_item_warns_without_status_change() {
    let state = test_state().await;
    let (feedback, vendor_id, assignee_id) =
        seed_forwarded_item(&state, Duration::days(2)).await;

    let outcome = run_vendor_sla_sweep(&state).await;
    assert_eq!(outcome.warnings, 1);
    assert_eq!(outcome.overdue, 0);

    let updated = FeedbackRepository::find_by_id(&state.db, &feedback.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.vendor_status, VendorStatus::Forwarded);

    for user_id in [&vendor_id, &assignee_id] {
        let notifications = NotificationRepository::list_for_user(&state.db, user_id, false, 50, 0)
            .await
            .unwrap();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].title, "Vendor response pending");
    }
}

/// An item whose vendor already responded is not warned.
#[tokio::test]
async fn responded_item_is_not_warned() {
    let state = test_state().await;
    let (feedback, vendor_id, _) = seed_forwarded_item(&state, Duration::days(2)).await;

    FeedbackRepository::set_vendor_status(
        &state.db,
        &feedback.id,
        VendorStatus::VendorReplied,
        Some(Utc::now().naive_utc()),
    )
    .await
    .unwrap();

    let outcome = run_vendor_sla_sweep(&state).await;
    assert_eq!(outcome.warnings, 0);
    assert_eq!(outcome.overdue, 0);

    let count = NotificationRepository::count_for_user(&state.db, &vendor_id)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

/// Settled escalations are ignored even when the due date has passed.
#[tokio::test]
async fn settled_items_are_ignored() {
    let state = test_state().await;
    let (feedback, vendor_id, _) = seed_forwarded_item(&state, Duration::hours(-3)).await;

    FeedbackRepository::set_vendor_status(
        &state.db,
        &feedback.id,
        VendorStatus::Approved,
        Some(Utc::now().naive_utc()),
    )
    .await
    .unwrap();

    let outcome = run_vendor_sla_sweep(&state).await;
    assert_eq!(outcome.overdue, 0);
    assert_eq!(outcome.warnings, 0);

    let updated = FeedbackRepository::find_by_id(&state.db, &feedback.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.vendor_status, VendorStatus::Approved);

    let count = NotificationRepository::count_for_user(&state.db, &vendor_id)
        .await
        .unwrap();
    assert_eq!(count, 0);
}
