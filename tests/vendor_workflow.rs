mod common;

use chrono::{NaiveDateTime, Utc};
use http::{Method, StatusCode};
use serde_json::json;

use common::{app, create_user, request, test_state, token_for};
use staffpulse::db::Role;

/// Full escalation path: submit -> forward -> vendor reply -> request
/// approval -> superadmin approve.
#[tokio::test]
async fn escalation_happy_path() {
    let state = test_state().await;
    let app = app(state.clone());

    let employee = create_user(&state, "emp@example.com", "Emp One", Role::Employee).await;
    let hr = create_user(&state, "hr@example.com", "HR One", Role::Hr).await;
    let vendor = create_user(&state, "vendor@example.com", "Vendor One", Role::Vendor).await;
    let superadmin = create_user(&state, "root@example.com", "Root One", Role::Superadmin).await;

    let employee_token = token_for(&state, &employee);
    let hr_token = token_for(&state, &hr);
    let vendor_token = token_for(&state, &vendor);
    let superadmin_token = token_for(&state, &superadmin);

    // Submit
    let (status, body) = request(
        &app,
        Method::POST,
        "/feedback",
        Some(&employee_token),
        Some(json!({ "title": "AC broken in lab", "description": "It has been 30C for days" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "SUBMITTED");
    assert_eq!(body["vendor_status"], "NONE");
    let id = body["id"].as_str().unwrap().to_string();

    // Forward to vendor with a three-day deadline
    let (status, body) = request(
        &app,
        Method::POST,
        &format!("/admin/feedback/{}/forward-vendor", id),
        Some(&hr_token),
        Some(json!({ "vendor_id": vendor.id, "due_days": 3, "message": "Please inspect" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["vendor_status"], "FORWARDED");

    let due_at: NaiveDateTime = serde_json::from_value(body["vendor_due_at"].clone()).unwrap();
    let expected = Utc::now().naive_utc() + chrono::Duration::days(3);
    assert!((due_at - expected).num_seconds().abs() < 60);

    // A superadmin decision is blocked until the vendor has replied
    let (status, body) = request(
        &app,
        Method::POST,
        &format!("/superadmin/feedback/{}/vendor-approve", id),
        Some(&superadmin_token),
        Some(json!({ "action": "approve" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["detail"], "Not awaiting superadmin decision");

    // Vendor replies
    let (status, _) = request(
        &app,
        Method::POST,
        &format!("/vendor/feedback/{}/reply", id),
        Some(&vendor_token),
        Some(json!({ "reply": "Compressor needs replacement, ETA two days" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = request(
        &app,
        Method::GET,
        &format!("/feedback/{}", id),
        Some(&hr_token),
        None,
    )
    .await;
    assert_eq!(body["vendor_status"], "VENDOR_REPLIED");
    assert!(body["vendor_last_response_at"].is_string());

    // The reply landed in the internal thread together with the forward note
    let (_, body) = request(
        &app,
        Method::GET,
        &format!("/feedback/{}/vendor-thread", id),
        Some(&hr_token),
        None,
    )
    .await;
    assert_eq!(body["total"], 2);

    // The vendor reply alerted every superadmin
    let (_, body) = request(
        &app,
        Method::GET,
        "/notifications",
        Some(&superadmin_token),
        None,
    )
    .await;
    assert!(body["unread_count"].as_i64().unwrap() >= 1);

    // HR hands the item to superadmin review
    let (status, body) = request(
        &app,
        Method::POST,
        &format!("/admin/feedback/{}/request-approval", id),
        Some(&hr_token),
        Some(json!({ "message": "Quote looks reasonable" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["vendor_status"], "AWAITING_SUPERADMIN");

    // Superadmin approves
    let (status, body) = request(
        &app,
        Method::POST,
        &format!("/superadmin/feedback/{}/vendor-approve", id),
        Some(&superadmin_token),
        Some(json!({ "action": "approve" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["vendor_status"], "APPROVED");

    // A settled escalation cannot be decided again
    let (status, _) = request(
        &app,
        Method::POST,
        &format!("/superadmin/feedback/{}/vendor-approve", id),
        Some(&superadmin_token),
        Some(json!({ "action": "reject" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn forward_vendor_overwrites_previous_due_date() {
    let state = test_state().await;
    let app = app(state.clone());

    let employee = create_user(&state, "emp@example.com", "Emp One", Role::Employee).await;
    let hr = create_user(&state, "hr@example.com", "HR One", Role::Hr).await;
    let hr_token = token_for(&state, &hr);
    let vendor = create_user(&state, "vendor@example.com", "Vendor One", Role::Vendor).await;

    let employee_token = token_for(&state, &employee);
    let (_, body) = request(
        &app,
        Method::POST,
        "/feedback",
        Some(&employee_token),
        Some(json!({ "title": "Leaky faucet", "description": "Kitchen, 2nd floor" })),
    )
    .await;
    let id = body["id"].as_str().unwrap().to_string();

    let uri = format!("/admin/feedback/{}/forward-vendor", id);
    let (_, body) = request(
        &app,
        Method::POST,
        &uri,
        Some(&hr_token),
        Some(json!({ "vendor_id": vendor.id, "due_days": 3, "message": "First pass" })),
    )
    .await;
    let first_due: NaiveDateTime = serde_json::from_value(body["vendor_due_at"].clone()).unwrap();

    // Re-forwarding is not idempotent: the second due date silently wins.
    let (status, body) = request(
        &app,
        Method::POST,
        &uri,
        Some(&hr_token),
        Some(json!({ "vendor_id": vendor.id, "due_days": 10, "message": "Second pass" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let second_due: NaiveDateTime = serde_json::from_value(body["vendor_due_at"].clone()).unwrap();

    assert!(second_due > first_due);
    assert!((second_due - first_due).num_days() >= 6);

    let (_, body) = request(
        &app,
        Method::GET,
        &format!("/feedback/{}", id),
        Some(&hr_token),
        None,
    )
    .await;
    let stored: NaiveDateTime = serde_json::from_value(body["vendor_due_at"].clone()).unwrap();
    assert_eq!(stored, second_due);
}

#[tokio::test]
async fn forward_vendor_requires_vendor_and_message() {
    let state = test_state().await;
    let app = app(state.clone());

    let employee = create_user(&state, "emp@example.com", "Emp One", Role::Employee).await;
    let hr = create_user(&state, "hr@example.com", "HR One", Role::Hr).await;

    let employee_token = token_for(&state, &employee);
    let hr_token = token_for(&state, &hr);

    let (_, body) = request(
        &app,
        Method::POST,
        "/feedback",
        Some(&employee_token),
        Some(json!({ "title": "Dead lightbulb", "description": "Hallway near exit" })),
    )
    .await;
    let id = body["id"].as_str().unwrap().to_string();

    let (status, body) = request(
        &app,
        Method::POST,
        &format!("/admin/feedback/{}/forward-vendor", id),
        Some(&hr_token),
        Some(json!({ "vendor_id": "", "message": "  " })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["errors"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn vendor_reply_rejected_for_wrong_vendor() {
    let state = test_state().await;
    let app = app(state.clone());

    let employee = create_user(&state, "emp@example.com", "Emp One", Role::Employee).await;
    let hr = create_user(&state, "hr@example.com", "HR One", Role::Hr).await;
    let vendor = create_user(&state, "vendor@example.com", "Vendor One", Role::Vendor).await;
    let other_vendor =
        create_user(&state, "other@example.com", "Vendor Two", Role::Vendor).await;

    let employee_token = token_for(&state, &employee);
    let hr_token = token_for(&state, &hr);

    let (_, body) = request(
        &app,
        Method::POST,
        "/feedback",
        Some(&employee_token),
        Some(json!({ "title": "Projector flickers", "description": "Meeting room B" })),
    )
    .await;
    let id = body["id"].as_str().unwrap().to_string();

    request(
        &app,
        Method::POST,
        &format!("/admin/feedback/{}/forward-vendor", id),
        Some(&hr_token),
        Some(json!({ "vendor_id": vendor.id, "due_days": 5, "message": "Check the cabling" })),
    )
    .await;

    let other_token = token_for(&state, &other_vendor);
    let (status, body) = request(
        &app,
        Method::POST,
        &format!("/vendor/feedback/{}/reply", id),
        Some(&other_token),
        Some(json!({ "reply": "On it" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["detail"], "Not assigned to you");

    // An employee is not a vendor at all
    let (status, _) = request(
        &app,
        Method::POST,
        &format!("/vendor/feedback/{}/reply", id),
        Some(&employee_token),
        Some(json!({ "reply": "On it" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn status_updates_are_hr_gated_and_notify_the_submitter() {
    let state = test_state().await;
    let app = app(state.clone());

    let employee = create_user(&state, "emp@example.com", "Emp One", Role::Employee).await;
    let hr = create_user(&state, "hr@example.com", "HR One", Role::Hr).await;

    let employee_token = token_for(&state, &employee);
    let hr_token = token_for(&state, &hr);

    let (_, body) = request(
        &app,
        Method::POST,
        "/feedback",
        Some(&employee_token),
        Some(json!({ "title": "Parking lot lights", "description": "Half of them are out" })),
    )
    .await;
    let id = body["id"].as_str().unwrap().to_string();

    let uri = format!("/feedback/{}/status", id);

    let (status, _) = request(
        &app,
        Method::PATCH,
        &uri,
        Some(&employee_token),
        Some(json!({ "status": "IN_PROGRESS" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = request(
        &app,
        Method::PATCH,
        &uri,
        Some(&hr_token),
        Some(json!({ "status": "IN_PROGRESS", "assigned_to": hr.id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "IN_PROGRESS");
    assert_eq!(body["sla_status"], "NORMAL");

    // The submitter was told about the transition
    let (_, body) = request(&app, Method::GET, "/notifications", Some(&employee_token), None).await;
    let titles: Vec<&str> = body["notifications"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|n| n["title"].as_str())
        .collect();
    assert!(titles.contains(&"Feedback Status Updated"));

    let (status, _) = request(
        &app,
        Method::PATCH,
        &uri,
        Some(&hr_token),
        Some(json!({ "status": "NOT_A_STATUS" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = request(
        &app,
        Method::PATCH,
        "/feedback/missing-id/status",
        Some(&hr_token),
        Some(json!({ "status": "CLOSED" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn submitter_visibility_and_internal_comments() {
    let state = test_state().await;
    let app = app(state.clone());

    let employee = create_user(&state, "emp@example.com", "Emp One", Role::Employee).await;
    let hr = create_user(&state, "hr@example.com", "HR One", Role::Hr).await;
    let outsider = create_user(&state, "other@example.com", "Emp Two", Role::Employee).await;

    let employee_token = token_for(&state, &employee);
    let hr_token = token_for(&state, &hr);
    let outsider_token = token_for(&state, &outsider);

    let (_, body) = request(
        &app,
        Method::POST,
        "/feedback",
        Some(&employee_token),
        Some(json!({ "title": "Coffee machine", "description": "Grinder jams daily" })),
    )
    .await;
    let id = body["id"].as_str().unwrap().to_string();

    // Another employee cannot view the item
    let (status, _) = request(
        &app,
        Method::GET,
        &format!("/feedback/{}", id),
        Some(&outsider_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // HR leaves one internal and one public comment
    let uri = format!("/feedback/{}/comments", id);
    request(
        &app,
        Method::POST,
        &uri,
        Some(&hr_token),
        Some(json!({ "comment": "Vendor quote pending", "is_internal": true })),
    )
    .await;
    request(
        &app,
        Method::POST,
        &uri,
        Some(&hr_token),
        Some(json!({ "comment": "We are looking into it" })),
    )
    .await;

    let (_, body) = request(&app, Method::GET, &uri, Some(&employee_token), None).await;
    assert_eq!(body["total"], 1);

    let (_, body) = request(&app, Method::GET, &uri, Some(&hr_token), None).await;
    assert_eq!(body["total"], 2);

    // The submitter cannot smuggle a comment into the internal thread
    let (status, body) = request(
        &app,
        Method::POST,
        &uri,
        Some(&employee_token),
        Some(json!({ "comment": "What is happening?", "is_internal": true })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["is_internal"], false);
}
