mod common;

use http::{Method, StatusCode};
use serde_json::json;

use common::{app, create_user, request, test_state, token_for};
use staffpulse::db::Role;

#[tokio::test]
async fn register_login_me_round_trip() {
    let state = test_state().await;
    let app = app(state.clone());

    let (status, body) = request(
        &app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({
            "email": "sam@example.com",
            "password": "hunter2hunter2",
            "full_name": "Sam Doe",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["role"], "EMPLOYEE");
    assert!(body["access_token"].as_str().is_some());

    let (status, body) = request(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "email": "sam@example.com", "password": "hunter2hunter2" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["access_token"].as_str().unwrap().to_string();

    let (status, body) = request(&app, Method::GET, "/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "sam@example.com");
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let state = test_state().await;
    let app = app(state.clone());
    create_user(&state, "taken@example.com", "First User", Role::Employee).await;

    let (status, body) = request(
        &app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({
            "email": "taken@example.com",
            "password": "longenough",
            "full_name": "Second User",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["detail"], "Email already registered");
}

#[tokio::test]
async fn invalid_registration_returns_field_errors() {
    let state = test_state().await;
    let app = app(state);

    let (status, body) = request(
        &app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({ "email": "not-an-email", "password": "short", "full_name": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["detail"], "Validation error");
    assert_eq!(body["errors"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let state = test_state().await;
    let app = app(state.clone());
    create_user(&state, "kim@example.com", "Kim Lee", Role::Employee).await;

    let (status, _) = request(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "email": "kim@example.com", "password": "wrong-password" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn refresh_token_is_rejected_as_access_token() {
    let state = test_state().await;
    let app = app(state.clone());
    let user = create_user(&state, "ana@example.com", "Ana Diaz", Role::Employee).await;

    let refresh =
        staffpulse::routes::auth::create_refresh_token(&state.config, &user).unwrap();

    let (status, _) = request(&app, Method::GET, "/auth/me", Some(&refresh), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = request(&app, Method::GET, "/auth/me", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = request(&app, Method::GET, "/auth/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn role_hierarchy_gates_admin_endpoints() {
    let state = test_state().await;
    let app = app(state.clone());

    let employee = create_user(&state, "emp@example.com", "Emp One", Role::Employee).await;
    let vendor = create_user(&state, "v@example.com", "Vendor One", Role::Vendor).await;
    let admin = create_user(&state, "adm@example.com", "Admin One", Role::Admin).await;

    for user in [&employee, &vendor] {
        let token = token_for(&state, user);
        let (status, _) =
            request(&app, Method::GET, "/admin/audit-logs", Some(&token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    let token = token_for(&state, &admin);
    let (status, _) = request(&app, Method::GET, "/admin/audit-logs", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    // VENDOR sits outside the hierarchy: even an admin is not a vendor.
    let (status, _) = request(&app, Method::GET, "/vendor/feedback", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
