//! Shared harness for integration tests: in-memory database, router assembly
//! and fixture users.
#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::{routing::get, Router};
use http::{header, Method, Request, StatusCode};
use http_body_util::BodyExt;
use sqlx::sqlite::SqlitePoolOptions;
use tower::ServiceExt;

use staffpulse::config::Config;
use staffpulse::db::{CreateUser, Role, User, UserRepository};
use staffpulse::routes;
use staffpulse::AppState;

pub async fn test_state() -> Arc<AppState> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("failed to open in-memory database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("failed to run migrations");

    let mut config = Config::default();
    config.jwt.secret = "test-secret".to_string();

    Arc::new(AppState {
        db: pool,
        config,
        mailer: None,
    })
}

/// The API router without the outer middleware stack (no rate limiting, no
/// CORS) so tests exercise handlers directly.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/auth", routes::auth::router())
        .nest("/feedback", routes::feedback::router())
        .nest("/admin", routes::admin::router())
        .nest("/vendor", routes::vendor::router())
        .nest("/superadmin", routes::superadmin::router())
        .nest("/notifications", routes::notifications::router())
        .with_state(state)
}

pub async fn create_user(state: &AppState, email: &str, full_name: &str, role: Role) -> User {
    UserRepository::create(
        &state.db,
        CreateUser {
            email: email.to_string(),
            // Minimum cost keeps the fixture fast.
            password_hash: bcrypt::hash("password123", 4).expect("failed to hash password"),
            full_name: full_name.to_string(),
            role,
            department: None,
        },
    )
    .await
    .expect("failed to create user")
}

pub fn token_for(state: &AppState, user: &User) -> String {
    routes::auth::create_access_token(&state.config, user).expect("failed to create token")
}

/// Drive one request through the router and decode the JSON body.
pub async fn request(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("failed to build request"),
        None => builder.body(Body::empty()).expect("failed to build request"),
    };

    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("request infallible");

    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("failed to read body")
        .to_bytes();

    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
    };

    (status, json)
}
