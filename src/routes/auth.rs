use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use chrono::{Duration, NaiveDateTime, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::db::{CreateUser, Role, User, UserRepository};
use crate::error::{AppError, AppResult, FieldError};
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh", post(refresh))
        .route("/me", get(me))
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub department: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub department: Option<String>,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse {
            id: user.id,
            email: user.email,
            full_name: user.full_name,
            role: user.role,
            department: user.department,
            is_active: user.is_active,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    pub user: UserResponse,
}

// ============================================================================
// Tokens
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub role: Role,
    #[serde(rename = "type")]
    pub token_type: String,
    pub iat: usize,
    pub exp: usize,
}

fn create_token(
    config: &Config,
    user: &User,
    token_type: &str,
    lifetime: Duration,
) -> AppResult<String> {
    let now = Utc::now();
    let claims = Claims {
        sub: user.id.clone(),
        email: user.email.clone(),
        role: user.role,
        token_type: token_type.to_string(),
        iat: now.timestamp() as usize,
        exp: (now + lifetime).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt.secret.as_bytes()),
    )?;
    Ok(token)
}

pub fn create_access_token(config: &Config, user: &User) -> AppResult<String> {
    create_token(
        config,
        user,
        "access",
        Duration::minutes(config.jwt.access_expire_minutes),
    )
}

pub fn create_refresh_token(config: &Config, user: &User) -> AppResult<String> {
    create_token(
        config,
        user,
        "refresh",
        Duration::days(config.jwt.refresh_expire_days),
    )
}

pub fn decode_token(config: &Config, token: &str) -> AppResult<Claims> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt.secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}

async fn token_pair(state: &Arc<AppState>, user: User) -> AppResult<AuthResponse> {
    let access_token = create_access_token(&state.config, &user)?;
    let refresh_token = create_refresh_token(&state.config, &user)?;

    Ok(AuthResponse {
        access_token,
        refresh_token,
        token_type: "bearer",
        user: user.into(),
    })
}

// ============================================================================
// Handlers
// ============================================================================

/// Create an EMPLOYEE account and log it in.
async fn register(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterRequest>,
) -> AppResult<Json<AuthResponse>> {
    let mut errors = Vec::new();
    if request.email.trim().is_empty() || !request.email.contains('@') {
        errors.push(FieldError::new("email", "must be a valid email address"));
    }
    if request.password.len() < 8 {
        errors.push(FieldError::new("password", "must be at least 8 characters"));
    }
    if request.full_name.trim().is_empty() {
        errors.push(FieldError::new("full_name", "must not be empty"));
    }
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    if UserRepository::find_by_email(&state.db, request.email.trim())
        .await?
        .is_some()
    {
        return Err(AppError::Conflict("Email already registered".to_string()));
    }

    let password_hash = bcrypt::hash(&request.password, bcrypt::DEFAULT_COST)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to hash password: {}", e)))?;

    let user = UserRepository::create(
        &state.db,
        CreateUser {
            email: request.email.trim().to_string(),
            password_hash,
            full_name: request.full_name.trim().to_string(),
            role: Role::Employee,
            department: request.department,
        },
    )
    .await?;

    tracing::info!("Registered new user {}", user.id);

    Ok(Json(token_pair(&state, user).await?))
}

async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let user = UserRepository::find_by_email(&state.db, request.email.trim())
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    let valid = bcrypt::verify(&request.password, &user.password_hash)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to verify password: {}", e)))?;
    if !valid {
        return Err(AppError::InvalidCredentials);
    }

    if !user.is_active {
        return Err(AppError::forbidden("User account is inactive"));
    }

    Ok(Json(token_pair(&state, user).await?))
}

/// Exchange a refresh token for a fresh token pair.
async fn refresh(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RefreshRequest>,
) -> AppResult<Json<AuthResponse>> {
    let claims = decode_token(&state.config, &request.refresh_token)?;
    if claims.token_type != "refresh" {
        return Err(AppError::Unauthorized);
    }

    let user = UserRepository::find_by_id(&state.db, &claims.sub)
        .await?
        .ok_or(AppError::Unauthorized)?;

    if !user.is_active {
        return Err(AppError::forbidden("User account is inactive"));
    }

    Ok(Json(token_pair(&state, user).await?))
}

async fn me(AuthUser(user): AuthUser) -> Json<UserResponse> {
    Json(user.into())
}

// ============================================================================
// Auth Middleware / Extractor
// ============================================================================

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

/// Extractor for the authenticated user.
pub struct AuthUser(pub User);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        // Extract Authorization header (Bearer token)
        let auth_header = parts
            .headers
            .get(http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                tracing::debug!("Missing or invalid Authorization header");
                AppError::Unauthorized
            })?;

        if !auth_header.to_ascii_lowercase().starts_with("bearer ") {
            tracing::debug!("Authorization header doesn't start with 'Bearer '");
            return Err(AppError::Unauthorized);
        }

        let token = auth_header[7..].trim();
        if token.is_empty() {
            return Err(AppError::Unauthorized);
        }

        let claims = decode_token(&state.config, token)?;
        if claims.token_type != "access" {
            tracing::debug!("Rejected non-access token on API request");
            return Err(AppError::Unauthorized);
        }

        let user = UserRepository::find_by_id(&state.db, &claims.sub)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !user.is_active {
            return Err(AppError::forbidden("User account is inactive"));
        }

        Ok(AuthUser(user))
    }
}

/// Require `required` or a higher staff role. VENDOR is outside the hierarchy
/// and only matches itself.
pub fn require_role(user: &User, required: Role) -> AppResult<()> {
    if user.has_role(required) {
        Ok(())
    } else {
        Err(AppError::forbidden(format!(
            "Insufficient permissions. Required role: {}",
            required.as_str()
        )))
    }
}
