//! Authentication REST API Routes
//!
//! Registration and login. Both endpoints are public; they mint the
//! bearer tokens the rest of the API requires.

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::post, Json, Router};
use facet_core::new_entity_id;
use std::sync::Arc;

use crate::{
    auth::{generate_jwt_token, hash_password, verify_password, AuthConfig},
    db::{DbClient, User},
    error::{ApiError, ApiResult},
    types::{LoginRequest, RegisterRequest, RegisterResponse, TokenResponse},
    validation::{validate_email, validate_password, ValidateNonEmpty},
};

// ============================================================================
// SHARED STATE
// ============================================================================

/// Shared application state for auth routes.
#[derive(Clone)]
pub struct AuthRouteState {
    pub db: DbClient,
    pub auth_config: Arc<AuthConfig>,
}

impl AuthRouteState {
    pub fn new(db: DbClient, auth_config: Arc<AuthConfig>) -> Self {
        Self { db, auth_config }
    }
}

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// POST /api/v1/auth/register - Create a user account and issue a token
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = RegisterResponse),
        (status = 400, description = "Invalid request", body = ApiError),
        (status = 409, description = "Email already registered", body = ApiError),
    )
)]
pub async fn register(
    State(state): State<Arc<AuthRouteState>>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    req.first_name.validate_non_empty("first_name")?;
    req.last_name.validate_non_empty("last_name")?;
    validate_email(&req.email)?;
    validate_password(&req.password)?;

    let email = req.email.trim().to_string();
    let password_hash = hash_password(&req.password)?;

    let user = User {
        id: new_entity_id(),
        first_name: req.first_name.trim().to_string(),
        last_name: req.last_name.trim().to_string(),
        email,
        password_hash,
        created_at: chrono::Utc::now(),
    };
    state.db.user_create(&user).await?;

    let token = generate_jwt_token(&state.auth_config, user.id, user.email.clone())?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user: user.profile(),
            token,
        }),
    ))
}

/// POST /api/v1/auth/login - Exchange credentials for a token
///
/// An unknown email and a wrong password produce the same 401 so the
/// endpoint does not reveal which accounts exist.
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 400, description = "Invalid request", body = ApiError),
        (status = 401, description = "Invalid credentials", body = ApiError),
    )
)]
pub async fn login(
    State(state): State<Arc<AuthRouteState>>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    req.email.validate_non_empty("email")?;
    req.password.validate_non_empty("password")?;

    let user = state
        .db
        .user_get_by_email(req.email.trim())
        .await?
        .ok_or_else(ApiError::invalid_credentials)?;

    if !verify_password(&req.password, &user.password_hash)? {
        return Err(ApiError::invalid_credentials());
    }

    let token = generate_jwt_token(&state.auth_config, user.id, user.email)?;
    Ok(Json(TokenResponse { token }))
}

// ============================================================================
// ROUTER
// ============================================================================

pub fn create_router(db: DbClient, auth_config: Arc<AuthConfig>) -> Router {
    let state = Arc::new(AuthRouteState::new(db, auth_config));

    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .with_state(state)
}
