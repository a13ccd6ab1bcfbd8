//! Axum Middleware for Authentication
//!
//! Validates the bearer token on every protected route, injects an
//! [`AuthContext`] into request extensions on success, and returns 401
//! for unauthenticated requests.

use crate::auth::{extract_bearer_token, validate_jwt_token, AuthConfig, AuthContext};
use crate::error::ApiError;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

// ============================================================================
// MIDDLEWARE STATE
// ============================================================================

/// Shared state for authentication middleware.
#[derive(Debug, Clone)]
pub struct AuthMiddlewareState {
    /// Authentication configuration
    pub auth_config: Arc<AuthConfig>,
}

impl AuthMiddlewareState {
    /// Create new middleware state with the given auth configuration.
    pub fn new(auth_config: AuthConfig) -> Self {
        Self {
            auth_config: Arc::new(auth_config),
        }
    }
}

// ============================================================================
// MIDDLEWARE FUNCTION
// ============================================================================

/// Axum middleware for bearer-token authentication.
///
/// 1. Extracts the Authorization header
/// 2. Validates the bearer token (signature + expiry)
/// 3. Injects [`AuthContext`] into request extensions on success
/// 4. Returns 401 Unauthorized otherwise
pub async fn auth_middleware(
    State(state): State<AuthMiddlewareState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthMiddlewareError> {
    let auth_header = request
        .headers()
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| {
            AuthMiddlewareError(ApiError::unauthorized(
                "Authentication required: provide an Authorization: Bearer header",
            ))
        })?;

    let token = extract_bearer_token(auth_header).map_err(AuthMiddlewareError)?;
    let claims = validate_jwt_token(&state.auth_config, token).map_err(AuthMiddlewareError)?;

    let auth_context = AuthContext {
        user_id: claims.user_id().map_err(AuthMiddlewareError)?,
        email: claims.email,
    };

    // Inject AuthContext into request extensions
    request.extensions_mut().insert(auth_context);

    Ok(next.run(request).await)
}

// ============================================================================
// ERROR HANDLING
// ============================================================================

/// Error wrapper for middleware that implements IntoResponse.
#[derive(Debug)]
pub struct AuthMiddlewareError(pub ApiError);

impl IntoResponse for AuthMiddlewareError {
    fn into_response(self) -> Response {
        self.0.into_response()
    }
}

// ============================================================================
// TYPED EXTRACTOR
// ============================================================================

/// Typed Axum extractor for authentication context.
///
/// Usable directly in handler signatures; makes auth required by the type
/// system. The `auth_middleware` must be applied for this extractor to
/// find a context; otherwise it returns a 500.
#[derive(Debug, Clone)]
pub struct AuthExtractor(pub AuthContext);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthExtractor
where
    S: Send + Sync,
{
    type Rejection = AuthMiddlewareError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .map(AuthExtractor)
            .ok_or_else(|| {
                AuthMiddlewareError(ApiError::internal_error(
                    "AuthContext not found in request extensions. \
                     Ensure auth_middleware is applied to this route.",
                ))
            })
    }
}

impl std::ops::Deref for AuthExtractor {
    type Target = AuthContext;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{generate_jwt_token, test_clocks, JwtSecret};
    use axum::{body::Body, http::Request as HttpRequest, middleware::from_fn_with_state, Router};
    use tower::ServiceExt;
    use uuid::Uuid;

    fn test_state() -> AuthMiddlewareState {
        AuthMiddlewareState::new(AuthConfig {
            jwt_secret: JwtSecret::new("test-secret".to_string()).unwrap(),
            clock: std::sync::Arc::new(test_clocks::valid()),
            ..AuthConfig::default()
        })
    }

    fn protected_app(state: AuthMiddlewareState) -> Router {
        Router::new()
            .route(
                "/whoami",
                axum::routing::get(|AuthExtractor(auth): AuthExtractor| async move {
                    auth.email
                }),
            )
            .layer(from_fn_with_state(state, auth_middleware))
    }

    #[tokio::test]
    async fn test_missing_header_is_401() {
        let app = protected_app(test_state());
        let response = app
            .oneshot(HttpRequest::get("/whoami").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_valid_token_passes_and_injects_context() {
        let state = test_state();
        let token = generate_jwt_token(
            &state.auth_config,
            Uuid::now_v7(),
            "john@example.com".to_string(),
        )
        .unwrap();

        let app = protected_app(state);
        let response = app
            .oneshot(
                HttpRequest::get("/whoami")
                    .header("authorization", format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::OK);
    }

    #[tokio::test]
    async fn test_garbage_token_is_401() {
        let app = protected_app(test_state());
        let response = app
            .oneshot(
                HttpRequest::get("/whoami")
                    .header("authorization", "Bearer garbage")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::UNAUTHORIZED);
    }
}
