//! REST API Routes
//!
//! Route modules and the top-level router assembly:
//! - Attribute catalog under /api/v1/attributes (protected)
//! - Projects, values, and filtering under /api/v1/projects (protected)
//! - Registration and login under /api/v1/auth (public)
//! - Health checks at /health/* (public)
//! - OpenAPI spec at /openapi.json

pub mod attribute;
pub mod auth;
pub mod health;
pub mod project;

use axum::{
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::{
    auth::AuthConfig,
    config::ApiConfig,
    db::DbClient,
    error::{ApiError, ApiResult},
    middleware::{auth_middleware, AuthMiddlewareState},
};

#[cfg(feature = "openapi")]
use crate::openapi::ApiDoc;
#[cfg(feature = "openapi")]
use utoipa::OpenApi;

// Re-export route creation functions for convenience
pub use attribute::create_router as attribute_router;
pub use auth::create_router as auth_router;
pub use health::create_router as health_router;
pub use project::create_router as project_router;

// ============================================================================
// OPENAPI ENDPOINT
// ============================================================================

/// Handler for /openapi.json endpoint.
#[cfg(feature = "openapi")]
async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

// ============================================================================
// PRODUCTION VALIDATION
// ============================================================================

/// Check if running in a production environment.
fn is_production_environment() -> bool {
    std::env::var("FACET_ENVIRONMENT")
        .map(|e| matches!(e.to_lowercase().as_str(), "production" | "prod"))
        .unwrap_or(false)
}

/// Validate configuration for production use.
fn validate_config_for_production(
    api_config: &ApiConfig,
    auth_config: &AuthConfig,
) -> ApiResult<()> {
    auth_config.validate_for_production()?;
    if api_config.cors_origins.is_empty() {
        return Err(ApiError::invalid_input(
            "CORS origins not configured for production. Set FACET_CORS_ORIGINS.",
        ));
    }
    Ok(())
}

// ============================================================================
// CORS
// ============================================================================

/// Build the CORS layer from ApiConfig.
///
/// In development mode (empty origins), allows all origins.
/// In production mode, only allows configured origins.
fn build_cors_layer(config: &ApiConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .max_age(Duration::from_secs(config.cors_max_age_secs));

    if config.cors_origins.is_empty() {
        tracing::info!("CORS: Development mode - allowing all origins");
        cors.allow_origin(Any).allow_headers(Any)
    } else {
        tracing::info!(
            "CORS: Production mode - allowing origins: {:?}",
            config.cors_origins
        );
        let origins: Vec<HeaderValue> = config
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();

        cors.allow_origin(origins)
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
    }
}

// ============================================================================
// ROUTER ASSEMBLY
// ============================================================================

/// Create the complete API router.
///
/// - Entity routes under /api/v1/attributes and /api/v1/projects require
///   a bearer token
/// - /api/v1/auth and /health/* are public
/// - In production (FACET_ENVIRONMENT=production), refuses to start with
///   the default JWT secret or unrestricted CORS
pub fn create_api_router(
    db: DbClient,
    api_config: &ApiConfig,
    auth_config: AuthConfig,
) -> ApiResult<Router> {
    if is_production_environment() {
        validate_config_for_production(api_config, &auth_config)?;
    }

    let auth_config = Arc::new(auth_config);
    let middleware_state = AuthMiddlewareState {
        auth_config: auth_config.clone(),
    };

    // Entity CRUD routes, bearer-token protected
    let protected_routes = Router::new()
        .nest("/attributes", attribute::create_router(db.clone()))
        .nest("/projects", project::create_router(db.clone(), api_config.clone()))
        .layer(from_fn_with_state(middleware_state, auth_middleware));

    let api_routes = protected_routes.nest("/auth", auth::create_router(db.clone(), auth_config));

    let router = Router::new()
        .nest("/api/v1", api_routes)
        .nest("/health", health::create_router(db));

    #[cfg(feature = "openapi")]
    let router = router.route("/openapi.json", get(openapi_json));

    let cors = build_cors_layer(api_config);

    Ok(router.layer(TraceLayer::new_for_http()).layer(cors))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cors_layer_dev_mode() {
        let config = ApiConfig::default();
        // Empty origins builds the permissive layer without panicking.
        let _ = build_cors_layer(&config);
    }

    #[test]
    fn test_cors_layer_with_origins() {
        let config = ApiConfig {
            cors_origins: vec!["https://facet.example".to_string()],
            ..ApiConfig::default()
        };
        let _ = build_cors_layer(&config);
    }

    #[test]
    fn test_production_validation_rejects_defaults() {
        let api_config = ApiConfig::default();
        let auth_config = AuthConfig::default();
        assert!(validate_config_for_production(&api_config, &auth_config).is_err());
    }
}
