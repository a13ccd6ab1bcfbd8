//! Facet API - REST API Layer
//!
//! This crate provides the HTTP layer for Facet, a project management
//! backend built around an open-ended attribute system. It exposes REST
//! endpoints (Axum) for the attribute catalog, project CRUD, attribute
//! filtering, and token-based authentication, backed by PostgreSQL.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod types;
pub mod validation;

#[cfg(feature = "openapi")]
pub mod openapi;

// Re-export commonly used types
pub use auth::{
    extract_bearer_token, generate_jwt_token, hash_password, validate_jwt_token, verify_password,
    AuthConfig, AuthContext, Claims, JwtClock, JwtSecret, SystemClock,
};
pub use config::ApiConfig;
pub use db::{DbClient, DbConfig, User};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use middleware::{auth_middleware, AuthExtractor, AuthMiddlewareState};
pub use routes::create_api_router;
pub use types::*;

#[cfg(feature = "openapi")]
pub use openapi::ApiDoc;
