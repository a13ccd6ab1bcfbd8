//! Attribute Catalog REST API Routes
//!
//! Registration and listing of catalog attributes. Entries are immutable
//! once created; there are no update or delete endpoints.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use facet_core::{Attribute, AttributeType};
use std::sync::Arc;

use crate::{
    db::DbClient,
    error::ApiError,
    error::ApiResult,
    types::CreateAttributeRequest,
    validation::ValidateNonEmpty,
};

// ============================================================================
// SHARED STATE
// ============================================================================

/// Shared application state for attribute routes.
#[derive(Clone)]
pub struct AttributeState {
    pub db: DbClient,
}

impl AttributeState {
    pub fn new(db: DbClient) -> Self {
        Self { db }
    }
}

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// POST /api/v1/attributes - Register a new catalog attribute
#[utoipa::path(
    post,
    path = "/api/v1/attributes",
    tag = "Attributes",
    request_body = CreateAttributeRequest,
    responses(
        (status = 201, description = "Attribute created", body = Attribute),
        (status = 400, description = "Invalid request", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_attribute(
    State(state): State<Arc<AttributeState>>,
    Json(req): Json<CreateAttributeRequest>,
) -> ApiResult<impl IntoResponse> {
    req.name.validate_non_empty("name")?;
    let attribute_type: AttributeType = req.attribute_type.parse()?;

    let attribute = Attribute::new(req.name, attribute_type)?;
    state.db.attribute_create(&attribute).await?;

    Ok((StatusCode::CREATED, Json(attribute)))
}

/// GET /api/v1/attributes - List the full catalog
#[utoipa::path(
    get,
    path = "/api/v1/attributes",
    tag = "Attributes",
    responses(
        (status = 200, description = "All catalog attributes", body = Vec<Attribute>),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_attributes(
    State(state): State<Arc<AttributeState>>,
) -> ApiResult<impl IntoResponse> {
    let attributes = state.db.attribute_list().await?;
    Ok(Json(attributes))
}

// ============================================================================
// ROUTER
// ============================================================================

pub fn create_router(db: DbClient) -> Router {
    let state = Arc::new(AttributeState::new(db));

    Router::new()
        .route("/", post(create_attribute))
        .route("/", get(list_attributes))
        .with_state(state)
}
