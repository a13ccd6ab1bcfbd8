//! Project REST API Routes
//!
//! Project CRUD plus the attribute-value store and filter engine
//! endpoints. Listing endpoints always return projects eagerly joined
//! with their attribute values.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use facet_core::{AttributeFilter, AttributeValue, Project, ProjectWithValues};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    config::ApiConfig,
    db::DbClient,
    error::{ApiError, ApiResult},
    middleware::AuthExtractor,
    types::{CreateAttributeValueRequest, CreateProjectRequest},
    validation::ValidateNonEmpty,
};

// ============================================================================
// SHARED STATE
// ============================================================================

/// Shared application state for project routes.
#[derive(Clone)]
pub struct ProjectState {
    pub db: DbClient,
    pub config: ApiConfig,
}

impl ProjectState {
    pub fn new(db: DbClient, config: ApiConfig) -> Self {
        Self { db, config }
    }
}

// ============================================================================
// FILTER QUERY PARSING
// ============================================================================

/// Parse `filters[<attribute_id>]=<value>` query pairs into an
/// [`AttributeFilter`].
///
/// Pairs whose key is not of that shape are ignored; a key of that shape
/// with a malformed UUID is a 400. No pairs at all means an empty filter,
/// which matches every project.
pub fn parse_filter_query(pairs: &[(String, String)]) -> ApiResult<AttributeFilter> {
    let mut filter = AttributeFilter::new();

    for (key, value) in pairs {
        let Some(inner) = key
            .strip_prefix("filters[")
            .and_then(|rest| rest.strip_suffix(']'))
        else {
            continue;
        };

        let attribute_id = Uuid::parse_str(inner).map_err(|_| {
            ApiError::invalid_format("filters", "filters[<attribute uuid>]=<value>")
        })?;
        filter.insert(attribute_id, value.clone());
    }

    Ok(filter)
}

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// POST /api/v1/projects - Create a project, optionally with inline
/// attribute values
#[utoipa::path(
    post,
    path = "/api/v1/projects",
    tag = "Projects",
    request_body = CreateProjectRequest,
    responses(
        (status = 201, description = "Project created", body = ProjectWithValues),
        (status = 400, description = "Invalid request", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 404, description = "Inline attribute id unknown", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_project(
    State(state): State<Arc<ProjectState>>,
    Json(req): Json<CreateProjectRequest>,
) -> ApiResult<impl IntoResponse> {
    req.name.validate_non_empty("name")?;

    let project = Project::new(req.name, req.status)?;
    let inline_values = req.attributes.unwrap_or_default();

    let created = state
        .db
        .project_create(&project, &inline_values, state.config.enforce_value_types)
        .await?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/v1/projects - List all projects with their attribute values
#[utoipa::path(
    get,
    path = "/api/v1/projects",
    tag = "Projects",
    responses(
        (status = 200, description = "All projects with values", body = Vec<ProjectWithValues>),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_projects(
    State(state): State<Arc<ProjectState>>,
) -> ApiResult<impl IntoResponse> {
    let projects = state.db.project_list().await?;
    Ok(Json(projects))
}

/// GET /api/v1/projects/filter - Filter projects by attribute values
///
/// Predicates arrive as `filters[<attribute_id>]=<value>` query pairs and
/// combine with AND; each predicate may be satisfied by a different value
/// row. No predicates returns every project.
#[utoipa::path(
    get,
    path = "/api/v1/projects/filter",
    tag = "Projects",
    params(
        ("filters" = Option<String>, Query,
         description = "Repeated filters[<attribute uuid>]=<value> pairs, ANDed together"),
    ),
    responses(
        (status = 200, description = "Matching projects with values", body = Vec<ProjectWithValues>),
        (status = 400, description = "Malformed filter key", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn filter_projects(
    State(state): State<Arc<ProjectState>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> ApiResult<impl IntoResponse> {
    let filter = parse_filter_query(&pairs)?;
    let projects = state.db.project_filter(&filter).await?;
    Ok(Json(projects))
}

/// GET /api/v1/projects/:id - Fetch one project with its values
#[utoipa::path(
    get,
    path = "/api/v1/projects/{id}",
    tag = "Projects",
    params(("id" = String, Path, description = "Project id")),
    responses(
        (status = 200, description = "Project with values", body = ProjectWithValues),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 404, description = "Project not found", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_project(
    State(state): State<Arc<ProjectState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let project = state
        .db
        .project_get(id)
        .await?
        .ok_or_else(|| ApiError::project_not_found(id))?;
    Ok(Json(project))
}

/// POST /api/v1/projects/:id/attributes - Attach an attribute value to a
/// project
///
/// The entity id is injected from the path. Repeat calls for the same
/// (project, attribute) pair accumulate rows; nothing deduplicates them.
#[utoipa::path(
    post,
    path = "/api/v1/projects/{id}/attributes",
    tag = "Projects",
    params(("id" = String, Path, description = "Project id")),
    request_body = CreateAttributeValueRequest,
    responses(
        (status = 201, description = "Value created", body = AttributeValue),
        (status = 400, description = "Invalid request", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 404, description = "Project or attribute not found", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn set_attribute_value(
    State(state): State<Arc<ProjectState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<CreateAttributeValueRequest>,
) -> ApiResult<impl IntoResponse> {
    let value = AttributeValue::new(req.attribute_id, id, req.value);
    state
        .db
        .attribute_value_create(&value, state.config.enforce_value_types)
        .await?;

    Ok((StatusCode::CREATED, Json(value)))
}

/// DELETE /api/v1/projects/:id - Delete a project and cascade to its
/// values
#[utoipa::path(
    delete,
    path = "/api/v1/projects/{id}",
    tag = "Projects",
    params(("id" = String, Path, description = "Project id")),
    responses(
        (status = 204, description = "Project deleted"),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 404, description = "Project not found", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_project(
    State(state): State<Arc<ProjectState>>,
    auth: AuthExtractor,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    if !state.db.project_delete(id).await? {
        return Err(ApiError::project_not_found(id));
    }
    tracing::info!(project_id = %id, user = %auth.email, "Project deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// ROUTER
// ============================================================================

pub fn create_router(db: DbClient, config: ApiConfig) -> Router {
    let state = Arc::new(ProjectState::new(db, config));

    Router::new()
        .route("/", post(create_project))
        .route("/", get(list_projects))
        .route("/filter", get(filter_projects))
        .route("/:id", get(get_project))
        .route("/:id", delete(delete_project))
        .route("/:id/attributes", post(set_attribute_value))
        .with_state(state)
}
