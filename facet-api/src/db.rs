//! Database Connection Pool Module
//!
//! PostgreSQL connection pooling via deadpool-postgres, plus the storage
//! operations behind the attribute catalog, attribute value store, entity
//! store, filter engine, and user accounts.
//!
//! Every API operation maps to a single transaction here. The filter
//! engine compiles the conjunction-of-existence law from facet-core into
//! one EXISTS semi-join per predicate.

use crate::error::{ApiError, ApiResult};
use crate::types::UserProfile;
use deadpool_postgres::{Config, ManagerConfig, Pool, RecyclingMethod, Runtime};
use facet_core::{
    Attribute, AttributeFilter, AttributeType, AttributeValue, EntityId, Project,
    ProjectWithValues, Timestamp, ValueWithAttribute,
};
use std::collections::BTreeMap;
use std::time::Duration;
use tokio_postgres::error::SqlState;
use tokio_postgres::types::ToSql;
use tokio_postgres::{NoTls, Row};
use uuid::Uuid;

// ============================================================================
// SCHEMA
// ============================================================================

/// Idempotent schema bootstrap. Applied at startup; real migration
/// tooling is deliberately out of scope.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS projects (
    id UUID PRIMARY KEY,
    name TEXT NOT NULL,
    status TEXT,
    created_at TIMESTAMPTZ NOT NULL
);

CREATE TABLE IF NOT EXISTS attributes (
    id UUID PRIMARY KEY,
    name TEXT NOT NULL,
    type TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL
);

CREATE TABLE IF NOT EXISTS attribute_values (
    id UUID PRIMARY KEY,
    attribute_id UUID NOT NULL REFERENCES attributes(id) ON DELETE CASCADE,
    entity_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    value TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL
);

CREATE INDEX IF NOT EXISTS attribute_values_entity_idx
    ON attribute_values (entity_id);
CREATE INDEX IF NOT EXISTS attribute_values_attr_value_idx
    ON attribute_values (attribute_id, value);

CREATE TABLE IF NOT EXISTS users (
    id UUID PRIMARY KEY,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    email TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL
);
"#;

// ============================================================================
// CONNECTION POOL CONFIGURATION
// ============================================================================

/// Database connection pool configuration.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// PostgreSQL host
    pub host: String,
    /// PostgreSQL port
    pub port: u16,
    /// Database name
    pub dbname: String,
    /// Database user
    pub user: String,
    /// Database password
    pub password: String,
    /// Maximum pool size
    pub max_size: usize,
    /// Connection timeout
    pub timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            dbname: "facet".to_string(),
            user: "postgres".to_string(),
            password: "".to_string(),
            max_size: 16,
            timeout: Duration::from_secs(30),
        }
    }
}

impl DbConfig {
    /// Create a new database configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("FACET_DB_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: std::env::var("FACET_DB_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5432),
            dbname: std::env::var("FACET_DB_NAME").unwrap_or_else(|_| "facet".to_string()),
            user: std::env::var("FACET_DB_USER").unwrap_or_else(|_| "postgres".to_string()),
            password: std::env::var("FACET_DB_PASSWORD").unwrap_or_default(),
            max_size: std::env::var("FACET_DB_POOL_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(16),
            timeout: Duration::from_secs(
                std::env::var("FACET_DB_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
        }
    }

    /// Create a connection pool from this configuration.
    pub fn create_pool(&self) -> ApiResult<Pool> {
        let mut cfg = Config::new();
        cfg.host = Some(self.host.clone());
        cfg.port = Some(self.port);
        cfg.dbname = Some(self.dbname.clone());
        cfg.user = Some(self.user.clone());
        cfg.password = Some(self.password.clone());

        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });

        let pool = cfg
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| ApiError::database_error(format!("Failed to create pool: {}", e)))?;

        Ok(pool)
    }
}

// ============================================================================
// USER RECORD
// ============================================================================

/// Internal user record. The password hash never leaves this crate;
/// the HTTP surface sees [`UserProfile`] only.
#[derive(Debug, Clone)]
pub struct User {
    pub id: EntityId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: Timestamp,
}

impl User {
    /// Public view without the password hash.
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
            created_at: self.created_at,
        }
    }
}

// ============================================================================
// DATABASE CLIENT
// ============================================================================

/// Database client wrapping a connection pool with high-level operations
/// for the catalog, value store, entity store, and user accounts.
#[derive(Clone)]
pub struct DbClient {
    pool: Pool,
}

impl DbClient {
    /// Create a new database client with the given pool.
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Create a new database client from configuration.
    pub fn from_config(config: &DbConfig) -> ApiResult<Self> {
        let pool = config.create_pool()?;
        Ok(Self::new(pool))
    }

    /// Get a connection from the pool.
    async fn get_conn(&self) -> ApiResult<deadpool_postgres::Object> {
        self.pool.get().await.map_err(ApiError::from)
    }

    /// Apply the idempotent schema. Called once at startup.
    pub async fn ensure_schema(&self) -> ApiResult<()> {
        let conn = self.get_conn().await?;
        conn.batch_execute(SCHEMA).await?;
        Ok(())
    }

    /// Liveness probe for health checks.
    pub async fn ping(&self) -> ApiResult<()> {
        let conn = self.get_conn().await?;
        conn.query_one("SELECT 1", &[]).await?;
        Ok(())
    }

    // ========================================================================
    // ATTRIBUTE CATALOG
    // ========================================================================

    /// Persist a new catalog entry.
    ///
    /// No uniqueness check on the name: the catalog accepts duplicates.
    pub async fn attribute_create(&self, attribute: &Attribute) -> ApiResult<()> {
        let conn = self.get_conn().await?;
        conn.execute(
            "INSERT INTO attributes (id, name, type, created_at) VALUES ($1, $2, $3, $4)",
            &[
                &attribute.id,
                &attribute.name,
                &attribute.attribute_type.as_db_str(),
                &attribute.created_at,
            ],
        )
        .await?;
        Ok(())
    }

    /// List every catalog entry, ordered by id (creation order).
    pub async fn attribute_list(&self) -> ApiResult<Vec<Attribute>> {
        let conn = self.get_conn().await?;
        let rows = conn
            .query(
                "SELECT id, name, type, created_at FROM attributes ORDER BY id",
                &[],
            )
            .await?;

        rows.iter().map(attribute_from_row).collect()
    }

    // ========================================================================
    // ATTRIBUTE VALUE STORE
    // ========================================================================

    /// Persist one value row for a project.
    ///
    /// Fails with AttributeNotFound if the attribute is not in the catalog
    /// and with ProjectNotFound if the project does not exist. No
    /// uniqueness constraint: repeat calls for the same (entity,
    /// attribute) pair accumulate rows.
    ///
    /// `enforce_types` opts into checking the value against the declared
    /// catalog type; by default values are stored as-is.
    pub async fn attribute_value_create(
        &self,
        value: &AttributeValue,
        enforce_types: bool,
    ) -> ApiResult<()> {
        let mut conn = self.get_conn().await?;
        let tx = conn.transaction().await?;

        let row = tx
            .query_opt(
                "SELECT id, name, type, created_at FROM attributes WHERE id = $1",
                &[&value.attribute_id],
            )
            .await?;
        let attribute = match row.as_ref() {
            Some(row) => attribute_from_row(row)?,
            None => return Err(ApiError::attribute_not_found(value.attribute_id)),
        };
        if enforce_types {
            attribute.attribute_type.check_value(&value.value)?;
        }

        let project = tx
            .query_opt("SELECT id FROM projects WHERE id = $1", &[&value.entity_id])
            .await?;
        if project.is_none() {
            return Err(ApiError::project_not_found(value.entity_id));
        }

        tx.execute(
            "INSERT INTO attribute_values (id, attribute_id, entity_id, value, created_at) \
             VALUES ($1, $2, $3, $4, $5)",
            &[
                &value.id,
                &value.attribute_id,
                &value.entity_id,
                &value.value,
                &value.created_at,
            ],
        )
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// All value rows for one project joined with their catalog entries,
    /// ordered by value id (accumulation order).
    pub async fn values_for_project(
        &self,
        entity_id: EntityId,
    ) -> ApiResult<Vec<ValueWithAttribute>> {
        let conn = self.get_conn().await?;
        let rows = conn
            .query(
                "SELECT av.id, av.attribute_id, av.entity_id, av.value, av.created_at, \
                        a.name AS attribute_name, a.type AS attribute_type, \
                        a.created_at AS attribute_created_at \
                 FROM attribute_values av \
                 JOIN attributes a ON a.id = av.attribute_id \
                 WHERE av.entity_id = $1 \
                 ORDER BY av.id",
                &[&entity_id],
            )
            .await?;

        rows.iter().map(value_with_attribute_from_row).collect()
    }

    // ========================================================================
    // ENTITY STORE (PROJECTS)
    // ========================================================================

    /// Persist a project and its inline attribute values in ONE
    /// transaction: if any value row fails (unknown attribute id), the
    /// project row rolls back too.
    pub async fn project_create(
        &self,
        project: &Project,
        inline_values: &BTreeMap<Uuid, String>,
        enforce_types: bool,
    ) -> ApiResult<ProjectWithValues> {
        let mut conn = self.get_conn().await?;
        let tx = conn.transaction().await?;

        tx.execute(
            "INSERT INTO projects (id, name, status, created_at) VALUES ($1, $2, $3, $4)",
            &[
                &project.id,
                &project.name,
                &project.status,
                &project.created_at,
            ],
        )
        .await?;

        let mut values = Vec::with_capacity(inline_values.len());
        for (attribute_id, raw_value) in inline_values {
            let row = tx
                .query_opt(
                    "SELECT id, name, type, created_at FROM attributes WHERE id = $1",
                    &[attribute_id],
                )
                .await?;
            let attribute = match row.as_ref() {
                Some(row) => attribute_from_row(row)?,
                None => return Err(ApiError::attribute_not_found(attribute_id)),
            };
            if enforce_types {
                attribute.attribute_type.check_value(raw_value)?;
            }

            let value = AttributeValue::new(*attribute_id, project.id, raw_value.clone());
            tx.execute(
                "INSERT INTO attribute_values (id, attribute_id, entity_id, value, created_at) \
                 VALUES ($1, $2, $3, $4, $5)",
                &[
                    &value.id,
                    &value.attribute_id,
                    &value.entity_id,
                    &value.value,
                    &value.created_at,
                ],
            )
            .await?;

            values.push(ValueWithAttribute::from_parts(&value, attribute));
        }

        tx.commit().await?;

        Ok(ProjectWithValues {
            project: project.clone(),
            values,
        })
    }

    /// Fetch one project with its values.
    pub async fn project_get(&self, id: EntityId) -> ApiResult<Option<ProjectWithValues>> {
        let conn = self.get_conn().await?;
        let row = conn
            .query_opt(
                "SELECT id, name, status, created_at FROM projects WHERE id = $1",
                &[&id],
            )
            .await?;

        let project = match row.as_ref() {
            Some(row) => project_from_row(row)?,
            None => return Ok(None),
        };
        drop(conn);

        let values = self.values_for_project(id).await?;
        Ok(Some(ProjectWithValues { project, values }))
    }

    /// List every project, eagerly joined with its values.
    ///
    /// Two queries total regardless of project count; never one query per
    /// project. Ordered by project id ascending.
    pub async fn project_list(&self) -> ApiResult<Vec<ProjectWithValues>> {
        let conn = self.get_conn().await?;
        let project_rows = conn
            .query(
                "SELECT id, name, status, created_at FROM projects ORDER BY id",
                &[],
            )
            .await?;
        let projects: Vec<Project> = project_rows
            .iter()
            .map(project_from_row)
            .collect::<ApiResult<_>>()?;

        let value_rows = conn
            .query(
                "SELECT av.id, av.attribute_id, av.entity_id, av.value, av.created_at, \
                        a.name AS attribute_name, a.type AS attribute_type, \
                        a.created_at AS attribute_created_at \
                 FROM attribute_values av \
                 JOIN attributes a ON a.id = av.attribute_id \
                 ORDER BY av.id",
                &[],
            )
            .await?;

        assemble_projects(projects, &value_rows)
    }

    /// Filter projects by a conjunction of (attribute id, value)
    /// predicates.
    ///
    /// Each predicate compiles to its own EXISTS semi-join, so predicates
    /// may be satisfied by different value rows. An empty filter returns
    /// every project. Ordered by project id ascending.
    pub async fn project_filter(
        &self,
        filter: &AttributeFilter,
    ) -> ApiResult<Vec<ProjectWithValues>> {
        if filter.is_empty() {
            return self.project_list().await;
        }

        let predicates: Vec<(Uuid, String)> = filter
            .iter()
            .map(|(id, value)| (*id, value.to_string()))
            .collect();

        let mut clauses = Vec::with_capacity(predicates.len());
        let mut params: Vec<&(dyn ToSql + Sync)> = Vec::with_capacity(predicates.len() * 2);
        for (i, (attribute_id, value)) in predicates.iter().enumerate() {
            clauses.push(format!(
                "EXISTS (SELECT 1 FROM attribute_values av \
                 WHERE av.entity_id = p.id AND av.attribute_id = ${} AND av.value = ${})",
                i * 2 + 1,
                i * 2 + 2,
            ));
            params.push(attribute_id);
            params.push(value);
        }

        let sql = format!(
            "SELECT p.id, p.name, p.status, p.created_at FROM projects p WHERE {} ORDER BY p.id",
            clauses.join(" AND ")
        );

        let conn = self.get_conn().await?;
        let project_rows = conn.query(sql.as_str(), &params).await?;
        let projects: Vec<Project> = project_rows
            .iter()
            .map(project_from_row)
            .collect::<ApiResult<_>>()?;

        let ids: Vec<Uuid> = projects.iter().map(|p| p.id).collect();
        let value_rows = conn
            .query(
                "SELECT av.id, av.attribute_id, av.entity_id, av.value, av.created_at, \
                        a.name AS attribute_name, a.type AS attribute_type, \
                        a.created_at AS attribute_created_at \
                 FROM attribute_values av \
                 JOIN attributes a ON a.id = av.attribute_id \
                 WHERE av.entity_id = ANY($1) \
                 ORDER BY av.id",
                &[&ids],
            )
            .await?;

        assemble_projects(projects, &value_rows)
    }

    /// Delete a project and cascade to its value rows, in one
    /// transaction. Cascade is an explicit store operation here, not an
    /// assumed storage trigger. Returns false if the project was absent.
    pub async fn project_delete(&self, id: EntityId) -> ApiResult<bool> {
        let mut conn = self.get_conn().await?;
        let tx = conn.transaction().await?;

        tx.execute("DELETE FROM attribute_values WHERE entity_id = $1", &[&id])
            .await?;
        let deleted = tx.execute("DELETE FROM projects WHERE id = $1", &[&id]).await?;

        tx.commit().await?;
        Ok(deleted > 0)
    }

    // ========================================================================
    // USERS
    // ========================================================================

    /// Persist a new user account.
    ///
    /// A duplicate email maps to a 409 EmailAlreadyRegistered via the
    /// unique constraint.
    pub async fn user_create(&self, user: &User) -> ApiResult<()> {
        let conn = self.get_conn().await?;
        let result = conn
            .execute(
                "INSERT INTO users (id, first_name, last_name, email, password_hash, created_at) \
                 VALUES ($1, $2, $3, $4, $5, $6)",
                &[
                    &user.id,
                    &user.first_name,
                    &user.last_name,
                    &user.email,
                    &user.password_hash,
                    &user.created_at,
                ],
            )
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if e.code() == Some(&SqlState::UNIQUE_VIOLATION) => {
                Err(ApiError::email_already_registered(&user.email))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Look up a user by email for login.
    pub async fn user_get_by_email(&self, email: &str) -> ApiResult<Option<User>> {
        let conn = self.get_conn().await?;
        let row = conn
            .query_opt(
                "SELECT id, first_name, last_name, email, password_hash, created_at \
                 FROM users WHERE email = $1",
                &[&email],
            )
            .await?;

        Ok(row.map(|row| User {
            id: row.get("id"),
            first_name: row.get("first_name"),
            last_name: row.get("last_name"),
            email: row.get("email"),
            password_hash: row.get("password_hash"),
            created_at: row.get("created_at"),
        }))
    }
}

// ============================================================================
// ROW MAPPING
// ============================================================================

fn attribute_from_row(row: &Row) -> ApiResult<Attribute> {
    let raw_type: String = row.get("type");
    let attribute_type: AttributeType = raw_type.parse().map_err(|_| {
        ApiError::internal_error(format!("Unknown attribute type in storage: {}", raw_type))
    })?;

    Ok(Attribute {
        id: row.get("id"),
        name: row.get("name"),
        attribute_type,
        created_at: row.get("created_at"),
    })
}

fn project_from_row(row: &Row) -> ApiResult<Project> {
    Ok(Project {
        id: row.get("id"),
        name: row.get("name"),
        status: row.get("status"),
        created_at: row.get("created_at"),
    })
}

/// Map a joined attribute_values x attributes row.
fn value_with_attribute_from_row(row: &Row) -> ApiResult<ValueWithAttribute> {
    let raw_type: String = row.get("attribute_type");
    let attribute_type: AttributeType = raw_type.parse().map_err(|_| {
        ApiError::internal_error(format!("Unknown attribute type in storage: {}", raw_type))
    })?;

    Ok(ValueWithAttribute {
        id: row.get("id"),
        attribute: Attribute {
            id: row.get("attribute_id"),
            name: row.get("attribute_name"),
            attribute_type,
            created_at: row.get("attribute_created_at"),
        },
        value: row.get("value"),
    })
}

/// Group joined value rows under their projects, preserving project order.
fn assemble_projects(projects: Vec<Project>, value_rows: &[Row]) -> ApiResult<Vec<ProjectWithValues>> {
    let mut by_entity: BTreeMap<EntityId, Vec<ValueWithAttribute>> = BTreeMap::new();
    for row in value_rows {
        let entity_id: EntityId = row.get("entity_id");
        by_entity
            .entry(entity_id)
            .or_default()
            .push(value_with_attribute_from_row(row)?);
    }

    Ok(projects
        .into_iter()
        .map(|project| {
            let values = by_entity.remove(&project.id).unwrap_or_default();
            ProjectWithValues { project, values }
        })
        .collect())
}
