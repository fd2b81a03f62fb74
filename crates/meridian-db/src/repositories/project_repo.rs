//! Project repository implementation
//!
//! PostgreSQL-backed storage for projects. The running CU counter is
//! incremented with a single SQL expression so concurrent call creations
//! against the same project cannot lose updates.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use meridian_core::{
    models::{Project, ProjectStatus},
    traits::{ProjectRepository, Repository},
    AppError, AppResult,
};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{debug, error, instrument};
use uuid::Uuid;

/// PostgreSQL implementation of ProjectRepository
pub struct PgProjectRepository {
    pool: PgPool,
}

impl PgProjectRepository {
    /// Create a new project repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const PROJECT_SELECT_COLUMNS: &str = r#"
    id, name, client_name, client_organization_id, pm_id,
    total_cu_used, cu_rate_per_cu, status,
    created_at, updated_at
"#;

#[async_trait]
impl Repository<Project, Uuid> for PgProjectRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Project>> {
        debug!("Finding project by id: {}", id);

        let query = format!(
            "SELECT {} FROM projects WHERE id = $1",
            PROJECT_SELECT_COLUMNS
        );

        let row = sqlx::query_as::<sqlx::Postgres, ProjectRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error finding project {}: {}", id, e);
                AppError::Database(format!("Failed to find project: {}", e))
            })?;

        row.map(Project::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn find_all(&self, limit: i64, offset: i64) -> AppResult<Vec<Project>> {
        let query = format!(
            "SELECT {} FROM projects ORDER BY created_at DESC LIMIT $1 OFFSET $2",
            PROJECT_SELECT_COLUMNS
        );

        let rows = sqlx::query_as::<sqlx::Postgres, ProjectRow>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error listing projects: {}", e);
                AppError::Database(format!("Failed to fetch projects: {}", e))
            })?;

        rows.into_iter().map(Project::try_from).collect()
    }

    #[instrument(skip(self))]
    async fn count(&self) -> AppResult<i64> {
        let result: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM projects")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error counting projects: {}", e);
                AppError::Database(format!("Failed to count projects: {}", e))
            })?;

        Ok(result.0)
    }

    #[instrument(skip(self, entity))]
    async fn create(&self, entity: &Project) -> AppResult<Project> {
        debug!("Creating project: {}", entity.name);

        let query = format!(
            r#"
            INSERT INTO projects (
                id, name, client_name, client_organization_id, pm_id,
                total_cu_used, cu_rate_per_cu, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            PROJECT_SELECT_COLUMNS
        );

        let row = sqlx::query_as::<sqlx::Postgres, ProjectRow>(&query)
            .bind(entity.id)
            .bind(&entity.name)
            .bind(&entity.client_name)
            .bind(entity.client_organization_id)
            .bind(entity.pm_id)
            .bind(entity.total_cu_used)
            .bind(entity.cu_rate_per_cu)
            .bind(entity.status.to_string())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error creating project: {}", e);
                AppError::Database(format!("Failed to create project: {}", e))
            })?;

        Project::try_from(row)
    }

    #[instrument(skip(self, entity))]
    async fn update(&self, entity: &Project) -> AppResult<Project> {
        debug!("Updating project: {}", entity.id);

        let query = format!(
            r#"
            UPDATE projects
            SET name = $2,
                client_name = $3,
                client_organization_id = $4,
                pm_id = $5,
                cu_rate_per_cu = $6,
                status = $7,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            PROJECT_SELECT_COLUMNS
        );

        let row = sqlx::query_as::<sqlx::Postgres, ProjectRow>(&query)
            .bind(entity.id)
            .bind(&entity.name)
            .bind(&entity.client_name)
            .bind(entity.client_organization_id)
            .bind(entity.pm_id)
            .bind(entity.cu_rate_per_cu)
            .bind(entity.status.to_string())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error updating project {}: {}", entity.id, e);
                AppError::Database(format!("Failed to update project: {}", e))
            })?;

        Project::try_from(row)
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error deleting project {}: {}", id, e);
                AppError::Database(format!("Failed to delete project: {}", e))
            })?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl ProjectRepository for PgProjectRepository {
    #[instrument(skip(self))]
    async fn increment_total_cu(&self, id: Uuid, delta: Decimal) -> AppResult<Decimal> {
        debug!("Incrementing total_cu_used for project {} by {}", id, delta);

        // Atomic increment; no application-level read-then-write
        let row: Option<(Decimal,)> = sqlx::query_as(
            r#"
            UPDATE projects
            SET total_cu_used = total_cu_used + $2,
                updated_at = NOW()
            WHERE id = $1
            RETURNING total_cu_used
            "#,
        )
        .bind(id)
        .bind(delta)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error incrementing CU for project {}: {}", id, e);
            AppError::Database(format!("Failed to increment project CU: {}", e))
        })?;

        row.map(|(total,)| total)
            .ok_or_else(|| AppError::ProjectNotFound(id.to_string()))
    }

    #[instrument(skip(self, ids))]
    async fn find_by_ids(&self, ids: &[Uuid]) -> AppResult<Vec<Project>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let query = format!(
            "SELECT {} FROM projects WHERE id = ANY($1)",
            PROJECT_SELECT_COLUMNS
        );

        let rows = sqlx::query_as::<sqlx::Postgres, ProjectRow>(&query)
            .bind(ids)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error batch-fetching projects: {}", e);
                AppError::Database(format!("Failed to fetch projects: {}", e))
            })?;

        rows.into_iter().map(Project::try_from).collect()
    }
}

/// Helper struct for mapping database rows to domain model
#[derive(Debug, sqlx::FromRow)]
struct ProjectRow {
    id: Uuid,
    name: String,
    client_name: String,
    client_organization_id: Option<Uuid>,
    pm_id: Option<Uuid>,
    total_cu_used: Decimal,
    cu_rate_per_cu: Option<Decimal>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProjectRow> for Project {
    type Error = AppError;

    fn try_from(row: ProjectRow) -> Result<Self, Self::Error> {
        let status = match row.status.as_str() {
            "active" => ProjectStatus::Active,
            "paused" => ProjectStatus::Paused,
            "closed" => ProjectStatus::Closed,
            other => {
                return Err(AppError::Database(format!(
                    "Unknown project status: {}",
                    other
                )))
            }
        };

        Ok(Self {
            id: row.id,
            name: row.name,
            client_name: row.client_name,
            client_organization_id: row.client_organization_id,
            pm_id: row.pm_id,
            total_cu_used: row.total_cu_used,
            cu_rate_per_cu: row.cu_rate_per_cu,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
