//! Expert repository implementation
//!
//! PostgreSQL-backed storage for the expert roster, including the sourcing
//! attribution fields read by the incentive aggregator.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use meridian_core::{
    models::Expert,
    traits::{ExpertRepository, Repository},
    AppError, AppResult,
};
use sqlx::PgPool;
use tracing::{debug, error, instrument};
use uuid::Uuid;

/// PostgreSQL implementation of ExpertRepository
pub struct PgExpertRepository {
    pool: PgPool,
}

impl PgExpertRepository {
    /// Create a new expert repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const EXPERT_SELECT_COLUMNS: &str = r#"
    id, name, email, headline,
    sourced_by_ra_id, sourced_at,
    created_at, updated_at
"#;

#[async_trait]
impl Repository<Expert, Uuid> for PgExpertRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Expert>> {
        debug!("Finding expert by id: {}", id);

        let query = format!("SELECT {} FROM experts WHERE id = $1", EXPERT_SELECT_COLUMNS);

        let row = sqlx::query_as::<sqlx::Postgres, ExpertRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error finding expert {}: {}", id, e);
                AppError::Database(format!("Failed to find expert: {}", e))
            })?;

        Ok(row.map(Into::into))
    }

    #[instrument(skip(self))]
    async fn find_all(&self, limit: i64, offset: i64) -> AppResult<Vec<Expert>> {
        let query = format!(
            "SELECT {} FROM experts ORDER BY created_at DESC LIMIT $1 OFFSET $2",
            EXPERT_SELECT_COLUMNS
        );

        let rows = sqlx::query_as::<sqlx::Postgres, ExpertRow>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error listing experts: {}", e);
                AppError::Database(format!("Failed to fetch experts: {}", e))
            })?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self))]
    async fn count(&self) -> AppResult<i64> {
        let result: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM experts")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error counting experts: {}", e);
                AppError::Database(format!("Failed to count experts: {}", e))
            })?;

        Ok(result.0)
    }

    #[instrument(skip(self, entity))]
    async fn create(&self, entity: &Expert) -> AppResult<Expert> {
        debug!("Creating expert: {}", entity.name);

        let query = format!(
            r#"
            INSERT INTO experts (
                id, name, email, headline, sourced_by_ra_id, sourced_at
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            EXPERT_SELECT_COLUMNS
        );

        let row = sqlx::query_as::<sqlx::Postgres, ExpertRow>(&query)
            .bind(entity.id)
            .bind(&entity.name)
            .bind(&entity.email)
            .bind(&entity.headline)
            .bind(entity.sourced_by_ra_id)
            .bind(entity.sourced_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error creating expert: {}", e);
                AppError::Database(format!("Failed to create expert: {}", e))
            })?;

        Ok(row.into())
    }

    #[instrument(skip(self, entity))]
    async fn update(&self, entity: &Expert) -> AppResult<Expert> {
        debug!("Updating expert: {}", entity.id);

        let query = format!(
            r#"
            UPDATE experts
            SET name = $2,
                email = $3,
                headline = $4,
                sourced_by_ra_id = $5,
                sourced_at = $6,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            EXPERT_SELECT_COLUMNS
        );

        let row = sqlx::query_as::<sqlx::Postgres, ExpertRow>(&query)
            .bind(entity.id)
            .bind(&entity.name)
            .bind(&entity.email)
            .bind(&entity.headline)
            .bind(entity.sourced_by_ra_id)
            .bind(entity.sourced_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error updating expert {}: {}", entity.id, e);
                AppError::Database(format!("Failed to update expert: {}", e))
            })?;

        Ok(row.into())
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM experts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error deleting expert {}: {}", id, e);
                AppError::Database(format!("Failed to delete expert: {}", e))
            })?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl ExpertRepository for PgExpertRepository {
    #[instrument(skip(self, ids))]
    async fn find_by_ids(&self, ids: &[Uuid]) -> AppResult<Vec<Expert>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let query = format!(
            "SELECT {} FROM experts WHERE id = ANY($1)",
            EXPERT_SELECT_COLUMNS
        );

        let rows = sqlx::query_as::<sqlx::Postgres, ExpertRow>(&query)
            .bind(ids)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error batch-fetching experts: {}", e);
                AppError::Database(format!("Failed to fetch experts: {}", e))
            })?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self))]
    async fn list_sourced_by(&self, ra_id: Uuid) -> AppResult<Vec<Expert>> {
        let query = format!(
            "SELECT {} FROM experts WHERE sourced_by_ra_id = $1 ORDER BY sourced_at DESC",
            EXPERT_SELECT_COLUMNS
        );

        let rows = sqlx::query_as::<sqlx::Postgres, ExpertRow>(&query)
            .bind(ra_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error listing experts sourced by {}: {}", ra_id, e);
                AppError::Database(format!("Failed to fetch sourced experts: {}", e))
            })?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

/// Helper struct for mapping database rows to domain model
#[derive(Debug, sqlx::FromRow)]
struct ExpertRow {
    id: Uuid,
    name: String,
    email: Option<String>,
    headline: Option<String>,
    sourced_by_ra_id: Option<Uuid>,
    sourced_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ExpertRow> for Expert {
    fn from(row: ExpertRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            headline: row.headline,
            sourced_by_ra_id: row.sourced_by_ra_id,
            sourced_at: row.sourced_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
