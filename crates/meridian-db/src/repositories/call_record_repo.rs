//! Call record repository implementation
//!
//! Provides PostgreSQL-backed storage for consultation call records with
//! queries for reporting-period filtering. Uses runtime queries (not
//! compile-time macros) to avoid requiring a database connection at build
//! time.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use meridian_core::{
    models::{CallRecord, CallStatus},
    traits::{CallRecordRepository, Repository},
    AppError, AppResult,
};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{debug, error, instrument};
use uuid::Uuid;

/// PostgreSQL implementation of CallRecordRepository
pub struct PgCallRecordRepository {
    pool: PgPool,
}

impl PgCallRecordRepository {
    /// Create a new call record repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const CALL_RECORD_SELECT_COLUMNS: &str = r#"
    id, project_id, expert_id, project_expert_id,
    pm_id, ra_id,
    duration_minutes, actual_duration_minutes, cu_used,
    status, call_date,
    scheduled_start_time, scheduled_end_time, completed_at,
    notes, recording_url, zoom_link,
    created_at, updated_at
"#;

#[async_trait]
impl Repository<CallRecord, Uuid> for PgCallRecordRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<CallRecord>> {
        debug!("Finding call record by id: {}", id);

        let query = format!(
            "SELECT {} FROM call_records WHERE id = $1",
            CALL_RECORD_SELECT_COLUMNS
        );

        let row = sqlx::query_as::<sqlx::Postgres, CallRecordRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error finding call record {}: {}", id, e);
                AppError::Database(format!("Failed to find call record: {}", e))
            })?;

        row.map(CallRecord::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn find_all(&self, limit: i64, offset: i64) -> AppResult<Vec<CallRecord>> {
        let query = format!(
            "SELECT {} FROM call_records ORDER BY call_date DESC, created_at DESC LIMIT $1 OFFSET $2",
            CALL_RECORD_SELECT_COLUMNS
        );

        let rows = sqlx::query_as::<sqlx::Postgres, CallRecordRow>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error listing call records: {}", e);
                AppError::Database(format!("Failed to fetch call records: {}", e))
            })?;

        rows.into_iter().map(CallRecord::try_from).collect()
    }

    #[instrument(skip(self))]
    async fn count(&self) -> AppResult<i64> {
        let result: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM call_records")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error counting call records: {}", e);
                AppError::Database(format!("Failed to count call records: {}", e))
            })?;

        Ok(result.0)
    }

    #[instrument(skip(self, entity))]
    async fn create(&self, entity: &CallRecord) -> AppResult<CallRecord> {
        debug!(
            "Creating call record for project {} / expert {}",
            entity.project_id, entity.expert_id
        );

        let query = format!(
            r#"
            INSERT INTO call_records (
                id, project_id, expert_id, project_expert_id,
                pm_id, ra_id,
                duration_minutes, actual_duration_minutes, cu_used,
                status, call_date,
                scheduled_start_time, scheduled_end_time, completed_at,
                notes, recording_url, zoom_link
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            RETURNING {}
            "#,
            CALL_RECORD_SELECT_COLUMNS
        );

        let row = sqlx::query_as::<sqlx::Postgres, CallRecordRow>(&query)
            .bind(entity.id)
            .bind(entity.project_id)
            .bind(entity.expert_id)
            .bind(entity.project_expert_id)
            .bind(entity.pm_id)
            .bind(entity.ra_id)
            .bind(entity.duration_minutes)
            .bind(entity.actual_duration_minutes)
            .bind(entity.cu_used)
            .bind(entity.status.to_string())
            .bind(entity.call_date)
            .bind(entity.scheduled_start_time)
            .bind(entity.scheduled_end_time)
            .bind(entity.completed_at)
            .bind(&entity.notes)
            .bind(&entity.recording_url)
            .bind(&entity.zoom_link)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error creating call record: {}", e);
                AppError::Database(format!("Failed to create call record: {}", e))
            })?;

        CallRecord::try_from(row)
    }

    #[instrument(skip(self, entity))]
    async fn update(&self, entity: &CallRecord) -> AppResult<CallRecord> {
        debug!("Updating call record: {}", entity.id);

        let query = format!(
            r#"
            UPDATE call_records
            SET project_expert_id = $2,
                pm_id = $3,
                ra_id = $4,
                duration_minutes = $5,
                actual_duration_minutes = $6,
                cu_used = $7,
                status = $8,
                call_date = $9,
                scheduled_start_time = $10,
                scheduled_end_time = $11,
                completed_at = $12,
                notes = $13,
                recording_url = $14,
                zoom_link = $15,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            CALL_RECORD_SELECT_COLUMNS
        );

        let row = sqlx::query_as::<sqlx::Postgres, CallRecordRow>(&query)
            .bind(entity.id)
            .bind(entity.project_expert_id)
            .bind(entity.pm_id)
            .bind(entity.ra_id)
            .bind(entity.duration_minutes)
            .bind(entity.actual_duration_minutes)
            .bind(entity.cu_used)
            .bind(entity.status.to_string())
            .bind(entity.call_date)
            .bind(entity.scheduled_start_time)
            .bind(entity.scheduled_end_time)
            .bind(entity.completed_at)
            .bind(&entity.notes)
            .bind(&entity.recording_url)
            .bind(&entity.zoom_link)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error updating call record {}: {}", entity.id, e);
                AppError::Database(format!("Failed to update call record: {}", e))
            })?;

        CallRecord::try_from(row)
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        debug!("Deleting call record: {}", id);

        let result = sqlx::query("DELETE FROM call_records WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error deleting call record {}: {}", id, e);
                AppError::Database(format!("Failed to delete call record: {}", e))
            })?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl CallRecordRepository for PgCallRecordRepository {
    #[instrument(skip(self))]
    async fn list_completed_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<CallRecord>> {
        debug!("Listing completed calls in [{}, {})", start, end);

        let query = format!(
            r#"
            SELECT {}
            FROM call_records
            WHERE status = 'completed'
              AND completed_at IS NOT NULL
              AND completed_at >= $1
              AND completed_at < $2
            ORDER BY completed_at
            "#,
            CALL_RECORD_SELECT_COLUMNS
        );

        let rows = sqlx::query_as::<sqlx::Postgres, CallRecordRow>(&query)
            .bind(start)
            .bind(end)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error listing completed calls: {}", e);
                AppError::Database(format!("Failed to fetch completed calls: {}", e))
            })?;

        rows.into_iter().map(CallRecord::try_from).collect()
    }

    #[instrument(skip(self))]
    async fn list_filtered(
        &self,
        project_id: Option<Uuid>,
        expert_id: Option<Uuid>,
        status: Option<CallStatus>,
        limit: i64,
        offset: i64,
    ) -> AppResult<(Vec<CallRecord>, i64)> {
        let mut conditions = Vec::new();
        let mut param_idx = 1;

        if project_id.is_some() {
            conditions.push(format!("project_id = ${}", param_idx));
            param_idx += 1;
        }
        if expert_id.is_some() {
            conditions.push(format!("expert_id = ${}", param_idx));
            param_idx += 1;
        }
        if status.is_some() {
            conditions.push(format!("status = ${}", param_idx));
            param_idx += 1;
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let count_sql = format!("SELECT COUNT(*) FROM call_records {}", where_clause);
        let data_sql = format!(
            "SELECT {} FROM call_records {} ORDER BY call_date DESC, created_at DESC LIMIT ${} OFFSET ${}",
            CALL_RECORD_SELECT_COLUMNS,
            where_clause,
            param_idx,
            param_idx + 1
        );

        let mut count_query = sqlx::query_as::<sqlx::Postgres, (i64,)>(&count_sql);
        let mut data_query = sqlx::query_as::<sqlx::Postgres, CallRecordRow>(&data_sql);

        if let Some(pid) = project_id {
            count_query = count_query.bind(pid);
            data_query = data_query.bind(pid);
        }
        if let Some(eid) = expert_id {
            count_query = count_query.bind(eid);
            data_query = data_query.bind(eid);
        }
        if let Some(st) = status {
            count_query = count_query.bind(st.to_string());
            data_query = data_query.bind(st.to_string());
        }

        let total = count_query.fetch_one(&self.pool).await.map_err(|e| {
            error!("Database error counting filtered call records: {}", e);
            AppError::Database(format!("Failed to count call records: {}", e))
        })?;

        let rows = data_query
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error fetching filtered call records: {}", e);
                AppError::Database(format!("Failed to fetch call records: {}", e))
            })?;

        let records: AppResult<Vec<CallRecord>> =
            rows.into_iter().map(CallRecord::try_from).collect();

        Ok((records?, total.0))
    }
}

/// Helper struct for mapping database rows to domain model
#[derive(Debug, sqlx::FromRow)]
struct CallRecordRow {
    id: Uuid,
    project_id: Uuid,
    expert_id: Uuid,
    project_expert_id: Option<Uuid>,
    pm_id: Option<Uuid>,
    ra_id: Option<Uuid>,
    duration_minutes: i32,
    actual_duration_minutes: Option<i32>,
    cu_used: Decimal,
    status: String,
    call_date: NaiveDate,
    scheduled_start_time: Option<DateTime<Utc>>,
    scheduled_end_time: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    notes: Option<String>,
    recording_url: Option<String>,
    zoom_link: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CallRecordRow> for CallRecord {
    type Error = AppError;

    fn try_from(row: CallRecordRow) -> Result<Self, Self::Error> {
        let status = CallStatus::from_str(&row.status).ok_or_else(|| {
            AppError::Database(format!("Unknown call record status: {}", row.status))
        })?;

        Ok(Self {
            id: row.id,
            project_id: row.project_id,
            expert_id: row.expert_id,
            project_expert_id: row.project_expert_id,
            pm_id: row.pm_id,
            ra_id: row.ra_id,
            duration_minutes: row.duration_minutes,
            actual_duration_minutes: row.actual_duration_minutes,
            cu_used: row.cu_used,
            status,
            call_date: row.call_date,
            scheduled_start_time: row.scheduled_start_time,
            scheduled_end_time: row.scheduled_end_time,
            completed_at: row.completed_at,
            notes: row.notes,
            recording_url: row.recording_url,
            zoom_link: row.zoom_link,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
