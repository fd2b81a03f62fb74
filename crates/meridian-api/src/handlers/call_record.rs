//! Call record API handlers
//!
//! Thin HTTP layer over the call lifecycle service. Each handler builds the
//! repositories it needs from the shared pool; all state-machine rules live
//! in the service.

use crate::dto::{
    ApiResponse, CallRecordFilterParams, CallRecordResponse, CancelCallRequest,
    CompleteCallRequest, CreateCallRecordRequest, ScheduleCallRequest, UpdateCallRecordRequest,
};
use actix_web::{
    web::{self, Data, Json, Path, Query},
    Result,
};
use meridian_auth::{AdminUser, AuthenticatedUser};
use meridian_core::{
    error::AppError,
    traits::{PaginatedResponse, Pagination},
};
use meridian_db::repositories::{
    PgCallRecordRepository, PgExpertRepository, PgProjectRepository,
};
use meridian_services::{CallLifecycleService, CreateCallInput, UpdateCallInput};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

type PgLifecycleService =
    CallLifecycleService<PgCallRecordRepository, PgProjectRepository, PgExpertRepository>;

fn lifecycle_service(db: &PgPool) -> PgLifecycleService {
    CallLifecycleService::new(
        Arc::new(PgCallRecordRepository::new(db.clone())),
        Arc::new(PgProjectRepository::new(db.clone())),
        Arc::new(PgExpertRepository::new(db.clone())),
    )
}

/// Create a call record
///
/// Initial status depends on whether a scheduled start time is supplied.
/// The owning project's CU counter is incremented as a side effect.
#[instrument(skip(db, body), fields(user_id = %user.user_id))]
pub async fn create_call_record(
    user: AuthenticatedUser,
    body: Json<CreateCallRecordRequest>,
    db: Data<PgPool>,
) -> Result<Json<ApiResponse<CallRecordResponse>>> {
    body.validate().map_err(|e| {
        warn!("Invalid create payload: {}", e);
        AppError::Validation(e.to_string())
    })?;

    let body = body.into_inner();
    let record = lifecycle_service(db.get_ref())
        .create(CreateCallInput {
            project_id: body.project_id,
            expert_id: body.expert_id,
            project_expert_id: body.project_expert_id,
            duration_minutes: body.duration_minutes,
            call_date: body.call_date,
            scheduled_start_time: body.scheduled_start_time,
            scheduled_end_time: body.scheduled_end_time,
            pm_id: body.pm_id,
            ra_id: body.ra_id,
            zoom_link: body.zoom_link,
            notes: body.notes,
        })
        .await?;

    info!(call_id = %record.id, "Call record created via API");

    Ok(Json(ApiResponse::with_message(
        CallRecordResponse::from(record),
        "Call record created",
    )))
}

/// List call records with filtering and pagination
#[instrument(skip(db, query))]
pub async fn list_call_records(
    _user: AuthenticatedUser,
    query: Query<CallRecordFilterParams>,
    db: Data<PgPool>,
) -> Result<Json<PaginatedResponse<CallRecordResponse>>> {
    query.validate().map_err(|e| {
        warn!("Invalid query parameters: {}", e);
        AppError::Validation(e.to_string())
    })?;

    debug!(
        "Listing call records: page={}, per_page={}, project={:?}, expert={:?}, status={:?}",
        query.pagination.page,
        query.pagination.per_page,
        query.project_id,
        query.expert_id,
        query.status
    );

    let (records, total) = lifecycle_service(db.get_ref())
        .list(
            query.project_id,
            query.expert_id,
            query.status,
            Pagination::new(query.pagination.page, query.pagination.per_page),
        )
        .await?;

    let data: Vec<CallRecordResponse> =
        records.into_iter().map(CallRecordResponse::from).collect();

    Ok(Json(query.pagination.paginate(data, total)))
}

/// Get a single call record by id
#[instrument(skip(db))]
pub async fn get_call_record(
    _user: AuthenticatedUser,
    path: Path<Uuid>,
    db: Data<PgPool>,
) -> Result<Json<ApiResponse<CallRecordResponse>>> {
    let record = lifecycle_service(db.get_ref())
        .get(path.into_inner())
        .await?;

    Ok(Json(ApiResponse::success(CallRecordResponse::from(record))))
}

/// Generic update; re-derives CU when the duration changes
#[instrument(skip(db, body))]
pub async fn update_call_record(
    _user: AuthenticatedUser,
    path: Path<Uuid>,
    body: Json<UpdateCallRecordRequest>,
    db: Data<PgPool>,
) -> Result<Json<ApiResponse<CallRecordResponse>>> {
    body.validate().map_err(|e| {
        warn!("Invalid update payload: {}", e);
        AppError::Validation(e.to_string())
    })?;

    let body = body.into_inner();
    let record = lifecycle_service(db.get_ref())
        .update(
            path.into_inner(),
            UpdateCallInput {
                duration_minutes: body.duration_minutes,
                call_date: body.call_date,
                scheduled_start_time: body.scheduled_start_time,
                scheduled_end_time: body.scheduled_end_time,
                pm_id: body.pm_id,
                ra_id: body.ra_id,
                zoom_link: body.zoom_link,
                notes: body.notes,
            },
        )
        .await?;

    Ok(Json(ApiResponse::success(CallRecordResponse::from(record))))
}

/// Schedule transition (pending → scheduled)
#[instrument(skip(db, body))]
pub async fn schedule_call_record(
    _user: AuthenticatedUser,
    path: Path<Uuid>,
    body: Json<ScheduleCallRequest>,
    db: Data<PgPool>,
) -> Result<Json<ApiResponse<CallRecordResponse>>> {
    body.validate().map_err(|e| {
        warn!("Invalid schedule payload: {}", e);
        AppError::Validation(e.to_string())
    })?;

    let body = body.into_inner();
    if body.scheduled_end_time <= body.scheduled_start_time {
        return Err(AppError::InvalidInput(
            "scheduled_end_time must be after scheduled_start_time".to_string(),
        )
        .into());
    }

    let record = lifecycle_service(db.get_ref())
        .schedule(
            path.into_inner(),
            body.scheduled_start_time,
            body.scheduled_end_time,
            body.zoom_link,
        )
        .await?;

    Ok(Json(ApiResponse::with_message(
        CallRecordResponse::from(record),
        "Call record scheduled",
    )))
}

/// Complete transition (scheduled → completed)
#[instrument(skip(db, body))]
pub async fn complete_call_record(
    _user: AuthenticatedUser,
    path: Path<Uuid>,
    body: Json<CompleteCallRequest>,
    db: Data<PgPool>,
) -> Result<Json<ApiResponse<CallRecordResponse>>> {
    body.validate().map_err(|e| {
        warn!("Invalid complete payload: {}", e);
        AppError::Validation(e.to_string())
    })?;

    let body = body.into_inner();
    let record = lifecycle_service(db.get_ref())
        .complete(
            path.into_inner(),
            body.actual_duration_minutes,
            body.recording_url,
            body.notes,
        )
        .await?;

    Ok(Json(ApiResponse::with_message(
        CallRecordResponse::from(record),
        "Call record completed",
    )))
}

/// Cancel transition (pending|scheduled → cancelled); idempotent
#[instrument(skip(db, body))]
pub async fn cancel_call_record(
    _user: AuthenticatedUser,
    path: Path<Uuid>,
    body: Json<CancelCallRequest>,
    db: Data<PgPool>,
) -> Result<Json<ApiResponse<CallRecordResponse>>> {
    body.validate().map_err(|e| {
        warn!("Invalid cancel payload: {}", e);
        AppError::Validation(e.to_string())
    })?;

    let record = lifecycle_service(db.get_ref())
        .cancel(path.into_inner(), body.into_inner().reason)
        .await?;

    Ok(Json(ApiResponse::with_message(
        CallRecordResponse::from(record),
        "Call record cancelled",
    )))
}

/// Administrative, irreversible removal
#[instrument(skip(db), fields(admin_id = %admin.user_id))]
pub async fn delete_call_record(
    admin: AdminUser,
    path: Path<Uuid>,
    db: Data<PgPool>,
) -> Result<Json<ApiResponse<serde_json::Value>>> {
    let id = path.into_inner();
    lifecycle_service(db.get_ref()).remove(id).await?;

    info!(call_id = %id, "Call record removed via API");

    Ok(Json(ApiResponse::with_message(
        serde_json::json!({ "id": id }),
        "Call record removed",
    )))
}

/// Mount the call record routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/call-records")
            .route("", web::get().to(list_call_records))
            .route("", web::post().to(create_call_record))
            .route("/{id}", web::get().to(get_call_record))
            .route("/{id}", web::put().to(update_call_record))
            .route("/{id}", web::delete().to(delete_call_record))
            .route("/{id}/schedule", web::post().to(schedule_call_record))
            .route("/{id}/complete", web::post().to(complete_call_record))
            .route("/{id}/cancel", web::post().to(cancel_call_record)),
    );
}
