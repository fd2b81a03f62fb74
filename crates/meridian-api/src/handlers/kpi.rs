//! KPI and reporting handlers
//!
//! Monthly per-role KPI report for the acting user, and the back-office
//! employee overview that runs the same aggregation on behalf of an
//! arbitrary employee.

use crate::dto::{ApiResponse, EmployeeOverviewResponse, KpiQueryParams, KpiReportResponse};
use actix_web::{
    web::{self, Data, Json, Path, Query},
    Result,
};
use chrono::Utc;
use meridian_auth::{AuthenticatedUser, BackOfficeUser};
use meridian_core::{
    error::AppError,
    models::{UserInfo, UserRole},
    traits::Repository,
};
use meridian_db::repositories::{
    PgCallRecordRepository, PgExpertRepository, PgProjectRepository, PgUserRepository,
};
use meridian_services::{account_rollup, AccountSummary, KpiScope, KpiService, MonthlyKpiReport};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

type PgKpiService = KpiService<PgCallRecordRepository, PgProjectRepository, PgExpertRepository>;

fn kpi_service(db: &PgPool) -> PgKpiService {
    KpiService::new(
        Arc::new(PgCallRecordRepository::new(db.clone())),
        Arc::new(PgProjectRepository::new(db.clone())),
        Arc::new(PgExpertRepository::new(db.clone())),
    )
}

async fn report_for(
    service: &PgKpiService,
    role: UserRole,
    user_id: Uuid,
    query: &KpiQueryParams,
) -> Result<(MonthlyKpiReport, Option<Vec<AccountSummary>>), AppError> {
    let scope = KpiScope::for_user(role, user_id);
    let reference = query.reference.unwrap_or_else(Utc::now);

    let report = service.monthly_report(scope, reference).await?;

    // The per-client rollup only exists for PM reports
    let accounts = matches!(scope, KpiScope::Pm { .. })
        .then(|| account_rollup(&report.calls, service.timezone()));

    Ok((report, accounts))
}

/// Monthly KPI report for the acting user
#[instrument(skip(db, query), fields(user_id = %user.user_id, role = ?user.role))]
pub async fn monthly_kpi(
    user: AuthenticatedUser,
    query: Query<KpiQueryParams>,
    db: Data<PgPool>,
) -> Result<Json<ApiResponse<KpiReportResponse>>> {
    let service = kpi_service(db.get_ref());
    let (report, accounts) = report_for(&service, user.role, user.user_id, &query).await?;

    info!(
        total_calls = report.totals.total_calls,
        total_cu = %report.totals.total_cu,
        "Monthly KPI computed"
    );

    Ok(Json(ApiResponse::success(KpiReportResponse {
        report,
        accounts,
    })))
}

/// Employee overview for back-office actors
///
/// Runs the aggregation on behalf of the given employee, using that
/// employee's role to select filter and incentive formula.
#[instrument(skip(db, query), fields(actor_id = %actor.user_id))]
pub async fn employee_overview(
    actor: BackOfficeUser,
    path: Path<Uuid>,
    query: Query<KpiQueryParams>,
    db: Data<PgPool>,
) -> Result<Json<ApiResponse<EmployeeOverviewResponse>>> {
    let employee_id = path.into_inner();
    debug!(%employee_id, "Computing employee overview");

    let user_repo = PgUserRepository::new(db.get_ref().clone());
    let employee = user_repo
        .find_by_id(employee_id)
        .await?
        .ok_or_else(|| AppError::UserNotFound(employee_id.to_string()))?;

    let service = kpi_service(db.get_ref());
    let (kpi, accounts) = report_for(&service, employee.role, employee.id, &query).await?;

    Ok(Json(ApiResponse::success(EmployeeOverviewResponse {
        employee: UserInfo::from(&employee),
        kpi,
        accounts,
    })))
}

/// Mount the KPI routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/kpi").route("/monthly", web::get().to(monthly_kpi)));
    cfg.service(
        web::scope("/employees").route("/{id}/overview", web::get().to(employee_overview)),
    );
}
