//! Monthly KPI/incentive aggregator
//!
//! Computes per-role monthly figures over completed calls: call counts, CU
//! totals, role-specific incentives, and (for back office) company revenue.
//! The reporting period is always the calendar month containing the
//! reference instant, evaluated in the America/Sao_Paulo timezone.

use crate::constants::{
    PM_INCENTIVE_PER_CU, RA_INCENTIVE_MONTHLY_CAP, RA_INCENTIVE_PER_CALL, REPORTING_TIMEZONE,
};
use chrono::{DateTime, Datelike, Duration, LocalResult, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use meridian_core::{
    billing::DEFAULT_CU_RATE_PER_CU,
    models::{CallRecord, Expert, Project, UserRole},
    traits::{CallRecordRepository, ExpertRepository, ProjectRepository},
    AppError, AppResult,
};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument};
use uuid::Uuid;

/// Display format for localized timestamps in reports
const LOCAL_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Resolve the UTC instant of local midnight on the first of the given month.
///
/// A spring-forward gap at local midnight (Sao Paulo DST transitions jumped
/// 00:00 to 01:00) resolves to the instant local clocks resume; an ambiguous
/// local time resolves to its earliest instant. Anything unresolvable is an
/// error, never a silent UTC fallback.
fn local_month_start(year: i32, month: u32, tz: Tz) -> AppResult<DateTime<Utc>> {
    let date = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| AppError::Timezone(format!("invalid month {}-{:02}", year, month)))?;
    let mut naive = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| AppError::Timezone(format!("invalid midnight for {}", date)))?;

    // DST gaps are at most a few hours; scan forward to the resume instant
    for _ in 0..=180 {
        match tz.from_local_datetime(&naive) {
            LocalResult::Single(dt) => return Ok(dt.with_timezone(&Utc)),
            LocalResult::Ambiguous(earliest, _) => return Ok(earliest.with_timezone(&Utc)),
            LocalResult::None => naive += Duration::minutes(1),
        }
    }

    Err(AppError::Timezone(format!(
        "could not resolve local month start {}-{:02} in {}",
        year, month, tz
    )))
}

/// Compute the `[start, end)` UTC bounds of the calendar month containing
/// `reference`, evaluated in `tz`.
pub fn month_bounds(
    reference: DateTime<Utc>,
    tz: Tz,
) -> AppResult<(DateTime<Utc>, DateTime<Utc>)> {
    let local = reference.with_timezone(&tz);
    let (year, month) = (local.year(), local.month());

    let start = local_month_start(year, month, tz)?;
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    let end = local_month_start(next_year, next_month, tz)?;

    Ok((start, end))
}

/// Role-specific aggregation scope
///
/// Closed dispatch over the three report shapes; an unrecognized role can
/// never fall through to a wrong formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KpiScope {
    /// Research associate: calls crediting this RA through the sourcing window
    Ra { ra_id: Uuid },
    /// Project manager: calls directly attributed via `pm_id`
    Pm { pm_id: Uuid },
    /// Back office (admin/finance): every completed call, company revenue
    Company,
}

impl KpiScope {
    /// Scope for a user acting on their own behalf
    pub fn for_user(role: UserRole, user_id: Uuid) -> Self {
        match role {
            UserRole::Ra => KpiScope::Ra { ra_id: user_id },
            UserRole::Pm => KpiScope::Pm { pm_id: user_id },
            UserRole::Admin | UserRole::Finance => KpiScope::Company,
        }
    }

    /// Whether this scope reports company-wide revenue
    pub fn is_company(&self) -> bool {
        matches!(self, KpiScope::Company)
    }

    /// Whether the given completed call falls inside this scope
    fn includes(&self, call: &CallRecord, expert: Option<&Expert>) -> bool {
        match self {
            KpiScope::Ra { ra_id } => {
                let Some(completed_at) = call.completed_at else {
                    return false;
                };
                expert
                    .map(|e| e.credits_ra(*ra_id, completed_at))
                    .unwrap_or(false)
            }
            KpiScope::Pm { pm_id } => call.pm_id == Some(*pm_id),
            KpiScope::Company => true,
        }
    }

    /// Role-specific incentive over the month's filtered totals
    fn incentive(&self, total_calls: i64, total_cu: Decimal) -> Decimal {
        match self {
            KpiScope::Ra { .. } => (RA_INCENTIVE_PER_CALL * Decimal::from(total_calls))
                .min(RA_INCENTIVE_MONTHLY_CAP),
            KpiScope::Pm { .. } => (total_cu * PM_INCENTIVE_PER_CU).round_dp(2),
            KpiScope::Company => Decimal::ZERO,
        }
    }
}

/// Reporting period bounds
#[derive(Debug, Clone, Serialize)]
pub struct ReportingPeriod {
    /// Inclusive lower bound (UTC)
    pub start: DateTime<Utc>,
    /// Exclusive upper bound (UTC)
    pub end: DateTime<Utc>,
    /// Month label in the reference timezone, e.g. "2026-08"
    pub label: String,
    /// Reference timezone name
    pub timezone: String,
}

/// Monthly totals for the evaluated scope
#[derive(Debug, Clone, Serialize)]
pub struct KpiTotals {
    pub total_calls: i64,
    pub total_cu: Decimal,
    pub incentive_usd: Decimal,
    /// Company-wide revenue; present only for back-office scopes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_company_revenue_usd: Option<Decimal>,
}

/// A completed call as reported, enriched with project/expert context
#[derive(Debug, Clone, Serialize)]
pub struct KpiCall {
    pub id: Uuid,
    pub project_id: Uuid,
    pub project_name: Option<String>,
    pub client_name: Option<String>,
    pub client_organization_id: Option<Uuid>,
    pub expert_id: Uuid,
    pub expert_name: Option<String>,
    pub completed_at: DateTime<Utc>,
    /// `completed_at` rendered in the reference timezone
    pub completed_at_local: String,
    pub cu_used: Decimal,
    pub rate_per_cu: Decimal,
    pub revenue_usd: Decimal,
}

/// Monthly KPI report
#[derive(Debug, Clone, Serialize)]
pub struct MonthlyKpiReport {
    pub period: ReportingPeriod,
    pub totals: KpiTotals,
    pub calls: Vec<KpiCall>,
}

/// Monthly KPI/incentive aggregation service
///
/// Read-only: re-scans the month's completed calls on every request. There
/// is no cached rollup to invalidate.
pub struct KpiService<C, P, E>
where
    C: CallRecordRepository,
    P: ProjectRepository,
    E: ExpertRepository,
{
    call_repo: Arc<C>,
    project_repo: Arc<P>,
    expert_repo: Arc<E>,
    timezone: Tz,
}

impl<C, P, E> KpiService<C, P, E>
where
    C: CallRecordRepository,
    P: ProjectRepository,
    E: ExpertRepository,
{
    /// Create a new KPI service using the reference reporting timezone
    pub fn new(call_repo: Arc<C>, project_repo: Arc<P>, expert_repo: Arc<E>) -> Self {
        Self::with_timezone(call_repo, project_repo, expert_repo, REPORTING_TIMEZONE)
    }

    /// Create a new KPI service with an explicit timezone
    pub fn with_timezone(
        call_repo: Arc<C>,
        project_repo: Arc<P>,
        expert_repo: Arc<E>,
        timezone: Tz,
    ) -> Self {
        Self {
            call_repo,
            project_repo,
            expert_repo,
            timezone,
        }
    }

    /// The reference timezone this service reports in
    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Compute the monthly report for the given scope
    #[instrument(skip(self))]
    pub async fn monthly_report(
        &self,
        scope: KpiScope,
        reference: DateTime<Utc>,
    ) -> AppResult<MonthlyKpiReport> {
        let (start, end) = month_bounds(reference, self.timezone)?;
        debug!(%start, %end, "Computed reporting period");

        let calls = self.call_repo.list_completed_between(start, end).await?;

        // Batch-fetch enrichment data
        let mut project_ids: Vec<Uuid> = calls.iter().map(|c| c.project_id).collect();
        project_ids.sort_unstable();
        project_ids.dedup();
        let mut expert_ids: Vec<Uuid> = calls.iter().map(|c| c.expert_id).collect();
        expert_ids.sort_unstable();
        expert_ids.dedup();

        let projects: HashMap<Uuid, Project> = self
            .project_repo
            .find_by_ids(&project_ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();
        let experts: HashMap<Uuid, Expert> = self
            .expert_repo
            .find_by_ids(&expert_ids)
            .await?
            .into_iter()
            .map(|e| (e.id, e))
            .collect();

        let mut report_calls = Vec::new();
        let mut total_cu = Decimal::ZERO;
        let mut company_revenue = Decimal::ZERO;

        for call in calls {
            let expert = experts.get(&call.expert_id);
            if !scope.includes(&call, expert) {
                continue;
            }

            let Some(completed_at) = call.completed_at else {
                continue;
            };

            let project = projects.get(&call.project_id);
            let rate = project
                .map(|p| p.effective_rate())
                .unwrap_or(DEFAULT_CU_RATE_PER_CU);
            let revenue = (call.cu_used * rate).round_dp(2);

            total_cu += call.cu_used;
            company_revenue += revenue;

            report_calls.push(KpiCall {
                id: call.id,
                project_id: call.project_id,
                project_name: project.map(|p| p.name.clone()),
                client_name: project.map(|p| p.client_name.clone()),
                client_organization_id: project.and_then(|p| p.client_organization_id),
                expert_id: call.expert_id,
                expert_name: expert.map(|e| e.name.clone()),
                completed_at,
                completed_at_local: completed_at
                    .with_timezone(&self.timezone)
                    .format(LOCAL_TIMESTAMP_FORMAT)
                    .to_string(),
                cu_used: call.cu_used,
                rate_per_cu: rate,
                revenue_usd: revenue,
            });
        }

        let total_calls = report_calls.len() as i64;
        // Rounded once at the end, not per call
        let total_cu = total_cu.round_dp(2);
        let incentive_usd = scope.incentive(total_calls, total_cu);

        let totals = KpiTotals {
            total_calls,
            total_cu,
            incentive_usd,
            total_company_revenue_usd: scope
                .is_company()
                .then(|| company_revenue.round_dp(2)),
        };

        let label = reference
            .with_timezone(&self.timezone)
            .format("%Y-%m")
            .to_string();

        Ok(MonthlyKpiReport {
            period: ReportingPeriod {
                start,
                end,
                label,
                timezone: self.timezone.to_string(),
            },
            totals,
            calls: report_calls,
        })
    }
}
