//! KPI and reporting DTOs

use chrono::{DateTime, Utc};
use meridian_core::models::UserInfo;
use meridian_services::{AccountSummary, MonthlyKpiReport};
use serde::{Deserialize, Serialize};

/// Query parameters for the monthly KPI report
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KpiQueryParams {
    /// Reference instant; the report covers the calendar month containing
    /// it. Defaults to now.
    pub reference: Option<DateTime<Utc>>,
}

/// Monthly KPI report, with the per-client rollup for PM actors
#[derive(Debug, Clone, Serialize)]
pub struct KpiReportResponse {
    #[serde(flatten)]
    pub report: MonthlyKpiReport,

    /// Present only when the evaluated employee is a PM
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accounts: Option<Vec<AccountSummary>>,
}

/// Employee overview: profile plus the same aggregation run on their behalf
#[derive(Debug, Clone, Serialize)]
pub struct EmployeeOverviewResponse {
    pub employee: UserInfo,

    pub kpi: MonthlyKpiReport,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub accounts: Option<Vec<AccountSummary>>,
}
