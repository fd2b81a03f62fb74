//! Business logic services for Meridian
//!
//! This crate contains the services that orchestrate the billing core:
//! the call-record lifecycle, the monthly KPI/incentive aggregator, and
//! the per-client revenue rollup.
//!
//! # Architecture
//!
//! Services are designed to be composable and testable:
//! - Each service owns its dependencies (repositories) behind trait bounds
//! - Services are wrapped in Arc for safe sharing across async tasks
//! - All operations are instrumented with tracing
//! - Comprehensive error handling with AppError
//!
//! # Services
//!
//! - `CallLifecycleService` - Call record state machine and CU derivation
//! - `KpiService` - Monthly per-role KPI and incentive aggregation
//! - `account_rollup` - Per-client revenue grouping for PM reports

pub mod kpi;
pub mod lifecycle;
pub mod rollup;

#[cfg(test)]
pub(crate) mod testing;

pub use kpi::{KpiCall, KpiScope, KpiService, KpiTotals, MonthlyKpiReport, ReportingPeriod};
pub use lifecycle::{CallLifecycleService, CreateCallInput, UpdateCallInput};
pub use rollup::{account_rollup, AccountSummary};

/// Business logic constants
pub mod constants {
    use chrono_tz::Tz;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    /// Per-call incentive for research associates, in USD
    pub const RA_INCENTIVE_PER_CALL: Decimal = dec!(250);

    /// Monthly cap on the RA incentive, in USD
    pub const RA_INCENTIVE_MONTHLY_CAP: Decimal = dec!(2500);

    /// Per-CU incentive for project managers, in USD (uncapped)
    pub const PM_INCENTIVE_PER_CU: Decimal = dec!(70);

    /// Reference timezone for all reporting-period arithmetic
    pub const REPORTING_TIMEZONE: Tz = chrono_tz::America::Sao_Paulo;
}
