//! Credit-Unit billing arithmetic
//!
//! A Credit Unit (CU) is a quarter-hour of consulting time, rounded up.
//! This module is the single source of truth for CU computation: every
//! place that derives `cu_used` goes through [`calculate_cu`] so the
//! rounding policy cannot drift between call sites.

use rust_decimal::Decimal;

/// USD charged per CU when a project carries no explicit rate.
pub const DEFAULT_CU_RATE_PER_CU: Decimal = Decimal::from_parts(1150, 0, 0, false, 0);

/// Convert a call duration in minutes to billable Credit Units.
///
/// Minutes are converted to hours and rounded *up* to the nearest
/// quarter-hour increment. Zero or negative durations bill nothing.
///
/// # Examples
///
/// ```
/// use meridian_core::billing::calculate_cu;
/// use rust_decimal::Decimal;
///
/// assert_eq!(calculate_cu(45), Decimal::new(75, 2));  // 0.75 CU
/// assert_eq!(calculate_cu(50), Decimal::new(100, 2)); // rounds up to 1.00 CU
/// ```
pub fn calculate_cu(minutes: i32) -> Decimal {
    if minutes <= 0 {
        return Decimal::ZERO;
    }

    // ceil(minutes / 60 * 4) / 4, i.e. quarter hours rounded up
    let quarter_hours = (Decimal::from(minutes) / Decimal::from(15)).ceil();
    (quarter_hours / Decimal::from(4)).normalize()
}

/// Per-call revenue in USD: CU used times the project's rate, rounded to
/// two decimals.
pub fn revenue_usd(cu_used: Decimal, rate_per_cu: Option<Decimal>) -> Decimal {
    let rate = rate_per_cu.unwrap_or(DEFAULT_CU_RATE_PER_CU);
    (cu_used * rate).round_dp(2)
}
