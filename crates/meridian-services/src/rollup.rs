//! Account revenue rollup
//!
//! Groups a PM's monthly completed calls by client and computes per-client
//! CU, call count, and USD revenue. Grouping prefers the stable
//! `client_organization_id`; the display name is only a fallback for
//! projects with no organization link.

use crate::kpi::KpiCall;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

/// Display format for localized timestamps in reports
const LOCAL_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Per-client monthly summary
#[derive(Debug, Clone, Serialize)]
pub struct AccountSummary {
    pub client_organization_id: Option<Uuid>,
    pub client_name: Option<String>,
    pub total_cu_this_month: Decimal,
    pub completed_calls_this_month: i64,
    pub revenue_this_month_usd: Decimal,
    /// Latest `completed_at` in the group, rendered in the reference zone
    pub last_activity_at: Option<String>,
    /// No contracted-CU data model exists; always `None`, meaning
    /// "not available", never zero
    pub contracted_cu: Option<Decimal>,
    /// Always `None` for the same reason as `contracted_cu`
    pub usage_rate: Option<Decimal>,
}

/// Grouping key: stable organization id when present, display name otherwise
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum AccountKey {
    Organization(Uuid),
    Name(String),
}

impl AccountKey {
    fn for_call(call: &KpiCall) -> Self {
        match call.client_organization_id {
            Some(org_id) => AccountKey::Organization(org_id),
            None => AccountKey::Name(call.client_name.clone().unwrap_or_default()),
        }
    }
}

#[derive(Default)]
struct GroupAccumulator {
    client_organization_id: Option<Uuid>,
    client_name: Option<String>,
    total_cu: Decimal,
    call_count: i64,
    revenue: Decimal,
    last_activity: Option<DateTime<Utc>>,
}

/// Group a month's reported calls by client, sorted descending by revenue
///
/// Every call lands in exactly one group, so the group CU totals sum to the
/// report's `total_cu`.
pub fn account_rollup(calls: &[KpiCall], tz: Tz) -> Vec<AccountSummary> {
    let mut groups: HashMap<AccountKey, GroupAccumulator> = HashMap::new();

    for call in calls {
        let acc = groups.entry(AccountKey::for_call(call)).or_default();
        if acc.call_count == 0 {
            acc.client_organization_id = call.client_organization_id;
            acc.client_name = call.client_name.clone();
        }
        acc.total_cu += call.cu_used;
        acc.call_count += 1;
        acc.revenue += call.revenue_usd;
        acc.last_activity = Some(match acc.last_activity {
            Some(current) => current.max(call.completed_at),
            None => call.completed_at,
        });
    }

    let mut summaries: Vec<AccountSummary> = groups
        .into_values()
        .map(|acc| AccountSummary {
            client_organization_id: acc.client_organization_id,
            client_name: acc.client_name,
            total_cu_this_month: acc.total_cu.round_dp(2),
            completed_calls_this_month: acc.call_count,
            revenue_this_month_usd: acc.revenue.round_dp(2),
            last_activity_at: acc.last_activity.map(|at| {
                at.with_timezone(&tz)
                    .format(LOCAL_TIMESTAMP_FORMAT)
                    .to_string()
            }),
            contracted_cu: None,
            usage_rate: None,
        })
        .collect();

    summaries.sort_by(|a, b| b.revenue_this_month_usd.cmp(&a.revenue_this_month_usd));
    summaries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::REPORTING_TIMEZONE;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn kpi_call(
        client_organization_id: Option<Uuid>,
        client_name: &str,
        cu: Decimal,
        revenue: Decimal,
        completed_at: DateTime<Utc>,
    ) -> KpiCall {
        KpiCall {
            id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            project_name: Some("Project".to_string()),
            client_name: Some(client_name.to_string()),
            client_organization_id,
            expert_id: Uuid::new_v4(),
            expert_name: None,
            completed_at,
            completed_at_local: String::new(),
            cu_used: cu,
            rate_per_cu: dec!(1150),
            revenue_usd: revenue,
        }
    }

    fn utc(y: i32, mo: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, 0, 0).unwrap()
    }

    #[test]
    fn test_groups_by_organization_id() {
        let org = Uuid::new_v4();
        let calls = vec![
            kpi_call(Some(org), "Acme", dec!(1), dec!(1150), utc(2025, 6, 3, 10)),
            kpi_call(Some(org), "Acme Corp", dec!(0.5), dec!(575), utc(2025, 6, 5, 10)),
        ];

        let accounts = account_rollup(&calls, REPORTING_TIMEZONE);

        // Same organization merges even when the display name drifted
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].client_organization_id, Some(org));
        assert_eq!(accounts[0].total_cu_this_month, dec!(1.5));
        assert_eq!(accounts[0].completed_calls_this_month, 2);
        assert_eq!(accounts[0].revenue_this_month_usd, dec!(1725.00));
    }

    #[test]
    fn test_name_fallback_without_organization() {
        let calls = vec![
            kpi_call(None, "Acme", dec!(1), dec!(1150), utc(2025, 6, 3, 10)),
            kpi_call(None, "Acme", dec!(1), dec!(1150), utc(2025, 6, 4, 10)),
            kpi_call(None, "Borealis", dec!(2), dec!(2300), utc(2025, 6, 5, 10)),
        ];

        let accounts = account_rollup(&calls, REPORTING_TIMEZONE);

        assert_eq!(accounts.len(), 2);
        // Sorted descending by revenue
        assert_eq!(accounts[0].client_name.as_deref(), Some("Borealis"));
        assert_eq!(accounts[0].revenue_this_month_usd, dec!(2300.00));
        assert_eq!(accounts[1].completed_calls_this_month, 2);
    }

    #[test]
    fn test_contracted_fields_are_unset() {
        let calls = vec![kpi_call(None, "Acme", dec!(1), dec!(1150), utc(2025, 6, 3, 10))];
        let accounts = account_rollup(&calls, REPORTING_TIMEZONE);

        assert!(accounts[0].contracted_cu.is_none());
        assert!(accounts[0].usage_rate.is_none());
    }

    #[test]
    fn test_last_activity_is_group_max_localized() {
        let calls = vec![
            kpi_call(None, "Acme", dec!(1), dec!(1150), utc(2025, 6, 3, 10)),
            kpi_call(None, "Acme", dec!(1), dec!(1150), utc(2025, 6, 10, 15)),
        ];

        let accounts = account_rollup(&calls, REPORTING_TIMEZONE);

        // 2025-06-10T15:00Z is 12:00 in Sao Paulo (-03)
        assert_eq!(
            accounts[0].last_activity_at.as_deref(),
            Some("2025-06-10 12:00:00")
        );
    }

    #[test]
    fn test_group_cu_sums_to_total() {
        let org_a = Uuid::new_v4();
        let calls = vec![
            kpi_call(Some(org_a), "A", dec!(1.25), dec!(1437.50), utc(2025, 6, 3, 10)),
            kpi_call(Some(org_a), "A", dec!(0.75), dec!(862.50), utc(2025, 6, 4, 10)),
            kpi_call(None, "B", dec!(2), dec!(2300), utc(2025, 6, 5, 10)),
        ];
        let total_cu: Decimal = calls.iter().map(|c| c.cu_used).sum();

        let accounts = account_rollup(&calls, REPORTING_TIMEZONE);
        let grouped_cu: Decimal = accounts.iter().map(|a| a.total_cu_this_month).sum();

        assert_eq!(grouped_cu, total_cu.round_dp(2));
    }

    #[test]
    fn test_empty_input_yields_no_accounts() {
        let accounts = account_rollup(&[], REPORTING_TIMEZONE);
        assert!(accounts.is_empty());
    }
}
