//! API layer for Meridian
//!
//! HTTP handlers and DTOs for the call-record lifecycle and the monthly
//! KPI/revenue reports.

pub mod dto;
pub mod handlers;

// Re-export DTOs (common types)
pub use dto::{ApiResponse, PaginationParams};

// Re-export handler configuration functions
pub use handlers::{configure_call_records, configure_kpi};
