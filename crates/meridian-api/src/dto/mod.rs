//! Data transfer objects for the HTTP API

pub mod call_record;
pub mod common;
pub mod kpi;

pub use call_record::{
    CallRecordFilterParams, CallRecordResponse, CancelCallRequest, CompleteCallRequest,
    CreateCallRecordRequest, ScheduleCallRequest, UpdateCallRecordRequest,
};
pub use common::{ApiResponse, PaginationParams};
pub use kpi::{EmployeeOverviewResponse, KpiQueryParams, KpiReportResponse};
