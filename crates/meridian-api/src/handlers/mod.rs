//! HTTP request handlers

pub mod call_record;
pub mod kpi;

pub use call_record::configure as configure_call_records;
pub use kpi::configure as configure_kpi;
