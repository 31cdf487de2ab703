pub mod error_detail;
pub mod metrics;
pub mod rate_limit;
pub mod security_headers;
pub mod tracing;
