pub mod cache;
pub mod health;
pub mod home;
pub mod metrics;

pub use cache::{cache_index, get_cached, store_cached};
pub use health::{health_check, readiness_check};
pub use home::{home, not_found};
pub use metrics::metrics;
