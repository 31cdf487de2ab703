pub mod config;
pub mod handlers;
pub mod middleware;
pub mod services;
pub mod startup;

use crate::config::WebConfig;
use crate::services::CacheStore;
use service_core::middleware::rate_limit::IpRateLimiter;
use service_core::readiness::{FunctionalChecks, GateState};
use std::sync::Arc;
use tokio::sync::watch;

pub use startup::{build_router, Application};

#[derive(Clone)]
pub struct AppState {
    pub config: WebConfig,
    pub cache: Arc<dyn CacheStore>,
    pub checks: FunctionalChecks,
    pub readiness: watch::Receiver<GateState>,
    pub ip_rate_limiter: IpRateLimiter,
}
