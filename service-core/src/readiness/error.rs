use super::target::{ProbeResult, ProbeTarget};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReadinessError {
    #[error("invalid readiness configuration: {0}")]
    Config(String),

    #[error(
        "timed out after {}ms waiting for {}",
        .timeout.as_millis(),
        describe_unreachable(.unreachable)
    )]
    Timeout {
        timeout: Duration,
        unreachable: Vec<ProbeResult>,
    },

    #[error("probe of {target} stopped before it stabilized: {reason}")]
    ProbeTask { target: String, reason: String },

    #[error("cache probe failed: {0}")]
    CacheProbe(String),

    #[error("database probe failed: {0}")]
    DatabaseProbe(String),
}

impl ReadinessError {
    /// Targets that never stabilized; empty for every variant but `Timeout`.
    pub fn unreachable_targets(&self) -> Vec<&ProbeTarget> {
        match self {
            ReadinessError::Timeout { unreachable, .. } => {
                unreachable.iter().map(|r| &r.target).collect()
            }
            _ => Vec::new(),
        }
    }
}

fn describe_unreachable(results: &[ProbeResult]) -> String {
    results
        .iter()
        .map(|r| match &r.error {
            Some(err) => format!("{} ({})", r.target, err),
            None => format!("{} (not stable yet)", r.target),
        })
        .collect::<Vec<_>>()
        .join(", ")
}
