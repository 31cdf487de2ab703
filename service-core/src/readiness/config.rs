use super::error::ReadinessError;
use std::time::Duration;

/// Number of probes spread across the stabilization window.
pub const STABILITY_SAMPLES: u32 = 4;

const MIN_STABILITY_STEP: Duration = Duration::from_millis(10);

/// Timing parameters of the readiness gate. Built once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeConfig {
    /// Pause before the first probe.
    pub initial_delay: Duration,
    /// Pause between probes of an unreachable target.
    pub poll_interval: Duration,
    /// Overall budget for the TCP stage, initial delay included.
    pub timeout: Duration,
    /// Budget of a single connect attempt.
    pub tcp_timeout: Duration,
    /// How long a target must stay reachable before it counts as stable.
    pub stabilization_window: Duration,
    /// Budget of each functional check.
    pub check_timeout: Duration,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(1000),
            poll_interval: Duration::from_millis(2000),
            timeout: Duration::from_millis(30_000),
            tcp_timeout: Duration::from_millis(500),
            stabilization_window: Duration::from_millis(1000),
            check_timeout: Duration::from_millis(10_000),
        }
    }
}

impl ProbeConfig {
    /// Requires `timeout >= poll_interval > 0` and non-zero connect and check budgets.
    pub fn validate(&self) -> Result<(), ReadinessError> {
        if self.poll_interval.is_zero() {
            return Err(ReadinessError::Config(
                "poll interval must be greater than zero".to_string(),
            ));
        }
        if self.timeout < self.poll_interval {
            return Err(ReadinessError::Config(format!(
                "timeout ({}ms) must not be shorter than the poll interval ({}ms)",
                self.timeout.as_millis(),
                self.poll_interval.as_millis()
            )));
        }
        if self.tcp_timeout.is_zero() {
            return Err(ReadinessError::Config(
                "tcp timeout must be greater than zero".to_string(),
            ));
        }
        if self.check_timeout.is_zero() {
            return Err(ReadinessError::Config(
                "functional check timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Pause between probes of a target that is inside its stabilization window.
    pub fn stability_step(&self) -> Duration {
        (self.stabilization_window / STABILITY_SAMPLES)
            .min(self.poll_interval)
            .max(MIN_STABILITY_STEP)
    }
}
