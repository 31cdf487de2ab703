use super::check::FunctionalChecks;
use super::config::ProbeConfig;
use super::error::ReadinessError;
use super::probe::{Prober, TcpProber};
use super::target::{ProbeResult, ProbeTarget};
use metrics::counter;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio::time::{Instant, sleep, timeout_at};

/// Lifecycle of a gate run.
///
/// `Idle -> WaitingInitialDelay -> Polling -> AllStable -> RunningFunctionalChecks -> Ready`,
/// leaving early through `ConfigError`, `TimedOut`, `ProbeFailed` or `FunctionalCheckFailed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Idle,
    WaitingInitialDelay,
    Polling,
    AllStable,
    RunningFunctionalChecks,
    Ready,
    TimedOut,
    ProbeFailed,
    FunctionalCheckFailed,
    ConfigError,
}

impl GateState {
    pub fn as_str(&self) -> &'static str {
        match self {
            GateState::Idle => "idle",
            GateState::WaitingInitialDelay => "waiting_initial_delay",
            GateState::Polling => "polling",
            GateState::AllStable => "all_stable",
            GateState::RunningFunctionalChecks => "running_functional_checks",
            GateState::Ready => "ready",
            GateState::TimedOut => "timed_out",
            GateState::ProbeFailed => "probe_failed",
            GateState::FunctionalCheckFailed => "functional_check_failed",
            GateState::ConfigError => "config_error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            GateState::Ready
                | GateState::TimedOut
                | GateState::ProbeFailed
                | GateState::FunctionalCheckFailed
                | GateState::ConfigError
        )
    }
}

impl fmt::Display for GateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Startup barrier in front of the HTTP listener.
pub struct ReadinessGate {
    config: ProbeConfig,
    prober: Arc<dyn Prober>,
    state: watch::Sender<GateState>,
}

impl ReadinessGate {
    pub fn new(config: ProbeConfig) -> Self {
        Self::with_prober(config, Arc::new(TcpProber))
    }

    pub fn with_prober(config: ProbeConfig, prober: Arc<dyn Prober>) -> Self {
        let (state, _) = watch::channel(GateState::Idle);
        Self {
            config,
            prober,
            state,
        }
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    pub fn state(&self) -> GateState {
        *self.state.borrow()
    }

    /// Follow state transitions, e.g. from a readiness endpoint.
    pub fn subscribe(&self) -> watch::Receiver<GateState> {
        self.state.subscribe()
    }

    fn transition(&self, next: GateState) {
        let previous = self.state.send_replace(next);
        tracing::debug!(from = %previous, to = %next, "Readiness gate transition");
    }

    /// Full gate: TCP stabilization of `targets`, then the functional checks.
    pub async fn run(
        &self,
        targets: &[ProbeTarget],
        checks: &FunctionalChecks,
    ) -> Result<(), ReadinessError> {
        self.await_ready(targets).await?;
        self.verify(checks).await
    }

    /// Waits until every target has been continuously reachable for the
    /// stabilization window, or fails once `timeout` has elapsed since the call.
    pub async fn await_ready(&self, targets: &[ProbeTarget]) -> Result<(), ReadinessError> {
        if let Err(e) = self.config.validate() {
            tracing::error!(error = %e, "Rejected readiness configuration");
            self.transition(GateState::ConfigError);
            return Err(e);
        }

        let deadline = Instant::now() + self.config.timeout;
        tracing::info!(
            targets = ?targets.iter().map(ToString::to_string).collect::<Vec<_>>(),
            initial_delay_ms = self.config.initial_delay.as_millis() as u64,
            timeout_ms = self.config.timeout.as_millis() as u64,
            "Waiting for dependencies"
        );

        // Each probe task owns the sending half of its slot; the gate keeps the receivers.
        let (slots, readers): (Vec<_>, Vec<_>) = targets
            .iter()
            .map(|t| watch::channel(ProbeResult::pending(t.clone())))
            .unzip();
        let mut stable = vec![false; targets.len()];

        self.transition(GateState::WaitingInitialDelay);
        let polled = timeout_at(deadline, async {
            sleep(self.config.initial_delay).await;
            self.transition(GateState::Polling);

            let mut tasks = JoinSet::new();
            let mut owners = HashMap::with_capacity(targets.len());
            for (index, (target, slot)) in targets.iter().cloned().zip(slots).enumerate() {
                let prober = self.prober.clone();
                let config = self.config.clone();
                let handle = tasks.spawn(async move {
                    hold_until_stable(prober.as_ref(), &target, &config, &slot).await;
                    index
                });
                owners.insert(handle.id(), index);
            }

            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok(index) => stable[index] = true,
                    Err(e) => {
                        let target = owners
                            .get(&e.id())
                            .and_then(|index| targets.get(*index))
                            .map_or_else(|| "unknown target".to_string(), ToString::to_string);
                        return Err(ReadinessError::ProbeTask {
                            target,
                            reason: e.to_string(),
                        });
                    }
                }
            }
            Ok(())
        })
        .await;

        // Dropping the polling future dropped the JoinSet, which aborts the probe tasks.
        match polled {
            Ok(Ok(())) if stable.iter().all(|s| *s) => {
                self.transition(GateState::AllStable);
                tracing::info!("Hosts active and listening.");
                return Ok(());
            }
            Ok(Err(err)) => {
                self.transition(GateState::ProbeFailed);
                tracing::error!(error = %err, "Probe task ended abnormally");
                return Err(err);
            }
            _ => {}
        }

        let unreachable: Vec<ProbeResult> = readers
            .iter()
            .zip(&stable)
            .filter(|(_, stable)| !**stable)
            .map(|(reader, _)| reader.borrow().clone())
            .collect();

        self.transition(GateState::TimedOut);
        let err = ReadinessError::Timeout {
            timeout: self.config.timeout,
            unreachable,
        };
        tracing::error!(error = %err, "Dependencies did not become ready");
        Err(err)
    }

    /// Runs the functional checks in order; the first failure ends the run.
    pub async fn verify(&self, checks: &FunctionalChecks) -> Result<(), ReadinessError> {
        self.transition(GateState::RunningFunctionalChecks);

        match checks.run(self.config.check_timeout).await {
            Ok(()) => {
                self.transition(GateState::Ready);
                tracing::info!(checks = ?checks.names(), "Healthcheck passed.");
                Ok(())
            }
            Err(e) => {
                self.transition(GateState::FunctionalCheckFailed);
                Err(e)
            }
        }
    }
}

/// One-shot gate run with the TCP prober.
pub async fn await_ready(
    targets: &[ProbeTarget],
    config: &ProbeConfig,
) -> Result<(), ReadinessError> {
    ReadinessGate::new(config.clone()).await_ready(targets).await
}

/// Probes `target` until it has answered for a full stabilization window.
///
/// Any failed probe restarts the window. Inside the window the target is
/// re-probed every `stability_step`, otherwise every `poll_interval`.
async fn hold_until_stable(
    prober: &dyn Prober,
    target: &ProbeTarget,
    config: &ProbeConfig,
    slot: &watch::Sender<ProbeResult>,
) {
    let step = config.stability_step();
    let mut reachable_since: Option<Instant> = None;

    loop {
        let result = prober.probe(target, config.tcp_timeout).await;
        let outcome = if result.succeeded { "success" } else { "failure" };
        counter!(
            "readiness_probe_attempts_total",
            "target" => target.to_string(),
            "outcome" => outcome
        )
        .increment(1);

        let now = Instant::now();
        let pause = if result.succeeded {
            let since = *reachable_since.get_or_insert(now);
            let held = now.saturating_duration_since(since);
            if held >= config.stabilization_window {
                tracing::info!(
                    target = %target,
                    held_ms = held.as_millis() as u64,
                    "Target stable"
                );
                slot.send_replace(result);
                return;
            }
            step.min(config.stabilization_window - held)
        } else {
            if reachable_since.take().is_some() {
                tracing::debug!(target = %target, "Target dropped inside stabilization window");
            } else {
                tracing::debug!(
                    target = %target,
                    error = result.error.as_deref().unwrap_or_default(),
                    "Target not reachable yet"
                );
            }
            config.poll_interval
        };

        slot.send_replace(result);
        sleep(pause).await;
    }
}
