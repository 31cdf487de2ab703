use super::error::ReadinessError;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Dependency class exercised by a functional check.
///
/// Declaration order is execution order: the cache is verified before the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CheckKind {
    Cache,
    Database,
}

impl CheckKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckKind::Cache => "cache",
            CheckKind::Database => "database",
        }
    }

    /// The gate error reported when a check of this kind fails.
    pub fn failure(self, reason: impl Into<String>) -> ReadinessError {
        match self {
            CheckKind::Cache => ReadinessError::CacheProbe(reason.into()),
            CheckKind::Database => ReadinessError::DatabaseProbe(reason.into()),
        }
    }
}

/// A probe that exercises real behavior of a dependency, beyond reachability.
#[async_trait]
pub trait FunctionalCheck: Send + Sync {
    fn name(&self) -> &str;
    fn kind(&self) -> CheckKind;
    async fn check(&self) -> anyhow::Result<()>;
}

/// Ordered set of functional checks, run one at a time.
#[derive(Clone, Default)]
pub struct FunctionalChecks {
    checks: Vec<Arc<dyn FunctionalCheck>>,
}

impl FunctionalChecks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, check: impl FunctionalCheck + 'static) -> Self {
        self.push(Arc::new(check));
        self
    }

    pub fn push(&mut self, check: Arc<dyn FunctionalCheck>) {
        self.checks.push(check);
        // Stable sort keeps insertion order among checks of one kind.
        self.checks.sort_by_key(|c| c.kind());
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.checks.iter().map(|c| c.name()).collect()
    }

    /// Runs every check in order; the first failure stops the run.
    pub async fn run(&self, timeout: Duration) -> Result<(), ReadinessError> {
        for check in &self.checks {
            let started = Instant::now();
            let kind = check.kind();

            match tokio::time::timeout(timeout, check.check()).await {
                Ok(Ok(())) => {
                    tracing::info!(
                        check = %check.name(),
                        kind = kind.as_str(),
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "Functional check passed"
                    );
                }
                Ok(Err(e)) => {
                    tracing::error!(
                        check = %check.name(),
                        kind = kind.as_str(),
                        error = %e,
                        "Functional check failed"
                    );
                    return Err(kind.failure(format!("{}: {:#}", check.name(), e)));
                }
                Err(_) => {
                    tracing::error!(
                        check = %check.name(),
                        kind = kind.as_str(),
                        timeout_ms = timeout.as_millis() as u64,
                        "Functional check timed out"
                    );
                    return Err(kind.failure(format!(
                        "{}: no answer within {}ms",
                        check.name(),
                        timeout.as_millis()
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recorded {
        name: &'static str,
        kind: CheckKind,
        outcome: Result<(), &'static str>,
        delay: Duration,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    #[async_trait]
    impl FunctionalCheck for Recorded {
        fn name(&self) -> &str {
            self.name
        }

        fn kind(&self) -> CheckKind {
            self.kind
        }

        async fn check(&self) -> anyhow::Result<()> {
            tokio::time::sleep(self.delay).await;
            self.log.lock().unwrap().push(self.name);
            self.outcome.map_err(|e| anyhow::anyhow!(e))
        }
    }

    fn recorded(
        name: &'static str,
        kind: CheckKind,
        outcome: Result<(), &'static str>,
        log: &Arc<Mutex<Vec<&'static str>>>,
    ) -> Recorded {
        Recorded {
            name,
            kind,
            outcome,
            delay: Duration::ZERO,
            log: log.clone(),
        }
    }

    #[tokio::test]
    async fn cache_runs_before_database_regardless_of_insertion() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let checks = FunctionalChecks::new()
            .with(recorded("mongodb", CheckKind::Database, Ok(()), &log))
            .with(recorded("redis", CheckKind::Cache, Ok(()), &log));

        assert_eq!(checks.names(), vec!["redis", "mongodb"]);
        checks.run(Duration::from_secs(1)).await.unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["redis", "mongodb"]);
    }

    #[tokio::test]
    async fn first_failure_aborts_remaining_checks() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let checks = FunctionalChecks::new()
            .with(recorded("redis", CheckKind::Cache, Err("value mismatch"), &log))
            .with(recorded("mongodb", CheckKind::Database, Ok(()), &log));

        let err = checks.run(Duration::from_secs(1)).await.unwrap_err();
        assert_eq!(
            err,
            ReadinessError::CacheProbe("redis: value mismatch".to_string())
        );
        assert_eq!(*log.lock().unwrap(), vec!["redis"]);
    }

    #[tokio::test]
    async fn database_failure_is_a_database_probe_error() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let checks = FunctionalChecks::new()
            .with(recorded("redis", CheckKind::Cache, Ok(()), &log))
            .with(recorded("mongodb", CheckKind::Database, Err("refused"), &log));

        let err = checks.run(Duration::from_secs(1)).await.unwrap_err();
        assert!(matches!(err, ReadinessError::DatabaseProbe(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn hung_check_is_bounded_by_timeout() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let checks = FunctionalChecks::new().with(Recorded {
            delay: Duration::from_secs(3600),
            ..recorded("mongodb", CheckKind::Database, Ok(()), &log)
        });

        let started = Instant::now();
        let err = checks.run(Duration::from_millis(250)).await.unwrap_err();

        assert_eq!(
            err,
            ReadinessError::DatabaseProbe("mongodb: no answer within 250ms".to_string())
        );
        assert!(started.elapsed() < Duration::from_secs(1));
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_set_passes() {
        assert!(FunctionalChecks::new().run(Duration::from_secs(1)).await.is_ok());
    }
}
