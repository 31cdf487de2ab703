//! Shared setup for web-service integration tests.
//!
//! Builds the router over an in-memory cache and scripted functional checks,
//! so no Redis or MongoDB is needed.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{body::Body, http::Request, response::Response, Router};
use http_body_util::BodyExt;
use service_core::config::Config as CoreConfig;
use service_core::middleware::rate_limit::create_ip_rate_limiter;
use service_core::readiness::{CheckKind, FunctionalCheck, FunctionalChecks, GateState};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::watch;
use tower::util::ServiceExt;
use web_service::config::{Vars, WebConfig};
use web_service::services::{CacheRoundTripCheck, CacheStore, MockCache};
use web_service::{build_router, AppState};

/// A functional check with a fixed verdict.
pub struct StaticCheck {
    pub kind: CheckKind,
    pub failure: Option<&'static str>,
}

#[async_trait]
impl FunctionalCheck for StaticCheck {
    fn name(&self) -> &str {
        match self.kind {
            CheckKind::Cache => "static cache",
            CheckKind::Database => "static database",
        }
    }

    fn kind(&self) -> CheckKind {
        self.kind
    }

    async fn check(&self) -> anyhow::Result<()> {
        match self.failure {
            Some(reason) => anyhow::bail!(reason),
            None => Ok(()),
        }
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub cache: Arc<MockCache>,
    pub gate_state: watch::Sender<GateState>,
    pub static_dir: TempDir,
}

pub struct TestAppBuilder {
    cache: MockCache,
    database_failure: Option<&'static str>,
    rate_limit: (u32, u64),
    gate_state: GateState,
    environment: &'static str,
}

impl TestAppBuilder {
    pub fn new() -> Self {
        Self {
            cache: MockCache::new(),
            database_failure: None,
            rate_limit: (100, 60),
            gate_state: GateState::Ready,
            environment: "local",
        }
    }

    pub fn cache_entry(mut self, key: &str, value: &str) -> Self {
        self.cache = self.cache.with_entry(key, value);
        self
    }

    pub fn failing_database(mut self, reason: &'static str) -> Self {
        self.database_failure = Some(reason);
        self
    }

    pub fn rate_limit(mut self, attempts: u32, window_seconds: u64) -> Self {
        self.rate_limit = (attempts, window_seconds);
        self
    }

    pub fn gate_state(mut self, state: GateState) -> Self {
        self.gate_state = state;
        self
    }

    pub fn environment(mut self, environment: &'static str) -> Self {
        self.environment = environment;
        self
    }

    pub fn build(self) -> TestApp {
        let static_dir = tempfile::tempdir().expect("Failed to create static dir");
        write_static_files(&static_dir);

        let config = test_config(&[
            (
                "STATIC_PATH",
                static_dir.path().to_str().expect("Non UTF-8 temp path"),
            ),
            ("ENVIRONMENT", self.environment),
            ("MONGO_HOST", "localhost:27017"),
            ("REDIS_HOST", "localhost:6379"),
        ]);

        let cache = Arc::new(self.cache);
        let checks = FunctionalChecks::new()
            .with(CacheRoundTripCheck::new(cache.clone() as Arc<dyn CacheStore>))
            .with(StaticCheck {
                kind: CheckKind::Database,
                failure: self.database_failure,
            });

        let (gate_state, readiness) = watch::channel(self.gate_state);
        let state = AppState {
            config,
            cache: cache.clone(),
            checks,
            readiness,
            ip_rate_limiter: create_ip_rate_limiter(self.rate_limit.0, self.rate_limit.1),
        };

        TestApp {
            router: build_router(state.clone()),
            state,
            cache,
            gate_state,
            static_dir,
        }
    }
}

impl TestApp {
    pub fn spawn() -> Self {
        TestAppBuilder::new().build()
    }

    pub async fn get(&self, uri: &str) -> Response {
        self.request(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn request(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }
}

/// Local-environment config on an ephemeral loopback port.
pub fn test_config(extra: &[(&str, &str)]) -> WebConfig {
    let mut vars: Vars = [("ENVIRONMENT", "local"), ("LOG_LEVEL", "error")]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    vars.extend(extra.iter().map(|(k, v)| (k.to_string(), v.to_string())));

    let common = CoreConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
    };
    WebConfig::from_vars(common, &vars).expect("Failed to build test config")
}

fn write_static_files(dir: &TempDir) {
    let files: [(&str, &[u8]); 4] = [
        ("index.html", b"<!doctype html><title>home</title>"),
        ("app.js", b"console.log('hi');"),
        ("logo.png", b"\x89PNG\r\n\x1a\n"),
        ("site.css", b"body { margin: 0; }"),
    ];
    for (name, contents) in files {
        std::fs::write(dir.path().join(name), contents).expect("Failed to write static file");
    }
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).expect("Response body is not JSON")
}

pub async fn body_text(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).expect("Response body is not UTF-8")
}
