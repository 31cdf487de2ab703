use super::target::{ProbeResult, ProbeTarget};
use async_trait::async_trait;
use std::time::Duration;
use tokio::net::TcpStream;

/// One reachability attempt against a target.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, target: &ProbeTarget, timeout: Duration) -> ProbeResult;
}

/// Opens (and immediately drops) a raw TCP connection.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpProber;

#[async_trait]
impl Prober for TcpProber {
    async fn probe(&self, target: &ProbeTarget, timeout: Duration) -> ProbeResult {
        match tokio::time::timeout(timeout, TcpStream::connect(target.address())).await {
            Ok(Ok(_stream)) => ProbeResult::success(target.clone()),
            Ok(Err(e)) => ProbeResult::failure(target.clone(), e.to_string()),
            Err(_) => ProbeResult::failure(
                target.clone(),
                format!("connect timed out after {}ms", timeout.as_millis()),
            ),
        }
    }
}
