//! Functional readiness checks for the cache and the database.

use super::cache::CacheStore;
use super::database::MongoDb;
use async_trait::async_trait;
use secrecy::{ExposeSecret, Secret};
use service_core::readiness::{CheckKind, FunctionalCheck};
use std::sync::Arc;

/// Sentinel written and read back by the cache check.
pub const CACHE_SENTINEL_KEY: &str = "cacheConnectTest";
pub const CACHE_SENTINEL_VALUE: &str = "works";
pub const CACHE_SENTINEL_EXPIRY_SECONDS: u64 = 10;

/// Writes the sentinel and requires reading back exactly what was written.
pub struct CacheRoundTripCheck {
    cache: Arc<dyn CacheStore>,
}

impl CacheRoundTripCheck {
    pub fn new(cache: Arc<dyn CacheStore>) -> Self {
        Self { cache }
    }
}

#[async_trait]
impl FunctionalCheck for CacheRoundTripCheck {
    fn name(&self) -> &str {
        "cache round-trip"
    }

    fn kind(&self) -> CheckKind {
        CheckKind::Cache
    }

    async fn check(&self) -> anyhow::Result<()> {
        self.cache
            .set(CACHE_SENTINEL_KEY, CACHE_SENTINEL_VALUE, CACHE_SENTINEL_EXPIRY_SECONDS)
            .await?;

        match self.cache.get(CACHE_SENTINEL_KEY).await? {
            Some(value) if value == CACHE_SENTINEL_VALUE => {
                tracing::info!("Cache connected.");
                Ok(())
            }
            Some(value) => anyhow::bail!("Cache connection test failed: read back {:?}", value),
            None => anyhow::bail!("Cache connection test failed: sentinel missing"),
        }
    }
}

/// Opens a fresh client on every run and pings the server.
pub struct DatabaseConnectCheck {
    uri: Secret<String>,
    database: String,
}

impl DatabaseConnectCheck {
    pub fn new(uri: Secret<String>, database: impl Into<String>) -> Self {
        Self {
            uri,
            database: database.into(),
        }
    }
}

#[async_trait]
impl FunctionalCheck for DatabaseConnectCheck {
    fn name(&self) -> &str {
        "database connect"
    }

    fn kind(&self) -> CheckKind {
        CheckKind::Database
    }

    async fn check(&self) -> anyhow::Result<()> {
        let db = MongoDb::connect(self.uri.expose_secret(), &self.database).await?;
        db.health_check().await?;
        tracing::info!(database = %self.database, "Database connected.");
        Ok(())
    }
}
