use async_trait::async_trait;
use redis::{aio::ConnectionManager, Client};
use tokio::sync::OnceCell;

/// Key/value store behind the `/cache` routes and the cache round-trip check.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn set(&self, key: &str, value: &str, expiry_seconds: u64) -> Result<(), anyhow::Error>;
    async fn get(&self, key: &str) -> Result<Option<String>, anyhow::Error>;
    async fn health_check(&self) -> Result<(), anyhow::Error>;
}

/// Redis-backed store.
///
/// The connection is opened on first use so the store can be handed to the
/// readiness checks before the server is reachable.
pub struct RedisCache {
    client: Client,
    manager: OnceCell<ConnectionManager>,
}

impl RedisCache {
    pub fn new(url: &str) -> Result<Self, anyhow::Error> {
        let client = Client::open(url)?;
        Ok(Self {
            client,
            manager: OnceCell::new(),
        })
    }

    async fn connection(&self) -> Result<ConnectionManager, anyhow::Error> {
        let manager = self
            .manager
            .get_or_try_init(|| async {
                tracing::info!("Connecting to Redis");
                // ConnectionManager reconnects on its own after the first handshake
                let manager = self.client.get_connection_manager().await.map_err(|e| {
                    tracing::error!("Failed to get Redis connection manager: {}", e);
                    anyhow::anyhow!("Failed to connect to Redis: {}", e)
                })?;
                tracing::info!("Successfully connected to Redis");
                Ok::<_, anyhow::Error>(manager)
            })
            .await?;
        Ok(manager.clone())
    }
}

#[async_trait]
impl CacheStore for RedisCache {
    async fn set(&self, key: &str, value: &str, expiry_seconds: u64) -> Result<(), anyhow::Error> {
        let mut conn = self.connection().await?;
        redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("EX")
            .arg(expiry_seconds)
            .query_async(&mut conn)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to set cache: {}", e))
    }

    async fn get(&self, key: &str) -> Result<Option<String>, anyhow::Error> {
        let mut conn = self.connection().await?;
        redis::cmd("GET")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to get cache: {}", e))
    }

    async fn health_check(&self) -> Result<(), anyhow::Error> {
        let mut conn = self.connection().await?;
        redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| anyhow::anyhow!("Redis health check failed: {}", e))
    }
}

/// In-memory store for tests. Expiry is ignored.
pub struct MockCache {
    pub entries: std::sync::Mutex<std::collections::HashMap<String, String>>,
}

impl Default for MockCache {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCache {
    pub fn new() -> Self {
        Self {
            entries: std::sync::Mutex::new(std::collections::HashMap::new()),
        }
    }

    pub fn with_entry(self, key: &str, value: &str) -> Self {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), value.to_string());
        }
        self
    }

    pub fn value(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }
}

#[async_trait]
impl CacheStore for MockCache {
    async fn set(&self, key: &str, value: &str, _expiry_seconds: u64) -> Result<(), anyhow::Error> {
        self.entries
            .lock()
            .map_err(|e| anyhow::anyhow!("Mock cache mutex poisoned: {}", e))?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, anyhow::Error> {
        let val = self
            .entries
            .lock()
            .map_err(|e| anyhow::anyhow!("Mock cache mutex poisoned: {}", e))?
            .get(key)
            .cloned();
        Ok(val)
    }

    async fn health_check(&self) -> Result<(), anyhow::Error> {
        Ok(())
    }
}
