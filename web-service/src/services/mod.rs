pub mod cache;
pub mod database;
pub mod probes;

pub use cache::{CacheStore, MockCache, RedisCache};
pub use database::MongoDb;
pub use probes::{CacheRoundTripCheck, DatabaseConnectCheck};
