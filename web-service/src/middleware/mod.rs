pub mod static_cache;

pub use static_cache::{cache_control_for, static_cache_middleware};
