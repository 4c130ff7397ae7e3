//! 旁路存储实现

pub mod memory_store;
pub mod redis_client;

// 重新导出
pub use memory_store::InMemorySideChannelStore;
pub use redis_client::{RedisConnectionPool, RedisSideChannelStore};
