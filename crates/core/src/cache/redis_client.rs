use std::collections::HashMap;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client};
use tracing::{debug, error, info};

use quant_universe_domain::SideChannelStore;

use crate::error::AppError;

/// Redis连接池管理器
pub struct RedisConnectionPool {
    client: Client,
}

impl RedisConnectionPool {
    /// 创建新的连接池
    pub async fn new(redis_url: &str) -> Result<Self> {
        let client = Client::open(redis_url).map_err(AppError::from)?;

        // 测试连接
        let _test_conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| {
                error!("Redis connection test failed: {}", redis_url);
                anyhow!("Failed to test Redis connection: {}", e)
            })?;

        info!("Redis connection pool initialized successfully ！");
        Ok(Self { client })
    }

    /// 获取连接
    pub async fn get_connection(&self) -> Result<MultiplexedConnection> {
        // 从客户端获取多路复用连接
        let conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| anyhow!("Failed to get multiplexed connection: {}", e))?;

        debug!("获取Redis连接成功");
        Ok(conn)
    }
}

/// 基于 Redis 的旁路存储
///
/// 持有一个多路复用连接，每次调用克隆句柄，可在多个任务间共享
pub struct RedisSideChannelStore {
    conn: MultiplexedConnection,
}

impl RedisSideChannelStore {
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let pool = RedisConnectionPool::new(redis_url).await?;
        Ok(Self {
            conn: pool.get_connection().await?,
        })
    }
}

#[async_trait]
impl SideChannelStore for RedisSideChannelStore {
    async fn hset_fields(&self, key: &str, fields: &[(String, String)]) -> Result<()> {
        if fields.is_empty() {
            return Ok(());
        }
        let mut con = self.conn.clone();
        let _: () = con.hset_multiple(key, fields).await?;
        Ok(())
    }

    async fn hget_all(&self, key: &str) -> Result<HashMap<String, String>> {
        let mut con = self.conn.clone();
        let values: HashMap<String, String> = con.hgetall(key).await?;
        Ok(values)
    }

    async fn zadd(&self, key: &str, member: &str, score: f64) -> Result<()> {
        let mut con = self.conn.clone();
        let _: () = con.zadd(key, member, score).await?;
        Ok(())
    }

    async fn zrange_by_score(&self, key: &str, min: f64, max: f64) -> Result<Vec<(String, f64)>> {
        let mut con = self.conn.clone();
        let data: Vec<(String, f64)> = con.zrangebyscore_withscores(key, min, max).await?;
        Ok(data)
    }

    async fn zrem_range_by_score(&self, key: &str, min: f64, max: f64) -> Result<usize> {
        let mut con = self.conn.clone();
        let removed: usize = con.zrembyscore(key, min, max).await?;
        Ok(removed)
    }
}
