//! 旁路存储接口
//!
//! 部分过滤器把计算结果发布给其他进程消费（如 Redis）。
//! 所有写入都是按 key 覆盖的幂等操作，读取方容忍最终一致。

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait SideChannelStore: Send + Sync {
    /// 覆盖写入哈希字段
    async fn hset_fields(&self, key: &str, fields: &[(String, String)]) -> Result<()>;

    /// 读取整个哈希
    async fn hget_all(&self, key: &str) -> Result<HashMap<String, String>>;

    /// 写入有序集合成员
    async fn zadd(&self, key: &str, member: &str, score: f64) -> Result<()>;

    /// 按分数区间读取有序集合（含边界），按分数升序
    async fn zrange_by_score(&self, key: &str, min: f64, max: f64) -> Result<Vec<(String, f64)>>;

    /// 按分数区间删除有序集合成员（含边界），返回删除数量
    async fn zrem_range_by_score(&self, key: &str, min: f64, max: f64) -> Result<usize>;
}

/// 过滤结果发布 key：`<阶段名>_filtered_symbol_<交易对>`
pub fn filtered_symbol_key(stage_name: &str, symbol: &str) -> String {
    format!("{}_filtered_symbol_{}", stage_name, symbol)
}

/// 资金流水有序集合 key：`income_<交易对>`
pub fn income_key(symbol: &str) -> String {
    format!("income_{}", symbol)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys() {
        assert_eq!(
            filtered_symbol_key("DynamicPriceChangePctFilter", "BTCUSDT"),
            "DynamicPriceChangePctFilter_filtered_symbol_BTCUSDT"
        );
        assert_eq!(income_key("ETHUSDT"), "income_ETHUSDT");
    }
}
