use serde::{Deserialize, Serialize};

/// 交易对静态元数据
///
/// 由交易所状态维护，过滤器只读
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolInformation {
    /// 交易对
    pub symbol: String,
    /// 上线时间 (Unix时间戳, 毫秒)
    pub onboard_date: i64,
    /// 最小下单数量
    pub minimum_quantity: f64,
    /// 最小名义价值（计价币）
    pub minimum_notional: f64,
}

impl SymbolInformation {
    /// 上线时长（毫秒），时钟偏差或脏数据时可能为负，溢出时取边界值
    pub fn age_millis(&self, now_millis: i64) -> i64 {
        now_millis.saturating_sub(self.onboard_date)
    }

    /// 实际最小开仓价值：max(固定最小名义价值, 当前价格 × 最小下单数量)
    pub fn effective_min_notional(&self, price: f64) -> f64 {
        self.minimum_notional.max(price * self.minimum_quantity)
    }
}
