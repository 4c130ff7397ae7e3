use serde::{Deserialize, Serialize};

/// 最新价格
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceTicker {
    pub symbol: String,
    pub price: f64,
    /// 数据更新时间 (Unix时间戳, 毫秒)
    #[serde(default)]
    pub timestamp: i64,
}

/// 24小时涨跌幅统计，由外部定时刷新
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeStatistic {
    pub symbol: String,
    /// 24小时价格变化百分比
    pub price_change_pct: f64,
}
