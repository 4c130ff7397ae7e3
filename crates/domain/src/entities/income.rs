use serde::{Deserialize, Serialize};

/// 资金流水（已实现盈亏、资金费、手续费等）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeRecord {
    /// 流水ID，同一交易所内唯一
    pub tran_id: String,
    pub symbol: String,
    /// 流水类型，如 REALIZED_PNL、FUNDING_FEE、COMMISSION
    pub income_type: String,
    pub amount: f64,
    /// 发生时间 (Unix时间戳, 毫秒)
    pub timestamp: i64,
}
