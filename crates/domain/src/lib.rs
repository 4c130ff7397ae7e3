//! # Quant Universe Domain
//!
//! 领域模型层 - 纯粹的数据结构与协作方接口，不依赖任何基础设施
//!
//! ## 模块组织
//!
//! - `entities`: K线、交易对元数据、行情快照、资金流水
//! - `enums`: 持仓方向
//! - `traits`: 交易所状态、行情数据、资金流水、旁路存储、时钟等抽象接口
//!
//! 过滤器只依赖这里的 trait，具体实现（交易所客户端、Redis、快照文件）由外层注入。

pub mod entities;
pub mod enums;
pub mod traits;

// 重新导出核心类型
pub use entities::{Candle, ChangeStatistic, IncomeRecord, PriceTicker, SymbolInformation};
pub use enums::{PositionSide, PositionSideError};
pub use traits::{
    filtered_symbol_key, income_key, Clock, ExchangeState, FixedClock, IncomeSource, MarketData,
    SideChannelStore, SystemClock,
};
