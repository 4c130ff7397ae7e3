//! 领域接口模块
//!
//! 定义过滤器依赖的协作方接口，由基础设施层实现

pub mod clock;
pub mod exchange_trait;
pub mod side_channel;

pub use clock::{Clock, FixedClock, SystemClock};
pub use exchange_trait::{ExchangeState, IncomeSource, MarketData};
pub use side_channel::{filtered_symbol_key, income_key, SideChannelStore};
