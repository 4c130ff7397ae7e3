//! 业务实体模块

pub mod candle;
pub mod income;
pub mod market;
pub mod symbol_information;

pub use candle::Candle;
pub use income::IncomeRecord;
pub use market::{ChangeStatistic, PriceTicker};
pub use symbol_information::SymbolInformation;
