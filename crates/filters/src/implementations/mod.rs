//! 过滤器实现
//!
//! - 区间类：AgeFilter, MinNotionalFilter
//! - 名单类：SymbolFilter, CsvSymbolFilter, SubListFilter
//! - 排序类：FundingRateFilter, Last24hPriceChangePctFilter, DynamicPriceChangePctFilter
//! - 统计类：CandleVolumeFilter, ATRFilter, VolatilityFilter
//! - 形态类：EmaReversalFilter, TrendReversalFilter

pub mod age_filter;
pub mod atr_filter;
pub mod candle_volume_filter;
pub mod csv_symbol_filter;
pub mod dynamic_price_change_pct_filter;
pub mod ema_reversal_filter;
pub mod funding_rate_filter;
pub mod last_24h_price_change_pct_filter;
pub mod min_notional_filter;
pub mod sub_list_filter;
pub mod symbol_filter;
pub mod trend_reversal_filter;
pub mod volatility_filter;

#[cfg(test)]
pub(crate) mod test_support;

pub use age_filter::AgeFilter;
pub use atr_filter::AtrFilter;
pub use candle_volume_filter::CandleVolumeFilter;
pub use csv_symbol_filter::CsvSymbolFilter;
pub use dynamic_price_change_pct_filter::DynamicPriceChangePctFilter;
pub use ema_reversal_filter::{EmaPivot, EmaReversalFilter};
pub use funding_rate_filter::FundingRateFilter;
pub use last_24h_price_change_pct_filter::Last24hPriceChangePctFilter;
pub use min_notional_filter::MinNotionalFilter;
pub use sub_list_filter::SubListFilter;
pub use symbol_filter::SymbolFilter;
pub use trend_reversal_filter::{is_swing_high, is_swing_low, TrendReversalFilter};
pub use volatility_filter::VolatilityFilter;
