//! 行情数据实现

pub mod snapshot;

pub use snapshot::SnapshotMarketData;
