//! 业务枚举

pub mod position_enums;

pub use position_enums::{PositionSide, PositionSideError};
