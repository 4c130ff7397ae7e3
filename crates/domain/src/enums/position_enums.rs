//! 持仓相关枚举

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("未知的持仓方向: {0}")]
pub struct PositionSideError(pub String);

/// 持仓方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PositionSide {
    /// 多头
    Long,
    /// 空头
    Short,
}

impl PositionSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            PositionSide::Long => "LONG",
            PositionSide::Short => "SHORT",
        }
    }
}

impl fmt::Display for PositionSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PositionSide {
    type Err = PositionSideError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "LONG" => Ok(PositionSide::Long),
            "SHORT" => Ok(PositionSide::Short),
            _ => Err(PositionSideError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_side_from_str() {
        assert_eq!("long".parse::<PositionSide>(), Ok(PositionSide::Long));
        assert_eq!("SHORT".parse::<PositionSide>(), Ok(PositionSide::Short));
        assert!("both".parse::<PositionSide>().is_err());
    }

    #[test]
    fn test_position_side_serde() {
        let side: PositionSide = serde_json::from_str("\"LONG\"").unwrap();
        assert_eq!(side, PositionSide::Long);
        assert_eq!(serde_json::to_string(&PositionSide::Short).unwrap(), "\"SHORT\"");
    }
}
