use chrono::{DateTime, Utc};
use thiserror::Error;

pub const SECOND_MILLIS: i64 = 1_000;
pub const MINUTE_MILLIS: i64 = 60 * SECOND_MILLIS;
pub const HOUR_MILLIS: i64 = 60 * MINUTE_MILLIS;
pub const DAY_MILLIS: i64 = 24 * HOUR_MILLIS;
pub const WEEK_MILLIS: i64 = 7 * DAY_MILLIS;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TimeParseError {
    #[error("时间字符串为空")]
    Empty,

    #[error("无法解析的时间长度: {0}")]
    InvalidDuration(String),

    #[error("不支持的K线周期: {0}")]
    UnsupportedTimeframe(String),
}

/// 解析时间长度字符串为毫秒数
///
/// 支持 `30s`、`15m`、`12h`、`7d`、`2w`，纯数字按毫秒处理。
/// 单位不区分大小写（`1H`、`1D` 同样接受），`M` 始终表示分钟。
pub fn parse_duration_to_millis(value: &str) -> Result<i64, TimeParseError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(TimeParseError::Empty);
    }

    let digits = value.chars().take_while(|c| c.is_ascii_digit()).count();
    let (num, unit) = value.split_at(digits);
    let num: i64 = num
        .parse()
        .map_err(|_| TimeParseError::InvalidDuration(value.to_string()))?;

    let factor = match unit.to_lowercase().as_str() {
        "" | "ms" => 1,
        "s" => SECOND_MILLIS,
        "m" | "min" => MINUTE_MILLIS,
        "h" => HOUR_MILLIS,
        "d" => DAY_MILLIS,
        "w" => WEEK_MILLIS,
        _ => return Err(TimeParseError::InvalidDuration(value.to_string())),
    };

    num.checked_mul(factor)
        .ok_or_else(|| TimeParseError::InvalidDuration(value.to_string()))
}

/// 解析K线周期字符串为毫秒数（如 "1m"、"4h"、"1d"）
pub fn parse_timeframe_to_millis(timeframe: &str) -> Result<i64, TimeParseError> {
    let millis = match timeframe {
        "1m" => MINUTE_MILLIS,
        "3m" => 3 * MINUTE_MILLIS,
        "5m" => 5 * MINUTE_MILLIS,
        "15m" => 15 * MINUTE_MILLIS,
        "30m" => 30 * MINUTE_MILLIS,
        "1h" | "1H" => HOUR_MILLIS,
        "2h" | "2H" => 2 * HOUR_MILLIS,
        "4h" | "4H" => 4 * HOUR_MILLIS,
        "6h" | "6H" => 6 * HOUR_MILLIS,
        "8h" | "8H" => 8 * HOUR_MILLIS,
        "12h" | "12H" => 12 * HOUR_MILLIS,
        "1d" | "1D" | "1Dutc" => DAY_MILLIS,
        "3d" | "3D" => 3 * DAY_MILLIS,
        "1w" | "1W" => WEEK_MILLIS,
        _ => return Err(TimeParseError::UnsupportedTimeframe(timeframe.to_string())),
    };
    Ok(millis)
}

/// 毫秒时间戳格式化为 `%Y-%m-%d %H:%M:%S`，非法时间戳原样输出
pub fn millis_to_string(timestamp_ms: i64) -> String {
    match DateTime::<Utc>::from_timestamp_millis(timestamp_ms) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => timestamp_ms.to_string(),
    }
}
