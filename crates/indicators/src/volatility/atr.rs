use thiserror::Error;

use quant_universe_domain::Candle;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AtrError {
    #[error("Invalid period: {0}, must be greater than 0")]
    InvalidPeriod(usize),

    #[error("Insufficient candles: need {required}, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("Invalid close price: {0}")]
    InvalidClose(f64),
}

/// 平均真实波幅，Wilder 平滑（RMA）
///
/// 前 `period` 个真实波幅取简单平均作为种子，之后按 `1/period` 递推
#[derive(Debug, Clone)]
pub struct ATR {
    period: usize,
    seed: Vec<f64>,
    value: Option<f64>,
}

impl ATR {
    pub fn new(period: usize) -> Result<Self, AtrError> {
        if period == 0 {
            return Err(AtrError::InvalidPeriod(0));
        }
        Ok(Self {
            period,
            seed: Vec::with_capacity(period),
            value: None,
        })
    }

    /// 输入一根K线的真实波幅，种子阶段返回 None
    pub fn update(&mut self, true_range: f64) -> Option<f64> {
        let next = match self.value {
            Some(prev) => {
                let alpha = 1.0 / self.period as f64;
                alpha.mul_add(true_range, (1.0 - alpha) * prev)
            }
            None => {
                self.seed.push(true_range);
                if self.seed.len() < self.period {
                    return None;
                }
                self.seed.iter().sum::<f64>() / self.period as f64
            }
        };
        self.value = Some(next);
        self.value
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }
}

/// 以最新收盘价归一化的ATR（百分比）
///
/// 至少需要 `period + 1` 根K线：第一根只提供前收盘价
pub fn atr_percent(candles: &[Candle], period: usize) -> Result<f64, AtrError> {
    if period == 0 {
        return Err(AtrError::InvalidPeriod(0));
    }
    if candles.len() < period + 1 {
        return Err(AtrError::InsufficientData {
            required: period + 1,
            actual: candles.len(),
        });
    }

    let mut atr = ATR::new(period)?;
    let mut prev_close = candles[0].close;
    for candle in &candles[1..] {
        atr.update(candle.true_range(Some(prev_close)));
        prev_close = candle.close;
    }

    let last_close = prev_close;
    if last_close <= 0.0 || !last_close.is_finite() {
        return Err(AtrError::InvalidClose(last_close));
    }

    let value = atr.value().ok_or(AtrError::InsufficientData {
        required: period + 1,
        actual: candles.len(),
    })?;
    Ok(value / last_close * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;

    #[test]
    fn test_seed_then_wilder_smoothing() {
        let mut atr = ATR::new(3).unwrap();

        // 种子阶段没有值
        assert_eq!(atr.update(2.0), None);
        assert_eq!(atr.update(2.0), None);
        assert_eq!(atr.update(2.0), Some(2.0));

        // RMA: 2 * 2/3 + 5 * 1/3 = 3
        let val = atr.update(5.0).unwrap();
        assert!(approx_eq!(f64, val, 3.0, epsilon = 1e-9));
        assert_eq!(atr.value(), Some(val));
    }

    #[test]
    fn test_atr_percent() {
        // (open, high, low, close)
        let bars = [
            (9.0, 10.0, 8.0, 9.0),
            (9.0, 11.0, 9.0, 10.0),
            (10.0, 12.0, 10.0, 11.0),
            (11.0, 13.0, 11.0, 12.0),
        ];
        let candles: Vec<Candle> = bars
            .iter()
            .enumerate()
            .map(|(i, (o, h, l, c))| Candle {
                start_date: i as i64 * 60_000,
                close_date: i as i64 * 60_000 + 59_999,
                open: *o,
                high: *h,
                low: *l,
                close: *c,
                volume: 1.0,
                quote_volume: *c,
            })
            .collect();

        // 三根K线的 TR 都是 2，ATR(3) = 2，最新收盘 12
        let pct = atr_percent(&candles, 3).unwrap();
        assert!(approx_eq!(f64, pct, 2.0 / 12.0 * 100.0, epsilon = 1e-9));

        assert_eq!(
            atr_percent(&candles, 4).unwrap_err(),
            AtrError::InsufficientData { required: 5, actual: 4 }
        );
    }

    #[test]
    fn test_invalid_period() {
        assert_eq!(ATR::new(0).unwrap_err(), AtrError::InvalidPeriod(0));
    }
}
