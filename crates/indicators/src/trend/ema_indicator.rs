use ta::indicators::ExponentialMovingAverage;
use ta::Next;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EmaError {
    #[error("Invalid EMA window: {0}")]
    InvalidWindow(usize),
}

/// 逐根计算EMA，返回与输入等长的序列
///
/// 首个值等于首个输入，平滑系数 2 / (window + 1)
pub fn ema_series(values: &[f64], window: usize) -> Result<Vec<f64>, EmaError> {
    let mut ema =
        ExponentialMovingAverage::new(window).map_err(|_| EmaError::InvalidWindow(window))?;
    Ok(values.iter().map(|v| ema.next(*v)).collect())
}
