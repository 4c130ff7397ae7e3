//! 应用错误类型

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Cache error: {0}")]
    CacheError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<redis::RedisError> for AppError {
    fn from(err: redis::RedisError) -> Self {
        AppError::CacheError(err.to_string())
    }
}

pub type AppResult<T> = std::result::Result<T, AppError>;
