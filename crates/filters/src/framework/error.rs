//! 过滤器错误类型
//!
//! - `FilterConfigError`：构建期配置错误，启动即失败，不做重试
//! - `FilterError`：运行期整体数据源失败，中止本轮筛选
//!
//! 单个交易对的数据问题不属于错误，由过滤器记录日志后剔除该交易对

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FilterConfigError {
    #[error("未知的过滤器: {0}")]
    UnknownFilter(String),

    #[error("{filter} 配置无效: {reason}")]
    Invalid { filter: String, reason: String },

    #[error("{filter} 配置项 `{field}` 无效: {reason}")]
    InvalidField {
        filter: String,
        field: String,
        reason: String,
    },

    #[error("流水线配置无效: {0}")]
    Pipeline(String),

    #[error("读取流水线配置失败 {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl FilterConfigError {
    pub fn invalid(filter: &str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            filter: filter.to_string(),
            reason: reason.into(),
        }
    }

    pub fn invalid_field(filter: &str, field: &str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            filter: filter.to_string(),
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum FilterError {
    #[error("{filter} 数据源不可用: {reason}")]
    DataSource { filter: String, reason: String },
}

impl FilterError {
    pub fn data_source(filter: &str, err: anyhow::Error) -> Self {
        Self::DataSource {
            filter: filter.to_string(),
            reason: format!("{:#}", err),
        }
    }
}
