//! 外部文件白名单
//!
//! 文件每行一个交易对，每轮重新读取；文件不存在时结果为空。
//! 首阶段直接以文件内容为起点，否则与输入取交集，最后剔除交易所未知的交易对

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use csv::{ReaderBuilder, Trim};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::framework::{
    carried_metadata, parse_filter_config, Filter, FilterConfigError, FilterContext, FilterError,
    FilterFactory, FilterResult,
};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CsvSymbolFilterConfig {
    input_file: PathBuf,
}

pub struct CsvSymbolFilter {
    input_file: PathBuf,
    ctx: FilterContext,
}

/// 读取文件中的交易对（去重，保持文件顺序）
///
/// 不解析引号，单行内容有误时只跳过该行
fn read_symbol_file(path: &Path) -> anyhow::Result<Vec<String>> {
    if !path.exists() {
        warn!(
            "{}: 文件不存在 {}，本轮结果为空",
            CsvSymbolFilter::NAME,
            path.display()
        );
        return Ok(Vec::new());
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .trim(Trim::All)
        .from_path(path)
        .with_context(|| format!("打开文件失败: {}", path.display()))?;

    let mut seen = HashSet::new();
    let mut symbols = Vec::new();
    for record in reader.byte_records() {
        let record = record.with_context(|| format!("读取文件失败: {}", path.display()))?;
        let Some(field) = record.get(0).filter(|f| !f.is_empty()) else {
            continue;
        };
        let symbol = match std::str::from_utf8(field) {
            Ok(symbol) => symbol,
            Err(e) => {
                let line = record.position().map(|p| p.line()).unwrap_or_default();
                warn!(
                    "{}: {} 第 {} 行不是有效的 UTF-8，跳过: {}",
                    CsvSymbolFilter::NAME,
                    path.display(),
                    line,
                    e
                );
                continue;
            }
        };
        if seen.insert(symbol.to_string()) {
            symbols.push(symbol.to_string());
        }
    }
    Ok(symbols)
}

impl CsvSymbolFilter {
    async fn read_symbols(&self) -> anyhow::Result<Vec<String>> {
        let path = self.input_file.clone();
        tokio::task::spawn_blocking(move || read_symbol_file(&path))
            .await
            .context("读取文件任务异常退出")?
    }
}

impl FilterFactory for CsvSymbolFilter {
    const NAME: &'static str = "CsvSymbolFilter";

    fn from_config(config: &Value, ctx: &FilterContext) -> Result<Self, FilterConfigError> {
        let config: CsvSymbolFilterConfig = parse_filter_config(Self::NAME, config)?;
        if config.input_file.as_os_str().is_empty() {
            return Err(FilterConfigError::invalid_field(
                Self::NAME,
                "input_file",
                "不能为空",
            ));
        }
        Ok(Self {
            input_file: config.input_file,
            ctx: ctx.clone(),
        })
    }
}

#[async_trait]
impl Filter for CsvSymbolFilter {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn select(
        &self,
        starting_list: &[String],
        is_first: bool,
        previous_results: &[FilterResult],
    ) -> Result<FilterResult, FilterError> {
        let file_symbols = self
            .read_symbols()
            .await
            .map_err(|e| FilterError::data_source(Self::NAME, e))?;

        let candidates: Vec<String> = if is_first {
            file_symbols
        } else {
            let allowed: HashSet<&str> = file_symbols.iter().map(String::as_str).collect();
            starting_list
                .iter()
                .filter(|symbol| allowed.contains(symbol.as_str()))
                .cloned()
                .collect()
        };

        let universe: HashSet<String> = self
            .ctx
            .universe(Self::NAME)
            .await?
            .into_iter()
            .collect();

        let mut result = FilterResult::new();
        for symbol in &candidates {
            if !universe.contains(symbol) {
                warn!("{}: 交易所不存在该交易对，跳过 {}", Self::NAME, symbol);
                continue;
            }
            result.insert(symbol.as_str(), carried_metadata(previous_results, symbol));
        }
        debug!(
            "{}: 文件交易对 {} 个，保留 {} 个",
            Self::NAME,
            candidates.len(),
            result.len()
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::implementations::test_support::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_file(content: &str) -> NamedTempFile {
        write_bytes(content.as_bytes())
    }

    fn write_bytes(content: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content).unwrap();
        file.flush().unwrap();
        file
    }

    fn filter(path: &std::path::Path, universe: &[&str]) -> CsvSymbolFilter {
        CsvSymbolFilter::from_config(
            &json!({ "input_file": path }),
            &context(snapshot_with_symbols(universe)),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_first_stage_seeds_from_file() {
        let file = write_file("ETHUSDT\nBTCUSDT\n\nUNKNOWN\nETHUSDT\n");
        let filter = filter(file.path(), &["BTCUSDT", "ETHUSDT", "SOLUSDT"]);

        let result = filter.select(&syms(&["SOLUSDT"]), true, &[]).await.unwrap();
        assert_eq!(result.symbols(), syms(&["ETHUSDT", "BTCUSDT"]));
    }

    #[tokio::test]
    async fn test_intersects_with_input() {
        let file = write_file(" BTCUSDT \nSOLUSDT\n");
        let filter = filter(file.path(), &["BTCUSDT", "ETHUSDT", "SOLUSDT"]);

        let result = filter
            .select(&syms(&["SOLUSDT", "ETHUSDT", "BTCUSDT"]), false, &[])
            .await
            .unwrap();
        assert_eq!(result.symbols(), syms(&["SOLUSDT", "BTCUSDT"]));
    }

    #[tokio::test]
    async fn test_quote_is_plain_text() {
        let file = write_file("ETHUSDT\n\"BAD\nBTCUSDT\nSOLUSDT\n");
        let filter = filter(file.path(), &["BTCUSDT", "ETHUSDT", "SOLUSDT"]);

        let result = filter.select(&[], true, &[]).await.unwrap();
        assert_eq!(result.symbols(), syms(&["ETHUSDT", "BTCUSDT", "SOLUSDT"]));
    }

    #[tokio::test]
    async fn test_invalid_utf8_line_skipped() {
        let file = write_bytes(b"ETHUSDT\n\xff\xfe\nBTCUSDT\n");
        let filter = filter(file.path(), &["BTCUSDT", "ETHUSDT"]);

        let result = filter.select(&[], true, &[]).await.unwrap();
        assert_eq!(result.symbols(), syms(&["ETHUSDT", "BTCUSDT"]));
    }

    #[test]
    fn test_read_symbol_file_dedups() {
        let file = write_file("BTCUSDT,extra\nBTCUSDT\n  \nETHUSDT\n");
        let symbols = read_symbol_file(file.path()).unwrap();
        assert_eq!(symbols, syms(&["BTCUSDT", "ETHUSDT"]));
    }

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let filter = filter(&dir.path().join("absent.csv"), &["BTCUSDT"]);

        let result = filter.select(&syms(&["BTCUSDT"]), false, &[]).await.unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_input_file_required() {
        let ctx = context(snapshot_with_symbols(&[]));
        assert!(CsvSymbolFilter::from_config(&json!({}), &ctx).is_err());
        assert!(CsvSymbolFilter::from_config(&json!({"input_file": ""}), &ctx).is_err());
    }
}
