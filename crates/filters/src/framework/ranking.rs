//! 排序类过滤器的公共逻辑
//!
//! 取标量 -> 可选绝对值 -> 上下界（闭区间） -> 按值分桶排序 -> 截取前 N 个

use std::cmp::Ordering;

use serde::Deserialize;

use super::error::FilterConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[serde(alias = "ASC")]
    Asc,
    #[serde(alias = "DESC")]
    Desc,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RankingOptions {
    pub sort: Option<SortDirection>,
    pub top: Option<usize>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub absolute: bool,
}

impl RankingOptions {
    /// 构建期校验：排序方向和 top 至少配置一个，上下界不能颠倒
    pub fn validate(
        &self,
        filter: &str,
        min_field: &str,
        max_field: &str,
    ) -> Result<(), FilterConfigError> {
        if self.sort.is_none() && self.top.is_none() {
            return Err(FilterConfigError::invalid(
                filter,
                "`sort` 和 `top` 至少需要配置一个",
            ));
        }
        if self.top == Some(0) {
            return Err(FilterConfigError::invalid_field(filter, "top", "必须大于 0"));
        }
        if let (Some(min), Some(max)) = (self.min, self.max) {
            if min >= max {
                return Err(FilterConfigError::invalid(
                    filter,
                    format!("`{}` ({}) 必须小于 `{}` ({})", min_field, min, max_field, max),
                ));
            }
        }
        Ok(())
    }

    /// 参与排序的值
    pub fn key(&self, value: f64) -> f64 {
        if self.absolute {
            value.abs()
        } else {
            value
        }
    }

    fn in_bounds(&self, key: f64) -> bool {
        self.min.map_or(true, |min| key >= min) && self.max.map_or(true, |max| key <= max)
    }

    /// 对 (交易对, 原始值) 排序，返回值仍为原始值
    ///
    /// 非有限值直接剔除；同值的交易对共享一个桶，桶内保持输入顺序
    pub fn rank(&self, values: Vec<(String, f64)>) -> Vec<(String, f64)> {
        let mut buckets: Vec<(f64, Vec<(String, f64)>)> = Vec::new();
        for (symbol, value) in values {
            let key = self.key(value);
            if !key.is_finite() || !self.in_bounds(key) {
                continue;
            }
            match buckets.iter_mut().find(|(k, _)| *k == key) {
                Some((_, bucket)) => bucket.push((symbol, value)),
                None => buckets.push((key, vec![(symbol, value)])),
            }
        }

        match self.sort {
            Some(SortDirection::Asc) => buckets.sort_by(|a, b| cmp_keys(a.0, b.0)),
            Some(SortDirection::Desc) => buckets.sort_by(|a, b| cmp_keys(b.0, a.0)),
            None => {}
        }

        let ranked = buckets.into_iter().flat_map(|(_, bucket)| bucket);
        match self.top {
            Some(top) => ranked.take(top).collect(),
            None => ranked.collect(),
        }
    }
}

fn cmp_keys(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}
