//! 单个过滤阶段的输出
//!
//! 有序映射：交易对 -> 元数据。排序类过滤器的输出顺序即排名顺序

use std::collections::HashMap;

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};

/// 每个交易对附带的元数据
pub type Metadata = Map<String, Value>;

/// 由键值对构造元数据
pub fn metadata<I, K>(pairs: I) -> Metadata
where
    I: IntoIterator<Item = (K, Value)>,
    K: Into<String>,
{
    pairs.into_iter().map(|(k, v)| (k.into(), v)).collect()
}

/// 元数据转为旁路存储的哈希字段，字符串原样写入，其余按 JSON 文本
pub fn metadata_to_fields(metadata: &Metadata) -> Vec<(String, String)> {
    metadata
        .iter()
        .map(|(field, value)| {
            let text = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (field.clone(), text)
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterResult {
    entries: Vec<(String, Metadata)>,
    /// 交易对 -> entries 下标
    index: HashMap<String, usize>,
}

impl FilterResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// 不带元数据的结果，保持给定顺序，重复项只保留第一次出现
    pub fn from_symbols<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut result = Self::new();
        for symbol in symbols {
            result.insert(symbol, Metadata::new());
        }
        result
    }

    /// 追加交易对；已存在时忽略并返回 false，保证已产出的元数据不被改写
    pub fn insert(&mut self, symbol: impl Into<String>, metadata: Metadata) -> bool {
        let symbol = symbol.into();
        if self.index.contains_key(&symbol) {
            return false;
        }
        self.index.insert(symbol.clone(), self.entries.len());
        self.entries.push((symbol, metadata));
        true
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.index.contains_key(symbol)
    }

    pub fn get(&self, symbol: &str) -> Option<&Metadata> {
        self.index.get(symbol).map(|&i| &self.entries[i].1)
    }

    /// 按输出顺序的交易对列表，即下一阶段的输入
    pub fn symbols(&self) -> Vec<String> {
        self.entries.iter().map(|(s, _)| s.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Metadata)> {
        self.entries.iter().map(|(s, m)| (s.as_str(), m))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 保留满足条件的交易对，顺序不变
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&str) -> bool,
    {
        self.entries.retain(|(s, _)| keep(s));
        self.index = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, (s, _))| (s.clone(), i))
            .collect();
    }
}

impl<'a> IntoIterator for &'a FilterResult {
    type Item = &'a (String, Metadata);
    type IntoIter = std::slice::Iter<'a, (String, Metadata)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// 序列化为 JSON 对象，键顺序即输出顺序
impl Serialize for FilterResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (symbol, metadata) in &self.entries {
            map.serialize_entry(symbol, metadata)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_insert_keeps_order_and_first_value() {
        let mut result = FilterResult::new();
        assert!(result.insert("C", metadata([("v", json!(1))])));
        assert!(result.insert("A", Metadata::new()));
        assert!(!result.insert("C", metadata([("v", json!(2))])));

        assert_eq!(result.symbols(), vec!["C", "A"]);
        assert_eq!(result.get("C").unwrap().get("v"), Some(&json!(1)));
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn test_lookup_after_retain() {
        let mut result = FilterResult::new();
        for i in 0..1000 {
            result.insert(format!("S{}USDT", i), metadata([("i", json!(i))]));
        }
        assert!(!result.insert("S10USDT", Metadata::new()));
        assert_eq!(result.len(), 1000);

        result.retain(|s| s.ends_with("7USDT"));
        assert_eq!(result.len(), 100);
        assert!(!result.contains("S10USDT"));
        assert_eq!(result.get("S997USDT").unwrap().get("i"), Some(&json!(997)));
        assert_eq!(result.get("S7USDT").unwrap().get("i"), Some(&json!(7)));

        // 被剔除的交易对可以重新加入，排在末尾
        assert!(result.insert("S10USDT", Metadata::new()));
        assert_eq!(result.symbols().last().map(String::as_str), Some("S10USDT"));
        assert!(result.get("S10USDT").unwrap().is_empty());
    }

    #[test]
    fn test_serialize_in_output_order() {
        let mut result = FilterResult::new();
        result.insert("ZEC", metadata([("rank", json!(1))]));
        result.insert("ADA", Metadata::new());

        let text = serde_json::to_string(&result).unwrap();
        assert_eq!(text, r#"{"ZEC":{"rank":1},"ADA":{}}"#);
    }

    #[test]
    fn test_metadata_to_fields() {
        let meta = metadata([
            ("long", json!(true)),
            ("position_side", json!("LONG")),
            ("pct", json!(1.5)),
        ]);
        let mut fields = metadata_to_fields(&meta);
        fields.sort();
        assert_eq!(
            fields,
            vec![
                ("long".to_string(), "true".to_string()),
                ("pct".to_string(), "1.5".to_string()),
                ("position_side".to_string(), "LONG".to_string()),
            ]
        );
    }
}
