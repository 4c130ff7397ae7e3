//! 内存旁路存储（使用DashMap）
//!
//! 语义与 Redis 实现一致，用于本地演练和测试

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;

use quant_universe_domain::SideChannelStore;

#[derive(Default)]
pub struct InMemorySideChannelStore {
    hashes: DashMap<String, HashMap<String, String>>,
    /// key -> member -> score
    sorted_sets: DashMap<String, HashMap<String, f64>>,
}

impl InMemorySideChannelStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SideChannelStore for InMemorySideChannelStore {
    async fn hset_fields(&self, key: &str, fields: &[(String, String)]) -> Result<()> {
        if fields.is_empty() {
            return Ok(());
        }
        let mut entry = self.hashes.entry(key.to_string()).or_default();
        for (field, value) in fields {
            entry.insert(field.clone(), value.clone());
        }
        Ok(())
    }

    async fn hget_all(&self, key: &str) -> Result<HashMap<String, String>> {
        Ok(self
            .hashes
            .get(key)
            .map(|entry| entry.value().clone())
            .unwrap_or_default())
    }

    async fn zadd(&self, key: &str, member: &str, score: f64) -> Result<()> {
        self.sorted_sets
            .entry(key.to_string())
            .or_default()
            .insert(member.to_string(), score);
        Ok(())
    }

    async fn zrange_by_score(&self, key: &str, min: f64, max: f64) -> Result<Vec<(String, f64)>> {
        let mut members: Vec<(String, f64)> = match self.sorted_sets.get(key) {
            Some(set) => set
                .iter()
                .filter(|(_, score)| **score >= min && **score <= max)
                .map(|(member, score)| (member.clone(), *score))
                .collect(),
            None => Vec::new(),
        };
        // 同分按成员字典序，与 Redis 保持一致
        members.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        Ok(members)
    }

    async fn zrem_range_by_score(&self, key: &str, min: f64, max: f64) -> Result<usize> {
        let Some(mut set) = self.sorted_sets.get_mut(key) else {
            return Ok(0);
        };
        let before = set.len();
        set.retain(|_, score| *score < min || *score > max);
        Ok(before - set.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hash_overwrite() {
        let store = InMemorySideChannelStore::new();
        store
            .hset_fields("k", &[("a".to_string(), "1".to_string())])
            .await
            .unwrap();
        store
            .hset_fields(
                "k",
                &[
                    ("a".to_string(), "2".to_string()),
                    ("b".to_string(), "3".to_string()),
                ],
            )
            .await
            .unwrap();

        let values = store.hget_all("k").await.unwrap();
        assert_eq!(values.get("a").map(String::as_str), Some("2"));
        assert_eq!(values.get("b").map(String::as_str), Some("3"));
        assert!(store.hget_all("missing").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sorted_set_range_and_purge() {
        let store = InMemorySideChannelStore::new();
        store.zadd("z", "c", 30.0).await.unwrap();
        store.zadd("z", "a", 10.0).await.unwrap();
        store.zadd("z", "b", 20.0).await.unwrap();

        let range = store.zrange_by_score("z", 10.0, 20.0).await.unwrap();
        assert_eq!(
            range,
            vec![("a".to_string(), 10.0), ("b".to_string(), 20.0)]
        );

        let removed = store.zrem_range_by_score("z", 0.0, 20.0).await.unwrap();
        assert_eq!(removed, 2);
        let rest = store.zrange_by_score("z", 0.0, 100.0).await.unwrap();
        assert_eq!(rest, vec![("c".to_string(), 30.0)]);
        assert_eq!(store.zrem_range_by_score("none", 0.0, 1.0).await.unwrap(), 0);
    }
}
