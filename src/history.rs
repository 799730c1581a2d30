use crate::models::ContentItem;
use crate::storage::{KeyValueStore, HISTORY_KEY};
use anyhow::Context;
use std::sync::Arc;

/// Newest-first archive of generation attempts.
#[derive(Clone)]
pub struct HistoryStore {
    store: Arc<dyn KeyValueStore>,
    limit: usize,
}

impl HistoryStore {
    /// `limit` caps the archive; the oldest items are dropped past it.
    pub fn new(store: Arc<dyn KeyValueStore>, limit: usize) -> Self {
        Self {
            store,
            limit: limit.max(1),
        }
    }

    /// Returns the archive, newest first. Items that no longer parse are skipped.
    ///
    /// For display only: an unreadable store also yields an empty archive. Anything
    /// that writes the archive back must use `try_load`.
    pub async fn load(&self) -> Vec<ContentItem> {
        match self.try_load().await {
            Ok(items) => items,
            Err(e) => {
                log::error!("Failed to read history: {:?}", e);
                Vec::new()
            }
        }
    }

    /// Like `load`, but a failed store read is returned as an error.
    pub async fn try_load(&self) -> anyhow::Result<Vec<ContentItem>> {
        let Some(raw) = self
            .store
            .get(HISTORY_KEY)
            .await
            .context("Failed to read history")?
        else {
            return Ok(Vec::new());
        };

        let values: Vec<serde_json::Value> = match serde_json::from_str(&raw) {
            Ok(values) => values,
            Err(e) => {
                log::warn!("Persisted history is malformed, treating as empty: {}", e);
                return Ok(Vec::new());
            }
        };

        let total = values.len();
        let items: Vec<ContentItem> = values
            .into_iter()
            .filter_map(|value| match serde_json::from_value::<ContentItem>(value) {
                Ok(item) => Some(item),
                Err(e) => {
                    log::warn!("Skipping malformed history item: {}", e);
                    None
                }
            })
            .collect();

        if items.len() != total {
            log::warn!("Loaded {} of {} history items", items.len(), total);
        }
        Ok(items)
    }

    pub async fn get(&self, id: &str) -> Option<ContentItem> {
        self.load().await.into_iter().find(|item| item.id == id)
    }

    /// Prepends `item`, persists, and returns the new archive.
    pub async fn append(&self, item: ContentItem) -> anyhow::Result<Vec<ContentItem>> {
        let mut items = self.try_load().await?;
        log::info!("Archiving item {} ({})", item.id, item.title);
        items.insert(0, item);

        if items.len() > self.limit {
            log::warn!(
                "History exceeds {} items, dropping {} oldest",
                self.limit,
                items.len() - self.limit
            );
            items.truncate(self.limit);
        }

        self.persist(&items).await?;
        Ok(items)
    }

    /// Drops the item with `id` and returns the remainder. Unknown ids are a no-op.
    pub async fn remove(&self, id: &str) -> anyhow::Result<Vec<ContentItem>> {
        let mut items = self.try_load().await?;
        let before = items.len();
        items.retain(|item| item.id != id);

        if items.len() == before {
            log::warn!("Attempted to delete non-existent history item: {}", id);
            return Ok(items);
        }

        self.persist(&items).await?;
        log::warn!("Deleted history item {}", id);
        Ok(items)
    }

    pub async fn clear(&self) -> anyhow::Result<()> {
        log::warn!("Clearing entire history");
        self.store.remove(HISTORY_KEY).await
    }

    async fn persist(&self, items: &[ContentItem]) -> anyhow::Result<()> {
        let json = serde_json::to_string(items).context("Failed to serialize history")?;
        self.store.set(HISTORY_KEY, &json).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ContentStatus, ContentType};
    use crate::storage::failing::FailingStore;
    use crate::storage::MemoryStore;

    fn item(topic: &str) -> ContentItem {
        ContentItem::new(topic, ContentType::Twitter, format!("body {}", topic), ContentStatus::Generated)
    }

    fn history(limit: usize) -> (Arc<MemoryStore>, HistoryStore) {
        let kv = Arc::new(MemoryStore::new());
        (kv.clone(), HistoryStore::new(kv, limit))
    }

    #[tokio::test]
    async fn load_empty_when_nothing_persisted() {
        let (_, history) = history(10);
        assert!(history.load().await.is_empty());
    }

    #[tokio::test]
    async fn append_places_new_item_first() {
        let (_, history) = history(10);
        history.append(item("first")).await.unwrap();
        let before = history.load().await.len();

        let newest = item("second");
        let after = history.append(newest.clone()).await.unwrap();

        assert_eq!(after.len(), before + 1);
        assert_eq!(after[0], newest);
        assert_eq!(after[1].topic, "first");
        assert_eq!(history.load().await, after);
    }

    #[tokio::test]
    async fn append_enforces_retention_limit() {
        let (_, history) = history(3);
        for topic in ["a", "b", "c", "d"] {
            history.append(item(topic)).await.unwrap();
        }
        let topics: Vec<String> = history.load().await.into_iter().map(|i| i.topic).collect();
        assert_eq!(topics, vec!["d", "c", "b"]);
    }

    #[tokio::test]
    async fn remove_present_id_drops_exactly_one() {
        let (_, history) = history(10);
        history.append(item("a")).await.unwrap();
        let target = item("b");
        history.append(target.clone()).await.unwrap();

        let remaining = history.remove(&target.id).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert!(remaining.iter().all(|i| i.id != target.id));
        assert_eq!(history.load().await, remaining);
    }

    #[tokio::test]
    async fn remove_absent_id_is_a_noop() {
        let (_, history) = history(10);
        history.append(item("a")).await.unwrap();
        let before = history.load().await;
        let after = history.remove("does-not-exist").await.unwrap();
        assert_eq!(after, before);
    }

    #[tokio::test]
    async fn clear_then_load_is_empty() {
        let (_, history) = history(10);
        history.append(item("a")).await.unwrap();
        history.clear().await.unwrap();
        assert!(history.load().await.is_empty());
    }

    #[tokio::test]
    async fn malformed_items_are_skipped() {
        let (kv, history) = history(10);
        let good = item("ok");
        let raw = serde_json::json!([good, {"id": "partial"}]).to_string();
        kv.set(HISTORY_KEY, &raw).await.unwrap();

        let loaded = history.load().await;
        assert_eq!(loaded, vec![good]);
    }

    #[tokio::test]
    async fn unparseable_history_loads_empty() {
        let (kv, history) = history(10);
        kv.set(HISTORY_KEY, "not-an-array").await.unwrap();
        assert!(history.load().await.is_empty());
    }

    #[tokio::test]
    async fn get_finds_item_by_id() {
        let (_, history) = history(10);
        let target = item("lookup");
        history.append(target.clone()).await.unwrap();
        assert_eq!(history.get(&target.id).await, Some(target));
        assert!(history.get("nope").await.is_none());
    }

    #[tokio::test]
    async fn read_failure_leaves_archive_intact() {
        let kv = Arc::new(FailingStore::new());
        let history = HistoryStore::new(kv.clone(), 10);
        for topic in ["a", "b", "c"] {
            history.append(item(topic)).await.unwrap();
        }
        let saved = history.load().await;

        kv.fail_reads(true);
        assert!(history.append(item("d")).await.is_err());
        assert!(history.remove(&saved[0].id).await.is_err());
        assert!(history.try_load().await.is_err());
        assert!(history.load().await.is_empty());

        kv.fail_reads(false);
        assert_eq!(history.load().await, saved);
    }

    #[tokio::test]
    async fn write_failure_is_reported() {
        let kv = Arc::new(FailingStore::new());
        let history = HistoryStore::new(kv.clone(), 10);
        history.append(item("a")).await.unwrap();
        let saved = history.load().await;

        kv.fail_writes(true);
        assert!(history.append(item("b")).await.is_err());
        assert!(history.remove(&saved[0].id).await.is_err());

        kv.fail_writes(false);
        assert_eq!(history.load().await, saved);
    }
}
