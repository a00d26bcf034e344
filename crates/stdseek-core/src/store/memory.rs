//! In-memory [`HistoryStore`] implementation for tests and embedding.
//!
//! Each table is a collection behind its own `std::sync::RwLock`. Writes
//! replace whole rows under the write lock, so readers never observe a
//! partially written entry.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{
    AvailabilityOverride, CacheEntry, DownloadHistoryEntry, DownloadProvenance, DownloadStatus,
    HistoryFilter, SearchHistoryEntry, StoreCounts,
};

use super::HistoryStore;

pub struct InMemoryStore {
    search: RwLock<HashMap<String, CacheEntry>>,
    search_log: RwLock<Vec<SearchHistoryEntry>>,
    provenance: RwLock<BTreeMap<String, DownloadProvenance>>,
    downloads: RwLock<Vec<DownloadHistoryEntry>>,
    availability: RwLock<BTreeMap<String, AvailabilityOverride>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            search: RwLock::new(HashMap::new()),
            search_log: RwLock::new(Vec::new()),
            provenance: RwLock::new(BTreeMap::new()),
            downloads: RwLock::new(Vec::new()),
            availability: RwLock::new(BTreeMap::new()),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HistoryStore for InMemoryStore {
    async fn put_search_entry(&self, entry: &CacheEntry) -> Result<()> {
        self.search
            .write()
            .unwrap()
            .insert(entry.key.clone(), entry.clone());
        Ok(())
    }

    async fn get_search_entry(&self, key: &str) -> Result<Option<CacheEntry>> {
        Ok(self.search.read().unwrap().get(key).cloned())
    }

    async fn delete_search_entry(&self, key: &str) -> Result<bool> {
        Ok(self.search.write().unwrap().remove(key).is_some())
    }

    async fn delete_expired_search_entries(&self, now: DateTime<Utc>) -> Result<usize> {
        let mut search = self.search.write().unwrap();
        let before = search.len();
        search.retain(|_, e| !e.is_expired(now));
        Ok(before - search.len())
    }

    async fn clear_search_entries(&self) -> Result<usize> {
        let mut search = self.search.write().unwrap();
        let n = search.len();
        search.clear();
        Ok(n)
    }

    async fn append_search_history(&self, entry: &SearchHistoryEntry) -> Result<()> {
        self.search_log.write().unwrap().push(entry.clone());
        Ok(())
    }

    async fn list_search_history(
        &self,
        keyword: Option<&str>,
        limit: usize,
    ) -> Result<Vec<SearchHistoryEntry>> {
        let log = self.search_log.read().unwrap();
        Ok(log
            .iter()
            .rev()
            .filter(|e| keyword.map_or(true, |k| e.keyword == k))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn delete_search_history_before(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        let mut log = self.search_log.write().unwrap();
        let before = log.len();
        log.retain(|e| e.searched_at >= cutoff);
        Ok(before - log.len())
    }

    async fn upsert_provenance(&self, provenance: &DownloadProvenance) -> Result<()> {
        self.provenance
            .write()
            .unwrap()
            .insert(provenance.normalized_id.clone(), provenance.clone());
        Ok(())
    }

    async fn get_provenance(&self, normalized_id: &str) -> Result<Option<DownloadProvenance>> {
        Ok(self.provenance.read().unwrap().get(normalized_id).cloned())
    }

    async fn list_provenance(&self) -> Result<Vec<DownloadProvenance>> {
        Ok(self.provenance.read().unwrap().values().cloned().collect())
    }

    async fn delete_provenance(&self, normalized_id: &str) -> Result<bool> {
        Ok(self
            .provenance
            .write()
            .unwrap()
            .remove(normalized_id)
            .is_some())
    }

    async fn append_download_history(&self, entry: &DownloadHistoryEntry) -> Result<i64> {
        let mut log = self.downloads.write().unwrap();
        let entry_id = log.last().map_or(1, |e| e.entry_id + 1);
        let mut row = entry.clone();
        row.entry_id = entry_id;
        log.push(row);
        Ok(entry_id)
    }

    async fn list_successful_downloads(
        &self,
        normalized_id: &str,
    ) -> Result<Vec<DownloadHistoryEntry>> {
        let log = self.downloads.read().unwrap();
        Ok(log
            .iter()
            .rev()
            .filter(|e| e.normalized_id == normalized_id && e.status == DownloadStatus::Success)
            .cloned()
            .collect())
    }

    async fn list_download_history(
        &self,
        filter: &HistoryFilter,
    ) -> Result<Vec<DownloadHistoryEntry>> {
        let log = self.downloads.read().unwrap();
        Ok(log
            .iter()
            .rev()
            .filter(|e| filter.matches(e))
            .take(filter.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    async fn delete_download_history(&self, entry_id: i64) -> Result<bool> {
        let mut log = self.downloads.write().unwrap();
        let before = log.len();
        log.retain(|e| e.entry_id != entry_id);
        Ok(log.len() != before)
    }

    async fn set_availability(&self, entry: &AvailabilityOverride) -> Result<()> {
        self.availability
            .write()
            .unwrap()
            .insert(entry.normalized_id.clone(), entry.clone());
        Ok(())
    }

    async fn get_availability(&self, normalized_id: &str) -> Result<Option<AvailabilityOverride>> {
        Ok(self.availability.read().unwrap().get(normalized_id).cloned())
    }

    async fn list_availability(&self) -> Result<Vec<AvailabilityOverride>> {
        Ok(self.availability.read().unwrap().values().cloned().collect())
    }

    async fn clear_availability(&self) -> Result<usize> {
        let mut map = self.availability.write().unwrap();
        let n = map.len();
        map.clear();
        Ok(n)
    }

    async fn counts(&self) -> Result<StoreCounts> {
        Ok(StoreCounts {
            search_entries: self.search.read().unwrap().len(),
            search_history: self.search_log.read().unwrap().len(),
            provenance: self.provenance.read().unwrap().len(),
            download_history: self.downloads.read().unwrap().len(),
            availability_overrides: self.availability.read().unwrap().len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StandardRecord;
    use chrono::Duration;

    fn ts(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }

    fn provenance(id: &str, at: DateTime<Utc>) -> DownloadProvenance {
        DownloadProvenance {
            normalized_id: id.into(),
            original_identifier: id.to_uppercase(),
            title: String::new(),
            source_name: "zby".into(),
            file_path: format!("/tmp/{id}.pdf"),
            file_size_bytes: 10,
            downloaded_at: at,
        }
    }

    #[tokio::test]
    async fn test_expired_search_entries_removed() {
        let store = InMemoryStore::new();
        for (key, ttl) in [("short", 10), ("long", 1000)] {
            store
                .put_search_entry(&CacheEntry {
                    key: key.into(),
                    keyword: "gb".into(),
                    sources: vec!["gbw".into()],
                    page: 1,
                    payload: vec![StandardRecord::new("gbw", "GB 1-2020")],
                    created_at: ts(0),
                    ttl_secs: ttl,
                })
                .await
                .unwrap();
        }
        assert_eq!(store.delete_expired_search_entries(ts(100)).await.unwrap(), 1);
        assert!(store.get_search_entry("long").await.unwrap().is_some());
        assert!(store.get_search_entry("short").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_download_history_ids_and_filter() {
        let store = InMemoryStore::new();
        let ok = DownloadHistoryEntry::success(&provenance("gb1", ts(0)));
        let mut failed = DownloadHistoryEntry::failure(
            &StandardRecord::new("zby", "GB 2"),
            "zby",
            ts(60),
        );
        failed.entry_id = 99;
        assert_eq!(store.append_download_history(&ok).await.unwrap(), 1);
        assert_eq!(store.append_download_history(&failed).await.unwrap(), 2);

        let only_failed = store
            .list_download_history(&HistoryFilter {
                status: Some(DownloadStatus::Failed),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(only_failed.len(), 1);
        assert_eq!(only_failed[0].entry_id, 2);

        let recent = store
            .list_download_history(&HistoryFilter {
                since: Some(ts(0) + Duration::seconds(30)),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(recent.len(), 1);

        assert_eq!(store.list_successful_downloads("gb1").await.unwrap().len(), 1);
        assert!(store.delete_download_history(1).await.unwrap());
        assert!(store.list_successful_downloads("gb1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_provenance_upsert_replaces() {
        let store = InMemoryStore::new();
        store.upsert_provenance(&provenance("gb1", ts(0))).await.unwrap();
        let mut newer = provenance("gb1", ts(5));
        newer.file_size_bytes = 99;
        store.upsert_provenance(&newer).await.unwrap();
        let got = store.get_provenance("gb1").await.unwrap().unwrap();
        assert_eq!(got.file_size_bytes, 99);
        assert_eq!(store.counts().await.unwrap().provenance, 1);
    }

    #[tokio::test]
    async fn test_search_history_newest_first() {
        let store = InMemoryStore::new();
        for (i, kw) in ["a", "b", "a"].iter().enumerate() {
            store
                .append_search_history(&SearchHistoryEntry {
                    keyword: kw.to_string(),
                    sources: vec![],
                    result_count: i,
                    searched_at: ts(i as i64),
                })
                .await
                .unwrap();
        }
        let all = store.list_search_history(None, 10).await.unwrap();
        assert_eq!(all[0].result_count, 2);
        let only_a = store.list_search_history(Some("a"), 1).await.unwrap();
        assert_eq!(only_a.len(), 1);
        assert_eq!(only_a[0].result_count, 2);
        assert_eq!(store.delete_search_history_before(ts(1)).await.unwrap(), 1);
    }
}
