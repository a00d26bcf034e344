//! Persistence contract for stdseek.
//!
//! The [`HistoryStore`] trait covers everything the cache layer keeps
//! durably: cached search envelopes, the search log, the provenance index
//! of downloaded files, the append-only download log, and availability
//! corrections. Backends are pluggable (SQLite in the application crate,
//! [`memory::InMemoryStore`] for tests).
//!
//! Implementations must be `Send + Sync` and must make every single-row
//! write atomic: a reader sees either the old or the new row, never a mix.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{
    AvailabilityOverride, CacheEntry, DownloadHistoryEntry, DownloadProvenance, HistoryFilter,
    SearchHistoryEntry, StoreCounts,
};

/// Durable key-value/relational store behind the cache layer.
///
/// # Operations
///
/// | Group | Methods |
/// |-------|---------|
/// | Search cache | [`put_search_entry`](HistoryStore::put_search_entry), [`get_search_entry`](HistoryStore::get_search_entry), [`delete_search_entry`](HistoryStore::delete_search_entry), [`delete_expired_search_entries`](HistoryStore::delete_expired_search_entries), [`clear_search_entries`](HistoryStore::clear_search_entries) |
/// | Search log | [`append_search_history`](HistoryStore::append_search_history), [`list_search_history`](HistoryStore::list_search_history), [`delete_search_history_before`](HistoryStore::delete_search_history_before) |
/// | Provenance | [`upsert_provenance`](HistoryStore::upsert_provenance), [`get_provenance`](HistoryStore::get_provenance), [`list_provenance`](HistoryStore::list_provenance), [`delete_provenance`](HistoryStore::delete_provenance) |
/// | Download log | [`append_download_history`](HistoryStore::append_download_history), [`list_successful_downloads`](HistoryStore::list_successful_downloads), [`list_download_history`](HistoryStore::list_download_history), [`delete_download_history`](HistoryStore::delete_download_history) |
/// | Availability | [`set_availability`](HistoryStore::set_availability), [`get_availability`](HistoryStore::get_availability), [`list_availability`](HistoryStore::list_availability), [`clear_availability`](HistoryStore::clear_availability) |
#[async_trait]
pub trait HistoryStore: Send + Sync {
    // ── search cache ───────────────────────────────────────────

    /// Insert or replace the entry under `entry.key`.
    async fn put_search_entry(&self, entry: &CacheEntry) -> Result<()>;

    async fn get_search_entry(&self, key: &str) -> Result<Option<CacheEntry>>;

    /// Returns whether a row was removed.
    async fn delete_search_entry(&self, key: &str) -> Result<bool>;

    /// Delete every entry with `created_at + ttl <= now`.
    async fn delete_expired_search_entries(&self, now: DateTime<Utc>) -> Result<usize>;

    async fn clear_search_entries(&self) -> Result<usize>;

    // ── search log ─────────────────────────────────────────────

    async fn append_search_history(&self, entry: &SearchHistoryEntry) -> Result<()>;

    /// Newest first, optionally limited to one keyword.
    async fn list_search_history(
        &self,
        keyword: Option<&str>,
        limit: usize,
    ) -> Result<Vec<SearchHistoryEntry>>;

    async fn delete_search_history_before(&self, cutoff: DateTime<Utc>) -> Result<usize>;

    // ── provenance index ───────────────────────────────────────

    /// Insert or replace by `normalized_id`.
    async fn upsert_provenance(&self, provenance: &DownloadProvenance) -> Result<()>;

    async fn get_provenance(&self, normalized_id: &str) -> Result<Option<DownloadProvenance>>;

    async fn list_provenance(&self) -> Result<Vec<DownloadProvenance>>;

    async fn delete_provenance(&self, normalized_id: &str) -> Result<bool>;

    // ── download log ───────────────────────────────────────────

    /// Append a row and return its assigned `entry_id`.
    async fn append_download_history(&self, entry: &DownloadHistoryEntry) -> Result<i64>;

    /// Successful downloads of one identifier, newest first.
    async fn list_successful_downloads(
        &self,
        normalized_id: &str,
    ) -> Result<Vec<DownloadHistoryEntry>>;

    /// Newest first.
    async fn list_download_history(
        &self,
        filter: &HistoryFilter,
    ) -> Result<Vec<DownloadHistoryEntry>>;

    async fn delete_download_history(&self, entry_id: i64) -> Result<bool>;

    // ── availability corrections ───────────────────────────────

    async fn set_availability(&self, entry: &AvailabilityOverride) -> Result<()>;

    async fn get_availability(&self, normalized_id: &str) -> Result<Option<AvailabilityOverride>>;

    async fn list_availability(&self) -> Result<Vec<AvailabilityOverride>>;

    async fn clear_availability(&self) -> Result<usize>;

    async fn counts(&self) -> Result<StoreCounts>;
}
