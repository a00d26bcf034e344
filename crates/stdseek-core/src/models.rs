//! Core data models used throughout stdseek.
//!
//! These types represent the records, cache envelopes and download
//! provenance that flow between source adapters, the aggregator, the cache
//! and the download orchestrator.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::normalize::normalize_identifier;

/// Source-specific fields needed later for download: internal numeric
/// ids, resource tokens, direct file URLs.
pub type SourceMetadata = BTreeMap<String, serde_json::Value>;

/// Lifecycle status of a standard, mapped from each source's vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Current,
    Withdrawn,
    Pending,
    #[default]
    Unknown,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Current => "current",
            Status::Withdrawn => "withdrawn",
            Status::Pending => "pending",
            Status::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a source claims it can produce the document itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Availability {
    Available,
    Unavailable,
    #[default]
    Undetermined,
}

impl Availability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Availability::Available => "available",
            Availability::Unavailable => "unavailable",
            Availability::Undetermined => "undetermined",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "available" => Some(Availability::Available),
            "unavailable" => Some(Availability::Unavailable),
            "undetermined" => Some(Availability::Undetermined),
            _ => None,
        }
    }
}

impl From<bool> for Availability {
    fn from(has: bool) -> Self {
        if has {
            Availability::Available
        } else {
            Availability::Unavailable
        }
    }
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One standard as reported by one or more sources.
///
/// `id` is the normalized identifier and the only merge key. Adapters
/// build records with [`StandardRecord::new`], which derives it from the
/// raw identifier; records whose id comes out empty are dropped before
/// merge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardRecord {
    pub id: String,
    pub raw_identifier: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub publish_date: Option<String>,
    #[serde(default)]
    pub effective_date: Option<String>,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub has_document: Availability,
    /// Metadata keyed by the source that produced it.
    #[serde(default)]
    pub source_metadata: BTreeMap<String, SourceMetadata>,
    #[serde(default)]
    pub contributing_sources: BTreeSet<String>,
}

impl StandardRecord {
    pub fn new(source_name: &str, raw_identifier: &str) -> Self {
        let raw = raw_identifier.trim().to_string();
        let mut contributing_sources = BTreeSet::new();
        contributing_sources.insert(source_name.to_string());
        Self {
            id: normalize_identifier(&raw),
            raw_identifier: raw,
            title: String::new(),
            publish_date: None,
            effective_date: None,
            status: Status::Unknown,
            has_document: Availability::Undetermined,
            source_metadata: BTreeMap::new(),
            contributing_sources,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    pub fn with_availability(mut self, has_document: Availability) -> Self {
        self.has_document = has_document;
        self
    }

    /// Attach one metadata field under `source_name`.
    pub fn with_meta(
        mut self,
        source_name: &str,
        key: &str,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.source_metadata
            .entry(source_name.to_string())
            .or_default()
            .insert(key.to_string(), value.into());
        self
    }

    pub fn metadata_for(&self, source_name: &str) -> Option<&SourceMetadata> {
        self.source_metadata.get(source_name)
    }

    /// A string metadata field, with numbers rendered as text. Empty
    /// strings count as absent.
    pub fn meta_str(&self, source_name: &str, key: &str) -> Option<String> {
        match self.metadata_for(source_name)?.get(key)? {
            serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// File name for the materialized document: `<identifier> <title>.pdf`
    /// with path separators and reserved characters replaced.
    pub fn file_name(&self) -> String {
        let base = if self.title.trim().is_empty() {
            self.raw_identifier.clone()
        } else {
            format!("{} {}", self.raw_identifier, self.title.trim())
        };
        let cleaned: String = base
            .chars()
            .map(|c| match c {
                '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
                c if c.is_control() => '_',
                c => c,
            })
            .collect();
        format!("{}.pdf", cleaned.trim())
    }
}

/// Durable record of a successfully materialized document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadProvenance {
    pub normalized_id: String,
    pub original_identifier: String,
    pub title: String,
    pub source_name: String,
    pub file_path: String,
    pub file_size_bytes: u64,
    pub downloaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadStatus {
    Success,
    Failed,
}

impl DownloadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DownloadStatus::Success => "success",
            DownloadStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "success" => Some(DownloadStatus::Success),
            "failed" => Some(DownloadStatus::Failed),
            _ => None,
        }
    }
}

/// Append-only download log row. `entry_id` is assigned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadHistoryEntry {
    pub entry_id: i64,
    pub normalized_id: String,
    pub original_identifier: String,
    pub title: String,
    pub source_name: String,
    pub file_path: Option<String>,
    pub file_size_bytes: u64,
    pub downloaded_at: DateTime<Utc>,
    pub status: DownloadStatus,
}

impl DownloadHistoryEntry {
    pub fn success(p: &DownloadProvenance) -> Self {
        Self {
            entry_id: 0,
            normalized_id: p.normalized_id.clone(),
            original_identifier: p.original_identifier.clone(),
            title: p.title.clone(),
            source_name: p.source_name.clone(),
            file_path: Some(p.file_path.clone()),
            file_size_bytes: p.file_size_bytes,
            downloaded_at: p.downloaded_at,
            status: DownloadStatus::Success,
        }
    }

    pub fn failure(record: &StandardRecord, source_name: &str, at: DateTime<Utc>) -> Self {
        Self {
            entry_id: 0,
            normalized_id: record.id.clone(),
            original_identifier: record.raw_identifier.clone(),
            title: record.title.clone(),
            source_name: source_name.to_string(),
            file_path: None,
            file_size_bytes: 0,
            downloaded_at: at,
            status: DownloadStatus::Failed,
        }
    }

    pub fn to_provenance(&self) -> Option<DownloadProvenance> {
        Some(DownloadProvenance {
            normalized_id: self.normalized_id.clone(),
            original_identifier: self.original_identifier.clone(),
            title: self.title.clone(),
            source_name: self.source_name.clone(),
            file_path: self.file_path.clone()?,
            file_size_bytes: self.file_size_bytes,
            downloaded_at: self.downloaded_at,
        })
    }
}

/// One row of the search log shown by history UIs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHistoryEntry {
    pub keyword: String,
    pub sources: Vec<String>,
    pub result_count: usize,
    pub searched_at: DateTime<Utc>,
}

/// Envelope for one cached aggregated search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: String,
    pub keyword: String,
    pub sources: Vec<String>,
    pub page: u32,
    pub payload: Vec<StandardRecord>,
    pub created_at: DateTime<Utc>,
    pub ttl_secs: i64,
}

impl CacheEntry {
    /// Saturates at the largest representable time for absurd TTLs.
    pub fn expires_at(&self) -> DateTime<Utc> {
        Duration::try_seconds(self.ttl_secs)
            .and_then(|ttl| self.created_at.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// An entry is live strictly before `created_at + ttl`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at()
    }
}

/// Availability correction recorded after a download disproved a source's
/// claim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityOverride {
    pub normalized_id: String,
    pub availability: Availability,
    pub reason: String,
    pub updated_at: DateTime<Utc>,
}

/// Filter for [`HistoryStore::list_download_history`](crate::store::HistoryStore::list_download_history).
#[derive(Debug, Clone, Default)]
pub struct HistoryFilter {
    pub status: Option<DownloadStatus>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
}

impl HistoryFilter {
    pub fn matches(&self, entry: &DownloadHistoryEntry) -> bool {
        if let Some(status) = self.status {
            if entry.status != status {
                return false;
            }
        }
        if let Some(since) = self.since {
            if entry.downloaded_at < since {
                return false;
            }
        }
        if let Some(until) = self.until {
            if entry.downloaded_at > until {
                return false;
            }
        }
        true
    }
}

/// Row counts per persisted table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreCounts {
    pub search_entries: usize,
    pub search_history: usize,
    pub provenance: usize,
    pub download_history: usize,
    pub availability_overrides: usize,
}
