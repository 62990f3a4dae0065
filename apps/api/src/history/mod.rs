//! History Store: every produced report, newest first, persisted as one JSON array
//! under a single key of a `KeyValueStore`.
//!
//! The list is capped, and every read-modify-write happens under one mutex so
//! concurrent appends and clears cannot interleave.

use std::sync::Arc;

use chrono::{Local, Utc};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::models::history::{job_description_snippet, HistoryEntry};
use crate::models::report::Report;

pub mod kv;

pub use kv::{KeyValueStore, MemoryStore, RedisStore};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub struct HistoryStore {
    kv: Arc<dyn KeyValueStore>,
    key: String,
    limit: usize,
    entries: Mutex<Vec<HistoryEntry>>,
}

impl HistoryStore {
    /// Reads the persisted list. A missing key is an empty history. Entries that do not
    /// parse are skipped one by one; a value that is not a JSON array at all counts as
    /// empty and is replaced by the next write.
    pub async fn load(
        kv: Arc<dyn KeyValueStore>,
        key: impl Into<String>,
        limit: usize,
    ) -> Result<Self, StoreError> {
        let key = key.into();
        let entries = match kv.get(&key).await? {
            Some(raw) => parse_entries(&key, &raw),
            None => Vec::new(),
        };
        info!("Loaded {} history entries from '{key}'", entries.len());

        Ok(Self {
            kv,
            key,
            limit: limit.max(1),
            entries: Mutex::new(entries),
        })
    }

    /// Snapshot, newest first.
    pub async fn entries(&self) -> Vec<HistoryEntry> {
        self.entries.lock().await.clone()
    }

    /// Prepends a new entry and persists the whole list. On a storage failure the
    /// in-memory list is left unchanged.
    pub async fn append(
        &self,
        report: Report,
        job_description: &str,
    ) -> Result<HistoryEntry, StoreError> {
        let mut entries = self.entries.lock().await;

        let now_ms = Utc::now().timestamp_millis();
        let id = match entries.first() {
            Some(newest) if newest.id >= now_ms => newest.id + 1,
            _ => now_ms,
        };
        let entry = HistoryEntry {
            id,
            report,
            job_description_snippet: job_description_snippet(job_description),
            timestamp: Local::now().format("%-m/%-d/%Y").to_string(),
        };

        let mut updated = Vec::with_capacity(entries.len() + 1);
        updated.push(entry.clone());
        updated.extend(entries.iter().cloned());
        updated.truncate(self.limit);

        self.kv
            .set(&self.key, &serde_json::to_string(&updated)?)
            .await?;
        *entries = updated;

        info!("History entry {} saved ({} total)", entry.id, entries.len());
        Ok(entry)
    }

    /// Removes the persisted key and empties the list.
    pub async fn clear(&self) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().await;
        self.kv.remove(&self.key).await?;
        entries.clear();
        info!("History cleared");
        Ok(())
    }
}

fn parse_entries(key: &str, raw: &str) -> Vec<HistoryEntry> {
    let items = match serde_json::from_str::<Vec<Value>>(raw) {
        Ok(items) => items,
        Err(e) => {
            warn!("Ignoring unreadable history under '{key}': {e}");
            return Vec::new();
        }
    };

    items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| {
            serde_json::from_value::<HistoryEntry>(item)
                .inspect_err(|e| warn!("Skipping history item {index} under '{key}': {e}"))
                .ok()
        })
        .collect()
}
