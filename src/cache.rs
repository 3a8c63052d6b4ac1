use crate::error::{LedgerError, Result};
use crate::schema::BuildingSnapshot;
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// A snapshot together with the time it was stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedSnapshot {
    pub data: BuildingSnapshot,
    #[serde(rename = "timestamp")]
    pub timestamp_millis: i64,
}

impl CachedSnapshot {
    pub fn new(data: BuildingSnapshot, timestamp_millis: i64) -> Self {
        Self {
            data,
            timestamp_millis,
        }
    }

    pub fn is_fresh(&self, now_millis: i64, ttl: Duration) -> bool {
        let ttl_millis = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        now_millis.saturating_sub(self.timestamp_millis) < ttl_millis
    }
}

/// Storage for the last normalized snapshot. Reads happen before a fetch,
/// writes only after a fully successful one.
pub trait SnapshotCache {
    fn get(&self, key: &str) -> Option<CachedSnapshot>;
    fn set(&self, key: &str, snapshot: &CachedSnapshot) -> Result<()>;
}

/// Keeps snapshots as serialized JSON text, so a hit goes through the same
/// serialization a persistent store would.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&self) {
        match self.lock() {
            Ok(mut entries) => entries.clear(),
            Err(e) => warn!("Could not clear snapshot cache: {}", e),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| LedgerError::Cache("snapshot cache lock poisoned".to_string()))
    }
}

impl SnapshotCache for MemoryCache {
    fn get(&self, key: &str) -> Option<CachedSnapshot> {
        let entries = match self.lock() {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Treating cache entry '{}' as missing: {}", key, e);
                return None;
            }
        };
        let raw = entries.get(key)?;
        match serde_json::from_str(raw) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!("Discarding unreadable cache entry '{}': {}", key, e);
                None
            }
        }
    }

    fn set(&self, key: &str, snapshot: &CachedSnapshot) -> Result<()> {
        let raw = serde_json::to_string(snapshot)?;
        self.lock()?.insert(key.to_string(), raw);
        Ok(())
    }
}

/// Never stores anything; every read is a miss.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCache;

impl SnapshotCache for NoCache {
    fn get(&self, _key: &str) -> Option<CachedSnapshot> {
        None
    }

    fn set(&self, _key: &str, _snapshot: &CachedSnapshot) -> Result<()> {
        Ok(())
    }
}
