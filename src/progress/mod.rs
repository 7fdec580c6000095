//! Bounded persisted watch-progress log
//!
//! The log lives in a single versioned JSON file and holds at most
//! [`PROGRESS_LOG_CAPACITY`] records, ordered most-recently-updated first.
//! Every write is an upsert keyed on `(ref_type, ref_id)` followed by a full
//! rewrite of the file. Reads never fail: a missing, unreadable or corrupt
//! file opens as an empty log.
//!
//! Concurrent writers (two browsing contexts over the same file) are not
//! coordinated; the last writer wins.

use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, warn};

use crate::catalog::EntityIndex;
use crate::errors::StorageResult;
use crate::models::progress::WatchProgressRecord;
use crate::models::{Entity, EntityRefType};

/// Maximum number of records retained in the log
pub const PROGRESS_LOG_CAPACITY: usize = 30;

/// Ratio at or above which an item counts as watched and stops being
/// resumable from the continue-watching row
pub const WATCHED_THRESHOLD: f64 = 0.92;

/// Versioned file name of the persisted log
pub const PROGRESS_LOG_FILE: &str = "watch-progress.v2.json";

pub struct ProgressStore {
    path: PathBuf,
    records: Vec<WatchProgressRecord>,
}

impl ProgressStore {
    /// Open the log at `path`; unreadable or corrupt contents start empty
    pub fn open<P: Into<PathBuf>>(path: P) -> Self {
        let path = path.into();
        let records = Self::read_log(&path);
        Self { path, records }
    }

    fn read_log(path: &Path) -> Vec<WatchProgressRecord> {
        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(records) => records,
                Err(e) => {
                    warn!(
                        "Corrupt progress log at {}, starting empty: {}",
                        path.display(),
                        e
                    );
                    Vec::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                warn!(
                    "Unreadable progress log at {}, starting empty: {}",
                    path.display(),
                    e
                );
                Vec::new()
            }
        }
    }

    /// Upsert a progress record and rewrite the persisted log
    ///
    /// Silently ignored when `ref_id` is empty or `duration_sec` is not
    /// positive. Progress is clamped to ≥ 0 and duration to ≥ 1 before the
    /// ratio is computed. The record moves to the head of the log, so the
    /// log stays ordered by recency of update after every write.
    pub fn record(
        &mut self,
        ref_type: EntityRefType,
        ref_id: &str,
        route_hash: &str,
        progress_sec: f64,
        duration_sec: f64,
    ) {
        if ref_id.is_empty() || duration_sec <= 0.0 {
            debug!(
                "Ignoring progress update for {} '{}' (duration {})",
                ref_type, ref_id, duration_sec
            );
            return;
        }

        let progress_sec = progress_sec.max(0.0);
        let duration_sec = duration_sec.max(1.0);
        let record = WatchProgressRecord {
            ref_type,
            ref_id: ref_id.to_string(),
            route_hash: route_hash.to_string(),
            progress_sec,
            duration_sec,
            ratio: progress_sec / duration_sec,
            updated_at: Utc::now(),
        };

        self.records
            .retain(|r| !(r.ref_type == ref_type && r.ref_id == ref_id));
        self.records.insert(0, record);
        self.records.truncate(PROGRESS_LOG_CAPACITY);
        self.persist();
    }

    /// The single record for `(ref_type, ref_id)`, when one exists
    pub fn resume_for(
        &self,
        ref_type: EntityRefType,
        ref_id: &str,
    ) -> Option<&WatchProgressRecord> {
        self.records
            .iter()
            .find(|r| r.ref_type == ref_type && r.ref_id == ref_id)
    }

    /// Resumable records joined against the current entity index
    ///
    /// Finished items (ratio at or above [`WATCHED_THRESHOLD`]) are excluded,
    /// and records whose entity is no longer in the catalog are filtered out
    /// here rather than purged from the log; a later catalog reload may bring
    /// the title back.
    pub fn continue_watching<'a>(
        &'a self,
        index: &EntityIndex,
    ) -> Vec<(&'a WatchProgressRecord, Entity)> {
        let mut rows: Vec<_> = self
            .records
            .iter()
            .filter(|r| r.ratio < WATCHED_THRESHOLD)
            .filter_map(|r| index.get(&r.ref_id).cloned().map(|entity| (r, entity)))
            .collect();
        rows.sort_by(|a, b| b.0.updated_at.cmp(&a.0.updated_at));
        rows
    }

    pub fn records(&self) -> &[WatchProgressRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn persist(&self) {
        if let Err(e) = self.try_persist() {
            warn!(
                "Failed to persist progress log to {}: {}",
                self.path.display(),
                e
            );
        }
    }

    fn try_persist(&self) -> StorageResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string(&self.records)?;
        std::fs::write(&self.path, contents)?;
        Ok(())
    }
}
