//! Watch-progress record model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::EntityRefType;

/// One entry in the persisted watch-progress log
///
/// The log holds at most one record per `(ref_type, ref_id)` pair and is
/// ordered most-recently-updated first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchProgressRecord {
    pub ref_type: EntityRefType,
    pub ref_id: String,
    /// Route fragment the UI uses to reopen playback at this entity
    pub route_hash: String,
    pub progress_sec: f64,
    pub duration_sec: f64,
    /// Fraction of the duration consumed; the resume/"watched" signal
    pub ratio: f64,
    pub updated_at: DateTime<Utc>,
}
