//! Loop-channel ("LIVE") document and queue models

use serde::{Deserialize, Serialize};

use super::EntityRefType;

/// Fallback duration for sponsored ads that do not declare one
pub const DEFAULT_AD_DURATION_SECS: f64 = 30.0;

/// The `loopChannel` section of a catalog document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoopChannelConfig {
    pub rotation_items: Vec<RotationRef>,
    pub sponsored_ads: Vec<SponsoredAd>,
    /// Minutes between ad breaks; zero or absent disables ad insertion
    pub ad_frequency_mins: f64,
    pub shuffle: bool,
}

/// A reference into the entity index used to populate the rotation queue
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RotationRef {
    pub ref_type: EntityRefType,
    pub ref_id: String,
    /// Optional display label overriding the entity title
    pub label: Option<String>,
}

/// A sponsored interstitial as configured in the catalog document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SponsoredAd {
    pub name: Option<String>,
    pub duration_sec: Option<f64>,
    pub mux_ad_playback_id: Option<String>,
    pub media_url: Option<String>,
    pub click_url: Option<String>,
}

impl SponsoredAd {
    /// Whether this ad has anything the player could actually play
    pub fn has_playable_source(&self) -> bool {
        self.mux_ad_playback_id.as_deref().is_some_and(|s| !s.is_empty())
            || self.media_url.as_deref().is_some_and(|s| !s.is_empty())
    }
}

/// A fully resolved rotation entry
///
/// Only references that resolved against the entity index with a playable
/// source become queue items; broken references are dropped at resolution
/// time, never retained as placeholders.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoopQueueItem {
    pub ref_type: EntityRefType,
    pub ref_id: String,
    pub label: String,
    pub poster_url: Option<String>,
    pub playback_id: String,
}

/// A sponsored interstitial chosen at play time; never persisted
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdSlot {
    pub label: String,
    pub duration_sec: f64,
    pub playback_id: Option<String>,
    pub media_url: Option<String>,
    pub click_url: Option<String>,
}

impl AdSlot {
    /// Build a playable slot from a configured ad
    pub fn from_sponsored(ad: &SponsoredAd) -> Self {
        Self {
            label: ad.name.clone().unwrap_or_else(|| "Sponsored".to_string()),
            duration_sec: ad.duration_sec.unwrap_or(DEFAULT_AD_DURATION_SECS),
            playback_id: ad.mux_ad_playback_id.clone(),
            media_url: ad.media_url.clone(),
            click_url: ad.click_url.clone(),
        }
    }
}
