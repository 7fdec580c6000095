//! Rotating "LIVE" channel scheduling
//!
//! The loop channel plays catalog entries back-to-back forever. The
//! scheduler owns a derived queue over the entity index: rotation references
//! from the catalog document are resolved into playable queue items (broken
//! references are dropped), the queue advances modulo its length, and every
//! wrap-around reshuffles it when shuffle is enabled, so the rotation is
//! never strictly periodic with shuffle on.
//!
//! Sponsored interstitials are gated purely on wall-clock time since the
//! last ad: the gate is re-evaluated on each `advance` (an item finishing or
//! erroring), never from a timer. The randomness source is injected so both
//! shuffling and ad choice are deterministic under a seeded generator.

use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::seq::{IndexedRandom, SliceRandom};
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::catalog::EntityIndex;
use crate::models::loop_channel::{
    AdSlot, LoopChannelConfig, LoopQueueItem, RotationRef, SponsoredAd,
};

/// Observable scheduler state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopPhase {
    /// No rotation items resolved; every operation is a no-op
    Idle,
    /// The current queue item is active
    Playing,
    /// A sponsored interstitial is active in place of the next item
    AdBreak,
}

pub struct LoopScheduler<R: Rng> {
    queue: Vec<LoopQueueItem>,
    index: usize,
    ads: Vec<SponsoredAd>,
    ad_frequency_mins: f64,
    last_ad_at: Option<DateTime<Utc>>,
    shuffle_enabled: bool,
    playing_ad: bool,
    rng: R,
}

/// Scheduler over the OS-seeded standard generator
pub type DefaultLoopScheduler = LoopScheduler<StdRng>;

impl DefaultLoopScheduler {
    pub fn from_config(config: &LoopChannelConfig, index: &EntityIndex) -> Self {
        Self::new(config, index, StdRng::from_os_rng())
    }
}

impl<R: Rng> LoopScheduler<R> {
    /// Resolve rotation references and reset the rotation state
    ///
    /// Rebuilt wholesale whenever the catalog reloads or the shuffle flag is
    /// toggled.
    pub fn new(config: &LoopChannelConfig, index: &EntityIndex, rng: R) -> Self {
        let mut scheduler = Self {
            queue: resolve_rotation(&config.rotation_items, index),
            index: 0,
            ads: config.sponsored_ads.clone(),
            ad_frequency_mins: config.ad_frequency_mins,
            last_ad_at: None,
            shuffle_enabled: config.shuffle,
            playing_ad: false,
            rng,
        };
        if scheduler.shuffle_enabled {
            scheduler.queue.shuffle(&mut scheduler.rng);
        }
        debug!(
            "Loop channel ready: {} of {} rotation items resolved, {} sponsored ads",
            scheduler.queue.len(),
            config.rotation_items.len(),
            scheduler.ads.len()
        );
        scheduler
    }

    pub fn phase(&self) -> LoopPhase {
        if self.queue.is_empty() {
            LoopPhase::Idle
        } else if self.playing_ad {
            LoopPhase::AdBreak
        } else {
            LoopPhase::Playing
        }
    }

    pub fn is_idle(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn queue(&self) -> &[LoopQueueItem] {
        &self.queue
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn position(&self) -> usize {
        self.index
    }

    pub fn shuffle_enabled(&self) -> bool {
        self.shuffle_enabled
    }

    /// The queue item at the rotation position
    ///
    /// Membership does not guarantee playability: an entry can lose its
    /// source if upstream catalog data changes after resolution. Callers
    /// that find the current item unplayable skip it by advancing again.
    pub fn current(&self) -> Option<&LoopQueueItem> {
        self.queue.get(self.index)
    }

    /// Whether an ad break is due at `now`
    ///
    /// True iff a positive ad frequency is configured and at least that many
    /// minutes have elapsed since the last break (a never-played ad counts
    /// as infinitely long ago). Zero or negative frequency permanently
    /// disables insertion.
    pub fn should_insert_ad_at(&self, now: DateTime<Utc>) -> bool {
        if self.ad_frequency_mins <= 0.0 {
            return false;
        }
        match self.last_ad_at {
            None => true,
            Some(last) => {
                now.signed_duration_since(last)
                    >= Duration::milliseconds((self.ad_frequency_mins * 60_000.0) as i64)
            }
        }
    }

    pub fn should_insert_ad(&self) -> bool {
        self.should_insert_ad_at(Utc::now())
    }

    /// Play-next: the single operation the player layer drives
    ///
    /// Both the natural end of the current item and a playback error funnel
    /// here; the rotation makes no distinction between the two.
    pub fn advance(&mut self) {
        self.advance_at(Utc::now());
    }

    pub fn advance_at(&mut self, now: DateTime<Utc>) {
        if self.queue.is_empty() {
            return;
        }

        if !self.playing_ad
            && self.should_insert_ad_at(now)
            && self.ads.iter().any(SponsoredAd::has_playable_source)
        {
            self.playing_ad = true;
            self.last_ad_at = Some(now);
            debug!("Loop channel entering ad break");
            return;
        }

        self.playing_ad = false;
        self.index = (self.index + 1) % self.queue.len();
        if self.index == 0 && self.shuffle_enabled {
            debug!("Rotation wrapped; reshuffling {} items", self.queue.len());
            self.queue.shuffle(&mut self.rng);
        }
    }

    /// Uniform-random choice among the playable sponsored ads
    pub fn pick_ad(&mut self) -> Option<AdSlot> {
        let playable: Vec<&SponsoredAd> = self
            .ads
            .iter()
            .filter(|ad| ad.has_playable_source())
            .collect();
        playable
            .choose(&mut self.rng)
            .map(|ad| AdSlot::from_sponsored(ad))
    }
}

/// Resolve rotation references into playable queue items, dropping the rest
fn resolve_rotation(refs: &[RotationRef], index: &EntityIndex) -> Vec<LoopQueueItem> {
    let mut queue = Vec::with_capacity(refs.len());
    for rotation in refs {
        let Some(entity) = index.get(&rotation.ref_id) else {
            debug!(
                "Dropping rotation item '{}': not in the catalog",
                rotation.ref_id
            );
            continue;
        };
        let Some(playback_id) = entity.playback_id() else {
            debug!(
                "Dropping rotation item '{}': no playback source",
                rotation.ref_id
            );
            continue;
        };
        queue.push(LoopQueueItem {
            ref_type: entity.ref_type(),
            ref_id: rotation.ref_id.clone(),
            label: rotation
                .label
                .clone()
                .unwrap_or_else(|| entity.title().to_string()),
            poster_url: entity.poster_url().map(str::to_string),
            playback_id: playback_id.to_string(),
        });
    }
    queue
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::normalize;
    use crate::models::EntityRefType;
    use serde_json::json;
    use std::collections::BTreeSet;

    fn catalog(n: usize) -> crate::catalog::CatalogSnapshot {
        let titles: Vec<_> = (0..n)
            .map(|i| {
                json!({
                    "id": format!("t{i}"),
                    "title": format!("Title {i}"),
                    "muxPlaybackId": format!("pb{i}")
                })
            })
            .collect();
        normalize(&json!({ "titles": titles }))
    }

    fn rotation(n: usize) -> Vec<RotationRef> {
        (0..n)
            .map(|i| RotationRef {
                ref_type: EntityRefType::Title,
                ref_id: format!("t{i}"),
                label: None,
            })
            .collect()
    }

    fn scheduler(
        n: usize,
        ads: Vec<SponsoredAd>,
        ad_frequency_mins: f64,
        shuffle: bool,
        seed: u64,
    ) -> LoopScheduler<StdRng> {
        let snapshot = catalog(n);
        let config = LoopChannelConfig {
            rotation_items: rotation(n),
            sponsored_ads: ads,
            ad_frequency_mins,
            shuffle,
        };
        LoopScheduler::new(&config, &snapshot.index, StdRng::seed_from_u64(seed))
    }

    fn playable_ad() -> SponsoredAd {
        SponsoredAd {
            name: Some("Acme".to_string()),
            mux_ad_playback_id: Some("ad-pb".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn empty_rotation_is_idle_and_advance_is_a_no_op() {
        let mut scheduler = scheduler(0, vec![playable_ad()], 1.0, true, 7);
        assert_eq!(scheduler.phase(), LoopPhase::Idle);
        assert!(scheduler.current().is_none());

        scheduler.advance_at(Utc::now());
        assert_eq!(scheduler.phase(), LoopPhase::Idle);
        assert_eq!(scheduler.position(), 0);
    }

    #[test]
    fn unresolvable_and_sourceless_references_are_dropped() {
        let snapshot = normalize(&json!({"titles": [
            {"id": "ok", "muxPlaybackId": "pb"},
            {"id": "no-source"}
        ]}));
        let config = LoopChannelConfig {
            rotation_items: vec![
                RotationRef {
                    ref_id: "ok".to_string(),
                    ..Default::default()
                },
                RotationRef {
                    ref_id: "no-source".to_string(),
                    ..Default::default()
                },
                RotationRef {
                    ref_id: "ghost".to_string(),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        let scheduler = LoopScheduler::new(&config, &snapshot.index, StdRng::seed_from_u64(1));
        assert_eq!(scheduler.queue_len(), 1);
        assert_eq!(scheduler.queue()[0].ref_id, "ok");
        assert_eq!(scheduler.queue()[0].playback_id, "pb");
    }

    #[test]
    fn rotation_labels_fall_back_to_entity_titles() {
        let snapshot = normalize(&json!({"titles": [
            {"id": "t0", "title": "From Entity", "muxPlaybackId": "pb"}
        ]}));
        let config = LoopChannelConfig {
            rotation_items: vec![
                RotationRef {
                    ref_id: "t0".to_string(),
                    label: Some("Override".to_string()),
                    ..Default::default()
                },
                RotationRef {
                    ref_id: "t0".to_string(),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        let scheduler = LoopScheduler::new(&config, &snapshot.index, StdRng::seed_from_u64(1));
        assert_eq!(scheduler.queue()[0].label, "Override");
        assert_eq!(scheduler.queue()[1].label, "From Entity");
    }

    #[test]
    fn full_rotation_returns_to_start_with_the_same_element_set() {
        let n = 8;
        let mut scheduler = scheduler(n, Vec::new(), 0.0, true, 42);
        let before: BTreeSet<String> =
            scheduler.queue().iter().map(|i| i.ref_id.clone()).collect();

        let now = Utc::now();
        for _ in 0..n {
            scheduler.advance_at(now);
        }

        assert_eq!(scheduler.position(), 0);
        let after: BTreeSet<String> =
            scheduler.queue().iter().map(|i| i.ref_id.clone()).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn advance_without_shuffle_is_strictly_cyclic() {
        let n = 3;
        let mut scheduler = scheduler(n, Vec::new(), 0.0, false, 42);
        let order: Vec<String> = scheduler.queue().iter().map(|i| i.ref_id.clone()).collect();

        let now = Utc::now();
        for expected in [1, 2, 0, 1] {
            scheduler.advance_at(now);
            assert_eq!(scheduler.position(), expected);
        }
        let after: Vec<String> = scheduler.queue().iter().map(|i| i.ref_id.clone()).collect();
        assert_eq!(order, after);
    }

    #[test]
    fn ad_break_fires_when_due_and_does_not_advance_the_rotation() {
        let mut scheduler = scheduler(3, vec![playable_ad()], 10.0, false, 42);
        let now = Utc::now();

        // Never played an ad: the first advance is already ad-eligible.
        scheduler.advance_at(now);
        assert_eq!(scheduler.phase(), LoopPhase::AdBreak);
        assert_eq!(scheduler.position(), 0);

        // Leaving the break resumes the rotation where it left off.
        scheduler.advance_at(now);
        assert_eq!(scheduler.phase(), LoopPhase::Playing);
        assert_eq!(scheduler.position(), 1);

        // Within the frequency window nothing new fires.
        let later = now + Duration::minutes(9);
        assert!(!scheduler.should_insert_ad_at(later));
        scheduler.advance_at(later);
        assert_eq!(scheduler.phase(), LoopPhase::Playing);
        assert_eq!(scheduler.position(), 2);

        // At exactly the configured frequency the gate opens again.
        let due = now + Duration::minutes(10);
        assert!(scheduler.should_insert_ad_at(due));
        scheduler.advance_at(due);
        assert_eq!(scheduler.phase(), LoopPhase::AdBreak);
        assert_eq!(scheduler.position(), 2);
    }

    #[test]
    fn zero_frequency_disables_ads_regardless_of_elapsed_time() {
        let mut scheduler = scheduler(3, vec![playable_ad()], 0.0, false, 42);
        let far_future = Utc::now() + Duration::days(365);
        assert!(!scheduler.should_insert_ad_at(far_future));

        scheduler.advance_at(far_future);
        assert_eq!(scheduler.phase(), LoopPhase::Playing);
    }

    #[test]
    fn ads_without_playable_sources_never_break_the_rotation() {
        let unplayable = SponsoredAd {
            name: Some("No source".to_string()),
            ..Default::default()
        };
        let mut scheduler = scheduler(3, vec![unplayable], 1.0, false, 42);

        scheduler.advance_at(Utc::now());
        assert_eq!(scheduler.phase(), LoopPhase::Playing);
        assert_eq!(scheduler.position(), 1);
    }

    #[test]
    fn pick_ad_chooses_among_playable_ads_only() {
        let playable = playable_ad();
        let unplayable = SponsoredAd {
            name: Some("Broken".to_string()),
            ..Default::default()
        };
        let mut scheduler = scheduler(1, vec![unplayable, playable], 1.0, false, 42);

        for _ in 0..16 {
            let slot = scheduler.pick_ad().unwrap();
            assert_eq!(slot.label, "Acme");
            assert_eq!(slot.playback_id.as_deref(), Some("ad-pb"));
        }
    }

    #[test]
    fn pick_ad_is_absent_when_none_are_configured() {
        let mut scheduler = scheduler(1, Vec::new(), 1.0, false, 42);
        assert!(scheduler.pick_ad().is_none());
    }

    #[test]
    fn seeded_schedulers_shuffle_identically() {
        let a = scheduler(6, Vec::new(), 0.0, true, 9);
        let b = scheduler(6, Vec::new(), 0.0, true, 9);
        let order = |s: &LoopScheduler<StdRng>| -> Vec<String> {
            s.queue().iter().map(|i| i.ref_id.clone()).collect()
        };
        assert_eq!(order(&a), order(&b));
    }
}
