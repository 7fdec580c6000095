//! Application state and the engine controller
//!
//! All mutable engine state lives in one place: the [`Engine`] owns the
//! current catalog snapshot, the watch-progress store and the loop-channel
//! scheduler, and the presentation layer reaches everything through it.
//! There are no ambient globals; a catalog reload replaces the snapshot (and
//! the scheduler derived from it) wholesale.

use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use crate::catalog::fetch::CatalogFetcher;
use crate::catalog::{self, EntityIndex, featured};
use crate::config::Config;
use crate::errors::CatalogResult;
use crate::loop_channel::DefaultLoopScheduler;
use crate::models::loop_channel::LoopChannelConfig;
use crate::models::progress::WatchProgressRecord;
use crate::models::{Entity, EntityRefType, Title};
use crate::playback::{self, PlaybackIntent, PlaybackRequest};
use crate::progress::{PROGRESS_LOG_FILE, ProgressStore};
use crate::utils::http_client::{CatalogHttpClient, StandardHttpClient};

/// One catalog load, resolved: replaced wholesale on every reload
#[derive(Default)]
pub struct CatalogState {
    pub titles: Vec<Arc<Title>>,
    pub index: EntityIndex,
    pub featured: Vec<Arc<Title>>,
    pub loop_channel: LoopChannelConfig,
}

/// The engine controller the presentation layer talks to
pub struct Engine<C: CatalogHttpClient = StandardHttpClient> {
    fetcher: CatalogFetcher<C>,
    catalog: CatalogState,
    progress: ProgressStore,
    scheduler: DefaultLoopScheduler,
}

impl Engine<StandardHttpClient> {
    pub fn new(config: Config) -> Self {
        let http = StandardHttpClient::with_connect_timeout(std::time::Duration::from_secs(
            config.catalog.connect_timeout_secs,
        ));
        Self::with_client(config, http)
    }
}

impl<C: CatalogHttpClient> Engine<C> {
    /// Build an engine over a custom HTTP client
    pub fn with_client(config: Config, http: C) -> Self {
        let progress = ProgressStore::open(config.storage.data_dir.join(PROGRESS_LOG_FILE));
        let catalog = CatalogState::default();
        let scheduler = DefaultLoopScheduler::from_config(&catalog.loop_channel, &catalog.index);
        Self {
            fetcher: CatalogFetcher::new(http, config.catalog),
            catalog,
            progress,
            scheduler,
        }
    }

    /// Fetch the catalog (manifest indirection + fallback chain) and replace
    /// the current snapshot with the result
    ///
    /// A second call simply repeats the fetch-then-replace sequence; the
    /// last completed load wins.
    pub async fn load_catalog(&mut self) -> CatalogResult<()> {
        let doc = self.fetcher.load().await?;
        self.install_document(&doc);
        Ok(())
    }

    /// Normalize a catalog document and swap in the resulting state
    pub fn install_document(&mut self, doc: &Value) {
        let snapshot = catalog::normalize(doc);
        let featured = featured::select_featured(doc, &snapshot);
        let loop_channel = catalog::loop_channel_config(doc);
        self.scheduler = DefaultLoopScheduler::from_config(&loop_channel, &snapshot.index);
        self.catalog = CatalogState {
            titles: snapshot.titles,
            index: snapshot.index,
            featured,
            loop_channel,
        };
        info!(
            "Catalog installed: {} titles, {} entities, {} featured, {} rotation items",
            self.catalog.titles.len(),
            self.catalog.index.len(),
            self.catalog.featured.len(),
            self.scheduler.queue_len()
        );
    }

    pub fn entity(&self, id: &str) -> Option<&Entity> {
        self.catalog.index.get(id)
    }

    pub fn index(&self) -> &EntityIndex {
        &self.catalog.index
    }

    /// Titles in document order
    pub fn titles(&self) -> &[Arc<Title>] {
        &self.catalog.titles
    }

    pub fn featured(&self) -> &[Arc<Title>] {
        &self.catalog.featured
    }

    pub fn progress(&self) -> &ProgressStore {
        &self.progress
    }

    pub fn record_progress(
        &mut self,
        ref_type: EntityRefType,
        ref_id: &str,
        route_hash: &str,
        progress_sec: f64,
        duration_sec: f64,
    ) {
        self.progress
            .record(ref_type, ref_id, route_hash, progress_sec, duration_sec);
    }

    pub fn resume_for(
        &self,
        ref_type: EntityRefType,
        ref_id: &str,
    ) -> Option<&WatchProgressRecord> {
        self.progress.resume_for(ref_type, ref_id)
    }

    pub fn continue_watching(&self) -> Vec<(&WatchProgressRecord, Entity)> {
        self.progress.continue_watching(&self.catalog.index)
    }

    /// Resolve an entity id into a concrete playback instruction
    pub fn playback_request(&self, id: &str, intent: PlaybackIntent) -> Option<PlaybackRequest> {
        let entity = self.catalog.index.get(id)?;
        playback::resolve_with_resume(entity, intent, &self.progress)
    }

    pub fn loop_scheduler(&self) -> &DefaultLoopScheduler {
        &self.scheduler
    }

    pub fn loop_scheduler_mut(&mut self) -> &mut DefaultLoopScheduler {
        &mut self.scheduler
    }

    /// Toggle shuffle, rebuilding the rotation queue from the current catalog
    pub fn set_loop_shuffle(&mut self, enabled: bool) {
        self.catalog.loop_channel.shuffle = enabled;
        self.scheduler =
            DefaultLoopScheduler::from_config(&self.catalog.loop_channel, &self.catalog.index);
    }
}
