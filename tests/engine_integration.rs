//! End-to-end engine flow over an in-memory HTTP client
//!
//! Mirrors the wiring the presentation layer drives (load a catalog through
//! manifest indirection, browse it, record progress, resume, rotate the loop
//! channel) without touching the network.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::{Value, json};
use tempfile::TempDir;

use ott_core::config::{CatalogConfig, Config, StorageConfig};
use ott_core::errors::{AppResult, CatalogError};
use ott_core::loop_channel::LoopPhase;
use ott_core::models::{Entity, EntityRefType};
use ott_core::playback::PlaybackIntent;
use ott_core::state::Engine;
use ott_core::utils::http_client::CatalogHttpClient;

const MANIFEST_URL: &str = "https://cdn.example/manifest.json";
const LIVE_URL: &str = "https://cdn.example/catalog-live.json";
const FALLBACK_URL: &str = "https://cdn.example/catalog.json";

struct StaticDocs(HashMap<String, Value>);

#[async_trait]
impl CatalogHttpClient for StaticDocs {
    async fn fetch_json(&self, url: &str) -> AppResult<Value> {
        self.0
            .get(url)
            .cloned()
            .ok_or_else(|| CatalogError::fetch(url, "connection refused").into())
    }
}

fn catalog_doc() -> Value {
    json!({
        "publishedTitles": [
            {
                "id": "film1",
                "type": "film",
                "title": "Silent Harbor",
                "muxPlaybackId": "pb-film1",
                "muxTrailerPlaybackId": "pb-film1-trailer",
                "monetization": {"svod": true, "avod": false, "tvod": {"enabled": true, "rentPrice": 3.99}}
            },
            {
                "id": "series1",
                "type": "series",
                "title": "Night Shift",
                "seasons": [
                    {"number": 1, "episodes": [
                        {"title": "Pilot", "muxPlaybackId": "pb-s1e1"},
                        {"title": "Fallout", "muxPlaybackId": "pb-s1e2"}
                    ]}
                ]
            },
            {
                "id": "doc1",
                "type": "documentary",
                "title": "Deep Water"
            }
        ],
        "featuredTitles": [
            {"refId": "doc1", "rank": 1},
            "film1"
        ],
        "loopChannel": {
            "rotationItems": [
                {"refType": "title", "refId": "film1"},
                {"refType": "episode", "refId": "series1_s1e1"},
                {"refType": "title", "refId": "doc1"},
                {"refType": "title", "refId": "missing"}
            ],
            "sponsoredAds": [
                {"name": "Acme Cola", "durationSec": 20, "muxAdPlaybackId": "ad-acme"}
            ],
            "adFrequencyMins": 0
        }
    })
}

fn engine_with(docs: &[(&str, Value)], data_dir: &TempDir) -> Engine<StaticDocs> {
    let client = StaticDocs(
        docs.iter()
            .map(|(url, doc)| (url.to_string(), doc.clone()))
            .collect(),
    );
    let config = Config {
        catalog: CatalogConfig {
            manifest_url: Some(MANIFEST_URL.to_string()),
            fallback_url: FALLBACK_URL.to_string(),
            ..Default::default()
        },
        storage: StorageConfig {
            data_dir: data_dir.path().to_path_buf(),
        },
    };
    Engine::with_client(config, client)
}

#[tokio::test]
async fn catalog_loads_through_manifest_indirection() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_with(
        &[
            (MANIFEST_URL, json!({"latestCatalogUrl": LIVE_URL})),
            (LIVE_URL, catalog_doc()),
        ],
        &dir,
    );

    engine.load_catalog().await.unwrap();

    assert_eq!(engine.titles().len(), 3);
    // 3 titles + 2 expanded episodes
    assert_eq!(engine.index().len(), 5);
    match engine.entity("series1_s1e1") {
        Some(Entity::Episode(episode)) => {
            assert_eq!(episode.series_id, "series1");
            assert_eq!(episode.season_index, 0);
        }
        other => panic!("expected expanded episode, got {other:?}"),
    }

    let featured: Vec<&str> = engine.featured().iter().map(|t| t.id.as_str()).collect();
    assert_eq!(featured, vec!["doc1", "film1"]);
}

#[tokio::test]
async fn manifest_failure_falls_back_and_total_failure_is_terminal() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_with(&[(FALLBACK_URL, catalog_doc())], &dir);
    engine.load_catalog().await.unwrap();
    assert_eq!(engine.titles().len(), 3);

    let dir = TempDir::new().unwrap();
    let mut engine = engine_with(&[], &dir);
    let err = engine.load_catalog().await.unwrap_err();
    assert!(matches!(err, CatalogError::Unavailable));
}

#[tokio::test]
async fn progress_round_trip_feeds_resume_and_continue_watching() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_with(&[(FALLBACK_URL, catalog_doc())], &dir);
    engine.load_catalog().await.unwrap();

    engine.record_progress(EntityRefType::Title, "film1", "#/watch/film1", 30.0, 120.0);
    engine.record_progress(
        EntityRefType::Episode,
        "series1_s1e1",
        "#/watch/series1_s1e1",
        115.0,
        120.0,
    );
    engine.record_progress(EntityRefType::Title, "removed", "#/watch/removed", 10.0, 100.0);

    // The nearly-finished episode and the vanished title are both filtered.
    let rows = engine.continue_watching();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].0.ref_id, "film1");
    assert_eq!(rows[0].0.ratio, 0.25);

    let request = engine
        .playback_request("film1", PlaybackIntent::Content)
        .unwrap();
    assert_eq!(request.playback_id, "pb-film1");
    assert_eq!(request.resume_from_sec, Some(30.0));

    let trailer = engine
        .playback_request("film1", PlaybackIntent::Trailer)
        .unwrap();
    assert_eq!(trailer.playback_id, "pb-film1-trailer");
    assert_eq!(trailer.resume_from_sec, None);

    // No playback identifiers at all: reported as absent, not an error.
    assert!(engine.playback_request("doc1", PlaybackIntent::Content).is_none());
}

#[tokio::test]
async fn progress_survives_engine_restart() {
    let dir = TempDir::new().unwrap();
    {
        let mut engine = engine_with(&[(FALLBACK_URL, catalog_doc())], &dir);
        engine.load_catalog().await.unwrap();
        engine.record_progress(EntityRefType::Title, "film1", "#/watch/film1", 45.0, 90.0);
    }

    let mut engine = engine_with(&[(FALLBACK_URL, catalog_doc())], &dir);
    engine.load_catalog().await.unwrap();
    let record = engine.resume_for(EntityRefType::Title, "film1").unwrap();
    assert_eq!(record.progress_sec, 45.0);
}

#[tokio::test]
async fn loop_channel_rotates_over_resolved_items_only() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_with(&[(FALLBACK_URL, catalog_doc())], &dir);
    engine.load_catalog().await.unwrap();

    let scheduler = engine.loop_scheduler_mut();
    // "doc1" has no playback source and "missing" is not in the catalog.
    assert_eq!(scheduler.queue_len(), 2);
    assert_eq!(scheduler.phase(), LoopPhase::Playing);

    let first = scheduler.current().unwrap().ref_id.clone();
    scheduler.advance();
    assert_ne!(scheduler.current().unwrap().ref_id, first);
    scheduler.advance();
    assert_eq!(scheduler.current().unwrap().ref_id, first);
    // Frequency 0 in the document: the rotation never breaks for ads.
    assert_eq!(scheduler.phase(), LoopPhase::Playing);
}

#[tokio::test]
async fn toggling_shuffle_rebuilds_the_queue_from_the_catalog() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_with(&[(FALLBACK_URL, catalog_doc())], &dir);
    engine.load_catalog().await.unwrap();

    engine.loop_scheduler_mut().advance();
    assert_eq!(engine.loop_scheduler().position(), 1);

    engine.set_loop_shuffle(true);
    let scheduler = engine.loop_scheduler();
    assert_eq!(scheduler.position(), 0);
    assert_eq!(scheduler.queue_len(), 2);
    assert!(scheduler.shuffle_enabled());
}

#[tokio::test]
async fn reload_replaces_the_snapshot_wholesale() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_with(&[(FALLBACK_URL, catalog_doc())], &dir);
    engine.load_catalog().await.unwrap();
    assert!(engine.entity("film1").is_some());

    let slim = json!({"titles": [{"id": "only", "muxPlaybackId": "pb-only"}]});
    engine.install_document(&slim);

    assert!(engine.entity("film1").is_none());
    assert!(engine.entity("only").is_some());
    assert_eq!(engine.titles().len(), 1);
    assert!(engine.loop_scheduler().is_idle());
}
