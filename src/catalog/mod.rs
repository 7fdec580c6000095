//! Catalog normalization and the entity index
//!
//! Remote catalog documents arrive in several close-but-not-identical shapes
//! depending on which CMS variant produced them. This module flattens any of
//! those shapes into a uniform, addressable entity graph: an ordered title
//! list plus an id-keyed index over every title and episode.
//!
//! Normalization never fails. Absent or malformed fields degrade to empty
//! collections at that level; a document with no recognizable title list
//! simply yields an empty catalog. The schema flexibility is expressed as
//! ordered accessor-strategy tables (the `*_FIELDS` constants below) rather
//! than scattered inline fallbacks, so the accepted document surface is
//! visible in one place.

pub mod featured;
pub mod fetch;

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::models::loop_channel::LoopChannelConfig;
use crate::models::{Entity, Title, TitleKind};

/// Document fields that may carry the title list, in priority order
pub const TITLE_LIST_FIELDS: &[&str] = &["titles", "publishedTitles"];

/// Document fields that may carry the explicit featured/hero list, in
/// priority order
pub const FEATURED_LIST_FIELDS: &[&str] = &[
    "featuredTitles",
    "featured",
    "hero",
    "heroItems",
    "featuredItems",
];

/// Rank fields on a featured reference, in priority order
pub const RANK_FIELDS: &[&str] = &["rank", "order"];

/// Manifest fields that may point at the catalog document, in priority order
pub const MANIFEST_URL_FIELDS: &[&str] = &["latestCatalogUrl", "catalogUrl", "stableCatalogUrl"];

/// Return the first present, non-null value from an ordered field list
pub(crate) fn first_present<'a>(doc: &'a Value, fields: &[&str]) -> Option<&'a Value> {
    fields
        .iter()
        .filter_map(|field| doc.get(*field))
        .find(|value| !value.is_null())
}

/// Id-keyed map over every title and episode in the current catalog
///
/// Built once per catalog load and replaced wholesale on reload; it is never
/// patched incrementally.
#[derive(Debug, Clone, Default)]
pub struct EntityIndex {
    map: HashMap<String, Entity>,
}

impl EntityIndex {
    pub fn get(&self, id: &str) -> Option<&Entity> {
        self.map.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.map.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// First insertion wins; later duplicates are dropped so the index never
    /// holds two entries for one id.
    fn insert(&mut self, id: String, entity: Entity) {
        use std::collections::hash_map::Entry;
        match self.map.entry(id) {
            Entry::Occupied(existing) => {
                warn!(
                    "Duplicate entity id '{}' in catalog document; keeping the first occurrence",
                    existing.key()
                );
            }
            Entry::Vacant(slot) => {
                slot.insert(entity);
            }
        }
    }
}

/// The normalized form of one catalog document
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    /// Titles in document order
    pub titles: Vec<Arc<Title>>,
    pub index: EntityIndex,
}

/// Flatten a raw catalog document into an ordered title list and entity index
///
/// Series titles are expanded in document order: every episode receives a
/// derived id when the document did not assign one, plus back-references to
/// its owning title, season index and episode index. The raw document is
/// left untouched; identity assignment happens on this function's own copy
/// before the result is frozen behind `Arc`s.
pub fn normalize(doc: &Value) -> CatalogSnapshot {
    let raw_titles = first_present(doc, TITLE_LIST_FIELDS)
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    let mut titles = Vec::with_capacity(raw_titles.len());
    let mut index = EntityIndex::default();

    for raw in raw_titles {
        let mut title = match serde_json::from_value::<Title>(raw) {
            Ok(title) => title,
            Err(e) => {
                warn!("Skipping unreadable title entry: {}", e);
                continue;
            }
        };
        if title.id.is_empty() {
            warn!("Skipping title without an id: '{}'", title.title);
            continue;
        }

        if title.kind == TitleKind::Series {
            assign_episode_identity(&mut title);
        }

        let title = Arc::new(title);
        index.insert(title.id.clone(), Entity::Title(Arc::clone(&title)));
        if title.kind == TitleKind::Series {
            for season in &title.seasons {
                for episode in &season.episodes {
                    index.insert(episode.id.clone(), Entity::Episode(Arc::new(episode.clone())));
                }
            }
        }
        titles.push(title);
    }

    debug!(
        "Normalized catalog: {} titles, {} indexed entities",
        titles.len(),
        index.len()
    );
    CatalogSnapshot { titles, index }
}

/// Derived episode id: unique and deterministic given the owning title and
/// the episode's 1-based season/episode position
pub fn derived_episode_id(title_id: &str, season_index: usize, episode_index: usize) -> String {
    format!("{}_s{}e{}", title_id, season_index + 1, episode_index + 1)
}

fn assign_episode_identity(title: &mut Title) {
    let title_id = title.id.clone();
    for (season_index, season) in title.seasons.iter_mut().enumerate() {
        for (episode_index, episode) in season.episodes.iter_mut().enumerate() {
            if episode.id.is_empty() {
                episode.id = derived_episode_id(&title_id, season_index, episode_index);
            }
            episode.series_id = title_id.clone();
            episode.season_index = season_index;
            episode.episode_index = episode_index;
        }
    }
}

/// Extract the `loopChannel` section of a document, defaulting every field
pub fn loop_channel_config(doc: &Value) -> LoopChannelConfig {
    doc.get("loopChannel")
        .cloned()
        .and_then(|raw| serde_json::from_value(raw).ok())
        .unwrap_or_default()
}
