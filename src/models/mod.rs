use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize};

pub mod loop_channel;
pub mod progress;

/// Content classification for a catalog title
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TitleKind {
    #[default]
    Film,
    Documentary,
    Series,
    Short,
    Foreign,
}

/// Lenient `type` field parsing: unknown or absent kinds fall back to the
/// default rather than rejecting the whole title.
fn title_kind_lenient<'de, D>(deserializer: D) -> Result<TitleKind, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| s.parse().ok()).unwrap_or_default())
}

/// A top-level catalog title (film, documentary, series, short, foreign)
///
/// Deserialized leniently from the remote catalog document: every field except
/// `id` is defaulted, so a partially filled title still loads. Titles without
/// an id are unaddressable and get dropped during normalization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Title {
    pub id: String,
    #[serde(rename = "type", deserialize_with = "title_kind_lenient")]
    pub kind: TitleKind,
    pub title: String,
    pub synopsis: String,
    #[serde(alias = "muxPlaybackId")]
    pub playback_id: Option<String>,
    #[serde(alias = "muxTrailerPlaybackId")]
    pub trailer_playback_id: Option<String>,
    pub poster_url: Option<String>,
    pub monetization: Monetization,
    pub seasons: Vec<Season>,
    pub tags: Vec<String>,
    pub genres: Vec<String>,
    pub featured: bool,
    pub rank: Option<i64>,
}

/// Monetization descriptor for a title
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Monetization {
    pub svod: bool,
    pub avod: bool,
    pub tvod: Tvod,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Tvod {
    pub enabled: bool,
    pub rent_price: Option<f64>,
    pub buy_price: Option<f64>,
}

/// One season of a series title; episode ordering is document order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Season {
    pub number: Option<u32>,
    pub episodes: Vec<Episode>,
}

/// One episode of a series
///
/// `series_id`, `season_index` and `episode_index` are back-references filled
/// in during catalog normalization; they relate the episode to its owning
/// title but carry no ownership. They are never read from the document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Episode {
    pub id: String,
    pub title: String,
    pub synopsis: String,
    #[serde(alias = "muxPlaybackId")]
    pub playback_id: Option<String>,
    #[serde(alias = "muxTrailerPlaybackId")]
    pub trailer_playback_id: Option<String>,
    pub poster_url: Option<String>,
    #[serde(skip_deserializing)]
    pub series_id: String,
    #[serde(skip_deserializing)]
    pub season_index: usize,
    #[serde(skip_deserializing)]
    pub episode_index: usize,
}

/// Discriminator for references into the entity index
///
/// Used both by loop-channel rotation items and by watch-progress records.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EntityRefType {
    #[default]
    Title,
    Episode,
}

/// An addressable catalog entity: a title or an episode
#[derive(Debug, Clone)]
pub enum Entity {
    Title(Arc<Title>),
    Episode(Arc<Episode>),
}

impl Entity {
    /// Unique id of the underlying entity
    pub fn id(&self) -> &str {
        match self {
            Entity::Title(t) => &t.id,
            Entity::Episode(e) => &e.id,
        }
    }

    /// Display title of the underlying entity
    pub fn title(&self) -> &str {
        match self {
            Entity::Title(t) => &t.title,
            Entity::Episode(e) => &e.title,
        }
    }

    pub fn poster_url(&self) -> Option<&str> {
        match self {
            Entity::Title(t) => t.poster_url.as_deref(),
            Entity::Episode(e) => e.poster_url.as_deref(),
        }
    }

    pub fn ref_type(&self) -> EntityRefType {
        match self {
            Entity::Title(_) => EntityRefType::Title,
            Entity::Episode(_) => EntityRefType::Episode,
        }
    }

    /// Content playback identifier, when the entity has one
    pub fn playback_id(&self) -> Option<&str> {
        match self {
            Entity::Title(t) => t.playback_id.as_deref(),
            Entity::Episode(e) => e.playback_id.as_deref(),
        }
    }

    /// Trailer playback identifier, when the entity has one
    pub fn trailer_playback_id(&self) -> Option<&str> {
        match self {
            Entity::Title(t) => t.trailer_playback_id.as_deref(),
            Entity::Episode(e) => e.trailer_playback_id.as_deref(),
        }
    }
}
