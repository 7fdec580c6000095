//! Playback identifier selection
//!
//! Pure selection over an entity's playback identifiers. A missing
//! identifier is a valid, reportable outcome (the UI renders an
//! "unavailable" state), never an error.

use crate::models::Entity;
use crate::progress::ProgressStore;

/// What the viewer asked to play
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum PlaybackIntent {
    Content,
    Trailer,
}

/// Select the playback identifier for an entity under the given intent
pub fn resolve(entity: &Entity, intent: PlaybackIntent) -> Option<&str> {
    match intent {
        PlaybackIntent::Content => entity.playback_id(),
        PlaybackIntent::Trailer => entity.trailer_playback_id(),
    }
}

/// A concrete instruction for the player layer
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackRequest {
    pub playback_id: String,
    /// Offset to resume from; `None` means start from the beginning
    pub resume_from_sec: Option<f64>,
}

/// Resolve an entity with resume handling
///
/// Resume offsets apply to content only; trailers never resume and never
/// record progress.
pub fn resolve_with_resume(
    entity: &Entity,
    intent: PlaybackIntent,
    progress: &ProgressStore,
) -> Option<PlaybackRequest> {
    let playback_id = resolve(entity, intent)?.to_string();
    let resume_from_sec = match intent {
        PlaybackIntent::Content => progress
            .resume_for(entity.ref_type(), entity.id())
            .map(|record| record.progress_sec),
        PlaybackIntent::Trailer => None,
    };
    Some(PlaybackRequest {
        playback_id,
        resume_from_sec,
    })
}
