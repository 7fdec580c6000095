//! Featured/hero title selection
//!
//! Catalog variants disagree on where the hero row lives and how its entries
//! point at titles. Selection prefers an explicit list (first present field
//! from [`FEATURED_LIST_FIELDS`](super::FEATURED_LIST_FIELDS)), resolving
//! each entry against the entity index, and falls back to scanning titles
//! for featured markers when no explicit list exists.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use super::{CatalogSnapshot, EntityIndex, FEATURED_LIST_FIELDS, RANK_FIELDS, first_present};
use crate::models::{Entity, Title};

/// Rank assigned to references that carry no rank/order field
const DEFAULT_FEATURED_RANK: i64 = 9999;

/// Resolve the ordered featured title set for a catalog document
pub fn select_featured(doc: &Value, catalog: &CatalogSnapshot) -> Vec<Arc<Title>> {
    if let Some(list) = first_present(doc, FEATURED_LIST_FIELDS).and_then(Value::as_array) {
        let mut ranked: Vec<(i64, Arc<Title>)> = list
            .iter()
            .filter_map(|reference| {
                resolve_reference(reference, &catalog.index)
                    .map(|title| (rank_of(reference, &title), title))
            })
            .collect();
        // Stable sort: equal ranks keep list order.
        ranked.sort_by_key(|(rank, _)| *rank);
        debug!("Featured: {} of {} references resolved", ranked.len(), list.len());
        return ranked.into_iter().map(|(_, title)| title).collect();
    }

    catalog
        .titles
        .iter()
        .filter(|title| has_featured_marker(title))
        .cloned()
        .collect()
}

/// A reference may be a plain id string, `{refId}`, `{id}`, or an inline
/// title object. Unresolvable references are dropped.
fn resolve_reference(reference: &Value, index: &EntityIndex) -> Option<Arc<Title>> {
    match reference {
        Value::String(id) => title_from_index(index, id),
        Value::Object(fields) => {
            if let Some(id) = fields.get("refId").and_then(Value::as_str) {
                return title_from_index(index, id);
            }
            if let Some(id) = fields.get("id").and_then(Value::as_str)
                && let Some(title) = title_from_index(index, id)
            {
                return Some(title);
            }
            inline_title(reference)
        }
        _ => None,
    }
}

fn title_from_index(index: &EntityIndex, id: &str) -> Option<Arc<Title>> {
    match index.get(id)? {
        Entity::Title(title) => Some(Arc::clone(title)),
        Entity::Episode(_) => None,
    }
}

fn inline_title(reference: &Value) -> Option<Arc<Title>> {
    let title: Title = serde_json::from_value(reference.clone()).ok()?;
    if title.id.is_empty() {
        return None;
    }
    Some(Arc::new(title))
}

fn rank_of(reference: &Value, title: &Title) -> i64 {
    first_present(reference, RANK_FIELDS)
        .and_then(Value::as_i64)
        .or(title.rank)
        .unwrap_or(DEFAULT_FEATURED_RANK)
}

fn has_featured_marker(title: &Title) -> bool {
    title.featured
        || title
            .tags
            .iter()
            .chain(title.genres.iter())
            .any(|label| label.to_lowercase().contains("featured"))
}
