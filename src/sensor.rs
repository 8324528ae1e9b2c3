//! Presentation adapter from the coordinator snapshot to the host entity.
//!
//! Pure, synchronous mapping: one state string (newest item title, capped
//! at 50 characters) and an attribute mapping the companion feed card
//! renders. Absence of data yields a fixed placeholder; there is no error
//! handling here.

use serde::Serialize;

use crate::coordinator::FeedSnapshot;
use crate::models::StreamEntry;

/// State shown when no feed data is available (or the newest entry has no
/// title)
pub const STATE_PLACEHOLDER: &str = "No Data";

/// Maximum state length before truncation, in characters
const MAX_STATE_CHARS: usize = 50;

/// Attribute mapping exposed alongside the state value.
#[derive(Debug, Clone, Serialize)]
pub struct FeedAttributes {
    pub items: Vec<StreamEntry>,
    pub organization_slug: String,
}

/// State value for the feed entity: the newest item's title, truncated to
/// 50 characters plus one ellipsis character.
pub fn state_value(snapshot: Option<&FeedSnapshot>) -> String {
    snapshot
        .and_then(|s| s.items.first())
        .and_then(|entry| entry.item.title())
        .map(truncate_title)
        .unwrap_or_else(|| STATE_PLACEHOLDER.to_string())
}

/// Attribute mapping for the feed entity: all items plus the organization
/// slug the card links back to.
pub fn attributes(snapshot: Option<&FeedSnapshot>, organization_slug: &str) -> FeedAttributes {
    FeedAttributes {
        items: snapshot.map(|s| s.items.clone()).unwrap_or_default(),
        organization_slug: organization_slug.to_string(),
    }
}

fn truncate_title(title: &str) -> String {
    if title.chars().count() > MAX_STATE_CHARS {
        let mut truncated: String = title.chars().take(MAX_STATE_CHARS).collect();
        truncated.push('…');
        truncated
    } else {
        title.to_string()
    }
}
