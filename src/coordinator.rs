//! Polling coordinator for the activity feed.
//!
//! One GraphQL fetch per cycle, no backoff, no jitter. The host scheduler
//! owns the timer and guarantees single-flight; `refresh` takes `&mut self`
//! so a second fetch cannot be started through the same coordinator while
//! one is in progress. On failure the previous snapshot is retained and the
//! typed [`UpdateError`] is surfaced so the host can mark the entity
//! unavailable until the next successful cycle.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::api::{UpdateError, VibboClient};
use crate::models::StreamEntry;

/// The latest successfully fetched feed state.
#[derive(Debug, Clone)]
pub struct FeedSnapshot {
    pub items: Vec<StreamEntry>,
    pub fetched_at: DateTime<Utc>,
}

pub struct FeedCoordinator {
    client: VibboClient,
    organization_id: String,
    limit: u32,
    snapshot: Option<FeedSnapshot>,
    last_update_ok: bool,
}

impl FeedCoordinator {
    pub fn new(client: VibboClient, organization_id: impl Into<String>, limit: u32) -> Self {
        Self {
            client,
            organization_id: organization_id.into(),
            limit,
            snapshot: None,
            last_update_ok: false,
        }
    }

    /// Run one poll cycle: fetch the stream and replace the snapshot.
    ///
    /// On failure the previous snapshot is kept and the error is returned
    /// for the host to surface as entity unavailability.
    pub async fn refresh(&mut self) -> Result<&FeedSnapshot, UpdateError> {
        debug!(organization_id = %self.organization_id, limit = self.limit, "Fetching activity stream");

        match self
            .client
            .activity_stream(&self.organization_id, self.limit)
            .await
        {
            Ok(items) => {
                debug!(count = items.len(), "Activity stream updated");
                self.last_update_ok = true;
                Ok(self.snapshot.insert(FeedSnapshot {
                    items,
                    fetched_at: Utc::now(),
                }))
            }
            Err(err) => {
                warn!(error = %err, "Activity stream update failed");
                self.last_update_ok = false;
                Err(err)
            }
        }
    }

    /// Last-known snapshot, if any cycle has succeeded.
    pub fn snapshot(&self) -> Option<&FeedSnapshot> {
        self.snapshot.as_ref()
    }

    /// Whether the most recent cycle succeeded.
    pub fn last_update_ok(&self) -> bool {
        self.last_update_ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FeedItem;

    fn entry(title: &str) -> StreamEntry {
        StreamEntry {
            happened_at: "2026-08-01T10:00:00Z".to_string(),
            item: FeedItem::News {
                slug: "s".to_string(),
                title: title.to_string(),
                ingress: None,
                pinned: false,
                topics: vec![],
                comments_count: 0,
                thumbs_up_count: 0,
            },
        }
    }

    #[test]
    fn test_snapshot_starts_empty_and_unavailable() {
        let client = VibboClient::new("sesid=a; sesid.sig=b").expect("client");
        let coordinator = FeedCoordinator::new(client, "T3Jn", 10);
        assert!(coordinator.snapshot().is_none());
        assert!(!coordinator.last_update_ok());
    }

    #[test]
    fn test_snapshot_accessors() {
        let client = VibboClient::new("sesid=a; sesid.sig=b").expect("client");
        let mut coordinator = FeedCoordinator::new(client, "T3Jn", 10);

        coordinator.snapshot = Some(FeedSnapshot {
            items: vec![entry("Dugnad")],
            fetched_at: Utc::now(),
        });
        coordinator.last_update_ok = true;

        let snapshot = coordinator.snapshot().expect("snapshot present");
        assert_eq!(snapshot.items.len(), 1);
        assert!(coordinator.last_update_ok());
    }
}
