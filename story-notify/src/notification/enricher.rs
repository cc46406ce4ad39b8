//! Resolves navigation targets and thumbnails for notifications about to be shown.

use std::sync::Arc;

use story_api::{Notification, Scheme, StoryApi};
use tracing::{debug, warn};

use super::DisplayNotification;

/// Best-effort enrichment of a notification into a display-ready alert.
pub struct NotificationEnricher {
    api: Arc<dyn StoryApi>,
}

impl NotificationEnricher {
    pub fn new(api: Arc<dyn StoryApi>) -> Self {
        Self { api }
    }

    /// Build the alert for `notification`.
    ///
    /// Never fails: a post lookup error only costs the thumbnail.
    pub async fn enrich(&self, notification: &Notification) -> DisplayNotification {
        let target = notification.target();
        let mut thumbnail_url = notification
            .thumbnail_url
            .clone()
            .filter(|url| !url.is_empty());

        if let Scheme::Activity(activity_id) = &target {
            if thumbnail_url.is_none() {
                thumbnail_url = self.lookup_thumbnail(activity_id).await;
            }
        } else if target == Scheme::Other {
            debug!(
                id = %notification.id,
                scheme = %notification.scheme,
                "Unrecognized scheme, showing text only"
            );
        }

        DisplayNotification {
            navigation_url: target.navigation_url(),
            title: notification.message.clone(),
            body: notification.content.clone(),
            thumbnail_url,
            tag: target.activity_id().map(str::to_string),
            replaces: Some(notification.scheme.clone()).filter(|s| !s.is_empty()),
        }
    }

    async fn lookup_thumbnail(&self, activity_id: &str) -> Option<String> {
        match self.api.post(activity_id).await {
            Ok(Some(post)) => post.thumbnail_candidate().map(str::to_string),
            Ok(None) => {
                debug!(%activity_id, "Post no longer exists");
                None
            }
            Err(e) => {
                warn!(%activity_id, error = %e, "Post lookup failed, showing without thumbnail");
                None
            }
        }
    }
}
