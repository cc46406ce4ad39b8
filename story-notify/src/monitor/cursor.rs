//! Dedup cursor over the notification feed.

use chrono::{DateTime, Utc};
use story_api::Notification;

/// Marks the newest feed entry seen by a completed cycle.
///
/// The feed is assumed to be newest first and contiguous with what was seen
/// before; there is no gap recovery.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollCursor {
    last_seen_id: Option<String>,
    last_seen_at: Option<DateTime<Utc>>,
}

impl PollCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a cycle has completed since startup.
    #[inline]
    pub fn is_primed(&self) -> bool {
        self.last_seen_id.is_some()
    }

    pub fn last_seen_id(&self) -> Option<&str> {
        self.last_seen_id.as_deref()
    }

    pub fn last_seen_at(&self) -> Option<DateTime<Utc>> {
        self.last_seen_at
    }

    /// Leading run of `feed` that is newer than the cursor and still unread.
    ///
    /// Stops at the first entry that fails either test; nothing past it is
    /// inspected. An unprimed cursor yields nothing.
    pub fn fresh_records<'a>(&self, feed: &'a [Notification]) -> &'a [Notification] {
        let Some(since) = self.last_seen_at else {
            return &[];
        };

        let count = feed
            .iter()
            .take_while(|n| n.created_at > since && n.is_new)
            .count();
        &feed[..count]
    }

    /// Move the cursor to `newest`.
    pub fn advance(&mut self, newest: &Notification) {
        self.last_seen_id = Some(newest.id.clone());
        self.last_seen_at = Some(newest.created_at);
    }
}
