//! Notification filtering, enrichment and delivery.

mod enricher;
mod filter;
mod notifier;

pub use enricher::NotificationEnricher;
pub use filter::{FAVORITE_FRIEND_MARKER, FilterReason, filter_reason, should_display};
pub use notifier::{ChannelNotifier, Notifier, TracingNotifier};

use serde::{Deserialize, Serialize};

/// An alert ready to be shown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayNotification {
    /// Page opened when the alert is activated.
    pub navigation_url: Option<String>,
    pub title: Option<String>,
    pub body: Option<String>,
    pub thumbnail_url: Option<String>,
    /// Groups alerts about the same activity.
    pub tag: Option<String>,
    /// Key of an earlier alert for the same target that this one supersedes.
    pub replaces: Option<String>,
}
