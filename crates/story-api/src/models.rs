//! Wire models for the notification feed, the unseen counter and posts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::urls;

const PROFILE_PREFIX: &str = "kakaostory://profiles/";
const ACTIVITY_PREFIX: &str = "kakaostory://activities/";
const PROFILE_QUERY_MARKER: &str = "?profile_id=";

/// A single entry of the notification feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub is_new: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub scheme: String,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    /// Present on "emotion" notifications. The payload itself is not used.
    #[serde(default)]
    pub emotion: Option<serde_json::Value>,
    #[serde(default)]
    pub decorators: Vec<Decorator>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decorator {
    #[serde(default)]
    pub text: Option<String>,
}

impl Notification {
    /// Text of the first decorator, if any.
    pub fn decorator_text(&self) -> Option<&str> {
        self.decorators.first().and_then(|d| d.text.as_deref())
    }

    #[inline]
    pub fn is_emotion(&self) -> bool {
        self.emotion.as_ref().is_some_and(|v| !v.is_null())
    }

    pub fn target(&self) -> Scheme {
        Scheme::parse(&self.scheme)
    }
}

/// The feed endpoint answers either with a bare array or a wrapped list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum NotificationsResponse {
    List(Vec<Notification>),
    Wrapped {
        #[serde(default)]
        notifications: Vec<Notification>,
    },
}

impl NotificationsResponse {
    pub(crate) fn into_vec(self) -> Vec<Notification> {
        match self {
            Self::List(list) => list,
            Self::Wrapped { notifications } => notifications,
        }
    }
}

/// Unseen notification counter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationStatus {
    #[serde(default, alias = "notificationCount")]
    pub notification_count: u32,
}

impl NotificationStatus {
    #[inline]
    pub fn has_unseen(&self) -> bool {
        self.notification_count > 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    #[serde(default)]
    pub media_type: Option<String>,
    #[serde(default)]
    pub media: Vec<PostMedia>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostMedia {
    #[serde(default)]
    pub origin_url: Option<String>,
}

impl Post {
    /// Image usable as a thumbnail: the first media item, unless the post is a video.
    pub fn thumbnail_candidate(&self) -> Option<&str> {
        if self.media_type.as_deref() == Some("video") {
            return None;
        }
        self.media.first().and_then(|m| m.origin_url.as_deref())
    }
}

/// Navigation target encoded in a notification's `scheme`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scheme {
    Profile(String),
    Activity(String),
    Other,
}

impl Scheme {
    /// Parse a scheme string. Unknown prefixes map to [`Scheme::Other`].
    pub fn parse(scheme: &str) -> Self {
        if let Some(profile_id) = scheme.strip_prefix(PROFILE_PREFIX) {
            return Self::Profile(profile_id.to_string());
        }

        if let Some(rest) = scheme.strip_prefix(ACTIVITY_PREFIX) {
            let activity_id = match rest.find(PROFILE_QUERY_MARKER) {
                Some(idx) => &rest[..idx],
                None => rest,
            };
            return Self::Activity(activity_id.to_string());
        }

        Self::Other
    }

    pub fn activity_id(&self) -> Option<&str> {
        match self {
            Self::Activity(id) => Some(id),
            _ => None,
        }
    }

    /// Web page that shows this target.
    pub fn navigation_url(&self) -> Option<String> {
        match self {
            Self::Profile(id) => Some(format!("{}/{}", urls::WEB_BASE, id)),
            Self::Activity(id) => Some(format!("{}/{}", urls::WEB_BASE, id.replace('.', "/"))),
            Self::Other => None,
        }
    }
}
