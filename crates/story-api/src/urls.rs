//! Endpoints and constant request metadata of the web API.

/// Web frontend, also the API host.
pub const WEB_BASE: &str = "https://story.kakao.com";
/// Host the service redirects to when the session is no longer valid.
pub const ACCOUNTS_HOST: &str = "accounts.kakao.com";
/// Login page that returns to the web frontend afterwards.
pub const LOGIN_PAGE: &str = "https://accounts.kakao.com/login/?continue=https://story.kakao.com/";

/// Unseen notification counter.
pub const NOTIFICATION_STATUS: &str = "a/notifications/status";
/// Notification feed, newest first.
pub const NOTIFICATIONS: &str = "a/notifications";
/// Post lookup, followed by `/<activity id>`.
pub const ACTIVITIES: &str = "a/activities";

pub(crate) const API_LEVEL: &str = "49";
pub(crate) const DEVICE_INFO: &str = "web:d;-;-";
