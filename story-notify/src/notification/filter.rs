//! Display filtering by user preference.

use story_api::Notification;

use crate::config::NotificationPreferences;

/// Decorator prefix the service uses for favorite-friend activity.
pub const FAVORITE_FRIEND_MARKER: &str = "관심친구";

/// Why a notification was held back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterReason {
    EmotionsDisabled,
    FavoriteFriendsDisabled,
}

/// Decide whether `notification` should be shown under `prefs`.
pub fn should_display(notification: &Notification, prefs: &NotificationPreferences) -> bool {
    filter_reason(notification, prefs).is_none()
}

/// Same decision as [`should_display`], reporting which preference rejected it.
pub fn filter_reason(
    notification: &Notification,
    prefs: &NotificationPreferences,
) -> Option<FilterReason> {
    if !prefs.show_emotion_notifications && notification.is_emotion() {
        return Some(FilterReason::EmotionsDisabled);
    }

    if !prefs.show_favorite_friend_notifications
        && notification
            .decorator_text()
            .is_some_and(|text| text.starts_with(FAVORITE_FRIEND_MARKER))
    {
        return Some(FilterReason::FavoriteFriendsDisabled);
    }

    None
}
