//! User preferences that shape which notifications are shown.

use std::sync::Arc;

use super::settings::SettingsStore;
use crate::Result;

/// Preference switches understood by the watcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PreferenceKey {
    /// Show "emotion" (reaction) notifications.
    EmotionNotifications,
    /// Show notifications about favorite friends' activity.
    FavoriteFriendNotifications,
}

impl PreferenceKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EmotionNotifications => "check_emotion_notifications",
            Self::FavoriteFriendNotifications => "check_favorite_friends_notifications",
        }
    }
}

/// Snapshot of the preferences relevant to a single filtering decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationPreferences {
    pub show_emotion_notifications: bool,
    pub show_favorite_friend_notifications: bool,
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            show_emotion_notifications: true,
            show_favorite_friend_notifications: true,
        }
    }
}

/// Typed access to the preference switches. Unset switches default to on.
#[derive(Clone)]
pub struct Preferences {
    store: Arc<dyn SettingsStore>,
}

impl Preferences {
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        Self { store }
    }

    pub fn get(&self, key: PreferenceKey) -> bool {
        self.store.get_bool(key.as_str()).unwrap_or(true)
    }

    pub fn set(&self, key: PreferenceKey, value: bool) -> Result<()> {
        self.store.set_bool(key.as_str(), value)
    }

    /// Flip a switch and return its new value.
    pub fn toggle(&self, key: PreferenceKey) -> Result<bool> {
        let value = !self.get(key);
        self.set(key, value)?;
        Ok(value)
    }

    /// Read the current values. Call once per decision; nothing is cached.
    pub fn notification_preferences(&self) -> NotificationPreferences {
        NotificationPreferences {
            show_emotion_notifications: self.get(PreferenceKey::EmotionNotifications),
            show_favorite_friend_notifications: self
                .get(PreferenceKey::FavoriteFriendNotifications),
        }
    }

    pub fn store(&self) -> &Arc<dyn SettingsStore> {
        &self.store
    }
}
