//! Configuration: process settings, the account file and user preferences.

mod account;
mod app;
mod preferences;
mod settings;

pub use account::AccountFile;
pub use app::{
    ACCOUNT_FILE_NAME, AppConfig, DEFAULT_POLL_INTERVAL, DEFAULT_UPDATE_CHECK_INTERVAL,
    SETTINGS_FILE_NAME,
};
pub use preferences::{NotificationPreferences, PreferenceKey, Preferences};
pub use settings::{JsonSettings, MemorySettings, SettingsStore};
