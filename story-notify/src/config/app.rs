//! Process configuration resolved from the environment.

use std::path::PathBuf;
use std::time::Duration;

use crate::{Error, Result};

/// Default delay between the end of one poll cycle and the start of the next.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);
/// Default delay between update checks.
pub const DEFAULT_UPDATE_CHECK_INTERVAL: Duration = Duration::from_secs(10 * 60);
/// Plain-text file holding the latest released version.
pub const DEFAULT_UPDATE_URL: &str =
    "https://raw.githubusercontent.com/story-notify/story-notify/master/latest";
/// Release page prefix, followed by the version tag.
pub const DEFAULT_RELEASE_URL: &str = "https://github.com/story-notify/story-notify/releases/tag/";

pub const ACCOUNT_FILE_NAME: &str = "account.json";
pub const SETTINGS_FILE_NAME: &str = "settings.json";

/// Runtime configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Directory holding `account.json` and `settings.json`.
    pub data_dir: PathBuf,
    pub log_dir: PathBuf,
    pub poll_interval: Duration,
    pub update_check_interval: Duration,
    /// Override for the API host.
    pub api_base_url: Option<String>,
    /// External program that performs the browser login.
    pub login_helper: Option<PathBuf>,
    pub login_helper_args: Vec<String>,
    pub update_url: String,
    pub release_url: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        let data_dir = PathBuf::from(".");
        Self {
            log_dir: data_dir.join("logs"),
            data_dir,
            poll_interval: DEFAULT_POLL_INTERVAL,
            update_check_interval: DEFAULT_UPDATE_CHECK_INTERVAL,
            api_base_url: None,
            login_helper: None,
            login_helper_args: Vec::new(),
            update_url: DEFAULT_UPDATE_URL.to_string(),
            release_url: DEFAULT_RELEASE_URL.to_string(),
        }
    }
}

impl AppConfig {
    /// Resolve the configuration from process environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve the configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let data_dir = get("STORY_NOTIFY_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.data_dir);
        let log_dir = get("STORY_NOTIFY_LOG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("logs"));

        let poll_interval = match get("STORY_NOTIFY_POLL_INTERVAL_MS") {
            Some(v) => Duration::from_millis(parse_number("STORY_NOTIFY_POLL_INTERVAL_MS", &v)?),
            None => defaults.poll_interval,
        };
        let update_check_interval = match get("STORY_NOTIFY_UPDATE_INTERVAL_MINS") {
            Some(v) => {
                let mins = parse_number("STORY_NOTIFY_UPDATE_INTERVAL_MINS", &v)?;
                let secs = mins.checked_mul(60).ok_or_else(|| {
                    Error::config("STORY_NOTIFY_UPDATE_INTERVAL_MINS is out of range")
                })?;
                Duration::from_secs(secs)
            }
            None => defaults.update_check_interval,
        };

        if poll_interval.is_zero() {
            return Err(Error::config("STORY_NOTIFY_POLL_INTERVAL_MS must be positive"));
        }
        if update_check_interval.is_zero() {
            return Err(Error::config(
                "STORY_NOTIFY_UPDATE_INTERVAL_MINS must be positive",
            ));
        }

        let login_helper_args = get("STORY_NOTIFY_LOGIN_HELPER_ARGS")
            .map(|v| v.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();

        Ok(Self {
            data_dir,
            log_dir,
            poll_interval,
            update_check_interval,
            api_base_url: get("STORY_NOTIFY_API_BASE_URL"),
            login_helper: get("STORY_NOTIFY_LOGIN_HELPER").map(PathBuf::from),
            login_helper_args,
            update_url: get("STORY_NOTIFY_UPDATE_URL").unwrap_or(defaults.update_url),
            release_url: get("STORY_NOTIFY_RELEASE_URL").unwrap_or(defaults.release_url),
        })
    }

    pub fn account_path(&self) -> PathBuf {
        self.data_dir.join(ACCOUNT_FILE_NAME)
    }

    pub fn settings_path(&self) -> PathBuf {
        self.data_dir.join(SETTINGS_FILE_NAME)
    }
}

fn parse_number(key: &str, value: &str) -> Result<u64> {
    value
        .trim()
        .parse()
        .map_err(|e| Error::config(format!("Invalid value for {}: {:?} ({})", key, value, e)))
}
