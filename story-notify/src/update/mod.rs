//! Periodic check for a newer release.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use semver::{BuildMetadata, Version};
use story_api::ApiError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::config::{AppConfig, SettingsStore};
use crate::notification::{DisplayNotification, Notifier};
use crate::{Error, Result};

/// Title of the alert announcing a new release.
pub const UPDATE_AVAILABLE_TITLE: &str = "Update Available";

/// Version of this build.
pub const CURRENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// A release newer than the running build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateInfo {
    pub version: Version,
    /// Version string as published, used for the release tag.
    pub tag: String,
    pub url: String,
}

/// Fetches the latest version string and announces each newer release once.
pub struct UpdateChecker {
    client: Client,
    update_url: String,
    release_url: String,
    current: Version,
    settings: Arc<dyn SettingsStore>,
    notifier: Arc<dyn Notifier>,
    interval: Duration,
}

impl UpdateChecker {
    pub fn new(
        client: Client,
        config: &AppConfig,
        settings: Arc<dyn SettingsStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self> {
        Ok(Self {
            client,
            update_url: config.update_url.clone(),
            release_url: config.release_url.clone(),
            current: parse_version(CURRENT_VERSION)?,
            settings,
            notifier,
            interval: config.update_check_interval,
        })
    }

    /// Compare against `version` instead of this build's version.
    pub fn with_current_version(mut self, version: Version) -> Self {
        self.current = version;
        self
    }

    pub fn current_version(&self) -> &Version {
        &self.current
    }

    /// Run until `cancel` fires, checking once per interval.
    pub async fn run(self, cancel: CancellationToken) {
        info!(
            current = %self.current,
            interval_secs = self.interval.as_secs(),
            "Update checker started"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
            if let Err(e) = self.check().await {
                warn!(error = %e, "Update check failed");
            }
        }

        debug!("Update checker stopped");
    }

    /// Check once. Returns the release that was announced, if any.
    #[instrument(skip(self), fields(url = %self.update_url))]
    pub async fn check(&self) -> Result<Option<UpdateInfo>> {
        let published = self.fetch_latest().await?;
        let Some(update) = self.evaluate(&published)? else {
            return Ok(None);
        };

        // A release counts as announced even if the alert fails.
        self.settings.set_bool(&checked_key(&update.tag), true)?;
        self.notifier.display(&update_alert(&update)).await?;
        info!(version = %update.tag, "Update available");
        Ok(Some(update))
    }

    /// The release worth announcing, if `published` is newer than this build
    /// and not yet announced.
    pub fn evaluate(&self, published: &str) -> Result<Option<UpdateInfo>> {
        let tag = published.trim();
        let latest = parse_version(tag)?;

        if latest <= self.current {
            debug!(%latest, current = %self.current, "Up to date");
            return Ok(None);
        }
        if self.settings.get_bool(&checked_key(tag)).unwrap_or(false) {
            debug!(%tag, "Release already announced");
            return Ok(None);
        }

        Ok(Some(UpdateInfo {
            version: latest,
            tag: tag.to_string(),
            url: format!("{}{}", self.release_url, tag),
        }))
    }

    async fn fetch_latest(&self) -> Result<String> {
        let response = self
            .client
            .get(&self.update_url)
            .send()
            .await
            .map_err(ApiError::from)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::UnexpectedStatus {
                status,
                url: self.update_url.clone(),
            }
            .into());
        }

        Ok(response.text().await.map_err(ApiError::from)?)
    }
}

/// Parse a published version string.
///
/// Accepts a leading `v` and one to four numeric components. Missing
/// components count as zero; a non-zero fourth component becomes numeric build
/// metadata, so `1.0.2.1` sorts after `1.0.2` and before `1.0.3`. Anything else
/// goes through regular semver parsing.
pub fn parse_version(text: &str) -> Result<Version> {
    let text = text.trim();
    let text = text
        .strip_prefix('v')
        .or_else(|| text.strip_prefix('V'))
        .unwrap_or(text);
    let invalid = |reason: String| Error::other(format!("invalid version {:?}: {}", text, reason));

    let numeric: Option<Vec<u64>> = text
        .split('.')
        .map(|part| {
            part.bytes()
                .all(|b| b.is_ascii_digit())
                .then(|| part.parse().ok())
                .flatten()
        })
        .collect();

    match numeric {
        Some(parts) if parts.len() <= 4 => {
            let component = |i: usize| parts.get(i).copied().unwrap_or(0);
            let mut version = Version::new(component(0), component(1), component(2));
            let revision = component(3);
            if revision > 0 {
                version.build = BuildMetadata::new(&revision.to_string())
                    .map_err(|e| invalid(e.to_string()))?;
            }
            Ok(version)
        }
        _ => Version::parse(text).map_err(|e| invalid(e.to_string())),
    }
}

fn checked_key(tag: &str) -> String {
    format!("version_checked.{}", tag)
}

fn update_alert(update: &UpdateInfo) -> DisplayNotification {
    DisplayNotification {
        navigation_url: Some(update.url.clone()),
        title: Some(UPDATE_AVAILABLE_TITLE.to_string()),
        body: Some(format!(
            "새 버전 ({})이 발견되었습니다.\n다운로드 받으시겠습니까?",
            update.tag
        )),
        thumbnail_url: None,
        tag: None,
        replaces: Some(checked_key(&update.tag)),
    }
}
