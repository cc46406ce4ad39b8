//! HTTP client for the KakaoStory web API.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::error::ApiError;
use crate::models::{Notification, NotificationStatus, NotificationsResponse, Post};
use crate::session::Session;
use crate::urls;

pub(crate) const DEFAULT_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Remote calls the notification engine depends on.
#[async_trait]
pub trait StoryApi: Send + Sync {
    /// Number of unseen notifications.
    async fn notification_status(&self) -> Result<NotificationStatus, ApiError>;

    /// Notification feed, newest first.
    async fn notifications(&self) -> Result<Vec<Notification>, ApiError>;

    /// Look up the post behind an activity. `Ok(None)` if it no longer exists.
    async fn post(&self, activity_id: &str) -> Result<Option<Post>, ApiError>;

    /// Install a freshly authenticated session, replacing the previous one.
    fn replace_session(&self, session: Session);

    fn has_session(&self) -> bool;
}

/// Builds the shared HTTP client with the headers the web frontend sends.
pub fn default_client() -> Result<Client, ApiError> {
    let mut headers = HeaderMap::new();
    headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert("X-Kakao-ApiLevel", HeaderValue::from_static(urls::API_LEVEL));
    headers.insert(
        "X-Kakao-DeviceInfo",
        HeaderValue::from_static(urls::DEVICE_INFO),
    );
    headers.insert(
        "X-Requested-With",
        HeaderValue::from_static("XMLHttpRequest"),
    );

    let client = Client::builder()
        .default_headers(headers)
        .user_agent(DEFAULT_UA)
        .timeout(REQUEST_TIMEOUT)
        .build()?;
    Ok(client)
}

/// [`StoryApi`] implementation over `reqwest`.
pub struct StoryClient {
    client: Client,
    base_url: Url,
    session: RwLock<Option<Arc<Session>>>,
}

impl StoryClient {
    /// Create a client for the public service.
    pub fn new(client: Client) -> Self {
        Self {
            client,
            base_url: Url::parse(urls::WEB_BASE).expect("WEB_BASE is a valid url"),
            session: RwLock::new(None),
        }
    }

    /// Create a client against a custom base url (proxies, tests).
    pub fn with_base_url(client: Client, base_url: &str) -> Result<Self, ApiError> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            client,
            base_url,
            session: RwLock::new(None),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Current session snapshot.
    fn current_session(&self) -> Result<Arc<Session>, ApiError> {
        self.session
            .read()
            .as_ref()
            .cloned()
            .ok_or(ApiError::SessionExpired)
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    async fn get(&self, path: &str) -> Result<Response, ApiError> {
        let session = self.current_session()?;
        let url = self.endpoint(path)?;
        trace!(%url, "GET");

        let response = self
            .client
            .get(url.clone())
            .header(header::COOKIE, session.cookie_header())
            .header(header::REFERER, self.base_url.as_str())
            .send()
            .await?;

        if is_login_redirect(&response) {
            debug!(final_url = %response.url(), "Request redirected to login page");
            return Err(ApiError::SessionExpired);
        }

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                debug!(status = %response.status(), %url, "Session rejected");
                Err(ApiError::SessionExpired)
            }
            _ => Ok(response),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.get(path).await?;
        let response = ensure_success(response)?;
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

fn ensure_success(response: Response) -> Result<Response, ApiError> {
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(ApiError::UnexpectedStatus {
            status: response.status(),
            url: response.url().to_string(),
        })
    }
}

fn is_login_redirect(response: &Response) -> bool {
    response
        .url()
        .host_str()
        .is_some_and(|host| host == urls::ACCOUNTS_HOST)
}

#[async_trait]
impl StoryApi for StoryClient {
    async fn notification_status(&self) -> Result<NotificationStatus, ApiError> {
        self.get_json(urls::NOTIFICATION_STATUS).await
    }

    async fn notifications(&self) -> Result<Vec<Notification>, ApiError> {
        let response: NotificationsResponse = self.get_json(urls::NOTIFICATIONS).await?;
        Ok(response.into_vec())
    }

    async fn post(&self, activity_id: &str) -> Result<Option<Post>, ApiError> {
        let path = format!("{}/{}", urls::ACTIVITIES, activity_id);
        let response = self.get(&path).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = ensure_success(response)?;
        let body = response.text().await?;
        Ok(Some(serde_json::from_str(&body)?))
    }

    fn replace_session(&self, session: Session) {
        *self.session.write() = Some(Arc::new(session));
        debug!("Session replaced");
    }

    fn has_session(&self) -> bool {
        self.session.read().is_some()
    }
}
