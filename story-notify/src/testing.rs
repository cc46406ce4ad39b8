//! Hand-written fakes shared by unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use story_api::{ApiError, Notification, NotificationStatus, Post, Session, StoryApi};
use tokio::sync::Notify;

use crate::credentials::{AccountCredentials, AuthError, Authenticator, CredentialStore};
use crate::notification::{DisplayNotification, Notifier};
use crate::{Error, Result};

/// Timestamp `secs` seconds into a fixed test day.
pub fn at(secs: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap() + chrono::Duration::seconds(secs)
}

/// A plain profile notification created at `at(secs)`.
pub fn notification(id: &str, secs: i64, is_new: bool) -> Notification {
    Notification {
        id: id.to_string(),
        created_at: at(secs),
        is_new,
        message: Some(format!("message {}", id)),
        content: None,
        scheme: format!("kakaostory://profiles/{}", id),
        thumbnail_url: None,
        emotion: None,
        decorators: Vec::new(),
    }
}

/// In-memory [`StoryApi`]. The session stays valid until [`FakeApi::expire_session`]
/// is called and becomes valid again once a new one is installed.
pub struct FakeApi {
    expired: AtomicBool,
    reject_new_sessions: AtomicBool,
    unseen: Mutex<u32>,
    feed: Mutex<Vec<Notification>>,
    posts: Mutex<HashMap<String, Post>>,
    fail_posts: AtomicBool,
    status_calls: AtomicUsize,
    feed_calls: AtomicUsize,
    post_calls: AtomicUsize,
    installed: AtomicUsize,
}

impl FakeApi {
    pub fn new() -> Self {
        Self {
            expired: AtomicBool::new(false),
            reject_new_sessions: AtomicBool::new(false),
            unseen: Mutex::new(1),
            feed: Mutex::new(Vec::new()),
            posts: Mutex::new(HashMap::new()),
            fail_posts: AtomicBool::new(false),
            status_calls: AtomicUsize::new(0),
            feed_calls: AtomicUsize::new(0),
            post_calls: AtomicUsize::new(0),
            installed: AtomicUsize::new(0),
        }
    }

    pub fn expire_session(&self) {
        self.expired.store(true, Ordering::SeqCst);
    }

    /// Keep reporting an expired session even after a new one is installed.
    pub fn reject_new_sessions(&self) {
        self.reject_new_sessions.store(true, Ordering::SeqCst);
    }

    pub fn set_unseen(&self, count: u32) {
        *self.unseen.lock() = count;
    }

    pub fn set_feed(&self, feed: Vec<Notification>) {
        *self.feed.lock() = feed;
    }

    pub fn set_post(&self, activity_id: &str, post: Post) {
        self.posts.lock().insert(activity_id.to_string(), post);
    }

    pub fn fail_posts(&self, fail: bool) {
        self.fail_posts.store(fail, Ordering::SeqCst);
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn feed_calls(&self) -> usize {
        self.feed_calls.load(Ordering::SeqCst)
    }

    pub fn post_calls(&self) -> usize {
        self.post_calls.load(Ordering::SeqCst)
    }

    pub fn installed_sessions(&self) -> usize {
        self.installed.load(Ordering::SeqCst)
    }

    fn check_session(&self) -> std::result::Result<(), ApiError> {
        if self.expired.load(Ordering::SeqCst) {
            Err(ApiError::SessionExpired)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl StoryApi for FakeApi {
    async fn notification_status(&self) -> std::result::Result<NotificationStatus, ApiError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        self.check_session()?;
        Ok(NotificationStatus {
            notification_count: *self.unseen.lock(),
        })
    }

    async fn notifications(&self) -> std::result::Result<Vec<Notification>, ApiError> {
        self.feed_calls.fetch_add(1, Ordering::SeqCst);
        self.check_session()?;
        Ok(self.feed.lock().clone())
    }

    async fn post(&self, activity_id: &str) -> std::result::Result<Option<Post>, ApiError> {
        self.post_calls.fetch_add(1, Ordering::SeqCst);
        self.check_session()?;
        if self.fail_posts.load(Ordering::SeqCst) {
            return Err(ApiError::UnexpectedStatus {
                status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
                url: format!("fake://a/activities/{}", activity_id),
            });
        }
        Ok(self.posts.lock().get(activity_id).cloned())
    }

    fn replace_session(&self, _session: Session) {
        self.installed.fetch_add(1, Ordering::SeqCst);
        if !self.reject_new_sessions.load(Ordering::SeqCst) {
            self.expired.store(false, Ordering::SeqCst);
        }
    }

    fn has_session(&self) -> bool {
        !self.expired.load(Ordering::SeqCst)
    }
}

/// Credential store with a fixed answer.
pub struct FakeCredentials {
    credentials: Option<AccountCredentials>,
}

impl FakeCredentials {
    pub fn valid() -> Self {
        Self {
            credentials: Some(AccountCredentials::new("me@example.com", "secret")),
        }
    }

    pub fn missing() -> Self {
        Self { credentials: None }
    }
}

#[async_trait]
impl CredentialStore for FakeCredentials {
    async fn load(&self) -> Result<AccountCredentials> {
        self.credentials
            .clone()
            .ok_or_else(|| Error::config("no account file"))
    }
}

/// Authenticator that answers immediately.
pub struct FakeAuth {
    succeed: bool,
    calls: AtomicUsize,
}

impl FakeAuth {
    pub fn succeeding() -> Self {
        Self {
            succeed: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            succeed: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Authenticator for FakeAuth {
    fn name(&self) -> &str {
        "fake"
    }

    async fn login(
        &self,
        _credentials: &AccountCredentials,
    ) -> std::result::Result<Session, AuthError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.succeed {
            Ok(Session::from_cookie_header("_karmt=fake"))
        } else {
            Err(AuthError::HelperFailed("scripted failure".to_string()))
        }
    }
}

/// Authenticator that blocks inside `login` until released.
pub struct GatedAuth {
    calls: AtomicUsize,
    entered: Notify,
    release: Notify,
    succeed: bool,
}

impl GatedAuth {
    pub fn new(succeed: bool) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            entered: Notify::new(),
            release: Notify::new(),
            succeed,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Wait until a login is blocked inside the gate.
    pub async fn wait_entered(&self) {
        self.entered.notified().await;
    }

    /// Let the blocked login finish.
    pub fn release(&self) {
        self.release.notify_one();
    }
}

#[async_trait]
impl Authenticator for GatedAuth {
    fn name(&self) -> &str {
        "gated"
    }

    async fn login(
        &self,
        _credentials: &AccountCredentials,
    ) -> std::result::Result<Session, AuthError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.entered.notify_one();
        self.release.notified().await;
        if self.succeed {
            Ok(Session::from_cookie_header("_karmt=fresh"))
        } else {
            Err(AuthError::MissingAuthCookie)
        }
    }
}

/// How [`RecordingNotifier`] reacts to an alert whose title matches.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Misbehave {
    Fail,
    Panic,
}

/// Notifier that records every alert it is given.
#[derive(Default)]
pub struct RecordingNotifier {
    shown: Mutex<Vec<DisplayNotification>>,
    misbehave_on: Mutex<Option<(String, Misbehave)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Misbehave when asked to display an alert with this title.
    pub fn misbehave_on(&self, title: &str, how: Misbehave) {
        *self.misbehave_on.lock() = Some((title.to_string(), how));
    }

    pub fn titles(&self) -> Vec<String> {
        self.shown
            .lock()
            .iter()
            .map(|n| n.title.clone().unwrap_or_default())
            .collect()
    }

    pub fn count(&self) -> usize {
        self.shown.lock().len()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn display(&self, notification: &DisplayNotification) -> Result<()> {
        let rule = self.misbehave_on.lock().clone();
        if let Some((title, how)) = rule {
            if notification.title.as_deref() == Some(title.as_str()) {
                match how {
                    Misbehave::Fail => return Err(Error::other("toast rejected")),
                    Misbehave::Panic => panic!("toast backend crashed"),
                }
            }
        }
        self.shown.lock().push(notification.clone());
        Ok(())
    }
}
