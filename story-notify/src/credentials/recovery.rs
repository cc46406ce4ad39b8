//! Session recovery.
//!
//! When a remote call reports an expired session, the engine asks the
//! [`SessionRecovery`] coordinator for a new one. At most one login runs at a
//! time process-wide; a request that arrives while a login is in flight is
//! rejected rather than queued, and the caller simply tries again on its next
//! tick.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use story_api::StoryApi;
use tracing::{error, info, instrument, warn};

use super::authenticator::Authenticator;
use super::store::CredentialStore;

/// Result of a recovery request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryOutcome {
    /// A new session was installed.
    Recovered,
    /// Another login is already running.
    InProgress,
    /// The login failed; the previous session (if any) is unchanged.
    Failed(String),
}

impl RecoveryOutcome {
    #[inline]
    pub fn is_recovered(&self) -> bool {
        matches!(self, Self::Recovered)
    }
}

impl std::fmt::Display for RecoveryOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Recovered => write!(f, "recovered"),
            Self::InProgress => write!(f, "login already in progress"),
            Self::Failed(reason) => write!(f, "login failed: {}", reason),
        }
    }
}

/// Releases the single-flight flag when dropped, including on panic.
struct LoginGuard<'a>(&'a AtomicBool);

impl Drop for LoginGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Single-flight re-authentication coordinator.
pub struct SessionRecovery {
    api: Arc<dyn StoryApi>,
    authenticator: Arc<dyn Authenticator>,
    credentials: Arc<dyn CredentialStore>,
    logging_in: AtomicBool,
    consecutive_failures: AtomicU32,
}

impl SessionRecovery {
    pub fn new(
        api: Arc<dyn StoryApi>,
        authenticator: Arc<dyn Authenticator>,
        credentials: Arc<dyn CredentialStore>,
    ) -> Self {
        Self {
            api,
            authenticator,
            credentials,
            logging_in: AtomicBool::new(false),
            consecutive_failures: AtomicU32::new(0),
        }
    }

    /// Whether a login is currently running.
    pub fn is_logging_in(&self) -> bool {
        self.logging_in.load(Ordering::Acquire)
    }

    /// Number of failed recoveries since the last success.
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures.load(Ordering::Relaxed)
    }

    /// Log in again and install the new session.
    #[instrument(skip(self), fields(strategy = self.authenticator.name()))]
    pub async fn recover(&self) -> RecoveryOutcome {
        if self
            .logging_in
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            info!("Login already in progress, skipping");
            return RecoveryOutcome::InProgress;
        }
        let _guard = LoginGuard(&self.logging_in);

        let credentials = match self.credentials.load().await {
            Ok(c) => c,
            Err(e) => return self.record_failure(format!("credentials unavailable: {}", e)),
        };

        info!("Session expired, logging in again");
        match self.authenticator.login(&credentials).await {
            Ok(session) => {
                self.api.replace_session(session);
                self.consecutive_failures.store(0, Ordering::Relaxed);
                info!("Session recovered");
                RecoveryOutcome::Recovered
            }
            Err(e) => self.record_failure(e.to_string()),
        }
    }

    fn record_failure(&self, reason: String) -> RecoveryOutcome {
        let failure_count = self.consecutive_failures.fetch_add(1, Ordering::Relaxed) + 1;
        if failure_count == 1 || failure_count % 10 == 0 {
            error!(%reason, %failure_count, "Session recovery failed");
        } else {
            warn!(%reason, %failure_count, "Session recovery failed");
        }
        RecoveryOutcome::Failed(reason)
    }
}
