//! Login strategies.

use std::sync::Arc;

use async_trait::async_trait;
use story_api::Session;
use tracing::{info, warn};

use super::error::AuthError;
use super::types::AccountCredentials;

/// Produces a fresh session from login credentials.
///
/// Implementations are opaque to the watcher: a browser automation helper, a
/// stored cookie export, or a fake in tests.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Strategy name for logs (e.g. "headless", "interactive").
    fn name(&self) -> &str;

    /// Perform a login.
    ///
    /// # Returns
    /// * `Ok(Session)` - an authenticated session
    /// * `Err(...)` - the login failed or produced no auth cookie
    async fn login(&self, credentials: &AccountCredentials) -> Result<Session, AuthError>;
}

/// Tries an ordered list of strategies until one succeeds.
///
/// Each strategy is attempted at most once per login, so a persistently
/// failing login terminates after `strategies.len()` attempts.
pub struct FallbackAuthenticator {
    strategies: Vec<Arc<dyn Authenticator>>,
}

impl FallbackAuthenticator {
    pub fn new(strategies: Vec<Arc<dyn Authenticator>>) -> Self {
        Self { strategies }
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

#[async_trait]
impl Authenticator for FallbackAuthenticator {
    fn name(&self) -> &str {
        "fallback"
    }

    async fn login(&self, credentials: &AccountCredentials) -> Result<Session, AuthError> {
        let mut last_error = AuthError::NoStrategies;

        for strategy in &self.strategies {
            info!(strategy = strategy.name(), "Attempting login");
            match strategy.login(credentials).await {
                Ok(session) => {
                    info!(strategy = strategy.name(), "Login succeeded");
                    return Ok(session);
                }
                Err(e) => {
                    warn!(strategy = strategy.name(), error = %e, "Login strategy failed");
                    let retryable = e.is_retryable();
                    last_error = e;
                    if !retryable {
                        break;
                    }
                }
            }
        }

        Err(last_error)
    }
}
