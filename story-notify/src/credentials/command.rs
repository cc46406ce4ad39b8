//! Login through an external helper process.
//!
//! The browser automation itself is out of process. The helper receives a
//! JSON request on stdin:
//!
//! ```json
//! { "email": "...", "password": "...", "login_url": "...", "headless": true }
//! ```
//!
//! and must print the captured cookies as JSON on stdout:
//!
//! ```json
//! { "cookies": [ { "name": "_karmt", "value": "...", "domain": ".kakao.com", "path": "/" } ] }
//! ```

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use story_api::{Session, urls};
use tracing::{debug, instrument};

use super::authenticator::Authenticator;
use super::error::AuthError;
use super::types::AccountCredentials;
use crate::utils::process::{RunOutcome, run_with_input, tokio_command};

/// Time a headless login may take before falling back to an interactive one.
pub const HEADLESS_LOGIN_TIMEOUT: Duration = Duration::from_secs(10);
/// Time the user is given to complete an interactive login.
pub const INTERACTIVE_LOGIN_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);

const STDERR_SNIPPET_LEN: usize = 512;

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
    login_url: &'a str,
    headless: bool,
}

/// [`Authenticator`] backed by an external login helper.
#[derive(Debug, Clone)]
pub struct CommandAuthenticator {
    program: PathBuf,
    args: Vec<String>,
    headless: bool,
    timeout: Duration,
}

impl CommandAuthenticator {
    /// Headless mode: no visible browser, short timeout.
    pub fn headless(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            headless: true,
            timeout: HEADLESS_LOGIN_TIMEOUT,
        }
    }

    /// Interactive mode: visible browser, the user may need to solve challenges.
    pub fn interactive(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            headless: false,
            timeout: INTERACTIVE_LOGIN_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl Authenticator for CommandAuthenticator {
    fn name(&self) -> &str {
        if self.headless {
            "headless"
        } else {
            "interactive"
        }
    }

    #[instrument(skip(self, credentials), fields(helper = %self.program.display(), headless = self.headless))]
    async fn login(&self, credentials: &AccountCredentials) -> Result<Session, AuthError> {
        let request = serde_json::to_vec(&LoginRequest {
            email: &credentials.email,
            password: &credentials.password,
            login_url: urls::LOGIN_PAGE,
            headless: self.headless,
        })?;

        let mut cmd = tokio_command(&self.program);
        cmd.args(&self.args);
        if self.headless {
            cmd.arg("--headless");
        }

        let output = match run_with_input(cmd, &request, self.timeout).await? {
            RunOutcome::Finished(output) => output,
            RunOutcome::TimedOut => return Err(AuthError::Timeout(self.timeout)),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let snippet: String = stderr.trim().chars().take(STDERR_SNIPPET_LEN).collect();
            return Err(AuthError::HelperFailed(format!(
                "exit status {}: {}",
                output.status, snippet
            )));
        }

        let session: Session = serde_json::from_slice(&output.stdout)?;
        debug!(cookies = session.cookies().len(), "Login helper returned session");

        if !session.is_authenticated() {
            return Err(AuthError::MissingAuthCookie);
        }
        Ok(session)
    }
}
