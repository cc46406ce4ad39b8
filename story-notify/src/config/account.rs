//! The `account.json` file holding the login credentials.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, info};

use crate::credentials::{AccountCredentials, CredentialStore};
use crate::utils::fs;
use crate::{Error, Result};

const EMAIL_PLACEHOLDER: &str = "Enter your email";
const PASSWORD_PLACEHOLDER: &str = "Enter your password";

/// Credentials file on disk. Re-read on every load so edits apply without a restart.
#[derive(Debug, Clone)]
pub struct AccountFile {
    path: PathBuf,
}

impl AccountFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Make sure the file exists and parses.
    ///
    /// A missing file is replaced by a template and reported as a configuration
    /// error so the user can fill it in and restart.
    pub fn ensure_exists(&self) -> Result<()> {
        let Some(text) = fs::read_optional("reading account file", &self.path)? else {
            let template = AccountCredentials::new(EMAIL_PLACEHOLDER, PASSWORD_PLACEHOLDER);
            let json = serde_json::to_string_pretty(&template)?;
            fs::write_atomic("creating account file", &self.path, json.as_bytes())?;
            info!(path = %self.path.display(), "Created account file template");
            return Err(Error::config(format!(
                "Account file did not exist and a new one was created. Edit {} and restart.",
                self.path.display()
            )));
        };

        self.parse(&text).map(|_| ())
    }

    fn parse(&self, text: &str) -> Result<AccountCredentials> {
        let credentials: AccountCredentials = serde_json::from_str(text).map_err(|e| {
            Error::config(format!(
                "Account file {} is corrupted ({}). Fix it and restart.",
                self.path.display(),
                e
            ))
        })?;

        if credentials.email.trim().is_empty() || credentials.email == EMAIL_PLACEHOLDER {
            return Err(Error::config(format!(
                "Account file {} has no email configured",
                self.path.display()
            )));
        }

        Ok(credentials)
    }
}

#[async_trait]
impl CredentialStore for AccountFile {
    async fn load(&self) -> Result<AccountCredentials> {
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| fs::io_error("reading account file", &self.path, e))?;
        debug!(path = %self.path.display(), "Loaded account file");
        self.parse(&text)
    }
}
