//! Credential persistence abstraction.
//!
//! Recovery re-reads the credentials on every attempt; the concrete file
//! implementation lives in the configuration layer.

use async_trait::async_trait;

use super::types::AccountCredentials;
use crate::Result;

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Load the current login credentials.
    async fn load(&self) -> Result<AccountCredentials>;
}
