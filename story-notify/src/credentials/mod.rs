//! Credential management module.
//!
//! # Architecture
//!
//! - [`AccountCredentials`]: Login credentials from the account file
//! - [`CredentialStore`]: Where credentials are (re-)loaded from
//! - [`Authenticator`]: Produces a fresh session; [`CommandAuthenticator`] delegates
//!   to an external login helper, [`FallbackAuthenticator`] chains strategies
//! - [`SessionRecovery`]: Single-flight coordinator that replaces an expired session

mod authenticator;
mod command;
mod error;
mod recovery;
mod store;
mod types;

pub use authenticator::{Authenticator, FallbackAuthenticator};
pub use command::{CommandAuthenticator, HEADLESS_LOGIN_TIMEOUT, INTERACTIVE_LOGIN_TIMEOUT};
pub use error::AuthError;
pub use recovery::{RecoveryOutcome, SessionRecovery};
pub use store::CredentialStore;
pub use types::AccountCredentials;
