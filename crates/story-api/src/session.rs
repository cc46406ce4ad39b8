//! Authenticated session state.
//!
//! A [`Session`] is the cookie set captured by a successful login. It is never
//! mutated in place: a new login produces a new session which replaces the old
//! one wholesale inside the client.

use serde::{Deserialize, Serialize};

/// Cookie whose presence marks a logged-in session.
pub const AUTH_COOKIE: &str = "_karmt";

/// A single cookie captured from the login flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCookie {
    pub name: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl SessionCookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: None,
            path: None,
        }
    }
}

/// Opaque credential bundle used to authorize API requests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    cookies: Vec<SessionCookie>,
}

impl Session {
    pub fn new(cookies: Vec<SessionCookie>) -> Self {
        Self { cookies }
    }

    /// Build a session from a `Cookie` header style string.
    ///
    /// # Example
    /// ```
    /// use story_api::Session;
    ///
    /// let session = Session::from_cookie_header("_karmt=abc; _kawlt=xyz");
    /// assert_eq!(session.cookie_value("_karmt"), Some("abc"));
    /// assert!(session.is_authenticated());
    /// ```
    pub fn from_cookie_header(header: &str) -> Self {
        let cookies = header
            .split(';')
            .filter_map(|part| {
                let (name, value) = part.trim().split_once('=')?;
                let name = name.trim();
                if name.is_empty() {
                    return None;
                }
                Some(SessionCookie::new(name, value.trim()))
            })
            .collect();
        Self { cookies }
    }

    pub fn cookies(&self) -> &[SessionCookie] {
        &self.cookies
    }

    /// Look up a cookie value by name.
    pub fn cookie_value(&self, name: &str) -> Option<&str> {
        self.cookies
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.value.as_str())
    }

    /// Render the cookies as a `Cookie` request header value.
    pub fn cookie_header(&self) -> String {
        self.cookies
            .iter()
            .map(|c| format!("{}={}", c.name, c.value))
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Whether the login that produced this session actually succeeded.
    #[inline]
    pub fn is_authenticated(&self) -> bool {
        self.cookie_value(AUTH_COOKIE).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }
}
