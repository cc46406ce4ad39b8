//! Client for the KakaoStory web API.
//!
//! Exposes the three calls a notification watcher needs (unseen counter,
//! notification feed and post lookup) behind the [`StoryApi`] trait, together
//! with the wire models and the cookie [`Session`] used to authorize them.

pub mod client;
pub mod error;
pub mod models;
pub mod session;
pub mod urls;

pub use client::{StoryApi, StoryClient, default_client};
pub use error::ApiError;
pub use models::{Decorator, Notification, NotificationStatus, Post, PostMedia, Scheme};
pub use session::{AUTH_COOKIE, Session, SessionCookie};
