//! Session management on top of the storage backend
//!
//! Sessions are server-side rows keyed by an opaque UUID token; the client
//! only ever holds the token in an HttpOnly cookie. The same storage
//! backend that holds the entities holds the sessions, so ephemeral mode
//! gets in-memory sessions and production gets a sessions table for free.
//! Expiry is enforced server-side: lookups treat stale rows as absent and
//! a background task sweeps them.

use std::sync::Arc;

use axum_extra::extract::cookie::{Cookie, SameSite};
use chrono::{Duration, Utc};
use tracing::info;
use uuid::Uuid;

use crate::models::{Session, User};
use crate::storage::{Storage, StorageResult};

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "session";

/// Creates, resolves and revokes sessions
#[derive(Clone)]
pub struct SessionManager {
    storage: Arc<dyn Storage>,
    ttl: Duration,
}

impl SessionManager {
    pub fn new(storage: Arc<dyn Storage>, ttl_secs: i64) -> Self {
        Self {
            storage,
            ttl: Duration::seconds(ttl_secs),
        }
    }

    /// Open a new session for a user
    pub async fn open(&self, user_id: i64) -> StorageResult<Session> {
        let session = self
            .storage
            .create_session(user_id, Utc::now() + self.ttl)
            .await?;
        info!(user_id, "session opened");
        Ok(session)
    }

    /// Resolve a cookie token to its user
    ///
    /// Unparseable tokens, unknown tokens, expired sessions and vanished
    /// users all come back as `Ok(None)`; only backend failures error.
    pub async fn resolve(&self, token: &str) -> StorageResult<Option<User>> {
        let Ok(token) = Uuid::parse_str(token) else {
            return Ok(None);
        };
        let Some(session) = self.storage.get_session(token).await? else {
            return Ok(None);
        };
        self.storage.get_user(session.user_id).await
    }

    /// Revoke a session by its cookie token
    pub async fn close(&self, token: &str) -> StorageResult<bool> {
        let Ok(token) = Uuid::parse_str(token) else {
            return Ok(false);
        };
        self.storage.delete_session(token).await
    }

    /// Sweep expired sessions; returns how many were removed
    pub async fn sweep(&self) -> StorageResult<u64> {
        self.storage.delete_expired_sessions().await
    }

    /// Build the session cookie for a freshly opened session
    pub fn cookie(&self, session: &Session) -> Cookie<'static> {
        let mut cookie = Cookie::new(SESSION_COOKIE, session.token.to_string());
        cookie.set_path("/");
        cookie.set_http_only(true);
        cookie.set_same_site(SameSite::Lax);
        cookie
    }

    /// Cookie identity used to clear the session on the client
    pub fn removal_cookie(&self) -> Cookie<'static> {
        let mut cookie = Cookie::new(SESSION_COOKIE, "");
        cookie.set_path("/");
        cookie
    }
}
