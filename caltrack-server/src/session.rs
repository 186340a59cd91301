//! Server-side sessions and credential checking
//!
//! A session is an opaque UUID held in the `caltrack_session` cookie and in
//! the in-memory [`SessionStore`]. Sessions expire after a period without
//! requests and do not survive a restart.

use axum::http::{header, HeaderMap};
use caltrack_common::config::Credentials;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "caltrack_session";

/// Sessions unused for this long are dropped
pub const SESSION_IDLE_TIMEOUT: Duration = Duration::from_secs(12 * 60 * 60);

/// Live session tokens and when each was last used
#[derive(Clone)]
pub struct SessionStore {
    tokens: Arc<RwLock<HashMap<Uuid, Instant>>>,
    idle_timeout: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_idle_timeout(SESSION_IDLE_TIMEOUT)
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_idle_timeout(idle_timeout: Duration) -> Self {
        Self {
            tokens: Arc::new(RwLock::new(HashMap::new())),
            idle_timeout,
        }
    }

    /// Start a new session and return its token
    ///
    /// Expired sessions are pruned first, so the store stays bounded by the
    /// number of logins within one idle period.
    pub async fn create(&self) -> Uuid {
        let token = Uuid::new_v4();
        let now = Instant::now();

        let mut tokens = self.tokens.write().await;
        let before = tokens.len();
        tokens.retain(|_, last_seen| now.duration_since(*last_seen) < self.idle_timeout);
        if tokens.len() < before {
            debug!("Pruned {} expired sessions", before - tokens.len());
        }
        tokens.insert(token, now);
        token
    }

    /// True if the token names a live session; refreshes its idle timer
    pub async fn touch(&self, token: &Uuid) -> bool {
        let now = Instant::now();
        let mut tokens = self.tokens.write().await;

        match tokens.get_mut(token) {
            Some(last_seen) if now.duration_since(*last_seen) < self.idle_timeout => {
                *last_seen = now;
                true
            }
            Some(_) => {
                tokens.remove(token);
                debug!("Session expired after {:?} idle", self.idle_timeout);
                false
            }
            None => false,
        }
    }

    /// End a session; returns false if the token was unknown
    pub async fn revoke(&self, token: &Uuid) -> bool {
        self.tokens.write().await.remove(token).is_some()
    }

    pub async fn len(&self) -> usize {
        self.tokens.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Compares login attempts against the configured credentials
#[derive(Clone)]
pub struct Authenticator {
    credentials: Arc<Credentials>,
}

impl Authenticator {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials: Arc::new(credentials),
        }
    }

    pub fn verify(&self, username: &str, password: &str) -> bool {
        username == self.credentials.username && password == self.credentials.password
    }
}

/// Extract the session token from the request's `Cookie` headers
pub fn session_token(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
}

/// `Set-Cookie` value establishing a session
pub fn session_cookie(token: &Uuid) -> String {
    format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, token)
}

/// `Set-Cookie` value removing the session cookie
pub fn expired_session_cookie() -> String {
    format!("{}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax", SESSION_COOKIE)
}
