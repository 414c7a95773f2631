//! In-memory login sessions
//!
//! A session is opened after the database accepted the operator's
//! credentials. Tokens travel as `Authorization: Bearer <token>` or the
//! `wms_session` cookie. Each use pushes the expiry forward.

use axum::http::{header, HeaderMap};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::Serialize;
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "wms_session";

#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub token: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct SessionStore {
    sessions: DashMap<String, Session>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl_minutes: u32) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl: Duration::minutes(i64::from(ttl_minutes)),
        }
    }

    pub fn open(&self, username: &str) -> Session {
        let now = Utc::now();
        let session = Session {
            token: Uuid::new_v4().simple().to_string(),
            username: username.to_string(),
            created_at: now,
            expires_at: now + self.ttl,
        };
        self.sessions.insert(session.token.clone(), session.clone());
        tracing::info!(username, "session opened");
        session
    }

    /// Live session for `token`, with its expiry extended.
    pub fn touch(&self, token: &str) -> Option<Session> {
        let now = Utc::now();
        let mut entry = self.sessions.get_mut(token)?;
        if entry.expires_at <= now {
            drop(entry);
            self.sessions.remove(token);
            return None;
        }
        entry.expires_at = now + self.ttl;
        Some(entry.value().clone())
    }

    pub fn close(&self, token: &str) -> bool {
        match self.sessions.remove(token) {
            Some((_, session)) => {
                tracing::info!(username = %session.username, "session closed");
                true
            }
            None => false,
        }
    }

    /// Drop expired sessions; returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let before = self.sessions.len();
        self.sessions.retain(|_, s| s.expires_at > now);
        before - self.sessions.len()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// Session token from a bearer header or the session cookie.
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
        .filter(|t| !t.is_empty())
}

/// `Set-Cookie` value carrying a session token.
pub fn session_cookie(token: &str, ttl_minutes: u32) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE,
        token,
        u64::from(ttl_minutes) * 60
    )
}

/// `Set-Cookie` value that removes the session cookie.
pub fn expired_cookie() -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn open_touch_close() {
        let store = SessionStore::new(30);
        let session = store.open("somchai");
        assert_eq!(store.len(), 1);

        let touched = store.touch(&session.token).unwrap();
        assert_eq!(touched.username, "somchai");
        assert!(touched.expires_at >= session.expires_at);

        assert!(store.close(&session.token));
        assert!(store.touch(&session.token).is_none());
        assert!(!store.close(&session.token));
    }

    #[test]
    fn zero_ttl_expires_immediately() {
        let store = SessionStore::new(0);
        let session = store.open("somchai");
        assert!(store.touch(&session.token).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn purge_drops_only_expired() {
        let store = SessionStore::new(0);
        store.open("a");
        store.open("b");
        assert_eq!(store.purge_expired(), 2);

        let store = SessionStore::new(60);
        store.open("c");
        assert_eq!(store.purge_expired(), 0);
    }

    #[test]
    fn token_prefers_bearer_then_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; wms_session=cookie-token"),
        );
        assert_eq!(token_from_headers(&headers).as_deref(), Some("cookie-token"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert_eq!(token_from_headers(&headers).as_deref(), Some("abc"));
    }

    #[test]
    fn no_token_without_headers() {
        assert!(token_from_headers(&HeaderMap::new()).is_none());
    }
}
