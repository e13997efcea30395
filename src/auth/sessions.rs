//! Login sessions
//!
//! Maps random session tokens to the Google account that logged in. The
//! token doubles as the account cookie value and the bearer access token.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use tracing::debug;

use super::generate_token;

/// A logged-in account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub account: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// In-memory session table with a fixed lifetime
#[derive(Debug)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
    lifetime: Duration,
}

impl SessionStore {
    pub fn new(lifetime_secs: u64) -> Self {
        let secs = i64::try_from(lifetime_secs)
            .unwrap_or(i64::MAX)
            .min(i64::MAX / 1000);
        Self {
            sessions: RwLock::new(HashMap::new()),
            lifetime: Duration::seconds(secs),
        }
    }

    pub fn lifetime_secs(&self) -> i64 {
        self.lifetime.num_seconds()
    }

    /// Open a session, returns its token
    ///
    /// Expired sessions are swept out first.
    pub fn create(&self, account: &str, name: &str) -> String {
        let token = generate_token();
        let now = Utc::now();
        let session = Session {
            account: account.to_string(),
            name: name.to_string(),
            created_at: now,
        };
        let mut sessions = self.sessions.write();
        sessions.retain(|_, s| now - s.created_at < self.lifetime);
        sessions.insert(token.clone(), session);
        drop(sessions);
        debug!("Opened session for {}", account);
        token
    }

    fn is_expired(&self, session: &Session) -> bool {
        Utc::now() - session.created_at >= self.lifetime
    }

    /// Look up a live session, dropping it if expired
    pub fn get(&self, token: &str) -> Option<Session> {
        let session = self.sessions.read().get(token).cloned()?;
        if self.is_expired(&session) {
            self.sessions.write().remove(token);
            debug!("Session for {} expired", session.account);
            return None;
        }
        Some(session)
    }

    pub fn is_valid(&self, token: &str) -> bool {
        self.get(token).is_some()
    }

    /// Close a session, returns true if it existed
    pub fn remove(&self, token: &str) -> bool {
        self.sessions.write().remove(token).is_some()
    }

    /// Drop all expired sessions
    pub fn purge_expired(&self) -> usize {
        let mut sessions = self.sessions.write();
        let before = sessions.len();
        let now = Utc::now();
        sessions.retain(|_, s| now - s.created_at < self.lifetime);
        before - sessions.len()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
