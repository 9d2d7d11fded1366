use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::authorization::Identity;
use super::domain::{Account, AccountId, Role};

/// Opaque bearer token handed out at login.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(pub String);

impl SessionToken {
    fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone)]
struct SessionRecord {
    account_id: AccountId,
    role: Role,
    expires_at: DateTime<Utc>,
}

/// In-process session table mapping tokens to identities.
#[derive(Debug)]
pub struct SessionStore {
    ttl: Duration,
    sessions: Mutex<HashMap<SessionToken, SessionRecord>>,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn issue(&self, account: &Account) -> SessionToken {
        self.issue_at(account, Utc::now())
    }

    /// Issuing also sweeps every record that has expired by `now`, so abandoned logins do not
    /// accumulate.
    pub fn issue_at(&self, account: &Account, now: DateTime<Utc>) -> SessionToken {
        let token = SessionToken::generate();
        let record = SessionRecord {
            account_id: account.id().clone(),
            role: account.role(),
            expires_at: now + self.ttl,
        };
        let mut sessions = self
            .sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        sessions.retain(|_, existing| existing.expires_at > now);
        sessions.insert(token.clone(), record);
        token
    }

    pub fn resolve(&self, token: &SessionToken) -> Identity {
        self.resolve_at(token, Utc::now())
    }

    /// Unknown and expired tokens resolve to [`Identity::Anonymous`]; expired ones are evicted.
    pub fn resolve_at(&self, token: &SessionToken, now: DateTime<Utc>) -> Identity {
        let mut sessions = self
            .sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        match sessions.get(token) {
            Some(record) if record.expires_at > now => {
                Identity::authenticated(record.account_id.clone(), record.role)
            }
            Some(_) => {
                sessions.remove(token);
                Identity::Anonymous
            }
            None => Identity::Anonymous,
        }
    }

    /// Returns `false` when the token was not active.
    pub fn revoke(&self, token: &SessionToken) -> bool {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(token)
            .is_some()
    }
}

impl SessionStore {
    /// Number of records currently held, expired or not.
    pub fn len(&self) -> usize {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(Duration::hours(24))
    }
}
