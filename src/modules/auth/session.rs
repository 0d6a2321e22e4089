//! Session persistence for student and guest logins.

use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::anyhow;
use chrono::Utc;
use learnhub_core::errors::AppError;
use learnhub_models::sessions::Session;
use rand::Rng;
use rand::distributions::Alphanumeric;

const TOKEN_LENGTH: usize = 48;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("Session not found")]
    NotFound,

    #[error("Session expired")]
    Expired,

    #[error("Session storage unavailable")]
    Unavailable,
}

impl SessionError {
    pub fn into_app_error(self) -> AppError {
        match self {
            Self::NotFound | Self::Expired => AppError::unauthorized(self.to_string()),
            Self::Unavailable => AppError::internal(anyhow!(self)),
        }
    }
}

/// Where sessions live between requests.
pub trait SessionRepository: Send + Sync {
    /// Returns the live session for `token`. Expired sessions are removed.
    fn load(&self, token: &str) -> Result<Session, SessionError>;

    fn save(&self, session: Session) -> Result<(), SessionError>;

    /// Clearing an unknown token is not an error.
    fn clear(&self, token: &str) -> Result<(), SessionError>;
}

/// Opaque bearer token for a new session.
pub fn generate_session_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

#[derive(Debug, Default)]
pub struct InMemorySessionRepository {
    sessions: RwLock<HashMap<String, Session>>,
}

impl InMemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionRepository for InMemorySessionRepository {
    fn load(&self, token: &str) -> Result<Session, SessionError> {
        let session = {
            let sessions = self.sessions.read().map_err(|_| SessionError::Unavailable)?;
            sessions.get(token).cloned().ok_or(SessionError::NotFound)?
        };

        if session.is_expired_at(Utc::now()) {
            self.clear(token)?;
            return Err(SessionError::Expired);
        }
        Ok(session)
    }

    /// Also drops every other session that has expired, so tokens that are
    /// never presented again do not accumulate.
    fn save(&self, session: Session) -> Result<(), SessionError> {
        let now = Utc::now();
        let mut sessions = self.sessions.write().map_err(|_| SessionError::Unavailable)?;
        sessions.retain(|_, s| !s.is_expired_at(now));
        sessions.insert(session.token.clone(), session);
        Ok(())
    }

    fn clear(&self, token: &str) -> Result<(), SessionError> {
        let mut sessions = self.sessions.write().map_err(|_| SessionError::Unavailable)?;
        sessions.remove(token);
        Ok(())
    }
}
