use std::sync::{Arc, LazyLock};

use anyhow::anyhow;
use chrono::{Duration, Utc};
use learnhub_config::SessionConfig;
use learnhub_core::errors::AppError;
use learnhub_core::password::{hash_password, verify_password};
use learnhub_models::sessions::{Session, SessionKind, StudentLoginRequest};
use tracing::{info, instrument, warn};

use super::session::{SessionError, SessionRepository, generate_session_token};
use crate::metrics;
use crate::modules::students::store::StudentStore;

const INVALID_CREDENTIALS: &str = "Invalid username or password";

/// Verified against on unknown usernames so both failures cost one bcrypt run.
static DUMMY_PASSWORD_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password(INVALID_CREDENTIALS).ok());

/// Student login, guest preview and session lookup over an injected
/// [`SessionRepository`].
#[derive(Clone)]
pub struct SessionService {
    repository: Arc<dyn SessionRepository>,
    config: SessionConfig,
}

impl SessionService {
    pub fn new(repository: Arc<dyn SessionRepository>, config: SessionConfig) -> Self {
        Self { repository, config }
    }

    fn new_session(&self, kind: SessionKind, ttl_seconds: i64) -> Result<Session, AppError> {
        let now = Utc::now();
        let session = Session {
            token: generate_session_token(),
            kind,
            created_at: now,
            expires_at: now + Duration::seconds(ttl_seconds),
        };
        self.repository
            .save(session.clone())
            .map_err(SessionError::into_app_error)?;
        Ok(session)
    }

    #[instrument(skip(self, students, request), fields(username = %request.username))]
    pub async fn login(
        &self,
        students: &dyn StudentStore,
        request: &StudentLoginRequest,
    ) -> Result<Session, AppError> {
        let username = request.username.trim();

        let Some(login) = students.find_login(username).await? else {
            if let Some(dummy) = DUMMY_PASSWORD_HASH.as_deref() {
                verify_password(&request.password, dummy)?;
            }
            metrics::track_student_login_failure("unknown_user");
            warn!("Login attempt for unknown username");
            return Err(AppError::unauthorized(INVALID_CREDENTIALS));
        };

        if !verify_password(&request.password, &login.password_hash)? {
            metrics::track_student_login_failure("bad_password");
            warn!("Login attempt with wrong password");
            return Err(AppError::unauthorized(INVALID_CREDENTIALS));
        }

        let student = login.student;
        if !student.is_active {
            metrics::track_student_login_failure("inactive");
            return Err(AppError::forbidden("Student account is inactive"));
        }

        let session = self.new_session(
            SessionKind::Student {
                student_id: student.id,
                school_id: student.school_id,
                username: student.username,
                student_name: student.student_name,
            },
            self.config.student_ttl_seconds,
        )?;

        metrics::track_student_login_success();
        info!("Student logged in");
        Ok(session)
    }

    #[instrument(skip(self))]
    pub fn start_guest(&self) -> Result<Session, AppError> {
        let session = self.new_session(SessionKind::Guest, self.config.guest_ttl_seconds)?;
        metrics::track_guest_session_started();
        Ok(session)
    }

    pub fn current(&self, token: &str) -> Result<Session, AppError> {
        self.repository
            .load(token)
            .map_err(SessionError::into_app_error)
    }

    #[instrument(skip(self, token))]
    pub fn logout(&self, token: &str) -> Result<(), AppError> {
        // Only live sessions can be logged out.
        self.current(token)?;
        self.repository
            .clear(token)
            .map_err(|e| AppError::internal(anyhow!(e)))
    }
}
