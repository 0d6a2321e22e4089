use std::sync::Arc;

use learnhub_config::{CorsConfig, ImportConfig, JwtConfig, SessionConfig};
use learnhub_db::init_db_pool;

use crate::db::run_migrations;
use crate::modules::auth::{InMemorySessionRepository, SessionService};
use crate::modules::schools::{PgSchoolStore, SchoolStore};
use crate::modules::students::{PgStudentStore, StudentStore};

#[derive(Clone)]
pub struct AppState {
    pub students: Arc<dyn StudentStore>,
    pub schools: Arc<dyn SchoolStore>,
    pub sessions: SessionService,
    pub jwt_config: JwtConfig,
    pub cors_config: CorsConfig,
    pub import_config: ImportConfig,
}

pub async fn init_app_state() -> anyhow::Result<AppState> {
    let db = init_db_pool().await?;
    run_migrations(&db).await?;

    Ok(AppState {
        students: Arc::new(PgStudentStore::new(db.clone())),
        schools: Arc::new(PgSchoolStore::new(db)),
        sessions: SessionService::new(
            Arc::new(InMemorySessionRepository::new()),
            SessionConfig::from_env(),
        ),
        jwt_config: JwtConfig::from_env(),
        cors_config: CorsConfig::from_env(),
        import_config: ImportConfig::from_env(),
    })
}

#[cfg(any(test, feature = "test-utils"))]
impl AppState {
    pub const TEST_JWT_SECRET: &'static str = "learnhub-test-secret";

    /// State backed by a [`MemoryStore`](crate::modules::students::store::MemoryStore),
    /// with a fixed JWT secret and the cheapest bcrypt cost.
    pub fn in_memory(store: Arc<crate::modules::students::store::MemoryStore>) -> Self {
        Self {
            students: store.clone(),
            schools: store,
            sessions: SessionService::new(
                Arc::new(InMemorySessionRepository::new()),
                SessionConfig::default(),
            ),
            jwt_config: JwtConfig {
                secret: Self::TEST_JWT_SECRET.to_string(),
                access_token_expiry: 3600,
            },
            cors_config: CorsConfig::default(),
            import_config: ImportConfig {
                password_hash_cost: 4,
                ..ImportConfig::default()
            },
        }
    }
}
