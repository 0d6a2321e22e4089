use learnhub_db::PgPool;
use tracing::info;

/// Applies the SQL migrations in `migrations/`.
pub async fn run_migrations(db: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(db).await?;
    info!("Database migrations applied");
    Ok(())
}
