use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vocabplay_backend::{config::Config, db::connection::create_pool, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vocabplay_backend=info,session_cleanup=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load()?;
    let retention = config.tab_session_retention();
    let pool = create_pool(&config.database_url).await?;
    let state = AppState::from_pool(pool.clone(), config);

    let deleted = state.tab_sessions.purge_expired(retention).await?;
    if deleted > 0 {
        tracing::info!("Deleted {} terminal tab sessions", deleted);
    }

    sqlx::query("VACUUM (ANALYZE) tab_sessions")
        .execute(&pool)
        .await?;

    Ok(())
}
