use storefront_api::db::{create_orm_conn, run_migrations};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let database_url = std::env::var("DATABASE_URL")?;
    let dir = std::env::var("MIGRATIONS_DIR").unwrap_or_else(|_| "migrations".to_string());

    let orm = create_orm_conn(&database_url).await?;
    run_migrations(&orm, &dir).await?;
    tracing::info!(%dir, "migrations applied");
    Ok(())
}
