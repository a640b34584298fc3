use user_directory::{config::DatabaseConfig, db, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init();

    let cfg = DatabaseConfig::from_env()?;
    let pool = db::connect(&cfg).await?;
    db::migrate(&pool).await?;

    tracing::info!("migrations applied successfully");
    Ok(())
}
