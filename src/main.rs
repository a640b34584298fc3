use user_directory::{app, config::AppConfig, state::AppState, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init();

    let config = AppConfig::from_env()?;
    let app_state = AppState::init(&config).await?;

    let router = app::build_app(app_state);
    app::serve(router, &config).await
}
