use anyhow::Context;
use clap::Parser;
use tracing::info;

use user_directory::{
    config::DatabaseConfig,
    db,
    seed::{self, SeedMode},
    telemetry,
    users::repo::PgUserRepository,
};

#[derive(Parser)]
#[command(name = "seed-users")]
#[command(about = "Generate synthetic users and store or print them")]
struct Args {
    /// Number of fake users to generate
    #[arg(short = 'n', long = "count", default_value_t = 10, allow_negative_numbers = true)]
    count: i64,

    /// Output destination
    #[arg(long, value_enum, default_value_t = SeedMode::Db, ignore_case = true)]
    mode: SeedMode,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    dotenvy::dotenv().ok();
    telemetry::init_stderr();

    let users = seed::generate(args.count)?;

    match args.mode {
        SeedMode::Db => {
            let cfg = DatabaseConfig::from_env()?;
            let pool = db::connect(&cfg).await?;
            db::migrate(&pool).await.context("auto migrate")?;
            let repo = PgUserRepository::new(pool);
            seed::persist(&repo, &users).await?;
        }
        SeedMode::Json => {
            seed::write_json(std::io::stdout().lock(), &users)?;
            info!(count = users.len(), "users written to stdout");
        }
    }
    Ok(())
}
