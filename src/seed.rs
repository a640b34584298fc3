//! Operator-side seeding: generate synthetic users and either store them or
//! print them as JSON.

use std::io::Write;

use anyhow::Context;
use clap::ValueEnum;
use tracing::info;

use crate::users::{
    generator,
    repo::UserRepository,
    repo_types::{GeneratedUser, NewUser, User},
};

/// Number of `email / password` pairs echoed after a successful insert.
pub const SAMPLE_CREDENTIALS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "lowercase")]
pub enum SeedMode {
    /// Insert into the database
    Db,
    /// Print to standard output
    Json,
}

pub fn generate(count: i64) -> anyhow::Result<Vec<GeneratedUser>> {
    generator::generate_users(count).context("generate fake users")
}

/// Inserts the batch atomically and logs a few credentials for bootstrap use.
pub async fn persist(
    repo: &dyn UserRepository,
    users: &[GeneratedUser],
) -> anyhow::Result<Vec<User>> {
    if users.is_empty() {
        info!("no users to insert");
        return Ok(Vec::new());
    }

    let records: Vec<NewUser> = users.iter().map(|u| u.record.clone()).collect();
    let stored = repo.insert_many(&records).await.context("insert users")?;

    info!(count = stored.len(), "inserted users");
    info!("sample credentials:");
    for user in users.iter().take(SAMPLE_CREDENTIALS) {
        info!("  {} / {}", user.record.email, user.plain_password);
    }
    Ok(stored)
}

pub fn write_json<W: Write>(mut out: W, users: &[GeneratedUser]) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut out, users).context("encode users")?;
    writeln!(out).context("write output")?;
    Ok(())
}
