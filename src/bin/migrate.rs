//! Apply, revert or inspect the embedded schema migrations.
//!
//! Usage: migrate up | migrate down --target VERSION | migrate status

use std::collections::HashSet;

use clap::{Parser, Subcommand};
use sqlx::migrate::Migrate;

use blueink_api::db::{self, MIGRATOR};

#[derive(Parser)]
#[command(name = "migrate", about = "Manage the blueink database schema")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Apply every pending migration
    Up,
    /// Revert applied migrations newer than the target version
    Down {
        /// Version to keep; 0 reverts everything
        #[arg(long)]
        target: i64,
    },
    /// List migrations and whether each is applied
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args = Args::parse();
    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("Missing required env var: DATABASE_URL"))?;
    let pool = db::create_pool(&database_url).await?;

    match args.command {
        Command::Up => {
            MIGRATOR.run(&pool).await?;
            tracing::info!("migrations applied");
        }
        Command::Down { target } => {
            MIGRATOR.undo(&pool, target).await?;
            tracing::info!(target, "migrations reverted");
        }
        Command::Status => {
            let mut conn = pool.acquire().await?;
            conn.ensure_migrations_table().await?;
            let applied: HashSet<i64> = conn
                .list_applied_migrations()
                .await?
                .into_iter()
                .map(|m| m.version)
                .collect();

            for migration in MIGRATOR
                .iter()
                .filter(|m| !m.migration_type.is_down_migration())
            {
                let mark = if applied.contains(&migration.version) { "applied" } else { "pending" };
                tracing::info!("{} {} [{}]", migration.version, migration.description, mark);
            }
        }
    }

    Ok(())
}
