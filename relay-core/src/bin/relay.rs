use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use relay_core::config::RelayConfig;
use relay_core::migrations::{register_migrations, MigrationRunner};
use relay_core::observability::setup_logging;
use relay_core::storage::SqliteRecordStore;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "relay", about = "Publishes task submissions as hosted static sites")]
struct Cli {
    /// TOML configuration file; environment variables override it.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the submission webhook.
    Serve {
        /// Overrides `server.bind`.
        #[arg(long)]
        bind: Option<String>,
    },
    /// Apply record-store migrations and print their status.
    Migrate {
        /// Roll back to this version instead of migrating up.
        #[arg(long)]
        down_to: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = RelayConfig::load(cli.config.as_deref()).context("loading configuration")?;
    setup_logging(&config.logging);

    match cli.command {
        Command::Serve { bind } => {
            if let Some(bind) = bind {
                config.server.bind = bind;
            }
            relay_core::server::serve(&config).await.context("serving")?;
        }
        Command::Migrate { down_to } => {
            let store = SqliteRecordStore::open(&config.storage.database_path)
                .await
                .context("opening record store")?;
            let mut runner = MigrationRunner::new(store.pool().clone());
            register_migrations(&mut runner);

            if let Some(target) = down_to {
                runner.migrate_down(target).await?;
            }

            for (version, name, applied) in runner.status().await? {
                println!("{:>4}  {:<32} {}", version, name, if applied { "applied" } else { "pending" });
            }
        }
    }

    Ok(())
}
