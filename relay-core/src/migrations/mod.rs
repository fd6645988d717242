/// Database migration system

pub mod runner;

pub use runner::{Migration, MigrationError, MigrationFuture, MigrationRunner};

/// Register all migrations
pub fn register_migrations(runner: &mut MigrationRunner) {
    use migrations::*;

    runner.add_migration(Migration {
        version: 1,
        name: "publish_records".to_string(),
        up: m001_publish_records::up,
        down: m001_publish_records::down,
    });

    runner.add_migration(Migration {
        version: 2,
        name: "publish_records_lookup_index".to_string(),
        up: m002_lookup_index::up,
        down: m002_lookup_index::down,
    });
}

mod migrations {
    pub mod m001_publish_records {
        use super::super::MigrationFuture;
        use sqlx::sqlite::SqlitePool;

        pub fn up(pool: &SqlitePool) -> MigrationFuture<'_> {
            Box::pin(apply(pool))
        }

        pub fn down(pool: &SqlitePool) -> MigrationFuture<'_> {
            Box::pin(revert(pool))
        }

        async fn apply(pool: &SqlitePool) -> Result<(), sqlx::Error> {
            sqlx::query(
                r#"
                CREATE TABLE IF NOT EXISTS publish_records (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    email TEXT NOT NULL,
                    task TEXT NOT NULL,
                    round INTEGER NOT NULL,
                    nonce TEXT,
                    repo_full TEXT NOT NULL,
                    repo_url TEXT NOT NULL,
                    commit_sha TEXT NOT NULL,
                    pages_url TEXT,
                    created_at INTEGER NOT NULL
                )
                "#,
            )
            .execute(pool)
            .await?;

            Ok(())
        }

        async fn revert(pool: &SqlitePool) -> Result<(), sqlx::Error> {
            sqlx::query("DROP TABLE IF EXISTS publish_records")
                .execute(pool)
                .await?;

            Ok(())
        }
    }

    pub mod m002_lookup_index {
        use super::super::MigrationFuture;
        use sqlx::sqlite::SqlitePool;

        pub fn up(pool: &SqlitePool) -> MigrationFuture<'_> {
            Box::pin(apply(pool))
        }

        pub fn down(pool: &SqlitePool) -> MigrationFuture<'_> {
            Box::pin(revert(pool))
        }

        async fn apply(pool: &SqlitePool) -> Result<(), sqlx::Error> {
            sqlx::query(
                "CREATE INDEX IF NOT EXISTS idx_publish_records_lookup ON publish_records(email, task, id)"
            )
            .execute(pool)
            .await?;

            Ok(())
        }

        async fn revert(pool: &SqlitePool) -> Result<(), sqlx::Error> {
            sqlx::query("DROP INDEX IF EXISTS idx_publish_records_lookup")
                .execute(pool)
                .await?;

            Ok(())
        }
    }
}
