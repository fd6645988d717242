/// Tests for record-store migrations

#[cfg(test)]
mod tests {
    use relay_core::migrations::{register_migrations, Migration, MigrationFuture, MigrationRunner};
    use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
    use std::time::Duration;

    async fn create_test_pool() -> SqlitePool {
        SqlitePoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(5))
            .connect("sqlite::memory:")
            .await
            .expect("Failed to create test pool")
    }

    async fn run_invalid_sql(pool: &SqlitePool) -> Result<(), sqlx::Error> {
        sqlx::query("INVALID SQL SYNTAX!!!").execute(pool).await?;
        Ok(())
    }

    fn invalid_up(pool: &SqlitePool) -> MigrationFuture<'_> {
        Box::pin(run_invalid_sql(pool))
    }

    fn noop(_pool: &SqlitePool) -> MigrationFuture<'_> {
        Box::pin(async { Ok::<(), sqlx::Error>(()) })
    }

    async fn table_exists(pool: &SqlitePool, name: &str) -> bool {
        let (count,) = sqlx::query_as::<_, (i64,)>(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?",
        )
        .bind(name)
        .fetch_one(pool)
        .await
        .expect("Should query sqlite_master");
        count == 1
    }

    #[tokio::test]
    async fn test_migration_up_creates_records_table() {
        let pool = create_test_pool().await;
        let mut runner = MigrationRunner::new(pool.clone());
        register_migrations(&mut runner);

        assert_eq!(runner.get_current_version().await.unwrap(), None);
        runner.migrate_up(None).await.expect("Migration should succeed");

        assert_eq!(runner.get_current_version().await.unwrap(), Some(2));
        assert!(table_exists(&pool, "publish_records").await);
    }

    #[tokio::test]
    async fn test_migration_target_version() {
        let pool = create_test_pool().await;
        let mut runner = MigrationRunner::new(pool);
        register_migrations(&mut runner);

        runner.migrate_up(Some(1)).await.expect("Migration should succeed");
        assert_eq!(runner.get_current_version().await.unwrap(), Some(1));

        let status = runner.status().await.unwrap();
        assert_eq!(
            status,
            vec![
                (1, "publish_records".to_string(), true),
                (2, "publish_records_lookup_index".to_string(), false),
            ]
        );
    }

    #[tokio::test]
    async fn test_migration_rollback() {
        let pool = create_test_pool().await;
        let mut runner = MigrationRunner::new(pool.clone());
        register_migrations(&mut runner);

        runner.migrate_up(None).await.expect("Migration should succeed");
        runner.migrate_down(0).await.expect("Rollback should succeed");

        assert_eq!(runner.get_current_version().await.unwrap(), None);
        assert!(!table_exists(&pool, "publish_records").await);
    }

    #[tokio::test]
    async fn test_migration_idempotency() {
        let pool = create_test_pool().await;
        let mut runner = MigrationRunner::new(pool);
        register_migrations(&mut runner);

        runner.migrate_up(None).await.expect("First migration should succeed");
        let first = runner.get_current_version().await.unwrap();
        runner.migrate_up(None).await.expect("Second migration should succeed");
        let second = runner.get_current_version().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(runner.get_applied_migrations().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_migration_error_handling() {
        let pool = create_test_pool().await;
        let mut runner = MigrationRunner::new(pool);

        runner.add_migration(Migration {
            version: 1,
            name: "invalid".to_string(),
            up: invalid_up,
            down: noop,
        });

        assert!(runner.migrate_up(None).await.is_err());
        assert_eq!(runner.get_current_version().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_migration_gap_rejected() {
        let pool = create_test_pool().await;
        let mut runner = MigrationRunner::new(pool);
        register_migrations(&mut runner);
        runner.migrate_up(None).await.unwrap();

        runner.add_migration(Migration {
            version: 5,
            name: "skips_ahead".to_string(),
            up: noop,
            down: noop,
        });

        assert!(runner.migrate_up(None).await.is_err());
    }
}
