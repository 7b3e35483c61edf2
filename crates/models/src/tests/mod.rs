use migration::MigratorTrait;
use sea_orm::DatabaseConnection;



/// Connect and migrate, or `None` when tests should be skipped
/// (`SKIP_DB_TESTS` set, or no database reachable).
pub(crate) async fn test_db() -> Option<DatabaseConnection> {
    if std::env::var("SKIP_DB_TESTS").is_ok() {
        return None;
    }
    let cfg = configs::DatabaseConfig {
        url: crate::db::DATABASE_URL.clone(),
        max_connections: 5,
        min_connections: 1,
        connect_timeout_secs: 2,
        acquire_timeout_secs: 2,
        ..Default::default()
    };
    let db = match crate::db::connect_with_config(&cfg).await {
        Ok(db) => db,
        Err(e) => {
            eprintln!("skip: cannot connect to db: {}", e);
            return None;
        }
    };
    if let Err(e) = migration::Migrator::up(&db, None).await {
        eprintln!("skip: migrate up failed: {}", e);
        return None;
    }
    Some(db)
}
