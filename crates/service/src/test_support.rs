#![cfg(test)]
use migration::MigratorTrait;
use models::db::{connect_with_config, DATABASE_URL};
use sea_orm::DatabaseConnection;
use tokio::sync::OnceCell;

// Migrations run once per test process; `false` means the database is unusable.
static MIGRATED: OnceCell<bool> = OnceCell::const_new();

fn test_config() -> configs::DatabaseConfig {
    configs::DatabaseConfig {
        url: DATABASE_URL.clone(),
        max_connections: 5,
        min_connections: 1,
        connect_timeout_secs: 2,
        acquire_timeout_secs: 2,
        ..Default::default()
    }
}

/// A migrated connection, or `None` when DB tests should be skipped
/// (`SKIP_DB_TESTS` set, or no database reachable).
pub async fn get_db() -> Option<DatabaseConnection> {
    if std::env::var("SKIP_DB_TESTS").is_ok() {
        return None;
    }
    let ready = *MIGRATED
        .get_or_init(|| async {
            match connect_with_config(&test_config()).await {
                Ok(db) => match migration::Migrator::up(&db, None).await {
                    Ok(()) => true,
                    Err(e) => {
                        eprintln!("skip: migrate up failed: {e}");
                        false
                    }
                },
                Err(e) => {
                    eprintln!("skip: cannot connect to db: {e}");
                    false
                }
            }
        })
        .await;
    if !ready {
        return None;
    }
    // fresh connection for the current test's runtime
    connect_with_config(&test_config()).await.ok()
}

/// Username/email pair that will not collide with other test runs.
pub fn unique_identity(prefix: &str) -> (String, String) {
    let tag = uuid::Uuid::new_v4().simple().to_string();
    let name = format!("{prefix}_{}", &tag[..12]);
    let email = format!("{name}@test.local");
    (name, email)
}
