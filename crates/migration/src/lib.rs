//! Migrator registering entity-specific migrations in dependency order.
//! Secondary indexes are applied last.
pub use sea_orm_migration::prelude::*;

mod m20241001_000001_create_users;
mod m20241001_000002_create_books;
mod m20241001_000003_create_posts;
mod m20241001_000004_create_exchanges;
mod m20241001_000005_create_messages;
mod m20241001_000006_create_ratings;
mod m20241001_000007_add_indexes;

pub use m20241001_000001_create_users::{UNIQ_EMAIL, UNIQ_USERNAME};

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20241001_000001_create_users::Migration),
            Box::new(m20241001_000002_create_books::Migration),
            Box::new(m20241001_000003_create_posts::Migration),
            Box::new(m20241001_000004_create_exchanges::Migration),
            Box::new(m20241001_000005_create_messages::Migration),
            Box::new(m20241001_000006_create_ratings::Migration),
            // Indexes should always be applied last
            Box::new(m20241001_000007_add_indexes::Migration),
        ]
    }
}
