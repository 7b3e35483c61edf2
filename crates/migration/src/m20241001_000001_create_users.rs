//! Create `users` table.
//!
//! `username` and `email` each carry a unique index; these constraints, not the
//! application-level pre-checks, decide who wins a concurrent registration.
use sea_orm_migration::{prelude::*, schema::*};

pub const UNIQ_USERNAME: &str = "uniq_users_username";
pub const UNIQ_EMAIL: &str = "uniq_users_email";

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(uuid(Users::Id).primary_key())
                    .col(string_len(Users::Username, 50).not_null())
                    .col(string_len(Users::Email, 100).not_null())
                    .col(string_len(Users::PasswordHash, 255).not_null())
                    .col(boolean(Users::IsActive).not_null().default(true))
                    .col(timestamp_with_time_zone(Users::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Users::UpdatedAt).not_null())
                    .col(
                        ColumnDef::new(Users::LastLoginAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name(UNIQ_USERNAME)
                    .table(Users::Table)
                    .col(Users::Username)
                    .unique()
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name(UNIQ_EMAIL)
                    .table(Users::Table)
                    .col(Users::Email)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Users::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Users { Table, Id, Username, Email, PasswordHash, IsActive, CreatedAt, UpdatedAt, LastLoginAt }
