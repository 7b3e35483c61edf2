//! Create `posts` table: a user offering one of their books.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Posts::Table)
                    .if_not_exists()
                    .col(uuid(Posts::Id).primary_key())
                    .col(uuid(Posts::UserId).not_null())
                    .col(uuid(Posts::BookId).not_null())
                    .col(
                        ColumnDef::new(Posts::ExchangeType)
                            .string_len(10)
                            .not_null()
                            .check(Expr::col(Posts::ExchangeType).is_in(["permanent", "temporary"])),
                    )
                    .col(
                        ColumnDef::new(Posts::AvailableUntil)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(string_len(Posts::Location, 255).not_null())
                    .col(timestamp_with_time_zone(Posts::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Posts::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_posts_user")
                            .from(Posts::Table, Posts::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_posts_book")
                            .from(Posts::Table, Posts::BookId)
                            .to(Books::Table, Books::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Posts::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Posts { Table, Id, UserId, BookId, ExchangeType, AvailableUntil, Location, CreatedAt, UpdatedAt }

#[derive(DeriveIden)]
enum Users { Table, Id }

#[derive(DeriveIden)]
enum Books { Table, Id }
