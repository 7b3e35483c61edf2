//! Create `books` table owned by a user.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Books::Table)
                    .if_not_exists()
                    .col(uuid(Books::Id).primary_key())
                    .col(uuid(Books::UserId).not_null())
                    .col(string_len(Books::Title, 255).not_null())
                    .col(string_len(Books::Author, 255).not_null())
                    .col(ColumnDef::new(Books::Description).text().null())
                    .col(boolean(Books::IsAvailable).not_null().default(true))
                    .col(timestamp_with_time_zone(Books::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Books::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_books_user")
                            .from(Books::Table, Books::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Books::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Books { Table, Id, UserId, Title, Author, Description, IsAvailable, CreatedAt, UpdatedAt }

#[derive(DeriveIden)]
enum Users { Table, Id }
