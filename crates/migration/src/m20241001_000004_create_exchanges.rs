//! Create `exchanges` table linking a post, its owner and a requester.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Exchanges::Table)
                    .if_not_exists()
                    .col(uuid(Exchanges::Id).primary_key())
                    .col(uuid(Exchanges::PostId).not_null())
                    .col(uuid(Exchanges::RequesterId).not_null())
                    .col(uuid(Exchanges::OwnerId).not_null())
                    .col(
                        ColumnDef::new(Exchanges::Status)
                            .string_len(10)
                            .not_null()
                            .check(Expr::col(Exchanges::Status).is_in(["pending", "accepted", "rejected", "completed"])),
                    )
                    .col(string_len(Exchanges::Location, 255).not_null())
                    .col(timestamp_with_time_zone(Exchanges::ExchangeDate).not_null())
                    .col(timestamp_with_time_zone(Exchanges::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Exchanges::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_exchanges_post")
                            .from(Exchanges::Table, Exchanges::PostId)
                            .to(Posts::Table, Posts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_exchanges_requester")
                            .from(Exchanges::Table, Exchanges::RequesterId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_exchanges_owner")
                            .from(Exchanges::Table, Exchanges::OwnerId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Exchanges::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Exchanges { Table, Id, PostId, RequesterId, OwnerId, Status, Location, ExchangeDate, CreatedAt, UpdatedAt }

#[derive(DeriveIden)]
enum Posts { Table, Id }

#[derive(DeriveIden)]
enum Users { Table, Id }
