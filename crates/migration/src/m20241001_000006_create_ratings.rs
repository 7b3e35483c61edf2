//! Create `ratings` table: one user scoring another after an exchange.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Ratings::Table)
                    .if_not_exists()
                    .col(uuid(Ratings::Id).primary_key())
                    .col(uuid(Ratings::ExchangeId).not_null())
                    .col(uuid(Ratings::RaterId).not_null())
                    .col(uuid(Ratings::RateeId).not_null())
                    .col(
                        ColumnDef::new(Ratings::Rating)
                            .integer()
                            .not_null()
                            .check(Expr::col(Ratings::Rating).between(1, 5)),
                    )
                    .col(ColumnDef::new(Ratings::Comment).text().null())
                    .col(timestamp_with_time_zone(Ratings::CreatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ratings_exchange")
                            .from(Ratings::Table, Ratings::ExchangeId)
                            .to(Exchanges::Table, Exchanges::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ratings_rater")
                            .from(Ratings::Table, Ratings::RaterId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ratings_ratee")
                            .from(Ratings::Table, Ratings::RateeId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Ratings::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Ratings { Table, Id, ExchangeId, RaterId, RateeId, Rating, Comment, CreatedAt }

#[derive(DeriveIden)]
enum Exchanges { Table, Id }

#[derive(DeriveIden)]
enum Users { Table, Id }
