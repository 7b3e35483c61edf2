//! Create `messages` table: chat within an exchange.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Messages::Table)
                    .if_not_exists()
                    .col(uuid(Messages::Id).primary_key())
                    .col(uuid(Messages::ExchangeId).not_null())
                    .col(uuid(Messages::SenderId).not_null())
                    .col(text(Messages::Content).not_null())
                    .col(timestamp_with_time_zone(Messages::SentAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_messages_exchange")
                            .from(Messages::Table, Messages::ExchangeId)
                            .to(Exchanges::Table, Exchanges::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_messages_sender")
                            .from(Messages::Table, Messages::SenderId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Messages::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Messages { Table, Id, ExchangeId, SenderId, Content, SentAt }

#[derive(DeriveIden)]
enum Exchanges { Table, Id }

#[derive(DeriveIden)]
enum Users { Table, Id }
