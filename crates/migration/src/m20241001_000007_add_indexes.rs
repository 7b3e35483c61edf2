use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

const INDEXES: &[(&str, &str, &str)] = &[
    ("idx_books_user", "books", "user_id"),
    ("idx_posts_user", "posts", "user_id"),
    ("idx_posts_book", "posts", "book_id"),
    ("idx_exchanges_post", "exchanges", "post_id"),
    ("idx_exchanges_requester", "exchanges", "requester_id"),
    ("idx_exchanges_owner", "exchanges", "owner_id"),
    ("idx_messages_exchange", "messages", "exchange_id"),
    ("idx_ratings_exchange", "ratings", "exchange_id"),
    ("idx_ratings_ratee", "ratings", "ratee_id"),
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Foreign-key lookup indexes
        for (name, table, col) in INDEXES {
            manager
                .create_index(
                    Index::create()
                        .name(*name)
                        .table(Alias::new(*table))
                        .col(Alias::new(*col))
                        .if_not_exists()
                        .to_owned(),
                )
                .await?;
        }
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for (name, table, _) in INDEXES {
            manager
                .drop_index(Index::drop().name(*name).table(Alias::new(*table)).to_owned())
                .await?;
        }
        Ok(())
    }
}
