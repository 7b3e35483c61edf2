use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{book, exchange, user};

/// Allowed values of `exchange_type`; enforced by a CHECK constraint.
pub const EXCHANGE_TYPES: [&str; 2] = ["permanent", "temporary"];

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "posts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub book_id: Uuid,
    pub exchange_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_until: Option<DateTimeWithTimeZone>,
    pub location: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    User,
    Book,
    Exchanges,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::User => Entity::belongs_to(user::Entity)
                .from(Column::UserId)
                .to(user::Column::Id)
                .into(),
            Relation::Book => Entity::belongs_to(book::Entity)
                .from(Column::BookId)
                .to(book::Column::Id)
                .into(),
            Relation::Exchanges => Entity::has_many(exchange::Entity).into(),
        }
    }
}

impl Related<user::Entity> for Entity {
    fn to() -> RelationDef { Relation::User.def() }
}

impl Related<book::Entity> for Entity {
    fn to() -> RelationDef { Relation::Book.def() }
}

impl Related<exchange::Entity> for Entity {
    fn to() -> RelationDef { Relation::Exchanges.def() }
}

impl ActiveModelBehavior for ActiveModel {}
