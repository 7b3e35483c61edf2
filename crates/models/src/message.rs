use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{exchange, user};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "messages")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub exchange_id: Uuid,
    pub sender_id: Uuid,
    #[sea_orm(column_type = "Text")]
    pub content: String,
    pub sent_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Exchange,
    Sender,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Exchange => Entity::belongs_to(exchange::Entity)
                .from(Column::ExchangeId)
                .to(exchange::Column::Id)
                .into(),
            Relation::Sender => Entity::belongs_to(user::Entity)
                .from(Column::SenderId)
                .to(user::Column::Id)
                .into(),
        }
    }
}

impl Related<exchange::Entity> for Entity {
    fn to() -> RelationDef { Relation::Exchange.def() }
}

impl ActiveModelBehavior for ActiveModel {}
