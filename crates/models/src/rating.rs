use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{exchange, user};

/// Inclusive score range; enforced by a CHECK constraint.
pub const SCORE_RANGE: std::ops::RangeInclusive<i32> = 1..=5;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ratings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub exchange_id: Uuid,
    pub rater_id: Uuid,
    pub ratee_id: Uuid,
    pub rating: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[sea_orm(column_type = "Text", nullable)]
    pub comment: Option<String>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Exchange,
    Rater,
    Ratee,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Exchange => Entity::belongs_to(exchange::Entity)
                .from(Column::ExchangeId)
                .to(exchange::Column::Id)
                .into(),
            Relation::Rater => Entity::belongs_to(user::Entity)
                .from(Column::RaterId)
                .to(user::Column::Id)
                .into(),
            Relation::Ratee => Entity::belongs_to(user::Entity)
                .from(Column::RateeId)
                .to(user::Column::Id)
                .into(),
        }
    }
}

impl Related<exchange::Entity> for Entity {
    fn to() -> RelationDef { Relation::Exchange.def() }
}

impl ActiveModelBehavior for ActiveModel {}
