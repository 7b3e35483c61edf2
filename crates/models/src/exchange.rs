use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{message, post, rating, user};

/// Allowed values of `status`; enforced by a CHECK constraint.
pub const STATUSES: [&str; 4] = ["pending", "accepted", "rejected", "completed"];

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "exchanges")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub post_id: Uuid,
    pub requester_id: Uuid,
    pub owner_id: Uuid,
    pub status: String,
    pub location: String,
    pub exchange_date: DateTimeWithTimeZone,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Post,
    Requester,
    Owner,
    Messages,
    Ratings,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Post => Entity::belongs_to(post::Entity)
                .from(Column::PostId)
                .to(post::Column::Id)
                .into(),
            Relation::Requester => Entity::belongs_to(user::Entity)
                .from(Column::RequesterId)
                .to(user::Column::Id)
                .into(),
            Relation::Owner => Entity::belongs_to(user::Entity)
                .from(Column::OwnerId)
                .to(user::Column::Id)
                .into(),
            Relation::Messages => Entity::has_many(message::Entity).into(),
            Relation::Ratings => Entity::has_many(rating::Entity).into(),
        }
    }
}

impl Related<post::Entity> for Entity {
    fn to() -> RelationDef { Relation::Post.def() }
}

impl Related<message::Entity> for Entity {
    fn to() -> RelationDef { Relation::Messages.def() }
}

impl Related<rating::Entity> for Entity {
    fn to() -> RelationDef { Relation::Ratings.def() }
}

impl ActiveModelBehavior for ActiveModel {}
