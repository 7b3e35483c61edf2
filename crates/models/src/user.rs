use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{entity::prelude::*, DatabaseConnection, DbErr, QueryFilter, Set, SqlErr};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{ModelError, UniqueField};
use crate::{book, post};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub username: String,
    #[sea_orm(unique)]
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    pub last_login_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Books,
    Posts,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Books => Entity::has_many(book::Entity).into(),
            Relation::Posts => Entity::has_many(post::Entity).into(),
        }
    }
}

impl Related<book::Entity> for Entity {
    fn to() -> RelationDef { Relation::Books.def() }
}

impl Related<post::Entity> for Entity {
    fn to() -> RelationDef { Relation::Posts.def() }
}

impl ActiveModelBehavior for ActiveModel {}

/// Row to insert at registration; the hash is produced upstream.
#[derive(Clone)]
pub struct NewUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

pub fn validate_username(username: &str) -> Result<(), ModelError> {
    if username.trim().is_empty() { return Err(ModelError::Validation("username required".into())); }
    if username.chars().count() > 50 { return Err(ModelError::Validation("username too long (<=50)".into())); }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), ModelError> {
    if !email.contains('@') { return Err(ModelError::Validation("invalid email".into())); }
    if email.chars().count() > 100 { return Err(ModelError::Validation("email too long (<=100)".into())); }
    Ok(())
}

/// Insert a user. A collision on either unique index comes back as
/// [`ModelError::Duplicate`] naming the column.
pub async fn create(db: &DatabaseConnection, new: NewUser) -> Result<Model, ModelError> {
    validate_username(&new.username)?;
    validate_email(&new.email)?;
    if new.password_hash.trim().is_empty() {
        return Err(ModelError::Validation("password hash required".into()));
    }
    let now = new.created_at.into();
    let am = ActiveModel {
        id: Set(new.id),
        username: Set(new.username),
        email: Set(new.email),
        password_hash: Set(new.password_hash),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        last_login_at: Set(None),
    };
    am.insert(db).await.map_err(map_insert_err)
}

pub async fn find_active_by_username(db: &DatabaseConnection, username: &str) -> Result<Option<Model>, ModelError> {
    Entity::find()
        .filter(Column::Username.eq(username))
        .filter(Column::IsActive.eq(true))
        .one(db)
        .await
        .map_err(|e| ModelError::Db(e.to_string()))
}

pub async fn find_active_by_email(db: &DatabaseConnection, email: &str) -> Result<Option<Model>, ModelError> {
    Entity::find()
        .filter(Column::Email.eq(email))
        .filter(Column::IsActive.eq(true))
        .one(db)
        .await
        .map_err(|e| ModelError::Db(e.to_string()))
}

/// Stamp `last_login_at`. Returns a validation error if no row matched.
pub async fn touch_last_login(db: &DatabaseConnection, id: Uuid, at: DateTime<Utc>) -> Result<(), ModelError> {
    let at: DateTimeWithTimeZone = at.into();
    let res = Entity::update_many()
        .col_expr(Column::LastLoginAt, Expr::value(Some(at)))
        .col_expr(Column::UpdatedAt, Expr::value(at))
        .filter(Column::Id.eq(id))
        .exec(db)
        .await
        .map_err(|e| ModelError::Db(e.to_string()))?;
    if res.rows_affected == 0 {
        return Err(ModelError::Validation("user not found".into()));
    }
    Ok(())
}

pub async fn set_active(db: &DatabaseConnection, id: Uuid, active: bool) -> Result<(), ModelError> {
    let mut found: ActiveModel = Entity::find_by_id(id)
        .one(db)
        .await
        .map_err(|e| ModelError::Db(e.to_string()))?
        .ok_or_else(|| ModelError::Validation("user not found".into()))?
        .into();
    found.is_active = Set(active);
    found.updated_at = Set(Utc::now().into());
    found.update(db).await.map_err(|e| ModelError::Db(e.to_string()))?;
    Ok(())
}

pub async fn hard_delete(db: &DatabaseConnection, id: Uuid) -> Result<(), ModelError> {
    Entity::delete_by_id(id).exec(db).await.map_err(|e| ModelError::Db(e.to_string()))?;
    Ok(())
}

fn map_insert_err(e: DbErr) -> ModelError {
    if let Some(SqlErr::UniqueConstraintViolation(msg)) = e.sql_err() {
        if let Some(field) = unique_field_from_message(&msg) {
            return ModelError::Duplicate(field);
        }
    }
    ModelError::Db(e.to_string())
}

/// Work out which unique index a driver error message refers to.
pub fn unique_field_from_message(msg: &str) -> Option<UniqueField> {
    if msg.contains(migration::UNIQ_USERNAME) {
        Some(UniqueField::Username)
    } else if msg.contains(migration::UNIQ_EMAIL) {
        Some(UniqueField::Email)
    } else {
        None
    }
}
