use chrono::Utc;
use models::errors::{ModelError, UniqueField};
use models::user::{self, NewUser};
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::auth::domain::{Account, NewAccount};
use crate::auth::repository::{AccountStore, StoreError};

/// PostgreSQL-backed account store. Duplicate detection comes from the
/// `uniq_users_username` / `uniq_users_email` indexes.
pub struct SeaOrmAccountStore {
    pub db: DatabaseConnection,
}

impl SeaOrmAccountStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn store_err(e: ModelError) -> StoreError {
    match e {
        ModelError::Duplicate(UniqueField::Username) => StoreError::DuplicateUsername,
        ModelError::Duplicate(UniqueField::Email) => StoreError::DuplicateEmail,
        ModelError::Validation(msg) => StoreError::Invalid(msg),
        other => StoreError::Backend(other.to_string()),
    }
}

#[async_trait::async_trait]
impl AccountStore for SeaOrmAccountStore {
    async fn create(&self, account: NewAccount) -> Result<Account, StoreError> {
        let row = NewUser {
            id: account.id,
            username: account.username,
            email: account.email,
            password_hash: account.password_hash,
            created_at: account.created_at,
        };
        let created = user::create(&self.db, row).await.map_err(store_err)?;
        Ok(created.into())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, StoreError> {
        let found = user::find_active_by_username(&self.db, username).await.map_err(store_err)?;
        Ok(found.map(Account::from))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let found = user::find_active_by_email(&self.db, email).await.map_err(store_err)?;
        Ok(found.map(Account::from))
    }

    async fn update_last_login(&self, id: Uuid) -> Result<(), StoreError> {
        user::touch_last_login(&self.db, id, Utc::now()).await.map_err(store_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_errors_map_to_store_errors() {
        assert!(matches!(store_err(ModelError::Duplicate(UniqueField::Username)), StoreError::DuplicateUsername));
        assert!(matches!(store_err(ModelError::Duplicate(UniqueField::Email)), StoreError::DuplicateEmail));
        assert!(matches!(store_err(ModelError::Db("down".into())), StoreError::Backend(_)));
        assert!(matches!(store_err(ModelError::Validation("bad".into())), StoreError::Invalid(_)));
    }

    fn new_account(username: &str, email: &str) -> NewAccount {
        NewAccount {
            id: Uuid::new_v4(),
            username: username.into(),
            email: email.into(),
            password_hash: "$argon2id$v=19$m=8,t=1,p=1$c2FsdHNhbHQ$aGFzaGhhc2hoYXNo".into(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn column_limits_are_caller_errors() {
        // validation runs before any query, so a disconnected handle is enough
        let store = SeaOrmAccountStore::new(sea_orm::DatabaseConnection::Disconnected);
        let long_name = "a".repeat(51);
        assert!(matches!(store.create(new_account(&long_name, "a@x.com")).await, Err(StoreError::Invalid(_))));
        assert!(matches!(store.create(new_account("alice", "alice")).await, Err(StoreError::Invalid(_))));
    }

    #[tokio::test]
    async fn create_lookup_and_duplicates() {
        let Some(db) = crate::test_support::get_db().await else { return };
        let store = SeaOrmAccountStore::new(db.clone());
        let (name, email) = crate::test_support::unique_identity("store");

        let created = store.create(new_account(&name, &email)).await.unwrap();
        let found = store.find_by_username(&name).await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert_eq!(store.find_by_email(&email).await.unwrap().unwrap().id, created.id);

        let (other_name, other_email) = crate::test_support::unique_identity("store");
        assert!(matches!(store.create(new_account(&name, &other_email)).await, Err(StoreError::DuplicateUsername)));
        assert!(matches!(store.create(new_account(&other_name, &email)).await, Err(StoreError::DuplicateEmail)));

        store.update_last_login(created.id).await.unwrap();
        assert!(store.find_by_username(&name).await.unwrap().unwrap().last_login_at.is_some());

        user::hard_delete(&db, created.id).await.unwrap();
    }

    #[tokio::test]
    async fn inactive_accounts_are_hidden_but_still_unique() {
        let Some(db) = crate::test_support::get_db().await else { return };
        let store = SeaOrmAccountStore::new(db.clone());
        let (name, email) = crate::test_support::unique_identity("inactive");

        let created = store.create(new_account(&name, &email)).await.unwrap();
        user::set_active(&db, created.id, false).await.unwrap();
        assert!(store.find_by_username(&name).await.unwrap().is_none());

        let (_, other_email) = crate::test_support::unique_identity("inactive");
        assert!(matches!(store.create(new_account(&name, &other_email)).await, Err(StoreError::DuplicateUsername)));

        user::hard_delete(&db, created.id).await.unwrap();
    }
}
