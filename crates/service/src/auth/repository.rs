use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use super::domain::{Account, NewAccount};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("username already exists")]
    DuplicateUsername,
    #[error("email already exists")]
    DuplicateEmail,
    /// The record breaks a column constraint (length, email shape).
    #[error("{0}")]
    Invalid(String),
    #[error("store failure: {0}")]
    Backend(String),
}

/// Persistence for accounts.
///
/// Uniqueness of username and email is enforced here, across active and
/// inactive accounts alike. Lookups only ever return active accounts.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn create(&self, account: NewAccount) -> Result<Account, StoreError>;
    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, StoreError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError>;
    async fn update_last_login(&self, id: Uuid) -> Result<(), StoreError>;
}

/// In-memory store for tests and doc examples
pub mod mock {
    use super::*;
    use chrono::Utc;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Mutex, MutexGuard};

    #[derive(Default)]
    pub struct InMemoryAccountStore {
        accounts: Mutex<HashMap<Uuid, Account>>, // key: account id
        fail_last_login: AtomicBool,
    }

    impl InMemoryAccountStore {
        fn guard(&self) -> Result<MutexGuard<'_, HashMap<Uuid, Account>>, StoreError> {
            self.accounts.lock().map_err(|_| StoreError::Backend("account map poisoned".into()))
        }

        /// Mark an account inactive. Returns false if no such username.
        pub fn deactivate(&self, username: &str) -> bool {
            let Ok(mut accounts) = self.guard() else { return false };
            match accounts.values_mut().find(|a| a.username == username) {
                Some(a) => {
                    a.is_active = false;
                    true
                }
                None => false,
            }
        }

        /// Make every subsequent `update_last_login` fail.
        pub fn fail_last_login_updates(&self, fail: bool) {
            self.fail_last_login.store(fail, Ordering::SeqCst);
        }

        /// Raw record lookup, ignoring the active flag.
        pub fn get(&self, id: Uuid) -> Option<Account> {
            self.guard().ok()?.get(&id).cloned()
        }

        pub fn len(&self) -> usize {
            self.guard().map(|a| a.len()).unwrap_or(0)
        }

        pub fn is_empty(&self) -> bool {
            self.len() == 0
        }
    }

    #[async_trait]
    impl AccountStore for InMemoryAccountStore {
        async fn create(&self, new: NewAccount) -> Result<Account, StoreError> {
            // same column limits as the users table
            models::user::validate_username(&new.username).map_err(|e| StoreError::Invalid(e.to_string()))?;
            models::user::validate_email(&new.email).map_err(|e| StoreError::Invalid(e.to_string()))?;
            let mut accounts = self.guard()?;
            if accounts.values().any(|a| a.username == new.username) {
                return Err(StoreError::DuplicateUsername);
            }
            if accounts.values().any(|a| a.email == new.email) {
                return Err(StoreError::DuplicateEmail);
            }
            let account = Account {
                id: new.id,
                username: new.username,
                email: new.email,
                password_hash: new.password_hash,
                created_at: new.created_at,
                last_login_at: None,
                is_active: true,
            };
            accounts.insert(account.id, account.clone());
            Ok(account)
        }

        async fn find_by_username(&self, username: &str) -> Result<Option<Account>, StoreError> {
            let accounts = self.guard()?;
            Ok(accounts.values().find(|a| a.is_active && a.username == username).cloned())
        }

        async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
            let accounts = self.guard()?;
            Ok(accounts.values().find(|a| a.is_active && a.email == email).cloned())
        }

        async fn update_last_login(&self, id: Uuid) -> Result<(), StoreError> {
            if self.fail_last_login.load(Ordering::SeqCst) {
                return Err(StoreError::Backend("last login update disabled".into()));
            }
            let mut accounts = self.guard()?;
            let account = accounts.get_mut(&id).ok_or_else(|| StoreError::Backend(format!("no account {id}")))?;
            account.last_login_at = Some(Utc::now());
            Ok(())
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        fn new_account(username: &str, email: &str) -> NewAccount {
            NewAccount {
                id: Uuid::new_v4(),
                username: username.into(),
                email: email.into(),
                password_hash: "$argon2id$v=19$m=8,t=1,p=1$c2FsdA$aGFzaA".into(),
                created_at: Utc::now(),
            }
        }

        #[tokio::test]
        async fn create_and_find() {
            let store = InMemoryAccountStore::default();
            let created = store.create(new_account("alice", "alice@x.com")).await.unwrap();
            assert!(created.is_active);
            let by_name = store.find_by_username("alice").await.unwrap().unwrap();
            assert_eq!(by_name.id, created.id);
            let by_email = store.find_by_email("alice@x.com").await.unwrap().unwrap();
            assert_eq!(by_email.id, created.id);
            assert!(store.find_by_username("Alice").await.unwrap().is_none());
        }

        #[tokio::test]
        async fn uniqueness_includes_inactive_accounts() {
            let store = InMemoryAccountStore::default();
            store.create(new_account("alice", "alice@x.com")).await.unwrap();
            assert!(store.deactivate("alice"));
            assert!(store.find_by_username("alice").await.unwrap().is_none());
            assert!(matches!(
                store.create(new_account("alice", "other@x.com")).await,
                Err(StoreError::DuplicateUsername)
            ));
            assert!(matches!(
                store.create(new_account("other", "alice@x.com")).await,
                Err(StoreError::DuplicateEmail)
            ));
            assert_eq!(store.len(), 1);
        }

        #[tokio::test]
        async fn column_limits_are_enforced() {
            let store = InMemoryAccountStore::default();
            let long_name = "a".repeat(51);
            assert!(matches!(store.create(new_account(&long_name, "a@x.com")).await, Err(StoreError::Invalid(_))));
            assert!(matches!(store.create(new_account("alice", "no-at-sign")).await, Err(StoreError::Invalid(_))));
            assert!(store.is_empty());
        }

        #[tokio::test]
        async fn last_login_is_stamped() {
            let store = InMemoryAccountStore::default();
            let a = store.create(new_account("bob", "bob@x.com")).await.unwrap();
            store.update_last_login(a.id).await.unwrap();
            assert!(store.get(a.id).unwrap().last_login_at.is_some());
            store.fail_last_login_updates(true);
            assert!(store.update_last_login(a.id).await.is_err());
            assert!(store.update_last_login(Uuid::new_v4()).await.is_err());
        }
    }
}
