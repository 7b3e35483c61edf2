use std::sync::Arc;

use chrono::Utc;
use tokio::sync::OnceCell;
use tracing::{debug, error, info, instrument, warn};
use models::user::{validate_email, validate_username};
use uuid::Uuid;

use super::domain::{AccountView, LoginInput, NewAccount, RegisterInput};
use super::errors::AuthError;
use super::password::{PasswordError, PasswordHasher};
use super::policy::PasswordPolicy;
use super::repository::AccountStore;
use super::token::TokenService;

// Verified against when the username is unknown, so both failure paths cost a hash.
const DUMMY_PASSWORD: &str = "Dummy-passw0rd!";

/// Auth business service independent of web framework
pub struct AuthService {
    store: Arc<dyn AccountStore>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: Arc<dyn TokenService>,
    policy: PasswordPolicy,
    dummy_hash: OnceCell<String>,
}

impl AuthService {
    pub fn new(store: Arc<dyn AccountStore>, hasher: Arc<dyn PasswordHasher>, tokens: Arc<dyn TokenService>) -> Self {
        Self { store, hasher, tokens, policy: PasswordPolicy::default(), dummy_hash: OnceCell::new() }
    }

    pub fn with_policy(mut self, policy: PasswordPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Register a new account with a hashed password.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    /// use service::auth::{AuthService, domain::RegisterInput};
    /// use service::auth::password::Argon2PasswordHasher;
    /// use service::auth::repository::mock::InMemoryAccountStore;
    /// use service::auth::token::{JwtTokenService, SystemClock};
    ///
    /// let tokens = JwtTokenService::new("secret", "book-exchange", std::time::Duration::from_secs(3600), Arc::new(SystemClock)).unwrap();
    /// let svc = AuthService::new(
    ///     Arc::new(InMemoryAccountStore::default()),
    ///     Arc::new(Argon2PasswordHasher::new(8, 1, 1).unwrap()),
    ///     Arc::new(tokens),
    /// );
    /// let input = RegisterInput { username: "alice".into(), email: "alice@x.com".into(), password: "Abcdef1!".into() };
    /// let view = tokio_test::block_on(svc.register(input)).unwrap();
    /// assert_eq!(view.username, "alice");
    /// ```
    #[instrument(skip(self, input), fields(username = %input.username))]
    pub async fn register(&self, input: RegisterInput) -> Result<AccountView, AuthError> {
        let RegisterInput { username, email, password } = input;
        if username.trim().is_empty() || email.trim().is_empty() || password.is_empty() {
            return Err(AuthError::invalid_input("username, email and password are required"));
        }
        validate_username(&username).map_err(|e| AuthError::invalid_input(e.to_string()))?;
        validate_email(&email).map_err(|e| AuthError::invalid_input(e.to_string()))?;
        if !self.policy.is_acceptable(&password) {
            debug!(violations = ?self.policy.violations(&password), "weak password rejected");
            return Err(AuthError::WeakPassword);
        }

        // Advisory only; the store's unique constraints decide under races.
        if self.store.find_by_username(&username).await?.is_some() {
            return Err(AuthError::UsernameTaken);
        }
        if self.store.find_by_email(&email).await?.is_some() {
            return Err(AuthError::EmailTaken);
        }

        let password_hash = self.hash(password).await?;
        let account = self
            .store
            .create(NewAccount { id: Uuid::new_v4(), username, email, password_hash, created_at: Utc::now() })
            .await?;
        info!(user_id = %account.id, algorithm = self.hasher.algorithm(), "user_registered");
        Ok(account.into())
    }

    /// Check credentials and issue a token.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    /// use service::auth::{AuthService, domain::{LoginInput, RegisterInput}};
    /// use service::auth::password::Argon2PasswordHasher;
    /// use service::auth::repository::mock::InMemoryAccountStore;
    /// use service::auth::token::{JwtTokenService, SystemClock};
    ///
    /// let tokens = JwtTokenService::new("secret", "book-exchange", std::time::Duration::from_secs(3600), Arc::new(SystemClock)).unwrap();
    /// let svc = AuthService::new(
    ///     Arc::new(InMemoryAccountStore::default()),
    ///     Arc::new(Argon2PasswordHasher::new(8, 1, 1).unwrap()),
    ///     Arc::new(tokens),
    /// );
    /// let reg = RegisterInput { username: "carol".into(), email: "c@x.com".into(), password: "Abcdef1!".into() };
    /// let view = tokio_test::block_on(svc.register(reg)).unwrap();
    /// let token = tokio_test::block_on(svc.login(LoginInput { username: "carol".into(), password: "Abcdef1!".into(), email: None })).unwrap();
    /// assert_eq!(svc.authorize(&token).unwrap(), view.id);
    /// ```
    #[instrument(skip(self, input), fields(username = %input.username))]
    pub async fn login(&self, input: LoginInput) -> Result<String, AuthError> {
        if input.username.trim().is_empty() || input.password.is_empty() {
            return Err(AuthError::invalid_input("username and password are required"));
        }

        let Some(account) = self.store.find_by_username(&input.username).await? else {
            self.dummy_verify(input.password).await;
            debug!("unknown username");
            return Err(AuthError::InvalidCredentials);
        };

        match self.verify(input.password, account.password_hash.clone()).await {
            Ok(()) => {}
            Err(PasswordError::MalformedHash(e)) => {
                error!(user_id = %account.id, error = %e, "stored password hash is malformed");
                return Err(AuthError::InvalidCredentials);
            }
            Err(e) => return Err(e.into()),
        }

        if let Err(e) = self.store.update_last_login(account.id).await {
            warn!(user_id = %account.id, error = %e, "failed to record last login");
        }

        let token = self.tokens.issue(account.id)?;
        info!(user_id = %account.id, "user_logged_in");
        Ok(token)
    }

    /// Resolve a bearer token to the account id it was issued for.
    pub fn authorize(&self, token: &str) -> Result<Uuid, AuthError> {
        self.tokens.validate(token).map_err(|e| {
            debug!(error = %e, "token rejected");
            AuthError::from(e)
        })
    }

    async fn hash(&self, password: String) -> Result<String, AuthError> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AuthError::Internal(format!("hash task failed: {e}")))?
            .map_err(AuthError::from)
    }

    async fn verify(&self, password: String, hash: String) -> Result<(), PasswordError> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|e| PasswordError::Hashing(format!("verify task failed: {e}")))?
    }

    async fn dummy_verify(&self, password: String) {
        let dummy = self.dummy_hash.get_or_try_init(|| self.hash(DUMMY_PASSWORD.to_string())).await;
        match dummy {
            Ok(hash) => {
                let _ = self.verify(password, hash.clone()).await;
            }
            Err(e) => warn!(error = %e, "could not prepare dummy hash"),
        }
    }
}
