//! Stateless identity tokens (HS256 JWT).

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("invalid token: {0}")]
    Invalid(String),
    #[error("signing secret is empty")]
    MissingSecret,
    #[error("token signing failed: {0}")]
    Signing(String),
}

/// Source of "now" for issuing and expiring tokens.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to. Second resolution.
#[derive(Debug)]
pub struct ManualClock {
    secs: AtomicI64,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self { secs: AtomicI64::new(start.timestamp()) }
    }

    pub fn advance(&self, by: Duration) {
        self.secs.fetch_add(by.as_secs() as i64, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        let secs = self.secs.load(Ordering::SeqCst);
        Utc.timestamp_opt(secs, 0).single().unwrap_or_else(Utc::now)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Account id
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
}

pub trait TokenService: Send + Sync {
    /// Sign a token for `subject` valid for the configured lifetime.
    fn issue(&self, subject: Uuid) -> Result<String, TokenError>;

    /// Check signature, algorithm, issuer and expiry; return the subject.
    fn validate(&self, token: &str) -> Result<Uuid, TokenError>;
}

pub struct JwtTokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for JwtTokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtTokenService")
            .field("issuer", &self.issuer)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl JwtTokenService {
    pub fn new(secret: &str, issuer: impl Into<String>, ttl: Duration, clock: Arc<dyn Clock>) -> Result<Self, TokenError> {
        if secret.trim().is_empty() {
            return Err(TokenError::MissingSecret);
        }
        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            issuer: issuer.into(),
            ttl,
            clock,
        })
    }

    fn validation(&self) -> Validation {
        let mut v = Validation::new(Algorithm::HS256);
        // expiry is checked against the injected clock instead
        v.validate_exp = false;
        v.leeway = 0;
        v.set_issuer(&[self.issuer.as_str()]);
        v.set_required_spec_claims(&["sub", "iat", "exp", "iss"]);
        v
    }
}

impl TokenService for JwtTokenService {
    fn issue(&self, subject: Uuid) -> Result<String, TokenError> {
        let iat = self.clock.now().timestamp();
        let exp = i64::try_from(self.ttl.as_secs())
            .ok()
            .and_then(|ttl| iat.checked_add(ttl))
            .ok_or_else(|| TokenError::Signing("token lifetime out of range".into()))?;
        let claims = Claims {
            sub: subject.to_string(),
            iat,
            exp,
            iss: self.issuer.clone(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(|e| TokenError::Signing(e.to_string()))
    }

    fn validate(&self, token: &str) -> Result<Uuid, TokenError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation())
            .map_err(|e| TokenError::Invalid(e.to_string()))?;
        let subject = Uuid::parse_str(&data.claims.sub).map_err(|_| TokenError::Invalid("subject is not an id".into()))?;
        if self.clock.now().timestamp() >= data.claims.exp {
            return Err(TokenError::Expired);
        }
        Ok(subject)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: Duration = Duration::from_secs(24 * 3600);

    fn setup() -> (Arc<ManualClock>, JwtTokenService) {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let svc = JwtTokenService::new("test-secret", "book-exchange", DAY, clock.clone()).unwrap();
        (clock, svc)
    }

    fn segments(token: &str) -> Vec<String> {
        token.split('.').map(str::to_string).collect()
    }

    #[test]
    fn issue_then_validate_returns_subject() {
        let (_, svc) = setup();
        let id = Uuid::new_v4();
        let token = svc.issue(id).unwrap();
        assert_eq!(segments(&token).len(), 3);
        assert_eq!(svc.validate(&token).unwrap(), id);
    }

    #[test]
    fn expires_exactly_at_ttl() {
        let (clock, svc) = setup();
        let token = svc.issue(Uuid::new_v4()).unwrap();
        clock.advance(DAY - Duration::from_secs(1));
        assert!(svc.validate(&token).is_ok());
        clock.advance(Duration::from_secs(1));
        assert!(matches!(svc.validate(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn claims_carry_issuer_and_lifetime() {
        let (clock, svc) = setup();
        let token = svc.issue(Uuid::new_v4()).unwrap();
        let claims = decode::<Claims>(&token, &svc.decoding, &svc.validation()).unwrap().claims;
        assert_eq!(claims.iss, "book-exchange");
        assert_eq!(claims.iat, clock.now().timestamp());
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
    }

    #[test]
    fn different_secret_is_invalid() {
        let (clock, svc) = setup();
        let other = JwtTokenService::new("another-secret", "book-exchange", DAY, clock).unwrap();
        let token = other.issue(Uuid::new_v4()).unwrap();
        assert!(matches!(svc.validate(&token), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn other_algorithm_is_invalid() {
        let (clock, svc) = setup();
        let iat = clock.now().timestamp();
        let claims = Claims { sub: Uuid::new_v4().to_string(), iat, exp: iat + 3600, iss: "book-exchange".into() };
        let token = encode(&Header::new(Algorithm::HS512), &claims, &EncodingKey::from_secret(b"test-secret")).unwrap();
        assert!(matches!(svc.validate(&token), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn alg_none_is_invalid() {
        let (_, svc) = setup();
        let token = svc.issue(Uuid::new_v4()).unwrap();
        let parts = segments(&token);
        // {"alg":"none","typ":"JWT"}
        let forged = format!("eyJhbGciOiJub25lIiwidHlwIjoiSldUIn0.{}.", parts[1]);
        assert!(matches!(svc.validate(&forged), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn wrong_issuer_is_invalid() {
        let (clock, svc) = setup();
        let other = JwtTokenService::new("test-secret", "someone-else", DAY, clock).unwrap();
        let token = other.issue(Uuid::new_v4()).unwrap();
        assert!(matches!(svc.validate(&token), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn non_uuid_subject_is_invalid() {
        let (clock, svc) = setup();
        let iat = clock.now().timestamp();
        let claims = Claims { sub: "alice".into(), iat, exp: iat + 3600, iss: "book-exchange".into() };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(b"test-secret")).unwrap();
        assert!(matches!(svc.validate(&token), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn garbage_is_invalid() {
        let (_, svc) = setup();
        for bad in ["", "abc", "a.b.c", "Bearer x.y.z"] {
            assert!(matches!(svc.validate(bad), Err(TokenError::Invalid(_))), "{bad:?}");
        }
    }

    #[test]
    fn out_of_range_lifetime_fails_to_issue() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let svc = JwtTokenService::new("secret", "book-exchange", Duration::from_secs(u64::MAX), clock).unwrap();
        assert!(matches!(svc.issue(Uuid::new_v4()), Err(TokenError::Signing(_))));
    }

    #[test]
    fn empty_secret_fails_at_construction() {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        assert!(matches!(JwtTokenService::new("", "i", DAY, clock.clone()), Err(TokenError::MissingSecret)));
        assert!(matches!(JwtTokenService::new("   ", "i", DAY, clock), Err(TokenError::MissingSecret)));
    }
}
