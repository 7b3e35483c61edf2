use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::Response;
use axum::{Extension, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use service::auth::domain::{AccountView, LoginInput, RegisterInput};
use service::auth::{AuthError, AuthService};

use crate::errors::ApiError;
use crate::observability::{LOGINS_TOTAL, REGISTRATIONS_TOTAL, TOKEN_REJECTIONS_TOTAL};

pub const AUTH_COOKIE: &str = "auth_token";

/// Longest password the transport will hand to the hasher.
pub const MAX_PASSWORD_CHARS: usize = 1024;

#[derive(Clone)]
pub struct ServerState {
    pub auth: Arc<AuthService>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginOutput {
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MeOutput {
    pub user_id: Uuid,
}

/// Caller identity placed in request extensions by [`require_bearer_token_state`].
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser(pub Uuid);

fn outcome(e: &AuthError) -> &'static str {
    match e {
        AuthError::InvalidInput(_) => "invalid_input",
        AuthError::WeakPassword => "weak_password",
        AuthError::UsernameTaken | AuthError::EmailTaken => "conflict",
        AuthError::InvalidCredentials => "invalid_credentials",
        AuthError::ExpiredToken | AuthError::InvalidToken => "invalid_token",
        AuthError::Internal(_) => "error",
    }
}

fn check_password_length(password: &str) -> Result<(), ApiError> {
    if password.chars().count() > MAX_PASSWORD_CHARS {
        return Err(ApiError::bad_request(format!("password longer than {MAX_PASSWORD_CHARS} characters")));
    }
    Ok(())
}

#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "auth",
    request_body = crate::openapi::RegisterRequest,
    responses(
        (status = 201, description = "Registered", body = crate::openapi::AccountViewDoc),
        (status = 400, description = "Invalid input or weak password", body = crate::openapi::ErrorResponse),
        (status = 409, description = "Username or email taken", body = crate::openapi::ErrorResponse)
    )
)]
pub async fn register(
    State(state): State<ServerState>,
    payload: Result<Json<RegisterInput>, JsonRejection>,
) -> Result<(StatusCode, Json<AccountView>), ApiError> {
    let Json(input) = payload?;
    check_password_length(&input.password)?;
    match state.auth.register(input).await {
        Ok(view) => {
            REGISTRATIONS_TOTAL.with_label_values(&["created"]).inc();
            Ok((StatusCode::CREATED, Json(view)))
        }
        Err(e) => {
            REGISTRATIONS_TOTAL.with_label_values(&[outcome(&e)]).inc();
            Err(e.into())
        }
    }
}

#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = crate::openapi::LoginRequest,
    responses(
        (status = 200, description = "Logged in; also sets the auth_token cookie", body = crate::openapi::TokenResponse),
        (status = 400, description = "Missing fields", body = crate::openapi::ErrorResponse),
        (status = 401, description = "Invalid username or password", body = crate::openapi::ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<ServerState>,
    jar: CookieJar,
    payload: Result<Json<LoginInput>, JsonRejection>,
) -> Result<(CookieJar, Json<LoginOutput>), ApiError> {
    let Json(input) = payload?;
    check_password_length(&input.password)?;
    let token = state.auth.login(input).await.map_err(|e| {
        LOGINS_TOTAL.with_label_values(&[outcome(&e)]).inc();
        ApiError::from(e)
    })?;
    LOGINS_TOTAL.with_label_values(&["success"]).inc();

    let mut cookie = Cookie::new(AUTH_COOKIE, token.clone());
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_secure(false);
    cookie.set_same_site(SameSite::Lax);
    Ok((jar.add(cookie), Json(LoginOutput { token })))
}

#[utoipa::path(post, path = "/auth/logout", tag = "auth", responses((status = 204, description = "Cookie cleared")))]
pub async fn logout(jar: CookieJar) -> (CookieJar, StatusCode) {
    let jar = jar.remove(Cookie::build((AUTH_COOKIE, "")).path("/"));
    (jar, StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "auth",
    responses(
        (status = 200, description = "Caller identity", body = crate::openapi::MeResponse),
        (status = 401, description = "Missing, invalid or expired token", body = crate::openapi::ErrorResponse)
    )
)]
pub async fn me(Extension(user): Extension<AuthenticatedUser>) -> Json<MeOutput> {
    Json(MeOutput { user_id: user.0 })
}

/// Token from `Authorization: Bearer <token>`, falling back to the
/// `auth_token` cookie. A present but non-Bearer header is not retried
/// against the cookie.
fn extract_token(headers: &HeaderMap, jar: &CookieJar) -> Result<String, &'static str> {
    if let Some(value) = headers.get(header::AUTHORIZATION) {
        let value = value.to_str().map_err(|_| "malformed_header")?;
        return match value.strip_prefix("Bearer ") {
            Some(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
            _ => Err("malformed_header"),
        };
    }
    match jar.get(AUTH_COOKIE) {
        Some(c) if !c.value().is_empty() => Ok(c.value().to_string()),
        _ => Err("missing"),
    }
}

/// Route layer for protected endpoints: validates the caller's token and
/// inserts [`AuthenticatedUser`]. Every failure is a 401.
pub async fn require_bearer_token_state(
    State(state): State<ServerState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let path = req.uri().path().to_string();
    let token = extract_token(req.headers(), &jar).map_err(|reason| {
        TOKEN_REJECTIONS_TOTAL.with_label_values(&[reason]).inc();
        tracing::warn!(path = %path, reason, "request without usable token");
        ApiError::unauthorized()
    })?;

    match state.auth.authorize(&token) {
        Ok(user_id) => {
            req.extensions_mut().insert(AuthenticatedUser(user_id));
            Ok(next.run(req).await)
        }
        Err(e) => {
            let reason = if matches!(e, AuthError::ExpiredToken) { "expired" } else { "invalid" };
            TOKEN_REJECTIONS_TOTAL.with_label_values(&[reason]).inc();
            tracing::warn!(path = %path, reason, "token validation failed");
            Err(ApiError::unauthorized())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_header_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        let jar = CookieJar::new().add(Cookie::new(AUTH_COOKIE, "from-cookie"));
        assert_eq!(extract_token(&headers, &jar).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn cookie_is_the_fallback() {
        let jar = CookieJar::new().add(Cookie::new(AUTH_COOKIE, "from-cookie"));
        assert_eq!(extract_token(&HeaderMap::new(), &jar).unwrap(), "from-cookie");
        assert_eq!(extract_token(&HeaderMap::new(), &CookieJar::new()), Err("missing"));
    }

    #[test]
    fn non_bearer_schemes_are_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwdw=="));
        assert_eq!(extract_token(&headers, &CookieJar::new()), Err("malformed_header"));
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(extract_token(&headers, &CookieJar::new()), Err("malformed_header"));
    }

    #[test]
    fn password_length_cap() {
        assert!(check_password_length(&"a".repeat(MAX_PASSWORD_CHARS)).is_ok());
        assert!(check_password_length(&"a".repeat(MAX_PASSWORD_CHARS + 1)).is_err());
    }
}
