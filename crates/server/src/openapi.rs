use chrono::{DateTime, Utc};
use utoipa::OpenApi;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(ToSchema)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    /// 8+ characters with upper, lower, digit and punctuation/symbol
    pub password: String,
}

#[derive(ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(ToSchema)]
pub struct AccountViewDoc {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

#[derive(ToSchema)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(ToSchema)]
pub struct MeResponse {
    pub user_id: Uuid,
}

#[derive(ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::auth::register,
        crate::routes::auth::login,
        crate::routes::auth::logout,
        crate::routes::auth::me,
    ),
    components(schemas(
        HealthResponse,
        RegisterRequest,
        LoginRequest,
        AccountViewDoc,
        TokenResponse,
        MeResponse,
        ErrorResponse,
    )),
    tags((name = "health"), (name = "auth"))
)]
pub struct ApiDoc;
