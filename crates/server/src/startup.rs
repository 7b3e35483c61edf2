use std::sync::Arc;

use axum::Router;
use migration::MigratorTrait;
use tower_http::cors::CorsLayer;
use tracing::info;

use service::auth::password::Argon2PasswordHasher;
use service::auth::repo::SeaOrmAccountStore;
use service::auth::repository::AccountStore;
use service::auth::token::{JwtTokenService, SystemClock};
use service::auth::AuthService;

use crate::errors::StartupError;
use crate::observability;
use crate::routes::{self, auth::ServerState};

pub fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Wire the auth use-cases from the `[auth]` section. Fails on an empty
/// signing secret or an unusable work factor.
pub fn build_auth_service(cfg: &configs::AuthConfig, store: Arc<dyn AccountStore>) -> Result<AuthService, StartupError> {
    let hasher = Argon2PasswordHasher::new(cfg.hash_memory_kib, cfg.hash_iterations, cfg.hash_parallelism)
        .map_err(|e| StartupError::InvalidConfig(e.to_string()))?;
    let tokens = JwtTokenService::new(&cfg.jwt_secret, cfg.issuer.clone(), cfg.token_ttl(), Arc::new(SystemClock))
        .map_err(|e| StartupError::InvalidConfig(e.to_string()))?;
    Ok(AuthService::new(store, Arc::new(hasher), Arc::new(tokens)))
}

pub fn build_app(auth: AuthService) -> Router {
    routes::build_router(ServerState { auth: Arc::new(auth) }, build_cors())
}

/// Public entry: connect, migrate and serve with an already validated config.
/// Logging is set up by the caller.
pub async fn run(cfg: configs::AppConfig) -> anyhow::Result<()> {
    observability::init_metrics();

    let db = models::db::connect_with_config(&cfg.database)
        .await
        .map_err(|e| StartupError::Database(e.to_string()))?;
    if cfg.database.auto_migrate {
        migration::Migrator::up(&db, None).await?;
        info!("database migrations applied");
    }

    let store: Arc<dyn AccountStore> = Arc::new(SeaOrmAccountStore::new(db));
    let app = build_app(build_auth_service(&cfg.auth, store)?);

    let addr = cfg.server.bind_addr();
    info!(%addr, issuer = %cfg.auth.issuer, "starting server");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
