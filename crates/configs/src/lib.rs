use anyhow::anyhow;
use anyhow::Result;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 3000,
            worker_threads: Some(4),
            log_format: default_log_format(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_max_lifetime")]
    pub max_lifetime_secs: u64,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
    #[serde(default)]
    pub sqlx_logging: bool,
    /// Apply pending migrations when the server starts.
    #[serde(default = "default_auto_migrate")]
    pub auto_migrate: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            idle_timeout_secs: default_idle_timeout(),
            max_lifetime_secs: default_max_lifetime(),
            acquire_timeout_secs: default_acquire_timeout(),
            sqlx_logging: false,
            auto_migrate: default_auto_migrate(),
        }
    }
}

/// Token signing and password hashing parameters.
///
/// `jwt_secret` has no default: an empty secret is rejected by
/// [`AuthConfig::validate`] and the server refuses to start.
#[derive(Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub jwt_secret: String,
    #[serde(default = "default_issuer")]
    pub issuer: String,
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: u64,
    /// Argon2 memory cost in KiB.
    #[serde(default = "default_hash_memory_kib")]
    pub hash_memory_kib: u32,
    #[serde(default = "default_hash_iterations")]
    pub hash_iterations: u32,
    #[serde(default = "default_hash_parallelism")]
    pub hash_parallelism: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            issuer: default_issuer(),
            token_ttl_hours: default_token_ttl_hours(),
            hash_memory_kib: default_hash_memory_kib(),
            hash_iterations: default_hash_iterations(),
            hash_parallelism: default_hash_parallelism(),
        }
    }
}

// Manual impl keeps the secret out of logs.
impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("issuer", &self.issuer)
            .field("token_ttl_hours", &self.token_ttl_hours)
            .field("hash_memory_kib", &self.hash_memory_kib)
            .field("hash_iterations", &self.hash_iterations)
            .field("hash_parallelism", &self.hash_parallelism)
            .finish()
    }
}

fn default_log_format() -> String { "compact".into() }
fn default_max_connections() -> u32 { 10 }
fn default_min_connections() -> u32 { 2 }
fn default_connect_timeout() -> u64 { 30 }
fn default_idle_timeout() -> u64 { 600 }
fn default_max_lifetime() -> u64 { 3600 }
fn default_acquire_timeout() -> u64 { 30 }
fn default_auto_migrate() -> bool { true }
fn default_issuer() -> String { "book-exchange".into() }
fn default_token_ttl_hours() -> u64 { 24 }
fn default_hash_memory_kib() -> u32 { 19 * 1024 }
fn default_hash_iterations() -> u32 { 2 }
fn default_hash_parallelism() -> u32 { 1 }

/// Longest token lifetime accepted from config (one year).
pub const MAX_TOKEN_TTL_HOURS: u64 = 24 * 365;

fn config_path() -> String {
    std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string())
}

/// Read and parse `path`. A missing file yields defaults; a file that exists
/// and cannot be read or parsed is an error.
pub fn load_from_file_or_default(path: &str) -> Result<AppConfig> {
    match std::fs::read_to_string(path) {
        Ok(content) => parse(&content).map_err(|e| anyhow!("{path}: {e}")),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(e) => Err(anyhow!("{path}: {e}")),
    }
}

pub fn parse(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    /// Load `config.toml` (or `CONFIG_PATH`) when present, otherwise start from
    /// defaults. Environment variables then override, and the result is
    /// validated.
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = load_from_file_or_default(&config_path())?;
        cfg.apply_env(|key| std::env::var(key).ok());
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    /// Overlay environment values. `lookup` is injectable so tests do not
    /// touch the process environment.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(host) = lookup("SERVER_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("SERVER_PORT").and_then(|p| p.parse::<u16>().ok()) {
            self.server.port = port;
        }
        if let Some(w) = lookup("TOKIO_WORKER_THREADS").and_then(|v| v.parse::<usize>().ok()) {
            self.server.worker_threads = Some(w);
        }
        if let Some(fmt) = lookup("LOG_FORMAT") {
            self.server.log_format = fmt;
        }
        self.database.normalize_from_env(&lookup);
        if let Some(secret) = lookup("JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }
        if let Some(issuer) = lookup("JWT_ISSUER") {
            self.auth.issuer = issuer;
        }
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize()?;
        self.database.validate()?;
        self.auth.validate()?;
        Ok(())
    }
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "0.0.0.0".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be in 1..=65535"));
        }
        match self.worker_threads {
            Some(0) | None => self.worker_threads = Some(4),
            Some(_) => {}
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl DatabaseConfig {
    /// Override the URL from `DATABASE_URL`, or else assemble one from the
    /// discrete `DB_HOST`/`DB_USER`/`DB_PASSWORD`/`DB_NAME`/`DB_PORT` variables.
    /// Without either, the file's URL stays.
    pub fn normalize_from_env(&mut self, lookup: &impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("DATABASE_URL").filter(|u| !u.trim().is_empty()) {
            self.url = url;
            return;
        }
        if let Some(host) = lookup("DB_HOST") {
            let user = lookup("DB_USER").unwrap_or_else(|| "postgres".into());
            let password = lookup("DB_PASSWORD").unwrap_or_default();
            let name = lookup("DB_NAME").unwrap_or_else(|| "book_exchange".into());
            let port = lookup("DB_PORT").unwrap_or_else(|| "5432".into());
            let creds = if password.is_empty() { user } else { format!("{user}:{password}") };
            self.url = format!("postgres://{creds}@{host}:{port}/{name}");
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(anyhow!("database.url is empty; set it in config.toml or DATABASE_URL"));
        }
        let lower = self.url.to_lowercase();
        if !(lower.starts_with("postgresql://") || lower.starts_with("postgres://")) {
            return Err(anyhow!("database.url must start with postgresql:// or postgres://"));
        }
        if self.min_connections == 0 {
            return Err(anyhow!("database.min_connections must be >= 1"));
        }
        if self.max_connections < self.min_connections {
            return Err(anyhow!("database.max_connections must be >= min_connections"));
        }
        if self.connect_timeout_secs == 0 || self.acquire_timeout_secs == 0 {
            return Err(anyhow!("database timeouts must be positive seconds"));
        }
        Ok(())
    }

    pub fn connect_timeout(&self) -> Duration { Duration::from_secs(self.connect_timeout_secs) }
    pub fn idle_timeout(&self) -> Duration { Duration::from_secs(self.idle_timeout_secs) }
    pub fn max_lifetime(&self) -> Duration { Duration::from_secs(self.max_lifetime_secs) }
    pub fn acquire_timeout(&self) -> Duration { Duration::from_secs(self.acquire_timeout_secs) }
}

impl AuthConfig {
    pub fn validate(&self) -> Result<()> {
        if self.jwt_secret.trim().is_empty() {
            return Err(anyhow!("auth.jwt_secret is empty; set JWT_SECRET"));
        }
        if self.issuer.trim().is_empty() {
            return Err(anyhow!("auth.issuer must not be empty"));
        }
        if self.token_ttl_hours == 0 || self.token_ttl_hours > MAX_TOKEN_TTL_HOURS {
            return Err(anyhow!("auth.token_ttl_hours must be in 1..={MAX_TOKEN_TTL_HOURS}"));
        }
        if self.hash_iterations == 0 || self.hash_parallelism == 0 {
            return Err(anyhow!("auth hash iterations and parallelism must be >= 1"));
        }
        Ok(())
    }

    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_hours.min(MAX_TOKEN_TTL_HOURS) * 3600)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn parses_toml_sections() {
        let cfg = parse(
            r#"
            [server]
            host = "127.0.0.1"
            port = 8088

            [database]
            url = "postgres://u:p@localhost/db"

            [auth]
            jwt_secret = "s3cret"
            issuer = "tests"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.server.port, 8088);
        assert_eq!(cfg.database.max_connections, 10);
        assert_eq!(cfg.auth.issuer, "tests");
        assert_eq!(cfg.auth.token_ttl_hours, 24);
    }

    #[test]
    fn env_overrides_and_assembles_db_url() {
        let mut cfg = AppConfig::default();
        cfg.apply_env(env(&[
            ("SERVER_PORT", "9000"),
            ("DB_HOST", "db.internal"),
            ("DB_USER", "books"),
            ("DB_PASSWORD", "pw"),
            ("JWT_SECRET", "abc"),
        ]));
        assert_eq!(cfg.server.port, 9000);
        assert_eq!(cfg.database.url, "postgres://books:pw@db.internal:5432/book_exchange");
        assert_eq!(cfg.auth.jwt_secret, "abc");
        cfg.normalize_and_validate().unwrap();
    }

    #[test]
    fn database_url_wins_over_parts() {
        let mut cfg = AppConfig::default();
        cfg.apply_env(env(&[("DATABASE_URL", "postgres://x@y/z"), ("DB_HOST", "ignored")]));
        assert_eq!(cfg.database.url, "postgres://x@y/z");
    }

    #[test]
    fn empty_secret_is_fatal() {
        let mut cfg = AppConfig::default();
        cfg.apply_env(env(&[("DATABASE_URL", "postgres://x@y/z"), ("JWT_SECRET", "   ")]));
        let err = cfg.normalize_and_validate().unwrap_err();
        assert!(err.to_string().contains("jwt_secret"));
    }

    #[test]
    fn rejects_non_postgres_url() {
        let db = DatabaseConfig { url: "mysql://x".into(), min_connections: 1, max_connections: 2, connect_timeout_secs: 1, acquire_timeout_secs: 1, ..Default::default() };
        assert!(db.validate().is_err());
    }

    #[test]
    fn env_database_url_overrides_file() {
        let mut cfg = parse("[database]\nurl = \"postgres://file@h/db\"\n").unwrap();
        cfg.apply_env(env(&[]));
        assert_eq!(cfg.database.url, "postgres://file@h/db");
        cfg.apply_env(env(&[("DATABASE_URL", "postgres://env@h/db")]));
        assert_eq!(cfg.database.url, "postgres://env@h/db");
        cfg.apply_env(env(&[("DB_HOST", "parts")]));
        assert_eq!(cfg.database.url, "postgres://postgres@parts:5432/book_exchange");
    }

    fn temp_config(name: &str, content: Option<&str>) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("book_exchange_cfg_{}_{name}.toml", std::process::id()));
        let _ = std::fs::remove_file(&path);
        if let Some(content) = content {
            std::fs::write(&path, content).unwrap();
        }
        path
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let path = temp_config("missing", None);
        let cfg = load_from_file_or_default(path.to_str().unwrap()).unwrap();
        assert_eq!(cfg.server.port, 3000);
    }

    #[test]
    fn broken_file_is_an_error() {
        let path = temp_config("broken", Some("[auth\njwt_secret = \"x\"\n"));
        let err = load_from_file_or_default(path.to_str().unwrap()).unwrap_err();
        assert!(err.to_string().contains(path.to_str().unwrap()));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn token_ttl_is_capped() {
        let mut auth = AuthConfig { jwt_secret: "s".into(), ..Default::default() };
        auth.token_ttl_hours = MAX_TOKEN_TTL_HOURS;
        assert!(auth.validate().is_ok());
        auth.token_ttl_hours = u64::MAX;
        assert!(auth.validate().is_err());
        assert_eq!(auth.token_ttl(), Duration::from_secs(MAX_TOKEN_TTL_HOURS * 3600));
    }

    #[test]
    fn debug_redacts_secret() {
        let auth = AuthConfig { jwt_secret: "topsecret".into(), ..Default::default() };
        assert!(!format!("{auth:?}").contains("topsecret"));
    }
}
