use anyhow::Result;
use serde::Deserialize;
use anyhow::anyhow;

pub use common::types::LogFormat;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
    /// Upper bound for request bodies (image uploads, spreadsheet imports).
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8080,
            worker_threads: Some(4),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
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
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub jwt_secret: String,
    /// Clock skew tolerated when checking `exp`.
    #[serde(default = "default_leeway")]
    pub leeway_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self { jwt_secret: String::new(), leeway_secs: default_leeway() }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
}

fn default_max_connections() -> u32 { 10 }
fn default_min_connections() -> u32 { 2 }
fn default_connect_timeout() -> u64 { 30 }
fn default_idle_timeout() -> u64 { 600 }
fn default_max_lifetime() -> u64 { 3600 }
fn default_acquire_timeout() -> u64 { 30 }
fn default_max_upload_bytes() -> usize { 10 * 1024 * 1024 }
fn default_leeway() -> u64 { 30 }

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let cfg: AppConfig = toml::from_str(&content)?;
    Ok(cfg)
}

impl AppConfig {
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = load_default()?;
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    /// Config file if present, otherwise defaults filled from the environment.
    pub fn load_or_env() -> Result<Self> {
        let mut cfg = load_default().unwrap_or_default();
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize_from_env();
        self.server.normalize()?;
        self.database.normalize_from_env();
        self.database.validate()?;
        self.auth.normalize_from_env();
        self.auth.validate()?;
        Ok(())
    }
}

impl ServerConfig {
    fn normalize_from_env(&mut self) {
        if let Ok(host) = std::env::var("SERVER_HOST") {
            self.host = host;
        }
        if let Some(port) = std::env::var("SERVER_PORT").ok().and_then(|p| p.parse::<u16>().ok()) {
            self.port = port;
        }
    }

    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be within 1..=65535"));
        }
        match self.worker_threads {
            Some(w) if w > 0 => {}
            _ => self.worker_threads = Some(4),
        }
        if self.max_upload_bytes == 0 {
            self.max_upload_bytes = default_max_upload_bytes();
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl DatabaseConfig {
    pub fn normalize_from_env(&mut self) {
        if self.url.trim().is_empty() {
            if let Ok(url) = std::env::var("DATABASE_URL") {
                self.url = url;
            }
        }
        if self.max_connections == 0 {
            self.max_connections = default_max_connections();
        }
        if self.connect_timeout_secs == 0 {
            self.connect_timeout_secs = default_connect_timeout();
        }
        if self.acquire_timeout_secs == 0 {
            self.acquire_timeout_secs = default_acquire_timeout();
        }
    }

    pub fn is_sqlite(&self) -> bool {
        self.url.to_lowercase().starts_with("sqlite:")
    }

    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(anyhow!("database.url is empty; set it in config.toml or DATABASE_URL"));
        }
        let lower = self.url.to_lowercase();
        if !(lower.starts_with("postgresql://") || lower.starts_with("postgres://") || lower.starts_with("sqlite:")) {
            return Err(anyhow!("database.url must start with postgres://, postgresql:// or sqlite:"));
        }
        if self.min_connections == 0 {
            return Err(anyhow!("database.min_connections must be >= 1"));
        }
        if self.max_connections < self.min_connections {
            return Err(anyhow!("database.max_connections must be >= min_connections"));
        }
        Ok(())
    }
}

impl AuthConfig {
    fn normalize_from_env(&mut self) {
        if self.jwt_secret.trim().is_empty() {
            if let Ok(secret) = std::env::var("JWT_SECRET") {
                self.jwt_secret = secret;
            }
        }
    }

    fn validate(&self) -> Result<()> {
        if self.jwt_secret.trim().is_empty() {
            return Err(anyhow!("auth.jwt_secret is empty; set it in config.toml or JWT_SECRET"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml_text: &str) -> AppConfig {
        toml::from_str(toml_text).expect("parse config")
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let cfg = parse("[database]\nurl = \"sqlite::memory:\"\n");
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.database.max_connections, 10);
        assert_eq!(cfg.database.min_connections, 2);
        assert_eq!(cfg.auth.leeway_secs, 30);
        assert_eq!(cfg.logging.format, LogFormat::Compact);
    }

    #[test]
    fn logging_format_parses_lowercase() {
        let cfg = parse("[logging]\nformat = \"json\"\n");
        assert_eq!(cfg.logging.format, LogFormat::Json);
    }

    #[test]
    fn database_validation_rejects_unknown_scheme() {
        let db = DatabaseConfig { url: "mysql://localhost/x".into(), min_connections: 1, max_connections: 2, ..Default::default() };
        assert!(db.validate().is_err());
        let db = DatabaseConfig { url: "postgres://localhost/x".into(), min_connections: 1, max_connections: 2, ..Default::default() };
        assert!(db.validate().is_ok());
        assert!(!db.is_sqlite());
    }

    #[test]
    fn database_validation_checks_pool_bounds() {
        let db = DatabaseConfig { url: "sqlite::memory:".into(), min_connections: 5, max_connections: 2, ..Default::default() };
        assert!(db.validate().is_err());
    }

    #[test]
    fn server_normalize_repairs_worker_threads() {
        let mut s = ServerConfig { worker_threads: Some(0), host: " ".into(), ..Default::default() };
        s.normalize().expect("normalize");
        assert_eq!(s.worker_threads, Some(4));
        assert_eq!(s.host, "127.0.0.1");
        assert_eq!(s.bind_addr(), "127.0.0.1:8080");
    }

    #[test]
    fn auth_requires_secret() {
        let a = AuthConfig { jwt_secret: "".into(), leeway_secs: 0 };
        assert!(a.validate().is_err());
        let a = AuthConfig { jwt_secret: "s3cret".into(), leeway_secs: 0 };
        assert!(a.validate().is_ok());
    }
}
