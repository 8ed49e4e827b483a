#![allow(dead_code)]

use std::net::SocketAddr;

use configs::AppConfig;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use migration::MigratorTrait;
use sea_orm::{ConnectOptions, Database};
use serde_json::json;
use tokio::net::TcpListener;

pub const JWT_SECRET: &str = "test-secret";

pub struct TestApp {
    pub base_url: String,
    pub client: reqwest::Client,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn get(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.client.get(self.url(path)).bearer_auth(token)
    }

    pub fn post(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.client.post(self.url(path)).bearer_auth(token)
    }

    pub fn put(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.client.put(self.url(path)).bearer_auth(token)
    }

    pub fn patch(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.client.patch(self.url(path)).bearer_auth(token)
    }

    pub fn delete(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.client.delete(self.url(path)).bearer_auth(token)
    }
}

/// Serve the app on an ephemeral port over a fresh in-memory database.
pub async fn start_server() -> anyhow::Result<TestApp> {
    let url = std::env::var("TEST_DATABASE_URL").unwrap_or_else(|_| "sqlite::memory:".to_string());
    let mut opt = ConnectOptions::new(url);
    opt.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(opt).await?;
    migration::Migrator::fresh(&db).await?;

    let mut cfg = AppConfig::default();
    cfg.auth.jwt_secret = JWT_SECRET.into();
    let app = server::startup::build_app(db, &cfg);

    let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
    let addr: SocketAddr = listener.local_addr()?;
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            eprintln!("server error: {e}");
        }
    });
    Ok(TestApp { base_url: format!("http://{}:{}", addr.ip(), addr.port()), client: reqwest::Client::new() })
}

pub fn token(user: &str, roles: &[&str]) -> String {
    let claims = json!({ "sub": user, "preferred_username": user, "roles": roles });
    encode(&Header::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(JWT_SECRET.as_bytes())).expect("encode token")
}

pub fn admin() -> String {
    token("admin", &["ROLE_ADMIN"])
}

pub fn editor() -> String {
    token("editor", &["ROLE_EDITOR"])
}

pub fn user() -> String {
    token("user", &["spexregister_USER"])
}
