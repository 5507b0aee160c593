//! Configuration module for the inspection backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::{AddrParseError, SocketAddr};
use std::path::PathBuf;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Token that authenticates as the built-in master admin account
    pub admin_token: Option<String>,
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Path to Tantivy search index directory
    pub index_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, AddrParseError> {
        dotenvy::dotenv().ok();

        let admin_token = env::var("INSPECT_ADMIN_TOKEN")
            .ok()
            .filter(|token| !token.trim().is_empty());

        let db_path = env::var("INSPECT_DB_PATH")
            .unwrap_or_else(|_| "./data/inspections.sqlite".to_string())
            .into();

        let index_path = env::var("INSPECT_INDEX_PATH")
            .unwrap_or_else(|_| "./data/index".to_string())
            .into();

        let bind_addr = env::var("INSPECT_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()?;

        let log_level = env::var("INSPECT_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            admin_token,
            db_path,
            index_path,
            bind_addr,
            log_level,
        })
    }
}
