// src/config/server.rs
// Observability endpoint and persistence file configuration

use serde::{Deserialize, Serialize};

use super::helpers::{env_bool, env_or, env_usize};

/// Bind address for the `/healthz` + `/metrics` axum router (§1 ambient Metrics).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 9090,
        }
    }
}

impl ServerConfig {
    pub fn from_env(default: Self) -> Self {
        Self {
            host: env_or("SERVER_HOST", &default.host),
            port: env_usize("SERVER_PORT", default.port as usize) as u16,
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// SQLite persistence file and pool configuration (§4.G).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://pipeline.db".to_string(),
        }
    }
}

impl DatabaseConfig {
    pub fn from_env(default: Self) -> Self {
        Self {
            url: env_or("DATABASE_URL", &default.url),
        }
    }
}

/// Structured logging configuration (§1 ambient Logging).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl LoggingConfig {
    pub fn from_env(default: Self) -> Self {
        Self {
            level: env_or("LOG_LEVEL", &default.level),
            json: env_bool("LOG_JSON", default.json),
        }
    }
}
