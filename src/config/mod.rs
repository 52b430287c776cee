// src/config/mod.rs
// Central configuration: JSON file defaults, layered with environment overrides.

pub mod chain;
pub mod executor;
pub mod helpers;
pub mod llm;
pub mod monitor;
pub mod phase;
pub mod server;

use std::fs;
use std::path::Path;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use self::helpers::env_or;

pub static CONFIG: Lazy<PipelineConfig> = Lazy::new(PipelineConfig::load);

const DEFAULT_CONFIG_PATH: &str = "config/pipeline.json";

/// Composes every domain sub-config into one structure, the way the teacher's
/// `MiraConfig` composes `GeminiConfig`/`MemoryConfig`/etc.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PipelineConfig {
    #[serde(default)]
    pub workers: WorkersConfig,
    #[serde(default)]
    pub llm: llm::LlmConfig,
    #[serde(default)]
    pub phase: phase::PhaseConfig,
    #[serde(default)]
    pub chain: chain::ChainConfig,
    #[serde(default)]
    pub monitor: monitor::MonitorConfig,
    #[serde(default)]
    pub executor: executor::ExecutorConfig,
    #[serde(default)]
    pub server: server::ServerConfig,
    #[serde(default)]
    pub database: server::DatabaseConfig,
    #[serde(default)]
    pub logging: server::LoggingConfig,
}

/// `workers`/`batch_size` live at the top level of the recognized-keys table
/// in §6, but are executor-scoped in practice; kept as a thin top-level alias
/// so `PIPELINE_CONFIG_PATH` files matching §6's key names still load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkersConfig {
    pub count: usize,
}

impl Default for WorkersConfig {
    fn default() -> Self {
        Self { count: 3 }
    }
}

impl PipelineConfig {
    /// Loads config from the file at `PIPELINE_CONFIG_PATH` (default
    /// `config/pipeline.json`) if present, then layers environment variable
    /// overrides and documented defaults on top of every key.
    pub fn load() -> Self {
        let path = env_or("PIPELINE_CONFIG_PATH", DEFAULT_CONFIG_PATH);
        let from_file = Self::read_file(&path).unwrap_or_else(|err| {
            tracing::warn!(path = %path, error = %err, "no pipeline config file found, using defaults");
            Self::default()
        });
        Self::from_env(from_file)
    }

    fn read_file(path: &str) -> anyhow::Result<Self> {
        let path = Path::new(path);
        if !path.exists() {
            anyhow::bail!("config file does not exist");
        }
        let raw = fs::read_to_string(path)?;
        let config = serde_json::from_str(&raw)?;
        Ok(config)
    }

    fn from_env(default: Self) -> Self {
        let mut executor = executor::ExecutorConfig::from_env(default.executor);
        // §6's top-level `workers` key is an alias for `executor.workers`.
        executor.workers = helpers::env_usize("WORKERS", executor.workers);

        Self {
            workers: WorkersConfig {
                count: executor.workers,
            },
            llm: llm::LlmConfig::from_env(default.llm),
            phase: phase::PhaseConfig::from_env(default.phase),
            chain: chain::ChainConfig::from_env(default.chain),
            monitor: monitor::MonitorConfig::from_env(default.monitor),
            executor,
            server: server::ServerConfig::from_env(default.server),
            database: server::DatabaseConfig::from_env(default.database),
            logging: server::LoggingConfig::from_env(default.logging),
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.executor.workers == 0 {
            anyhow::bail!("executor.workers must be >= 1");
        }
        if self.executor.batch_size == 0 {
            anyhow::bail!("executor.batch_size must be >= 1");
        }
        if self.llm.endpoint_url.is_empty() {
            anyhow::bail!("llm.endpoint_url must not be empty");
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        self.server.bind_address()
    }
}
