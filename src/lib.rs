// src/lib.rs

pub mod chain;
pub mod classify;
pub mod config;
pub mod domain;
pub mod error;
pub mod executor;
pub mod extract;
pub mod llmclient;
pub mod metrics;
pub mod monitor;
pub mod persistence;
pub mod phases;
pub mod utils;

pub use config::CONFIG;
pub use error::{PipelineError, PipelineResult};
