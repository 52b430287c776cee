// src/config/helpers.rs
// Helper functions for loading environment variables with defaults

use std::env;

pub fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

pub fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

pub fn env_usize(key: &str, default: usize) -> usize {
    env_parsed(key, default)
}

pub fn env_u32(key: &str, default: u32) -> u32 {
    env_parsed(key, default)
}

pub fn env_f64(key: &str, default: f64) -> f64 {
    env_parsed(key, default)
}

pub fn env_bool(key: &str, default: bool) -> bool {
    env_parsed(key, default)
}
