// src/chain/mod.rs

pub mod chain_analyzer;

pub use chain_analyzer::{build_chains, estimate_business_value, normalize_subject};
