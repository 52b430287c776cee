// src/persistence/mod.rs

pub mod pool;
pub mod repository;
pub mod schema;

pub use pool::build_pool;
pub use repository::{ClaimedEmail, Repository};
pub use schema::ensure_schema;
