// src/domain/mod.rs
// Tagged domain structures replacing the source's dynamic dictionaries (§9).

pub mod analysis;
pub mod chain;
pub mod email;
pub mod entities;
pub mod state;

pub use analysis::{
    ActionableItem, AnalysisResult, BrokenChainContext, Financial, OpportunityLevel, Priority,
    Stakeholders, WorkflowState,
};
pub use chain::{Completeness, EmailChain};
pub use email::{Email, Importance};
pub use entities::{Amount, Contact, ContactKind, DateMention, Entities};
pub use state::RecordState;
