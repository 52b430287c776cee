// src/phases/mod.rs

pub mod parse;
pub mod phase1;
pub mod phase2;
pub mod phase3;
pub mod prompt;
pub mod router;

pub use router::analyze_email;

use crate::domain::AnalysisResult;

/// Outcome of routing+analyzing one email. `TimedOut` means the LLM call
/// itself reported a timeout (§4.E/F) -- per §7 that is never retried and
/// never persisted as a fallback analysis; the row goes straight to
/// `timeout` for the next run to re-claim.
pub enum PhaseOutcome {
    Analyzed(AnalysisResult),
    TimedOut,
}
