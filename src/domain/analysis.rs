// src/domain/analysis.rs
// Per-email analysis output (§3 AnalysisResult, §4.D-F)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entities::Entities;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkflowState {
    StartPoint,
    InProgress,
    Completion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpportunityLevel {
    High,
    Medium,
    Low,
    None,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionableItem {
    pub task: String,
    pub owner: Option<String>,
    pub deadline: Option<String>,
    pub impact: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Financial {
    pub estimated_value: f64,
    pub opportunity: OpportunityLevel,
    pub risk_level: OpportunityLevel,
    pub budget_mentioned: bool,
}

impl Default for Financial {
    fn default() -> Self {
        Self {
            estimated_value: 0.0,
            opportunity: OpportunityLevel::None,
            risk_level: OpportunityLevel::None,
            budget_mentioned: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Stakeholders {
    pub decision_makers: Vec<String>,
    pub technical_contacts: Vec<String>,
    pub procurement_contacts: Vec<String>,
}

/// Extension fields used only by the Phase 3 (large-LLM, broken-chain) analyzer (§4.F).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BrokenChainContext {
    pub missing_context: Vec<String>,
    pub required_actions: Vec<String>,
    pub escalation_needed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub email_id: String,
    pub chain_id: String,
    pub phase_used: u8,
    pub method_tag: String,
    pub priority: Priority,
    pub workflow_type: String,
    pub workflow_state: WorkflowState,
    pub confidence: f64,
    pub entities: Entities,
    pub actionable_items: Vec<ActionableItem>,
    pub financial: Financial,
    pub stakeholders: Stakeholders,
    pub summary: String,
    #[serde(default)]
    pub broken_chain_context: Option<BrokenChainContext>,
    pub processing_time_ms: u64,
    pub processed_at: DateTime<Utc>,
}
