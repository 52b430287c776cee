// src/config/chain.rs
// Chain grouping, completeness bucketing, and workflow/priority keyword configuration (§4.B, §4.C)

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::helpers::env_f64;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletenessBuckets {
    pub complete: f64,
    pub partial: f64,
}

impl Default for CompletenessBuckets {
    fn default() -> Self {
        Self {
            complete: 0.7,
            partial: 0.3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessValueMultipliers {
    pub workflow: HashMap<String, f64>,
    pub completeness: HashMap<String, f64>,
}

impl Default for BusinessValueMultipliers {
    fn default() -> Self {
        let mut workflow = HashMap::new();
        workflow.insert("quote_request".to_string(), 1.2);
        workflow.insert("order_processing".to_string(), 1.5);
        workflow.insert("pricing_agreement".to_string(), 1.3);
        workflow.insert("deal_registration".to_string(), 1.4);
        workflow.insert("invoice".to_string(), 1.1);
        workflow.insert("support_ticket".to_string(), 0.6);
        workflow.insert("shipment_tracking".to_string(), 0.7);
        workflow.insert("return_merchandise".to_string(), 0.5);
        workflow.insert("escalation".to_string(), 0.8);
        workflow.insert("general_inquiry".to_string(), 0.5);

        let mut completeness = HashMap::new();
        completeness.insert("complete".to_string(), 1.0);
        completeness.insert("partial".to_string(), 0.7);
        completeness.insert("broken".to_string(), 0.4);

        Self {
            workflow,
            completeness,
        }
    }
}

/// Keyword lists for the closed workflow-kind set, in enumeration order
/// (ties in §4.B's argmax are broken by this order).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowKeywords {
    pub ordered_kinds: Vec<String>,
    pub keywords: HashMap<String, Vec<String>>,
}

impl Default for WorkflowKeywords {
    fn default() -> Self {
        let ordered_kinds = vec![
            "quote_request".to_string(),
            "order_processing".to_string(),
            "support_ticket".to_string(),
            "shipment_tracking".to_string(),
            "invoice".to_string(),
            "pricing_agreement".to_string(),
            "deal_registration".to_string(),
            "return_merchandise".to_string(),
            "escalation".to_string(),
            "general_inquiry".to_string(),
        ];

        let mut keywords: HashMap<String, Vec<String>> = HashMap::new();
        keywords.insert(
            "quote_request".to_string(),
            vec![
                "quote".to_string(),
                "rfq".to_string(),
                "quotation".to_string(),
                "pricing request".to_string(),
            ],
        );
        keywords.insert(
            "order_processing".to_string(),
            vec![
                "purchase order".to_string(),
                "po number".to_string(),
                "order confirmation".to_string(),
                "place an order".to_string(),
            ],
        );
        keywords.insert(
            "support_ticket".to_string(),
            vec![
                "support".to_string(),
                "ticket".to_string(),
                "issue".to_string(),
                "not working".to_string(),
                "help".to_string(),
            ],
        );
        keywords.insert(
            "shipment_tracking".to_string(),
            vec![
                "tracking".to_string(),
                "shipment".to_string(),
                "delivery".to_string(),
                "shipped".to_string(),
                "where is my order".to_string(),
            ],
        );
        keywords.insert(
            "invoice".to_string(),
            vec![
                "invoice".to_string(),
                "billing".to_string(),
                "payment due".to_string(),
                "remit".to_string(),
            ],
        );
        keywords.insert(
            "pricing_agreement".to_string(),
            vec![
                "special pricing".to_string(),
                "spa".to_string(),
                "pricing agreement".to_string(),
                "discount approval".to_string(),
            ],
        );
        keywords.insert(
            "deal_registration".to_string(),
            vec![
                "deal registration".to_string(),
                "register this opportunity".to_string(),
                "partner deal".to_string(),
            ],
        );
        keywords.insert(
            "return_merchandise".to_string(),
            vec![
                "rma".to_string(),
                "return merchandise".to_string(),
                "return authorization".to_string(),
                "defective".to_string(),
            ],
        );
        keywords.insert(
            "escalation".to_string(),
            vec![
                "escalate".to_string(),
                "urgent".to_string(),
                "asap".to_string(),
                "unacceptable".to_string(),
            ],
        );
        keywords.insert("general_inquiry".to_string(), vec![]);

        Self {
            ordered_kinds,
            keywords,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriorityKeywords {
    pub urgent: Vec<String>,
    pub quote_or_po: Vec<String>,
    pub support: Vec<String>,
}

impl Default for PriorityKeywords {
    fn default() -> Self {
        Self {
            urgent: vec![
                "urgent".to_string(),
                "asap".to_string(),
                "critical".to_string(),
                "emergency".to_string(),
                "immediately".to_string(),
            ],
            quote_or_po: vec![
                "quote".to_string(),
                "rfq".to_string(),
                "purchase order".to_string(),
                "po number".to_string(),
            ],
            support: vec![
                "support".to_string(),
                "ticket".to_string(),
                "issue".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    pub completeness_buckets: CompletenessBuckets,
    pub resolution_keywords: Vec<String>,
    pub workflow_keywords: WorkflowKeywords,
    pub priority_keywords: PriorityKeywords,
    pub business_value_multipliers: BusinessValueMultipliers,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            completeness_buckets: CompletenessBuckets::default(),
            resolution_keywords: vec![
                "resolved".to_string(),
                "closed".to_string(),
                "shipped".to_string(),
                "thank you".to_string(),
                "confirmed".to_string(),
                "approved".to_string(),
                "completed".to_string(),
                "delivered".to_string(),
            ],
            workflow_keywords: WorkflowKeywords::default(),
            priority_keywords: PriorityKeywords::default(),
            business_value_multipliers: BusinessValueMultipliers::default(),
        }
    }
}

impl ChainConfig {
    pub fn from_env(default: Self) -> Self {
        Self {
            completeness_buckets: CompletenessBuckets {
                complete: env_f64(
                    "CHAIN_COMPLETENESS_COMPLETE",
                    default.completeness_buckets.complete,
                ),
                partial: env_f64(
                    "CHAIN_COMPLETENESS_PARTIAL",
                    default.completeness_buckets.partial,
                ),
            },
            ..default
        }
    }
}
