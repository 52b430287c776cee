// src/classify/workflow_classifier.rs
// Keyword-scored workflow and priority classification (§4.B, §4.D)

use crate::config::chain::{PriorityKeywords, WorkflowKeywords};
use crate::domain::Priority;

/// Scores `text` against each kind's keyword list and returns the argmax, or
/// `general_inquiry` if nothing matched. Ties are broken by enumeration
/// order in `keywords.ordered_kinds`.
pub fn classify_workflow(text: &str, keywords: &WorkflowKeywords) -> String {
    let lowered = text.to_lowercase();
    let mut best_kind = "general_inquiry".to_string();
    let mut best_score = 0usize;

    for kind in &keywords.ordered_kinds {
        let Some(list) = keywords.keywords.get(kind) else {
            continue;
        };
        let score = list.iter().filter(|kw| lowered.contains(kw.as_str())).count();
        if score > best_score {
            best_score = score;
            best_kind = kind.clone();
        }
    }

    best_kind
}

/// Priority rule (§4.D): Critical if any urgent keyword, High if any
/// quote/PO keyword, Medium if any support keyword, else Low.
pub fn classify_priority(text: &str, keywords: &PriorityKeywords) -> Priority {
    let lowered = text.to_lowercase();
    if keywords.urgent.iter().any(|kw| lowered.contains(kw.as_str())) {
        Priority::Critical
    } else if keywords
        .quote_or_po
        .iter()
        .any(|kw| lowered.contains(kw.as_str()))
    {
        Priority::High
    } else if keywords.support.iter().any(|kw| lowered.contains(kw.as_str())) {
        Priority::Medium
    } else {
        Priority::Low
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_quote_request() {
        let keywords = WorkflowKeywords::default();
        let kind = classify_workflow("Please send an RFQ for 500 units", &keywords);
        assert_eq!(kind, "quote_request");
    }

    #[test]
    fn defaults_to_general_inquiry() {
        let keywords = WorkflowKeywords::default();
        let kind = classify_workflow("Just checking in, no specifics here", &keywords);
        assert_eq!(kind, "general_inquiry");
    }

    #[test]
    fn priority_escalates_on_urgent_keyword() {
        let keywords = PriorityKeywords::default();
        assert_eq!(
            classify_priority("This is urgent, please respond ASAP", &keywords),
            Priority::Critical
        );
        assert_eq!(
            classify_priority("Attached is our quote request", &keywords),
            Priority::High
        );
        assert_eq!(
            classify_priority("Opening a support ticket", &keywords),
            Priority::Medium
        );
        assert_eq!(classify_priority("Hello there", &keywords), Priority::Low);
    }
}
