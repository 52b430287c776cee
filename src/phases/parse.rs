// src/phases/parse.rs
// Defensive LLM response parsing: balanced-brace scan -> strict parse ->
// per-field defaults -> regex-floor merge (§4.E, §9).

use serde_json::Value;

use crate::domain::analysis::{
    ActionableItem, BrokenChainContext, Financial, OpportunityLevel, Priority, Stakeholders,
    WorkflowState,
};
use crate::domain::entities::{Amount, Contact, ContactKind, DateMention, Entities};

/// Fields recovered from an LLM response, with tracking of which ones had to
/// fall back to a default because the model omitted or malformed them.
pub struct ParsedFields {
    pub priority: Priority,
    pub workflow_type: String,
    pub workflow_state: WorkflowState,
    pub entities: Entities,
    pub actionable_items: Vec<ActionableItem>,
    pub financial: Financial,
    pub stakeholders: Stakeholders,
    pub summary: String,
    pub broken_chain_context: Option<BrokenChainContext>,
    /// True if any required field above had to be filled from a default
    /// rather than the model's own output (drives the confidence penalty).
    pub any_field_defaulted: bool,
}

pub struct Fallbacks<'a> {
    pub regex_entities: &'a Entities,
    pub default_priority: Priority,
    pub default_workflow_type: &'a str,
    pub want_broken_chain_extension: bool,
}

/// Scans for the first balanced `{ ... }` region in `raw` and attempts a
/// strict JSON parse of it. Returns `None` if no balanced region exists or
/// the region fails to parse.
pub fn extract_balanced_json(raw: &str) -> Option<Value> {
    let bytes = raw.as_bytes();
    let start = bytes.iter().position(|&b| b == b'{')?;

    let mut depth = 0i32;
    let mut in_string = false;
    let mut escaped = false;
    let mut end = None;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    end = Some(i + 1);
                    break;
                }
            }
            _ => {}
        }
    }

    let end = end?;
    serde_json::from_str::<Value>(&raw[start..end]).ok()
}

/// Parses `raw` (the LLM's full text response), filling any missing or
/// malformed required field from `fallbacks`. Always returns a usable
/// result — never propagates a parse failure to the caller.
pub fn parse_llm_response(raw: &str, fallbacks: &Fallbacks) -> ParsedFields {
    let mut defaulted = false;
    let value = extract_balanced_json(raw);
    let obj = value.as_ref();

    let priority = obj
        .and_then(|v| v.get("priority"))
        .and_then(Value::as_str)
        .and_then(parse_priority)
        .unwrap_or_else(|| {
            defaulted = true;
            fallbacks.default_priority
        });

    let workflow_type = obj
        .and_then(|v| v.get("workflow_type"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| {
            defaulted = true;
            fallbacks.default_workflow_type.to_string()
        });

    let workflow_state = obj
        .and_then(|v| v.get("workflow_state"))
        .and_then(Value::as_str)
        .and_then(parse_workflow_state)
        .unwrap_or_else(|| {
            defaulted = true;
            WorkflowState::InProgress
        });

    let mut entities = obj
        .and_then(|v| v.get("entities"))
        .map(parse_entities)
        .unwrap_or_else(|| {
            defaulted = true;
            Entities::default()
        });
    entities.merge_regex_floor(fallbacks.regex_entities);

    let actionable_items = obj
        .and_then(|v| v.get("actionable_items"))
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(parse_actionable_item).collect())
        .unwrap_or_default();

    let max_regex_amount = fallbacks
        .regex_entities
        .amounts
        .iter()
        .map(|a| a.value)
        .fold(0.0_f64, f64::max);

    let financial = obj
        .and_then(|v| v.get("financial"))
        .map(parse_financial)
        .unwrap_or_else(|| {
            defaulted = true;
            Financial {
                estimated_value: max_regex_amount,
                ..Financial::default()
            }
        });

    let stakeholders = obj
        .and_then(|v| v.get("stakeholders"))
        .map(parse_stakeholders)
        .unwrap_or_default();

    let summary = obj
        .and_then(|v| v.get("summary"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| {
            defaulted = true;
            String::new()
        });

    let broken_chain_context = if fallbacks.want_broken_chain_extension {
        Some(parse_broken_chain_context(obj))
    } else {
        None
    };

    ParsedFields {
        priority,
        workflow_type,
        workflow_state,
        entities,
        actionable_items,
        financial,
        stakeholders,
        summary,
        broken_chain_context,
        any_field_defaulted: defaulted,
    }
}

fn parse_priority(s: &str) -> Option<Priority> {
    match s.to_lowercase().as_str() {
        "critical" => Some(Priority::Critical),
        "high" => Some(Priority::High),
        "medium" => Some(Priority::Medium),
        "low" => Some(Priority::Low),
        _ => None,
    }
}

fn parse_workflow_state(s: &str) -> Option<WorkflowState> {
    match s.to_uppercase().as_str() {
        "START_POINT" => Some(WorkflowState::StartPoint),
        "IN_PROGRESS" => Some(WorkflowState::InProgress),
        "COMPLETION" => Some(WorkflowState::Completion),
        _ => None,
    }
}

fn parse_opportunity(s: &str) -> OpportunityLevel {
    match s.to_lowercase().as_str() {
        "high" => OpportunityLevel::High,
        "medium" => OpportunityLevel::Medium,
        "low" => OpportunityLevel::Low,
        _ => OpportunityLevel::None,
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn parse_entities(value: &Value) -> Entities {
    let amounts = value
        .get("amounts")
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(|a| {
                    let v = a.get("value")?.as_f64()?;
                    let currency = a
                        .get("currency")
                        .and_then(Value::as_str)
                        .unwrap_or("USD")
                        .to_string();
                    Some(Amount { value: v, currency })
                })
                .collect()
        })
        .unwrap_or_default();

    let dates = value
        .get("dates")
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(|d| {
                    let v = d.get("value")?.as_str()?.to_string();
                    let context = d
                        .get("context")
                        .and_then(Value::as_str)
                        .unwrap_or("")
                        .to_string();
                    Some(DateMention { value: v, context })
                })
                .collect()
        })
        .unwrap_or_default();

    let contacts = value
        .get("contacts")
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(|c| {
                    let address = c.get("address").and_then(Value::as_str)?.to_string();
                    let kind = match c.get("kind").and_then(Value::as_str) {
                        Some("phone") => ContactKind::Phone,
                        _ => ContactKind::Email,
                    };
                    Some(Contact { address, kind })
                })
                .collect()
        })
        .unwrap_or_default();

    Entities {
        po_numbers: string_list(value.get("po_numbers")),
        quote_numbers: string_list(value.get("quote_numbers")),
        spa_codes: string_list(value.get("spa_codes")),
        case_numbers: string_list(value.get("case_numbers")),
        part_numbers: string_list(value.get("part_numbers")),
        amounts,
        dates,
        contacts,
    }
}

fn parse_actionable_item(value: &Value) -> Option<ActionableItem> {
    let task = value.get("task")?.as_str()?.to_string();
    Some(ActionableItem {
        task,
        owner: value
            .get("owner")
            .and_then(Value::as_str)
            .map(str::to_string),
        deadline: value
            .get("deadline")
            .and_then(Value::as_str)
            .map(str::to_string),
        impact: value
            .get("impact")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string(),
    })
}

fn parse_financial(value: &Value) -> Financial {
    Financial {
        estimated_value: value
            .get("estimated_value")
            .and_then(Value::as_f64)
            .unwrap_or(0.0),
        opportunity: value
            .get("opportunity")
            .and_then(Value::as_str)
            .map(parse_opportunity)
            .unwrap_or(OpportunityLevel::None),
        risk_level: value
            .get("risk_level")
            .and_then(Value::as_str)
            .map(parse_opportunity)
            .unwrap_or(OpportunityLevel::None),
        budget_mentioned: value
            .get("budget_mentioned")
            .and_then(Value::as_bool)
            .unwrap_or(false),
    }
}

fn parse_stakeholders(value: &Value) -> Stakeholders {
    Stakeholders {
        decision_makers: string_list(value.get("decision_makers")),
        technical_contacts: string_list(value.get("technical_contacts")),
        procurement_contacts: string_list(value.get("procurement_contacts")),
    }
}

fn parse_broken_chain_context(obj: Option<&Value>) -> BrokenChainContext {
    BrokenChainContext {
        missing_context: obj.map(|v| string_list(v.get("missing_context"))).unwrap_or_default(),
        required_actions: obj.map(|v| string_list(v.get("required_actions"))).unwrap_or_default(),
        escalation_needed: obj
            .and_then(|v| v.get("escalation_needed"))
            .and_then(Value::as_bool)
            .unwrap_or(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_first_balanced_json_ignoring_surrounding_prose() {
        let raw = "Sure, here you go: {\"priority\": \"High\", \"nested\": {\"a\": 1}} thanks!";
        let value = extract_balanced_json(raw).expect("should parse");
        assert_eq!(value["priority"], "High");
        assert_eq!(value["nested"]["a"], 1);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults_and_flag_defaulting() {
        let fallbacks = Fallbacks {
            regex_entities: &Entities::default(),
            default_priority: Priority::Medium,
            default_workflow_type: "general_inquiry",
            want_broken_chain_extension: false,
        };
        let parsed = parse_llm_response("{}", &fallbacks);
        assert_eq!(parsed.priority, Priority::Medium);
        assert_eq!(parsed.workflow_type, "general_inquiry");
        assert!(parsed.any_field_defaulted);
    }

    #[test]
    fn regex_floor_always_present_even_when_llm_omits_amounts() {
        let mut regex_entities = Entities::default();
        regex_entities.amounts.push(Amount {
            value: 9999.0,
            currency: "USD".to_string(),
        });
        regex_entities.po_numbers.push("0505915850".to_string());

        let fallbacks = Fallbacks {
            regex_entities: &regex_entities,
            default_priority: Priority::Medium,
            default_workflow_type: "general_inquiry",
            want_broken_chain_extension: false,
        };
        let parsed = parse_llm_response("{}", &fallbacks);
        assert!(parsed.entities.amounts.iter().any(|a| a.value == 9999.0));
        assert!(parsed
            .entities
            .po_numbers
            .contains(&"0505915850".to_string()));
    }
}
