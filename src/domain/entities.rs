// src/domain/entities.rs
// Extracted business entities (§3 Entities, §4.A)

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Amount {
    pub value: f64,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateMention {
    pub value: String,
    pub context: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactKind {
    Email,
    Phone,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub address: String,
    pub kind: ContactKind,
}

/// Deterministic, deduplicated, first-occurrence-ordered extraction output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Entities {
    pub po_numbers: Vec<String>,
    pub quote_numbers: Vec<String>,
    pub spa_codes: Vec<String>,
    pub case_numbers: Vec<String>,
    pub part_numbers: Vec<String>,
    pub amounts: Vec<Amount>,
    pub dates: Vec<DateMention>,
    pub contacts: Vec<Contact>,
}

impl Entities {
    pub fn is_empty(&self) -> bool {
        self.po_numbers.is_empty()
            && self.quote_numbers.is_empty()
            && self.spa_codes.is_empty()
            && self.case_numbers.is_empty()
            && self.part_numbers.is_empty()
            && self.amounts.is_empty()
            && self.dates.is_empty()
            && self.contacts.is_empty()
    }

    pub fn count(&self) -> usize {
        self.po_numbers.len()
            + self.quote_numbers.len()
            + self.spa_codes.len()
            + self.case_numbers.len()
            + self.part_numbers.len()
            + self.amounts.len()
            + self.dates.len()
            + self.contacts.len()
    }

    /// Overwrites `po_numbers`, `quote_numbers`, `amounts` with the union of
    /// `self` (typically LLM-provided) and `floor` (always regex-extracted),
    /// preserving the regex floor guarantee of §4.E step 3 / P4.
    pub fn merge_regex_floor(&mut self, floor: &Entities) {
        self.po_numbers = union_preserve_order(&self.po_numbers, &floor.po_numbers);
        self.quote_numbers = union_preserve_order(&self.quote_numbers, &floor.quote_numbers);
        self.amounts = union_amounts(&self.amounts, &floor.amounts);
    }
}

fn union_preserve_order(a: &[String], b: &[String]) -> Vec<String> {
    let mut out = Vec::with_capacity(a.len() + b.len());
    for v in a.iter().chain(b.iter()) {
        if !out.contains(v) {
            out.push(v.clone());
        }
    }
    out
}

fn union_amounts(a: &[Amount], b: &[Amount]) -> Vec<Amount> {
    let mut out = Vec::with_capacity(a.len() + b.len());
    for v in a.iter().chain(b.iter()) {
        if !out.iter().any(|x: &Amount| x == v) {
            out.push(v.clone());
        }
    }
    out
}
