// src/extract/entity_extractor.rs
// Pure, stateless entity extraction (§4.A)

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

use crate::domain::entities::{Amount, Contact, ContactKind, DateMention, Entities};

fn ci(pattern: &str) -> Regex {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .expect("static regex is valid")
}

static PO_NUMBER: Lazy<Regex> =
    Lazy::new(|| ci(r"\b(?:PO|P\.O\.|Purchase Order)\s*#?\s*(\d{5,12})\b"));
static QUOTE_NUMBER: Lazy<Regex> = Lazy::new(|| ci(r"\b(?:Quote|RFQ|Q)\s*#?\s*(\d{5,12})\b"));
static SPA_CODE: Lazy<Regex> = Lazy::new(|| ci(r"\bCAS-[A-Z0-9-]{6,}\b"));
static CASE_NUMBER: Lazy<Regex> =
    Lazy::new(|| ci(r"\b(?:Case|Ticket|TS-|SR-|INC)\s*#?\s*(\d{3,})\b"));
static PART_NUMBER: Lazy<Regex> = Lazy::new(|| ci(r"\b[A-Z0-9]{2,}-?[A-Z0-9]{2,}-?[A-Z0-9]*\b"));
static AMOUNT_DOLLAR: Lazy<Regex> = Lazy::new(|| ci(r"\$\s?(\d{1,3}(?:,\d{3})*(?:\.\d{2})?)"));
static AMOUNT_WORD: Lazy<Regex> =
    Lazy::new(|| ci(r"\b(\d{1,3}(?:,\d{3})*(?:\.\d{2})?)\s*(?:USD|dollars)\b"));
static EMAIL_ADDRESS: Lazy<Regex> =
    Lazy::new(|| ci(r"\b[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,}\b"));
static DATE_SLASH: Lazy<Regex> = Lazy::new(|| ci(r"\b(\d{1,2})[/-](\d{1,2})[/-](\d{4})\b"));
static PHONE_NUMBER: Lazy<Regex> =
    Lazy::new(|| ci(r"(?:\+?1[-.\s]?)?\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}"));

/// Tracks byte spans already claimed by an earlier, higher-priority pattern
/// so later patterns never retain an overlapping match (§4.A: "no overlapping
/// spans retained").
struct SpanLedger {
    claimed: Vec<(usize, usize)>,
}

impl SpanLedger {
    fn new() -> Self {
        Self { claimed: Vec::new() }
    }

    fn try_claim(&mut self, start: usize, end: usize) -> bool {
        if self.claimed.iter().any(|&(s, e)| start < e && s < end) {
            return false;
        }
        self.claimed.push((start, end));
        true
    }
}

fn push_unique(out: &mut Vec<String>, value: String) {
    if !out.contains(&value) {
        out.push(value);
    }
}

/// Extracts the closed set of recognized entities from `text` (the
/// concatenation of an email's subject and body, per §4.A). Deterministic,
/// pure, and stateless: the same text always yields the same `Entities`.
pub fn extract_entities(subject: &str, text: &str) -> Entities {
    let mut entities = Entities::default();
    let mut ledger = SpanLedger::new();

    for m in PO_NUMBER.find_iter(text) {
        if ledger.try_claim(m.start(), m.end()) {
            if let Some(caps) = PO_NUMBER.captures(m.as_str()) {
                if let Some(digits) = caps.get(1) {
                    push_unique(&mut entities.po_numbers, digits.as_str().to_string());
                }
            }
        }
    }

    for caps in QUOTE_NUMBER.captures_iter(text) {
        let m = caps.get(0).expect("whole match always present");
        if ledger.try_claim(m.start(), m.end()) {
            if let Some(digits) = caps.get(1) {
                push_unique(&mut entities.quote_numbers, digits.as_str().to_string());
            }
        }
    }

    for m in SPA_CODE.find_iter(text) {
        if ledger.try_claim(m.start(), m.end()) {
            push_unique(&mut entities.spa_codes, m.as_str().to_uppercase());
        }
    }

    for caps in CASE_NUMBER.captures_iter(text) {
        let m = caps.get(0).expect("whole match always present");
        if ledger.try_claim(m.start(), m.end()) {
            push_unique(&mut entities.case_numbers, m.as_str().trim().to_string());
        }
    }

    // Part numbers are recognized on the uppercased subject only (§4.A);
    // since `subject` is a byte-length-preserving uppercase of itself and a
    // prefix of `text` (see `Email::text`), its offsets line up directly.
    let upper_subject = subject.to_uppercase();
    for m in PART_NUMBER.find_iter(&upper_subject) {
        if looks_like_other_entity(m.as_str()) {
            continue;
        }
        if ledger.try_claim(m.start(), m.end()) {
            push_unique(&mut entities.part_numbers, m.as_str().to_string());
        }
    }

    for caps in AMOUNT_DOLLAR.captures_iter(text) {
        let m = caps.get(0).expect("whole match always present");
        if ledger.try_claim(m.start(), m.end()) {
            if let Some(value) = parse_amount(caps.get(1).unwrap().as_str()) {
                push_amount(&mut entities.amounts, value);
            }
        }
    }
    for caps in AMOUNT_WORD.captures_iter(text) {
        let m = caps.get(0).expect("whole match always present");
        if ledger.try_claim(m.start(), m.end()) {
            if let Some(value) = parse_amount(caps.get(1).unwrap().as_str()) {
                push_amount(&mut entities.amounts, value);
            }
        }
    }

    for m in EMAIL_ADDRESS.find_iter(text) {
        if ledger.try_claim(m.start(), m.end()) {
            push_contact(
                &mut entities.contacts,
                m.as_str().to_lowercase(),
                ContactKind::Email,
            );
        }
    }

    for m in DATE_SLASH.find_iter(text) {
        if ledger.try_claim(m.start(), m.end()) {
            entities.dates.push(DateMention {
                value: m.as_str().to_string(),
                context: surrounding_context(text, m.start(), m.end()),
            });
        }
    }

    for m in PHONE_NUMBER.find_iter(text) {
        let digit_count = m.as_str().chars().filter(|c| c.is_ascii_digit()).count();
        if digit_count < 10 {
            continue;
        }
        if ledger.try_claim(m.start(), m.end()) {
            push_contact(
                &mut entities.contacts,
                normalize_phone(m.as_str()),
                ContactKind::Phone,
            );
        }
    }

    entities
}

fn looks_like_other_entity(candidate: &str) -> bool {
    candidate.starts_with("CAS-") || candidate.chars().all(|c| c.is_ascii_digit())
}

fn parse_amount(raw: &str) -> Option<f64> {
    raw.replace(',', "").parse::<f64>().ok()
}

fn push_amount(out: &mut Vec<Amount>, value: f64) {
    let amount = Amount {
        value,
        currency: "USD".to_string(),
    };
    if !out.iter().any(|a| a.value == amount.value) {
        out.push(amount);
    }
}

fn push_contact(out: &mut Vec<Contact>, address: String, kind: ContactKind) {
    if !out.iter().any(|c| c.address == address && c.kind == kind) {
        out.push(Contact { address, kind });
    }
}

fn normalize_phone(raw: &str) -> String {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    digits
}

fn surrounding_context(text: &str, start: usize, end: usize) -> String {
    let lo = text[..start].char_indices().rev().nth(20).map(|(i, _)| i).unwrap_or(0);
    let hi = text[end..]
        .char_indices()
        .nth(20)
        .map(|(i, _)| end + i)
        .unwrap_or(text.len());
    text[lo..hi].trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_po_and_amount() {
        let text = "Please see PO 0505915850 for $12,500.00 total.";
        let entities = extract_entities("Order update", text);
        assert_eq!(entities.po_numbers, vec!["0505915850".to_string()]);
        assert!(entities.amounts.iter().any(|a| a.value == 12500.0));
    }

    #[test]
    fn extracts_spa_code() {
        let text = "Approved under CAS-107073-B4P8K8 effective today.";
        let entities = extract_entities("SPA approval", text);
        assert_eq!(entities.spa_codes, vec!["CAS-107073-B4P8K8".to_string()]);
    }

    #[test]
    fn deduplicates_and_preserves_first_occurrence_order() {
        let text = "Quote 123456 then again Quote 123456, also RFQ 654321";
        let entities = extract_entities("Quotes", text);
        assert_eq!(
            entities.quote_numbers,
            vec!["123456".to_string(), "654321".to_string()]
        );
    }

    #[test]
    fn extracts_email_and_phone_contacts() {
        let text = "Reach me at jane.doe@example.com or (415) 555-0199.";
        let entities = extract_entities("Contact info", text);
        assert!(entities
            .contacts
            .iter()
            .any(|c| c.kind == ContactKind::Email && c.address == "jane.doe@example.com"));
        assert!(entities.contacts.iter().any(|c| c.kind == ContactKind::Phone));
    }

    #[test]
    fn deterministic_given_same_input() {
        let text = "PO 1234567 and $999.00 due by 03/15/2026";
        let a = extract_entities("Order", text);
        let b = extract_entities("Order", text);
        assert_eq!(a, b);
    }
}
