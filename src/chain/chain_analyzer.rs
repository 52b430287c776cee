// src/chain/chain_analyzer.rs
// Groups emails into conversation chains and scores completeness (§4.C)

use std::collections::{HashMap, HashSet};

use crate::config::chain::ChainConfig;
use crate::domain::{Completeness, Email, EmailChain};
use crate::utils::sha256_hash;

struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, x: usize) -> usize {
        if self.parent[x] != x {
            self.parent[x] = self.find(self.parent[x]);
        }
        self.parent[x]
    }

    fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra != rb {
            self.parent[ra] = rb;
        }
    }
}

/// Strips reply/forward prefixes, bracketed tokens, and collapses whitespace,
/// then lowercases — the normalization used both for chain grouping and for
/// the deterministic `chain_id` key (§4.C).
pub fn normalize_subject(subject: &str) -> String {
    let mut s = subject.trim();
    loop {
        let lowered = s.to_lowercase();
        let stripped = ["re:", "fw:", "fwd:"]
            .iter()
            .find(|p| lowered.starts_with(**p))
            .map(|p| s[p.len()..].trim_start());
        match stripped {
            Some(rest) => s = rest,
            None => break,
        }
    }

    let without_brackets = strip_bracketed_tokens(s);
    let collapsed: String = without_brackets
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    collapsed.to_lowercase()
}

fn strip_bracketed_tokens(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut depth_square = 0i32;
    for ch in s.chars() {
        match ch {
            '[' => depth_square += 1,
            ']' => depth_square = (depth_square - 1).max(0),
            _ if depth_square > 0 => {}
            _ => out.push(ch),
        }
    }
    out
}

fn same_chain(a: &Email, b: &Email) -> bool {
    match (&a.conversation_id, &b.conversation_id) {
        (Some(x), Some(y)) if x == y => return true,
        _ => {}
    }
    let na = normalize_subject(&a.subject);
    let nb = normalize_subject(&b.subject);
    na == nb || is_subject_extension(&na, &nb) || is_subject_extension(&nb, &na)
}

/// True if `longer` is `shorter` with extra trailing words appended (a later
/// reply that tacked on "— approved", "- resolved", etc.), so threads whose
/// subject grows over time still group as one chain. The match must land on
/// a word boundary so e.g. "rfq 500" does not match "rfq 5000".
fn is_subject_extension(shorter: &str, longer: &str) -> bool {
    if shorter.is_empty() || !longer.starts_with(shorter) {
        return false;
    }
    longer.len() == shorter.len() || longer.as_bytes()[shorter.len()] == b' '
}

fn chain_id_for(representative_subject: &str, conversation_id: Option<&str>) -> String {
    let key = format!(
        "{}|{}",
        normalize_subject(representative_subject),
        conversation_id.unwrap_or("")
    );
    let digest = sha256_hash(&key);
    digest[..32].to_string()
}

/// Business value estimate (§4.C): `max(amounts) * workflow_multiplier *
/// completeness_multiplier`.
pub fn estimate_business_value(
    max_amount: f64,
    workflow_type: &str,
    completeness: Completeness,
    config: &ChainConfig,
) -> f64 {
    let workflow_multiplier = config
        .business_value_multipliers
        .workflow
        .get(workflow_type)
        .copied()
        .unwrap_or(1.0);
    let completeness_key = match completeness {
        Completeness::Complete => "complete",
        Completeness::Partial => "partial",
        Completeness::Broken => "broken",
    };
    let completeness_multiplier = config
        .business_value_multipliers
        .completeness
        .get(completeness_key)
        .copied()
        .unwrap_or(1.0);
    max_amount * workflow_multiplier * completeness_multiplier
}

fn completeness_score(emails: &[&Email], config: &ChainConfig, text_of: impl Fn(&Email) -> String) -> f64 {
    let participants: HashSet<&str> = emails
        .iter()
        .flat_map(|e| std::iter::once(e.sender.as_str()).chain(e.recipients.iter().map(|r| r.as_str())))
        .collect();
    let participant_term = (0.15_f64).min(0.15 * (participants.len().saturating_sub(1)) as f64);

    let volume_term = (0.25_f64).min(0.05 * emails.len() as f64);

    let min_time = emails.iter().map(|e| e.received_at).min();
    let max_time = emails.iter().map(|e| e.received_at).max();
    let span_days = match (min_time, max_time) {
        (Some(min), Some(max)) => (max - min).num_seconds() as f64 / 86_400.0,
        _ => 0.0,
    };
    let time_term = (0.15_f64).min(0.02 * span_days);

    let resolution_count: usize = emails
        .iter()
        .map(|e| {
            let text = text_of(e).to_lowercase();
            config
                .resolution_keywords
                .iter()
                .filter(|kw| text.contains(kw.as_str()))
                .count()
        })
        .sum();
    let resolution_term = (0.30_f64).min(0.10 * resolution_count as f64);

    (participant_term + volume_term + time_term + resolution_term).clamp(0.0, 1.0)
}

/// Groups `emails` into chains and assigns each a completeness score, bucket,
/// workflow type, and recommended phase.
pub fn build_chains(
    emails: &[Email],
    config: &ChainConfig,
    workflow_of: impl Fn(&Email) -> String,
) -> Vec<EmailChain> {
    if emails.is_empty() {
        return Vec::new();
    }

    let mut dsu = DisjointSet::new(emails.len());
    for i in 0..emails.len() {
        for j in (i + 1)..emails.len() {
            if same_chain(&emails[i], &emails[j]) {
                dsu.union(i, j);
            }
        }
    }

    let mut groups: HashMap<usize, Vec<usize>> = HashMap::new();
    for i in 0..emails.len() {
        let root = dsu.find(i);
        groups.entry(root).or_default().push(i);
    }

    let mut chains = Vec::with_capacity(groups.len());
    for (_root, mut indices) in groups {
        indices.sort_by_key(|&i| emails[i].received_at);
        let members: Vec<&Email> = indices.iter().map(|&i| &emails[i]).collect();

        let score = completeness_score(&members, config, |e| e.text());
        let bucket = Completeness::from_score(
            score,
            config.completeness_buckets.complete,
            config.completeness_buckets.partial,
        );

        let representative = members[0];
        let chain_id = chain_id_for(&representative.subject, representative.conversation_id.as_deref());

        let mut participants: Vec<String> = members
            .iter()
            .flat_map(|e| std::iter::once(e.sender.clone()).chain(e.recipients.iter().cloned()))
            .collect();
        participants.sort();
        participants.dedup();

        let workflow_type = workflow_of(representative);

        chains.push(EmailChain {
            chain_id,
            member_ids: members.iter().map(|e| e.id.clone()).collect(),
            participants,
            completeness: bucket,
            completeness_score: score,
            workflow_type,
            recommended_phase: bucket.recommended_phase(),
            first_seen: members.first().unwrap().received_at,
            last_seen: members.last().unwrap().received_at,
        });
    }

    chains
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn email(id: &str, subject: &str, body: &str, offset_hours: i64) -> Email {
        Email {
            id: id.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
            sender: "buyer@example.com".to_string(),
            recipients: vec!["sales@example.com".to_string()],
            received_at: Utc::now() + Duration::hours(offset_hours),
            conversation_id: None,
            has_attachments: false,
            importance: crate::domain::Importance::Normal,
        }
    }

    #[test]
    fn normalizes_reply_and_bracket_prefixes() {
        assert_eq!(
            normalize_subject("RE: [EXTERNAL] RFQ  500 units"),
            "rfq 500 units"
        );
    }

    #[test]
    fn groups_by_normalized_subject() {
        let config = ChainConfig::default();
        let emails = vec![
            email("1", "RFQ 500 units Surface Pro", "please quote", 0),
            email("2", "RE: RFQ 500 units Surface Pro", "following up", 2),
            email(
                "3",
                "RE: RFQ 500 units Surface Pro — approved",
                "quote approved, $12,500.00",
                4,
            ),
        ];
        let chains = build_chains(&emails, &config, |_| "quote_request".to_string());
        assert_eq!(chains.len(), 1);
        assert_eq!(chains[0].member_ids.len(), 3);
    }

    #[test]
    fn singleton_chain_is_broken_without_signals() {
        let config = ChainConfig::default();
        let emails = vec![email("1", "where order?", "hasn't arrived yet, urgent", 0)];
        let chains = build_chains(&emails, &config, |_| "general_inquiry".to_string());
        assert_eq!(chains.len(), 1);
        assert_eq!(chains[0].completeness, Completeness::Broken);
        assert_eq!(chains[0].recommended_phase, 3);
    }

    #[test]
    fn chain_id_is_deterministic() {
        let a = chain_id_for("RFQ 500 units", Some("conv-1"));
        let b = chain_id_for("RFQ 500 units", Some("conv-1"));
        assert_eq!(a, b);
    }
}
