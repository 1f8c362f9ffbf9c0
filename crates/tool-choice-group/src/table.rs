//! Canonical choice values and the label phrasings they stand for.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::ChoiceError;

/// Canonical value -> label patterns, tried in order.
const ENTRIES: &[(&str, &[&str])] = &[
    // payment method
    ("club_card_with_extra", &[r"(?i)\bwith\s+additional\s+funding"]),
    (
        "club_card_without_extra",
        &[r"(?i)\bwithout\s+additional\s+funding"],
    ),
    (
        "club_card",
        &[
            r"(?i)\bwithout\s+additional\s+funding",
            r"(?i)\bclub\s+(spending\s+)?card\b",
        ],
    ),
    (
        "out_of_pocket",
        &[
            r"(?i)\bout[\s-]+of[\s-]+pocket\b",
            r"(?i)\bpersonal\s+(funds|card|money)\b",
            r"(?i)\breimburse",
        ],
    ),
    // purchase type
    (
        "food",
        &[r"(?i)\b(food|meals?|refreshments?|catering|snacks?)\b"],
    ),
    ("supplies", &[r"(?i)\bsuppl(y|ies)\b", r"(?i)\bmaterials?\b"]),
    ("travel", &[r"(?i)\b(travel|transportation|lodging)\b"]),
    ("equipment", &[r"(?i)\bequipment\b"]),
    ("other", &[r"(?i)\bother\b"]),
];

static TABLE: Lazy<HashMap<&'static str, Vec<Regex>>> = Lazy::new(|| {
    ENTRIES
        .iter()
        .map(|(key, patterns)| {
            let compiled = patterns
                .iter()
                .filter_map(|p| Regex::new(p).ok())
                .collect();
            (*key, compiled)
        })
        .collect()
});

/// Lower-case, with spaces and hyphens folded to underscores.
pub fn canonical_key(value: &str) -> String {
    value
        .trim()
        .to_lowercase()
        .split(|c: char| c.is_whitespace() || c == '-' || c == '_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

/// Patterns for `value`: the table entry when there is one, else a literal
/// case-insensitive match on the value (and its underscore-free spelling).
pub fn patterns_for(value: &str) -> Result<Vec<Regex>, ChoiceError> {
    if let Some(patterns) = TABLE.get(canonical_key(value).as_str()) {
        return Ok(patterns.clone());
    }
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ChoiceError::NoMatch(String::new()));
    }
    let mut literals = vec![trimmed.to_string()];
    let spaced = trimmed.replace('_', " ");
    if spaced != trimmed {
        literals.push(spaced);
    }
    literals
        .iter()
        .map(|lit| {
            Regex::new(&format!("(?i){}", regex::escape(lit)))
                .map_err(|err| ChoiceError::Pattern(err.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_table_pattern_compiles() {
        for (key, patterns) in ENTRIES {
            assert_eq!(TABLE[key].len(), patterns.len(), "pattern for {key}");
        }
    }

    #[test]
    fn keys_are_folded() {
        assert_eq!(canonical_key(" Out-of pocket "), "out_of_pocket");
        assert_eq!(canonical_key("club_card_with_extra"), "club_card_with_extra");
    }

    #[test]
    fn with_and_without_do_not_collide() {
        let with = &patterns_for("club_card_with_extra").unwrap()[0];
        assert!(with.is_match("Club Spending Card (with additional funding)"));
        assert!(!with.is_match("Club Spending Card (without additional funding)"));
    }

    #[test]
    fn unknown_values_match_literally() {
        let patterns = patterns_for("Gift (cards)").unwrap();
        assert_eq!(patterns.len(), 1);
        assert!(patterns[0].is_match("gift (cards) for volunteers"));
        let patterns = patterns_for("venmo_transfer").unwrap();
        assert!(patterns[1].is_match("Venmo transfer"));
    }
}
