//! The compiled-in field table.
//!
//! One definition per semantic field, in the order fill passes visit them.

use autofill_core_types::{FieldName, ParsedRecord, RecordValue, WriterKind};
use once_cell::sync::Lazy;
use regex::Regex;

#[derive(Debug)]
pub struct FieldDefinition {
    pub name: FieldName,
    pub label_pattern: Regex,
    pub writer: WriterKind,
    /// Profile-backed fields: filled whenever a usable value exists,
    /// regardless of confidence.
    pub always_fill: bool,
}

impl FieldDefinition {
    /// The value and confidence this field takes from `record`.
    ///
    /// Missing entries come back as `("", 0.0)`.
    pub fn extract(&self, record: &ParsedRecord) -> (String, f64) {
        let Some(estimate) = record.get(self.name) else {
            return (String::new(), 0.0);
        };
        let value = match self.name {
            FieldName::TotalAmount => render_amount(&estimate.value),
            _ => estimate.value.render(),
        };
        (value, estimate.confidence)
    }
}

/// Amounts always carry two decimals; text that is not a number is kept.
fn render_amount(value: &RecordValue) -> String {
    match value.as_number() {
        Some(number) => format!("{number:.2}"),
        None => value.render(),
    }
}

const DEFINITIONS: &[(FieldName, &str, WriterKind, bool)] = &[
    (
        FieldName::PurchaserName,
        r"(?i)\b(purchaser'?s?|your|full)\s+name\b",
        WriterKind::Text,
        true,
    ),
    (FieldName::NetId, r"(?i)\bnet\s*-?\s*id\b", WriterKind::Text, true),
    (
        FieldName::ClubName,
        r"(?i)\b(club|organi[sz]ation|student\s+group)\s+name\b|\bwhich\s+club\b",
        WriterKind::Select,
        true,
    ),
    (
        FieldName::PaymentMethod,
        r"(?i)\bpayment\s+(method|type)\b|\bhow\s+(was|did)\b.*\bpa(y|id)\b",
        WriterKind::ChoiceGroup,
        false,
    ),
    (
        FieldName::VendorName,
        r"(?i)\bvendor(\s+name)?\b|\bmerchant\b|\bstore\s+name\b",
        WriterKind::Text,
        false,
    ),
    (
        FieldName::ExpenseDate,
        r"(?i)\b(expense|purchase|transaction|receipt)\s+date\b|\bdate\s+of\s+(purchase|expense)\b",
        WriterKind::Text,
        false,
    ),
    (
        FieldName::TotalAmount,
        r"(?i)\b(total\s+)?amount\b|\btotal\s+(cost|spent)\b",
        WriterKind::Text,
        false,
    ),
    (
        FieldName::PurchaseType,
        r"(?i)\b(purchase|expense)\s+(type|category)\b|\btype\s+of\s+(purchase|expense)\b",
        WriterKind::ChoiceGroup,
        false,
    ),
    (
        FieldName::EventLink,
        r"(?i)\bevent\s+(link|url|page)\b",
        WriterKind::Text,
        false,
    ),
    (
        FieldName::Description,
        r"(?i)\b(description|business\s+purpose|purpose\s+of\s+(the\s+)?purchase)\b",
        WriterKind::Text,
        false,
    ),
];

static FIELD_TABLE: Lazy<Vec<FieldDefinition>> = Lazy::new(|| {
    DEFINITIONS
        .iter()
        .filter_map(|(name, pattern, writer, always_fill)| {
            Regex::new(pattern).ok().map(|label_pattern| FieldDefinition {
                name: *name,
                label_pattern,
                writer: *writer,
                always_fill: *always_fill,
            })
        })
        .collect()
});

pub fn field_table() -> &'static [FieldDefinition] {
    &FIELD_TABLE
}

#[cfg(test)]
mod tests {
    use field_locator::normalize_label;

    use super::*;

    fn definition(name: FieldName) -> Option<&'static FieldDefinition> {
        field_table().iter().find(|def| def.name == name)
    }

    #[test]
    fn one_definition_per_field_in_declared_order() {
        let names: Vec<FieldName> = field_table().iter().map(|d| d.name).collect();
        assert_eq!(names, FieldName::ALL.to_vec());
    }

    #[test]
    fn profile_fields_are_always_fill() {
        let always: Vec<FieldName> = field_table()
            .iter()
            .filter(|d| d.always_fill)
            .map(|d| d.name)
            .collect();
        assert_eq!(
            always,
            vec![FieldName::PurchaserName, FieldName::NetId, FieldName::ClubName]
        );
        assert_eq!(
            definition(FieldName::ClubName).map(|d| d.writer),
            Some(WriterKind::Select)
        );
    }

    #[test]
    fn labels_match_only_their_field() {
        let labels = [
            ("Purchaser's Name *", FieldName::PurchaserName),
            ("Net ID", FieldName::NetId),
            ("Club Name", FieldName::ClubName),
            ("Payment Method", FieldName::PaymentMethod),
            ("Vendor\n   Name", FieldName::VendorName),
            ("Date of Purchase", FieldName::ExpenseDate),
            ("Total Amount ($)", FieldName::TotalAmount),
            ("Purchase Type", FieldName::PurchaseType),
            ("Event Link (if applicable)", FieldName::EventLink),
            ("Description / Business Purpose", FieldName::Description),
        ];
        for (label, expected) in labels {
            let text = normalize_label(label);
            let hits: Vec<FieldName> = field_table()
                .iter()
                .filter(|d| d.label_pattern.is_match(&text))
                .map(|d| d.name)
                .collect();
            assert_eq!(hits, vec![expected], "label {label:?}");
        }
    }

    #[test]
    fn extraction_formats_amounts() {
        let record = ParsedRecord::new()
            .with(FieldName::TotalAmount, 42.5, 0.95)
            .with(FieldName::VendorName, "  Acme  ", 0.9);
        let amount = definition(FieldName::TotalAmount).unwrap();
        assert_eq!(amount.extract(&record), ("42.50".to_string(), 0.95));
        let vendor = definition(FieldName::VendorName).unwrap();
        assert_eq!(vendor.extract(&record), ("Acme".to_string(), 0.9));

        let text_amount = ParsedRecord::new().with(FieldName::TotalAmount, "$1,204.1", 0.9);
        assert_eq!(amount.extract(&text_amount).0, "1204.10");
    }

    #[test]
    fn missing_entries_extract_empty() {
        let link = definition(FieldName::EventLink).unwrap();
        assert_eq!(link.extract(&ParsedRecord::new()), (String::new(), 0.0));
    }
}
