use std::collections::BTreeMap;
use std::fmt;

/// The fixed vocabulary of the reimbursement form.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-full", serde(rename_all = "snake_case"))]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum FieldName {
    PurchaserName,
    NetId,
    ClubName,
    PaymentMethod,
    VendorName,
    ExpenseDate,
    TotalAmount,
    PurchaseType,
    EventLink,
    Description,
}

impl FieldName {
    pub const ALL: [FieldName; 10] = [
        FieldName::PurchaserName,
        FieldName::NetId,
        FieldName::ClubName,
        FieldName::PaymentMethod,
        FieldName::VendorName,
        FieldName::ExpenseDate,
        FieldName::TotalAmount,
        FieldName::PurchaseType,
        FieldName::EventLink,
        FieldName::Description,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FieldName::PurchaserName => "purchaser_name",
            FieldName::NetId => "net_id",
            FieldName::ClubName => "club_name",
            FieldName::PaymentMethod => "payment_method",
            FieldName::VendorName => "vendor_name",
            FieldName::ExpenseDate => "expense_date",
            FieldName::TotalAmount => "total_amount",
            FieldName::PurchaseType => "purchase_type",
            FieldName::EventLink => "event_link",
            FieldName::Description => "description",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let key = raw.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        Self::ALL.into_iter().find(|field| field.as_str() == key)
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw value as emitted by the parsing collaborator.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-full", serde(untagged))]
#[derive(Clone, Debug, PartialEq)]
pub enum RecordValue {
    Number(f64),
    Text(String),
}

impl RecordValue {
    pub fn render(&self) -> String {
        match self {
            RecordValue::Text(text) => text.trim().to_string(),
            RecordValue::Number(number) if number.fract() == 0.0 => format!("{}", *number as i64),
            RecordValue::Number(number) => format!("{number}"),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            RecordValue::Number(number) => Some(*number),
            RecordValue::Text(text) => text
                .trim()
                .trim_start_matches('$')
                .replace(',', "")
                .parse()
                .ok(),
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, RecordValue::Text(text) if text.trim().is_empty())
    }
}

impl From<&str> for RecordValue {
    fn from(value: &str) -> Self {
        RecordValue::Text(value.to_string())
    }
}

impl From<String> for RecordValue {
    fn from(value: String) -> Self {
        RecordValue::Text(value)
    }
}

impl From<f64> for RecordValue {
    fn from(value: f64) -> Self {
        RecordValue::Number(value)
    }
}

/// A single extracted value with the collaborator's certainty in [0, 1].
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct FieldEstimate {
    pub value: RecordValue,
    pub confidence: f64,
}

impl FieldEstimate {
    pub fn new(value: impl Into<RecordValue>, confidence: f64) -> Self {
        let confidence = if confidence.is_nan() {
            0.0
        } else {
            confidence.clamp(0.0, 1.0)
        };
        Self {
            value: value.into(),
            confidence,
        }
    }
}

/// Structured receipt data keyed by semantic field.
///
/// Built once by the parsing collaborator and never mutated afterwards; the
/// builder methods consume `self`.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-full", serde(transparent))]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParsedRecord {
    fields: BTreeMap<FieldName, FieldEstimate>,
}

impl ParsedRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(
        mut self,
        field: FieldName,
        value: impl Into<RecordValue>,
        confidence: f64,
    ) -> Self {
        self.fields
            .insert(field, FieldEstimate::new(value, confidence));
        self
    }

    /// Fills `field` only when the record has no usable value for it.
    pub fn with_default(self, field: FieldName, value: &str, confidence: f64) -> Self {
        let missing = self
            .fields
            .get(&field)
            .map(|estimate| estimate.value.is_blank())
            .unwrap_or(true);
        if missing && !value.trim().is_empty() {
            self.with(field, value, confidence)
        } else {
            self
        }
    }

    pub fn get(&self, field: FieldName) -> Option<&FieldEstimate> {
        self.fields.get(&field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FieldName, &FieldEstimate)> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
