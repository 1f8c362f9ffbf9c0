//! Control-specific value formatting.

use chrono::NaiveDate;

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%m/%d/%Y",
    "%m/%d/%y",
    "%m-%d-%Y",
    "%Y/%m/%d",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
];

/// Parses common US and ISO renderings of a calendar date.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

/// Shapes `value` for a control of `input_type`.
///
/// Date inputs only accept ISO dates; number inputs reject currency
/// symbols and grouping separators. Anything that does not parse is
/// written as given so the host's own validation can complain.
pub fn for_control(value: &str, input_type: &str) -> String {
    match input_type {
        "date" => parse_date(value)
            .map(|date| date.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| value.to_string()),
        "number" => {
            let stripped: String = value
                .trim()
                .trim_start_matches('$')
                .chars()
                .filter(|c| *c != ',')
                .collect();
            if stripped.parse::<f64>().is_ok() {
                stripped
            } else {
                value.to_string()
            }
        }
        _ => value.to_string(),
    }
}
