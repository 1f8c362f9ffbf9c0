use async_trait::async_trait;
use autofill_core_types::ParsedRecord;

use super::{apply_profile_defaults, RecordParser, TextExtractor};
use crate::config::ProfileSettings;
use crate::errors::CollaboratorError;

/// Returns a fixed record regardless of the text. For offline runs.
#[derive(Clone, Debug, Default)]
pub struct StaticRecordParser {
    record: ParsedRecord,
}

impl StaticRecordParser {
    pub fn new(record: ParsedRecord) -> Self {
        Self { record }
    }
}

#[async_trait]
impl RecordParser for StaticRecordParser {
    async fn parse(
        &self,
        _text: &str,
        profile: &ProfileSettings,
    ) -> Result<ParsedRecord, CollaboratorError> {
        Ok(apply_profile_defaults(self.record.clone(), profile))
    }
}

/// Accepts UTF-8 text receipts as-is.
#[derive(Clone, Copy, Debug, Default)]
pub struct PlainTextExtractor;

#[async_trait]
impl TextExtractor for PlainTextExtractor {
    async fn extract(&self, bytes: &[u8]) -> Result<String, CollaboratorError> {
        let text = std::str::from_utf8(bytes)
            .map_err(|err| CollaboratorError::Extraction(format!("not UTF-8 text: {err}")))?;
        if text.trim().is_empty() {
            return Err(CollaboratorError::Extraction("file is empty".into()));
        }
        Ok(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use autofill_core_types::FieldName;

    use super::*;

    #[tokio::test]
    async fn static_parser_applies_profile() {
        let parser = StaticRecordParser::new(
            ParsedRecord::new().with(FieldName::VendorName, "Acme", 0.95),
        );
        let profile = ProfileSettings {
            club_name: "Chess Club".into(),
            ..ProfileSettings::default()
        };
        let record = parser.parse("ignored", &profile).await.unwrap();
        assert_eq!(record.len(), 2);
        assert_eq!(
            record.get(FieldName::ClubName).unwrap().value.render(),
            "Chess Club"
        );
    }

    #[tokio::test]
    async fn plain_text_rejects_binary_and_empty() {
        assert!(PlainTextExtractor.extract(&[0xff, 0xfe, 0x00]).await.is_err());
        assert!(PlainTextExtractor.extract(b"   ").await.is_err());
        assert_eq!(
            PlainTextExtractor.extract(b"Total $4.00").await.unwrap(),
            "Total $4.00"
        );
    }
}
