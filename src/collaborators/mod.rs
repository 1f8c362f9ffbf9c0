//! Boundary collaborators: text extraction and structured parsing.
//!
//! Both are fatal to the fill attempt that calls them and never retried.

mod fixed;
mod json;
mod openai;
mod pdf;

use async_trait::async_trait;
use autofill_core_types::{FieldName, ParsedRecord};

use crate::config::ProfileSettings;
use crate::errors::CollaboratorError;

pub use fixed::{PlainTextExtractor, StaticRecordParser};
pub use json::extract_json_object;
pub use openai::{record_from_json, OpenAiRecordParser};
pub use pdf::{extract_text, PdfTextExtractor};

/// Confidence given to values taken from the user's profile.
pub const PROFILE_CONFIDENCE: f64 = 1.0;

#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(&self, bytes: &[u8]) -> Result<String, CollaboratorError>;
}

#[async_trait]
pub trait RecordParser: Send + Sync {
    async fn parse(
        &self,
        text: &str,
        profile: &ProfileSettings,
    ) -> Result<ParsedRecord, CollaboratorError>;
}

/// Fills the profile-backed fields the parser left empty.
pub fn apply_profile_defaults(record: ParsedRecord, profile: &ProfileSettings) -> ParsedRecord {
    record
        .with_default(FieldName::PurchaserName, &profile.purchaser_name, PROFILE_CONFIDENCE)
        .with_default(FieldName::NetId, &profile.net_id, PROFILE_CONFIDENCE)
        .with_default(FieldName::ClubName, &profile.club_name, PROFILE_CONFIDENCE)
}
