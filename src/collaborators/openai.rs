//! Receipt parsing through an OpenAI-compatible chat completions endpoint.

use async_trait::async_trait;
use autofill_core_types::{FieldName, ParsedRecord, RecordValue};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use tracing::{debug, instrument, warn};

use super::{apply_profile_defaults, extract_json_object, RecordParser};
use crate::config::{LlmConfig, ProfileSettings};
use crate::errors::CollaboratorError;

/// Receipt text past this many characters is cut before prompting.
const MAX_RECEIPT_CHARS: usize = 12_000;

const SYSTEM_PROMPT: &str = "\
You extract reimbursement data from receipt text. Reply with one JSON object \
whose keys are exactly: purchaser_name, net_id, club_name, payment_method, \
vendor_name, expense_date, total_amount, purchase_type, event_link, description. \
Each value is an object {\"value\": <string or number>, \"confidence\": <0..1>}. \
Use an empty string with confidence 0 for anything the receipt does not show. \
expense_date is MM/DD/YYYY. total_amount is a number without currency symbols. \
payment_method is one of club_card_with_extra, club_card_without_extra, out_of_pocket. \
purchase_type is one of food, supplies, travel, equipment, other. \
description is one short sentence stating the business purpose.";

pub struct OpenAiRecordParser {
    client: Client,
    config: LlmConfig,
    api_key: Option<String>,
}

impl OpenAiRecordParser {
    /// `api_key` falls back to the configured environment variable.
    pub fn new(config: LlmConfig, api_key: Option<String>) -> Result<Self, CollaboratorError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|err| CollaboratorError::Network(format!("failed to build HTTP client: {err}")))?;
        let api_key = api_key
            .filter(|key| !key.trim().is_empty())
            .or_else(|| config.api_key_from_env());
        Ok(Self {
            client,
            config,
            api_key,
        })
    }

    fn user_prompt(text: &str, profile: &ProfileSettings) -> String {
        let receipt: String = text.chars().take(MAX_RECEIPT_CHARS).collect();
        let mut prompt = String::from("Receipt text:\n");
        prompt.push_str(&receipt);
        let hints: Vec<String> = [
            ("purchaser_name", &profile.purchaser_name),
            ("net_id", &profile.net_id),
            ("club_name", &profile.club_name),
        ]
        .iter()
        .filter(|(_, value)| !value.trim().is_empty())
        .map(|(key, value)| format!("{key}: {value}"))
        .collect();
        if !hints.is_empty() {
            prompt.push_str("\n\nKnown profile values (use them when the receipt is silent):\n");
            prompt.push_str(&hints.join("\n"));
        }
        prompt
    }
}

#[async_trait]
impl RecordParser for OpenAiRecordParser {
    #[instrument(skip_all, fields(model = %self.config.model, chars = text.len()))]
    async fn parse(
        &self,
        text: &str,
        profile: &ProfileSettings,
    ) -> Result<ParsedRecord, CollaboratorError> {
        let key = self
            .api_key
            .as_deref()
            .ok_or_else(|| CollaboratorError::MissingCredential(self.config.api_key_env.clone()))?;
        let url = format!(
            "{}/chat/completions",
            self.config.api_base.trim_end_matches('/')
        );
        let body = ChatCompletionRequest {
            model: self.config.model.clone(),
            temperature: self.config.temperature,
            response_format: ResponseFormat {
                r#type: "json_object".to_string(),
            },
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: Self::user_prompt(text, profile),
                },
            ],
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(key)
            .json(&body)
            .send()
            .await
            .map_err(|err| CollaboratorError::Network(format!("request failed: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "<response unavailable>".to_string());
            let message = error_message(&text);
            warn!(%status, message = %message, "parsing service returned an error");
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    CollaboratorError::Authentication(message)
                }
                _ => CollaboratorError::Network(format!("{status}: {message}")),
            });
        }

        let response: ChatCompletionResponse = response.json().await.map_err(|err| {
            CollaboratorError::MalformedResponse(format!("invalid response body: {err}"))
        })?;
        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.as_text())
            .ok_or_else(|| CollaboratorError::MalformedResponse("response has no content".into()))?;
        let json = extract_json_object(&content)
            .ok_or_else(|| CollaboratorError::MalformedResponse("response has no JSON object".into()))?;

        let record = record_from_json(&json)?;
        debug!(fields = record.len(), "receipt parsed");
        Ok(apply_profile_defaults(record, profile))
    }
}

/// Builds a record from the model's `{field: {value, confidence}}` object.
///
/// Unknown keys and null values are ignored. A bare value without an
/// object counts as zero confidence. Confidences are clamped into [0, 1].
pub fn record_from_json(json: &str) -> Result<ParsedRecord, CollaboratorError> {
    let root: Map<String, JsonValue> = serde_json::from_str(json)
        .map_err(|err| CollaboratorError::MalformedResponse(format!("invalid JSON: {err}")))?;

    let mut record = ParsedRecord::new();
    for (key, entry) in root {
        let Some(field) = FieldName::parse(&key) else {
            debug!(key, "ignoring unknown field");
            continue;
        };
        let (raw, confidence) = match &entry {
            JsonValue::Object(object) => (
                object.get("value").cloned().unwrap_or(JsonValue::Null),
                object
                    .get("confidence")
                    .and_then(JsonValue::as_f64)
                    .unwrap_or(0.0),
            ),
            other => (other.clone(), 0.0),
        };
        let value = match raw {
            JsonValue::String(text) => RecordValue::Text(text),
            JsonValue::Number(number) => match number.as_f64() {
                Some(number) => RecordValue::Number(number),
                None => continue,
            },
            JsonValue::Bool(flag) => RecordValue::Text(flag.to_string()),
            _ => continue,
        };
        record = record.with(field, value, confidence);
    }
    Ok(record)
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<OpenAiErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.error.message)
        .unwrap_or_else(|| body.trim().to_string())
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    temperature: f32,
    response_format: ResponseFormat,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    r#type: String,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatCompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChoice {
    message: ChatCompletionMessage,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionMessage {
    content: ChatCompletionContent,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ChatCompletionContent {
    Text(String),
    Parts(Vec<ChatCompletionPart>),
}

impl ChatCompletionContent {
    fn as_text(&self) -> Option<String> {
        match self {
            ChatCompletionContent::Text(value) => Some(value.clone()),
            ChatCompletionContent::Parts(parts) => {
                let text = parts
                    .iter()
                    .filter_map(|part| part.text.as_ref())
                    .cloned()
                    .collect::<Vec<_>>()
                    .join("\n");
                (!text.is_empty()).then_some(text)
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionPart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorEnvelope {
    error: OpenAiErrorMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorMessage {
    message: Option<String>,
}
