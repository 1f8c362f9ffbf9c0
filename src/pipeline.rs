//! Receipt bytes to fill command: extraction, then parsing.

use std::sync::Arc;

use autofill_core_types::{FillSummary, ParsedRecord};
use tracing::{info, instrument, warn};

use crate::agent::AutofillAgent;
use crate::collaborators::{RecordParser, TextExtractor};
use crate::command::{Command, FillCommand, FilePayload, Response};
use crate::config::ProfileSettings;
use crate::errors::{AgentError, CollaboratorError};

#[derive(Clone)]
pub struct ReceiptPipeline {
    extractor: Arc<dyn TextExtractor>,
    parser: Arc<dyn RecordParser>,
}

impl ReceiptPipeline {
    pub fn new(extractor: Arc<dyn TextExtractor>, parser: Arc<dyn RecordParser>) -> Self {
        Self { extractor, parser }
    }

    /// Any collaborator failure aborts; no partial record is returned.
    #[instrument(skip_all, fields(bytes = bytes.len()))]
    pub async fn parse(
        &self,
        bytes: &[u8],
        profile: &ProfileSettings,
    ) -> Result<ParsedRecord, CollaboratorError> {
        let text = self.extractor.extract(bytes).await.map_err(|err| {
            warn!(category = err.category(), error = %err, "extraction failed");
            err
        })?;
        let record = self.parser.parse(&text, profile).await.map_err(|err| {
            warn!(category = err.category(), error = %err, "parsing failed");
            err
        })?;
        info!(fields = record.len(), "receipt parsed");
        Ok(record)
    }

    /// Parses `file` and wraps the result, file included, in a fill command.
    pub async fn fill_command(
        &self,
        file: FilePayload,
        profile: &ProfileSettings,
    ) -> Result<Command, CollaboratorError> {
        let record = self.parse(&file.data, profile).await?;
        Ok(Command::Fill(FillCommand::new(record).with_file(file)))
    }

    /// Parses with the session's profile and hands the result to `agent`.
    pub async fn run(
        &self,
        agent: &AutofillAgent,
        file: FilePayload,
    ) -> Result<FillSummary, AgentError> {
        let profile = agent.session().settings().profile;
        let command = self.fill_command(file, &profile).await?;
        match agent.handle(command).await? {
            Response::Filled(summary) => Ok(summary),
            Response::SettingsStored => Err(AgentError::InvalidCommand(
                "fill command answered with a settings reply".into(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use autofill_core_types::FieldName;

    use super::*;
    use crate::collaborators::{PlainTextExtractor, StaticRecordParser};

    struct FailingParser;

    #[async_trait]
    impl RecordParser for FailingParser {
        async fn parse(
            &self,
            _text: &str,
            _profile: &ProfileSettings,
        ) -> Result<ParsedRecord, CollaboratorError> {
            Err(CollaboratorError::Authentication("bad key".into()))
        }
    }

    #[tokio::test]
    async fn builds_fill_command_with_file() {
        let pipeline = ReceiptPipeline::new(
            Arc::new(PlainTextExtractor),
            Arc::new(StaticRecordParser::new(
                ParsedRecord::new().with(FieldName::VendorName, "Acme", 0.95),
            )),
        );
        let file = FilePayload::new("receipt.txt", b"ACME SUPPLIES  Total 42.50".to_vec());
        let Command::Fill(fill) = pipeline
            .fill_command(file, &ProfileSettings::default())
            .await
            .unwrap()
        else {
            panic!("expected fill command");
        };
        assert_eq!(fill.record.len(), 1);
        assert_eq!(fill.file.unwrap().mime_type, "text/plain");
    }

    #[tokio::test]
    async fn collaborator_errors_surface_verbatim() {
        let pipeline = ReceiptPipeline::new(Arc::new(PlainTextExtractor), Arc::new(FailingParser));
        let err = pipeline
            .parse(b"Total 4.00", &ProfileSettings::default())
            .await
            .unwrap_err();
        assert_eq!(err, CollaboratorError::Authentication("bad key".into()));

        let err = pipeline
            .parse(b"", &ProfileSettings::default())
            .await
            .unwrap_err();
        assert_eq!(err.category(), "extraction");
    }
}
