//! Text extraction from text-based PDF receipts.

use async_trait::async_trait;
use lopdf::Document;
use tracing::{debug, info, warn};

use super::TextExtractor;
use crate::errors::CollaboratorError;

/// Fewer meaningful characters than this means there is nothing to parse.
const MIN_TEXT_CHARS: usize = 30;

/// Share of image-only pages at which the whole file counts as scanned.
const SCANNED_RATIO: f64 = 0.8;

#[derive(Clone, Copy, Debug, Default)]
pub struct PdfTextExtractor;

impl PdfTextExtractor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TextExtractor for PdfTextExtractor {
    async fn extract(&self, bytes: &[u8]) -> Result<String, CollaboratorError> {
        let bytes = bytes.to_vec();
        tokio::task::spawn_blocking(move || extract_text(&bytes))
            .await
            .map_err(|err| CollaboratorError::Extraction(format!("extraction task failed: {err}")))?
    }
}

/// Structural check with lopdf, then full extraction with pdf-extract.
pub fn extract_text(bytes: &[u8]) -> Result<String, CollaboratorError> {
    if !bytes.starts_with(b"%PDF") {
        return Err(CollaboratorError::Extraction("file is not a PDF".into()));
    }
    let doc = Document::load_mem(bytes)
        .map_err(|err| CollaboratorError::Extraction(format!("failed to parse PDF: {err}")))?;
    if looks_like_scanned(&doc) {
        info!("PDF looks scanned or image-only");
        return Err(CollaboratorError::Extraction(
            "PDF has no text layer (scanned image)".into(),
        ));
    }

    let text = pdf_extract::extract_text_from_mem(bytes).map_err(|err| {
        warn!(error = %err, "pdf-extract failed");
        CollaboratorError::Extraction(format!("text extraction failed: {err}"))
    })?;
    let meaningful = text.chars().filter(|c| !c.is_whitespace()).count();
    if meaningful < MIN_TEXT_CHARS {
        return Err(CollaboratorError::Extraction(format!(
            "only {meaningful} characters of text found"
        )));
    }
    debug!(chars = meaningful, "text extracted");
    Ok(text)
}

/// Pages with image XObjects but no fonts are scans.
fn looks_like_scanned(doc: &Document) -> bool {
    let pages = doc.get_pages();
    if pages.is_empty() {
        return false;
    }

    let image_only = pages
        .values()
        .filter_map(|object_id| doc.get_object(*object_id).ok())
        .filter_map(|page| page.as_dict().ok())
        .filter(|page| {
            let resource = |key: &[u8]| {
                page.get(b"Resources")
                    .ok()
                    .and_then(|r| doc.dereference(r).ok())
                    .and_then(|(_, resolved)| resolved.as_dict().ok())
                    .and_then(|res| res.get(key).ok())
                    .and_then(|entry| doc.dereference(entry).ok())
                    .and_then(|(_, resolved)| resolved.as_dict().ok())
                    .is_some_and(|dict| !dict.is_empty())
            };
            resource(b"XObject") && !resource(b"Font")
        })
        .count();

    let ratio = image_only as f64 / pages.len() as f64;
    debug!(pages = pages.len(), image_only, ratio, "scanned-page analysis");
    ratio >= SCANNED_RATIO
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_pdf_bytes() {
        let err = extract_text(b"PK\x03\x04 definitely a zip").unwrap_err();
        assert_eq!(err.category(), "extraction");
    }

    #[test]
    fn rejects_truncated_pdf() {
        assert!(matches!(
            extract_text(b"%PDF-1.4\n%garbage"),
            Err(CollaboratorError::Extraction(_))
        ));
    }

    #[tokio::test]
    async fn extractor_runs_off_the_async_thread() {
        let err = PdfTextExtractor::new().extract(b"hello").await.unwrap_err();
        assert!(err.to_string().contains("not a PDF"));
    }
}
