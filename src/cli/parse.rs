use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use receipt_autofill::collaborators::{
    OpenAiRecordParser, PdfTextExtractor, PlainTextExtractor, TextExtractor,
};
use receipt_autofill::ReceiptPipeline;

use super::context::CliContext;
use super::fill::read_file;
use super::output::print_value;

#[derive(Args, Clone, Debug)]
pub struct ParseArgs {
    /// Receipt to parse (PDF, or plain text)
    #[arg(long, value_name = "FILE")]
    pub file: PathBuf,
}

pub async fn cmd_parse(args: ParseArgs, ctx: &CliContext) -> Result<()> {
    let file = read_file(&args.file).await?;
    let pipeline = build_pipeline(&args.file, ctx)?;
    let record = pipeline.parse(&file.data, &ctx.config().profile).await?;
    print_value(&record, ctx.output())
}

/// PDFs go through the PDF extractor; anything else is read as text.
pub fn build_pipeline(path: &Path, ctx: &CliContext) -> Result<ReceiptPipeline> {
    let is_pdf = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
    let extractor: Arc<dyn TextExtractor> = if is_pdf {
        Arc::new(PdfTextExtractor::new())
    } else {
        Arc::new(PlainTextExtractor)
    };
    let parser = OpenAiRecordParser::new(ctx.config().llm.clone(), None)?;
    Ok(ReceiptPipeline::new(extractor, Arc::new(parser)))
}
