use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use host_dom::HostPage;
use receipt_autofill::{
    AutofillAgent, Command, FillCommand, FillSummary, FilePayload, ParsedRecord, Response,
    Settings,
};
use tokio::fs;
use tracing::info;

use super::context::CliContext;
use super::host::{load_page, read_json, write_page};
use super::output::print_summary;

#[derive(Args, Clone, Debug)]
pub struct FillArgs {
    /// Page snapshot (JSON) to fill
    #[arg(long, value_name = "FILE")]
    pub page: PathBuf,

    /// Parsed record (JSON)
    #[arg(long, value_name = "FILE")]
    pub record: PathBuf,

    /// Receipt file to hand to the page's upload control
    #[arg(long, value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Where to write the filled page snapshot
    #[arg(long, value_name = "FILE")]
    pub out: Option<PathBuf>,

    /// Run a scripted host upload handler on the page
    #[arg(long)]
    pub emulate_host: bool,
}

pub async fn cmd_fill(args: FillArgs, ctx: &CliContext) -> Result<()> {
    let page = load_page(&args.page, args.emulate_host).await?;
    let record: ParsedRecord = read_json(&args.record).await?;
    let agent = build_agent(page, ctx).await?;

    let mut command = FillCommand::new(record);
    if let Some(path) = &args.file {
        command = command.with_file(read_file(path).await?);
    }
    let Response::Filled(summary) = agent.handle(Command::Fill(command)).await? else {
        anyhow::bail!("unexpected reply to fill command");
    };
    finish(&agent, &summary, args.out.as_ref(), ctx).await
}

/// Creates the agent and hands it the configured profile.
pub async fn build_agent(page: Arc<HostPage>, ctx: &CliContext) -> Result<AutofillAgent> {
    let agent = AutofillAgent::new(page, ctx.config());
    agent
        .handle(Command::UpdateSettings(Settings {
            api_key: ctx.config().llm.api_key_from_env(),
            profile: ctx.config().profile.clone(),
        }))
        .await?;
    Ok(agent)
}

pub async fn read_file(path: &Path) -> Result<FilePayload> {
    let data = fs::read(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "receipt".to_string());
    Ok(FilePayload::new(name, data))
}

/// Waits for any attachment flow, prints the summary and saves the page.
pub async fn finish(
    agent: &AutofillAgent,
    summary: &FillSummary,
    out: Option<&PathBuf>,
    ctx: &CliContext,
) -> Result<()> {
    if let Some(outcome) = agent.wait_for_attachment().await {
        info!(?outcome, "attachment finished");
    }
    print_summary(summary, ctx.output())?;
    if let Some(path) = out {
        write_page(agent.page(), path).await?;
    }
    Ok(())
}
