use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use receipt_autofill::AgentError;

use super::context::CliContext;
use super::fill::{build_agent, finish, read_file};
use super::host::load_page;
use super::parse::build_pipeline;

#[derive(Args, Clone, Debug)]
pub struct RunArgs {
    /// Page snapshot (JSON) to fill
    #[arg(long, value_name = "FILE")]
    pub page: PathBuf,

    /// Receipt to parse and attach
    #[arg(long, value_name = "FILE")]
    pub file: PathBuf,

    /// Where to write the filled page snapshot
    #[arg(long, value_name = "FILE")]
    pub out: Option<PathBuf>,

    /// Run a scripted host upload handler on the page
    #[arg(long)]
    pub emulate_host: bool,
}

pub async fn cmd_run(args: RunArgs, ctx: &CliContext) -> Result<()> {
    let page = load_page(&args.page, args.emulate_host).await?;
    let agent = build_agent(page, ctx).await?;
    let pipeline = build_pipeline(&args.file, ctx)?;
    let file = read_file(&args.file).await?;

    let summary = pipeline.run(&agent, file).await.map_err(|err| {
        if let AgentError::Collaborator(failure) = &err {
            eprintln!("{}", failure.user_message());
        }
        err
    })?;
    finish(&agent, &summary, args.out.as_ref(), ctx).await
}
