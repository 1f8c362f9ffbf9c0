use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use super::commands::Commands;
use super::config::cmd_config;
use super::context::CliContext;
use super::env::CliArgs;
use super::fill::cmd_fill;
use super::parse::cmd_parse;
use super::run::cmd_run;
use super::runtime::{init_logging, load_config};
use receipt_autofill::LoadedConfig;

pub async fn run() -> Result<()> {
    let cli = CliArgs::parse();

    init_logging(&cli.log_level, cli.debug, cli.json_logs)?;
    info!("Starting receipt-autofill v{}", env!("CARGO_PKG_VERSION"));

    let LoadedConfig { config, path } = load_config(cli.config.as_ref()).await?;
    let ctx = CliContext::new(config, path, cli.output);

    match dispatch(cli.command, &ctx).await {
        Ok(()) => {
            info!("Command completed successfully");
            Ok(())
        }
        Err(err) => {
            error!("Command failed: {:#}", err);
            Err(err)
        }
    }
}

async fn dispatch(command: Commands, ctx: &CliContext) -> Result<()> {
    match command {
        Commands::Fill(args) => cmd_fill(args, ctx).await,
        Commands::Parse(args) => cmd_parse(args, ctx).await,
        Commands::Run(args) => cmd_run(args, ctx).await,
        Commands::Config(args) => cmd_config(args, ctx).await,
    }
}
