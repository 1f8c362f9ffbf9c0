use clap::Subcommand;

use super::config::ConfigArgs;
use super::fill::FillArgs;
use super::parse::ParseArgs;
use super::run::RunArgs;

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// Fill a saved page snapshot from a parsed record
    Fill(FillArgs),

    /// Extract and parse a receipt into a record
    Parse(ParseArgs),

    /// Parse a receipt and fill a page snapshot with it
    Run(RunArgs),

    /// Manage autofill configuration
    Config(ConfigArgs),
}
