// gtsetup/src/cli.rs
//! Defines the command-line argument structure using clap.
use clap::{ArgAction, Parser, Subcommand};
use gtsetup_common::error::Result;
use gtsetup_common::Config;

pub mod gt911;
pub mod provision;

use crate::cli::gt911::Gt911Command;
use crate::cli::provision::ProvisionArgs;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None, name = "gtsetup", bin_name = "gtsetup")]
#[command(propagate_version = true)]
pub struct CliArgs {
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Defaults to `provision` when omitted.
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Enable the goodix overlay, install its files and reboot.
    Provision(ProvisionArgs),
    /// Generate, inspect and install GT911 controller configs.
    #[command(subcommand)]
    Gt911(Gt911Command),
}

impl Command {
    pub async fn run(&self, config: &Config) -> Result<()> {
        match self {
            Self::Provision(command) => command.run(config).await,
            Self::Gt911(command) => command.run(config).await,
        }
    }
}
