mod ask;
mod data;
mod export;
mod health;
mod watch;

use clap::{Parser, Subcommand};

pub use self::{ask::AskArgs, export::ExportArgs, health::HealthArgs, watch::WatchArgs};

#[derive(Parser)]
#[command(author, version, about, propagate_version = true)]
#[must_use]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Main command: render the dashboard and keep refreshing it.
    #[clap(name = "watch")]
    Watch(Box<WatchArgs>),

    /// Export the windowed observations as CSV.
    #[clap(name = "export")]
    Export(Box<ExportArgs>),

    /// Ask the assistant about the data, optionally letting it write a file.
    #[clap(name = "ask")]
    Ask(Box<AskArgs>),

    /// Check that the assistant is up.
    #[clap(name = "health")]
    Health(HealthArgs),
}
