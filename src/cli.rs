mod dashboard;
mod export;
mod query;
mod roster;
mod show;
mod storage;

use clap::{Parser, Subcommand};

use crate::{
    cli::{
        dashboard::DashboardArgs,
        export::ExportArgs,
        roster::RosterCommandArgs,
        show::ShowArgs,
    },
    prelude::*,
};

#[derive(Parser)]
#[command(author, version, about, propagate_version = true)]
#[must_use]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Fetch one day of a home, a group, or every home, and print the charts and energy totals.
    Show(Box<ShowArgs>),

    /// Fetch a home together with the aggregates of its groups.
    Dashboard(Box<DashboardArgs>),

    /// Save the power rows as CSV, one file per entity.
    Export(Box<ExportArgs>),

    /// List the homes and groups.
    Roster(RosterCommandArgs),
}

impl Command {
    pub async fn run(self) -> Result {
        match self {
            Self::Show(args) => args.run().await,
            Self::Dashboard(args) => args.run().await,
            Self::Export(args) => args.run().await,
            Self::Roster(args) => args.run(),
        }
    }
}
