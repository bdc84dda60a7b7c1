use clap::Parser;
use serde_json::json;

use crate::{
    api::directory::Directory,
    cli::{
        query::{DateArgs, ScopeArgs},
        roster::RosterArgs,
        storage::StorageArgs,
    },
    core::request::{DataKind, SeriesRequest},
    orchestrator::{Orchestrator, Outcome, SeriesResponse},
    prelude::*,
    tables::{build_raw_table, build_totals_table},
};

#[derive(Parser)]
pub struct ShowArgs {
    #[clap(flatten)]
    storage: StorageArgs,

    #[clap(flatten)]
    roster: RosterArgs,

    #[clap(flatten)]
    date: DateArgs,

    #[clap(flatten)]
    scope: ScopeArgs,

    #[clap(long, value_enum, default_value = "power")]
    kind: DataKind,

    /// Print the chart-ready series as JSON instead of the tables.
    #[clap(long)]
    json: bool,
}

impl ShowArgs {
    #[instrument(skip_all)]
    pub async fn run(self) -> Result {
        let orchestrator = Orchestrator::new(self.storage.connect()?, self.roster.load()?);
        let request = SeriesRequest::new(self.scope.scope(), self.date.date(), self.kind);
        let outcome = orchestrator.handle(&request).await?;
        if self.json {
            println!("{}", to_json(&outcome)?);
        } else {
            print_outcome(&outcome, orchestrator.directory());
        }
        Ok(())
    }
}

/// Series as JSON, or a `no_data` marker with the date.
fn to_json(outcome: &Outcome) -> serde_json::Result<String> {
    match outcome {
        Outcome::NoData { date } => serde_json::to_string_pretty(&json!({ "no_data": date })),
        Outcome::Delivered(response) => serde_json::to_string_pretty(response),
    }
}

pub fn print_outcome(outcome: &Outcome, directory: &impl Directory) {
    match outcome {
        Outcome::NoData { date } => println!("{date}: no data"),
        Outcome::Delivered(SeriesResponse::Power(charts)) => {
            println!("{}", build_totals_table(charts, directory));
        }
        Outcome::Delivered(SeriesResponse::Raw(charts)) => {
            println!("{}", build_raw_table(charts));
        }
    }
}
