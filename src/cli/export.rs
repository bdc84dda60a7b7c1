use std::path::PathBuf;

use clap::Parser;

use crate::{
    cli::{
        query::{DateArgs, ScopeArgs},
        roster::RosterArgs,
        storage::StorageArgs,
    },
    core::request::{DataKind, SeriesRequest},
    export::export_to,
    orchestrator::Orchestrator,
    prelude::*,
};

#[derive(Parser)]
pub struct ExportArgs {
    #[clap(flatten)]
    storage: StorageArgs,

    #[clap(flatten)]
    roster: RosterArgs,

    #[clap(flatten)]
    date: DateArgs,

    #[clap(flatten)]
    scope: ScopeArgs,

    /// Either `power` or `groups`.
    #[clap(long, value_enum, default_value = "power")]
    kind: DataKind,

    #[clap(long = "output-dir", default_value = ".")]
    output_dir: PathBuf,
}

impl ExportArgs {
    #[instrument(skip_all)]
    pub async fn run(self) -> Result {
        let orchestrator = Orchestrator::new(self.storage.connect()?, self.roster.load()?);
        let request = SeriesRequest::new(self.scope.scope(), self.date.date(), self.kind);
        let samples = orchestrator.fetch_power_samples(&request).await?;
        if samples.is_empty() {
            info!(date = %request.date, "no data");
            return Ok(());
        }
        let paths = export_to(&self.output_dir, request.date, &samples)?;
        info!(n_files = paths.len(), "done");
        Ok(())
    }
}
