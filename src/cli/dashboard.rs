use clap::Parser;

use crate::{
    api::directory::Directory,
    cli::{query::DateArgs, roster::RosterArgs, show::print_outcome, storage::StorageArgs},
    core::{
        request::{DataKind, Scope, SeriesRequest},
        sample::EntityId,
    },
    orchestrator::Orchestrator,
    prelude::*,
    session::{Panel, Session},
};

#[derive(Parser)]
pub struct DashboardArgs {
    #[clap(flatten)]
    storage: StorageArgs,

    #[clap(flatten)]
    roster: RosterArgs,

    #[clap(flatten)]
    date: DateArgs,

    #[clap(long, env = "HOME_ID")]
    home: EntityId,
}

impl DashboardArgs {
    #[instrument(skip_all, fields(home = %self.home))]
    pub async fn run(self) -> Result {
        let orchestrator = Orchestrator::new(self.storage.connect()?, self.roster.load()?);
        let date = self.date.date();

        let mut requests =
            vec![SeriesRequest::new(Scope::Entity(self.home.clone()), date, DataKind::Power)];
        requests.extend(
            orchestrator
                .directory()
                .groups_of(&self.home)
                .into_iter()
                .map(|group_id| SeriesRequest::new(Scope::Group(group_id), date, DataKind::Groups)),
        );
        info!(n_requests = requests.len(), %date, "fetching…");

        let mut session = Session::default();
        let ticket = session.begin();
        for (request, result) in requests.iter().zip(orchestrator.handle_all(&requests).await) {
            session.accept(ticket, request.scope.to_string(), result);
        }

        for view in session.views() {
            println!("{}", view.label);
            match &view.panel {
                Panel::Ready(outcome) => print_outcome(outcome, orchestrator.directory()),
                Panel::Failed => println!("failed to fetch"),
            }
        }
        Ok(())
    }
}
