use std::path::PathBuf;

use clap::Parser;

use crate::{api::directory::Roster, prelude::*, tables::build_roster_table};

#[derive(Parser)]
pub struct RosterArgs {
    /// TOML file with the homes, their phase channels, and the groups.
    #[clap(long = "roster", env = "ROSTER_PATH", default_value = "roster.toml")]
    path: PathBuf,
}

impl RosterArgs {
    pub fn load(&self) -> Result<Roster> {
        Roster::read_from(&self.path)
    }
}

#[derive(Parser)]
pub struct RosterCommandArgs {
    #[clap(flatten)]
    roster: RosterArgs,
}

impl RosterCommandArgs {
    pub fn run(self) -> Result {
        println!("{}", build_roster_table(&self.roster.load()?));
        Ok(())
    }
}
