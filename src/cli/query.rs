use chrono::{Local, NaiveDate};
use clap::Parser;

use crate::core::{request::Scope, sample::EntityId};

#[derive(Parser)]
pub struct DateArgs {
    /// Day to query, defaults to today.
    #[clap(long, env = "DATE")]
    date: Option<NaiveDate>,
}

impl DateArgs {
    pub fn date(&self) -> NaiveDate {
        self.date.unwrap_or_else(|| Local::now().date_naive())
    }
}

#[derive(Parser)]
pub struct ScopeArgs {
    /// Single home or group.
    #[clap(long, conflicts_with = "group")]
    home: Option<EntityId>,

    /// Members of the group, or the group aggregate with `--kind groups`.
    #[clap(long)]
    group: Option<EntityId>,
}

impl ScopeArgs {
    /// Without a home or group, every home is queried.
    pub fn scope(&self) -> Scope {
        match (&self.home, &self.group) {
            (Some(entity_id), _) => Scope::Entity(entity_id.clone()),
            (None, Some(group_id)) => Scope::Group(group_id.clone()),
            (None, None) => Scope::All,
        }
    }
}
