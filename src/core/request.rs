use std::fmt::{Display, Formatter};

use chrono::NaiveDate;
use serde::Serialize;

use crate::core::sample::EntityId;

/// Which entities a request targets.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Scope {
    /// Single home or group.
    Entity(EntityId),

    /// Every home in the roster.
    All,

    /// Members of the group, or the group's own aggregate for [`DataKind::Groups`].
    Group(EntityId),
}

impl Display for Scope {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Entity(entity_id) => write!(f, "{entity_id}"),
            Self::All => f.write_str("*"),
            Self::Group(group_id) => write!(f, "group:{group_id}"),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DataKind {
    /// Per-phase readings.
    Raw,

    /// Consumption, production and net grid power.
    #[value(alias = "powers")]
    Power,

    /// Power aggregated at the group level.
    Groups,
}

impl DataKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Raw => "raw",
            Self::Power => "power",
            Self::Groups => "groups",
        }
    }
}

impl Display for DataKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[must_use]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SeriesRequest {
    pub scope: Scope,
    pub date: NaiveDate,
    pub kind: DataKind,
}

impl SeriesRequest {
    pub const fn new(scope: Scope, date: NaiveDate, kind: DataKind) -> Self {
        Self { scope, date, kind }
    }
}

impl Display for SeriesRequest {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} on {}", self.kind, self.scope, self.date)
    }
}
