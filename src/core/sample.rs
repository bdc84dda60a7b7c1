use std::fmt::{Display, Formatter};

use bon::Builder;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::quantity::power::Watts;

/// Home or group identifier.
#[derive(
    Clone,
    Debug,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::From,
    derive_more::FromStr,
)]
#[serde(transparent)]
pub struct EntityId(String);

impl AsRef<str> for EntityId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

/// Local wall-clock timestamp as the charting surface expects it: `YYYY-MM-DDTHH:MM:SS`.
#[derive(Copy, Clone, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub struct LocalTimestamp(pub NaiveDateTime);

impl LocalTimestamp {
    pub const FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

    /// Pin the time of day of `timestamp` onto the calendar `date`.
    ///
    /// Stored timestamps are only meaningful as a time of day within the queried partition.
    pub fn on(date: NaiveDate, timestamp: NaiveDateTime) -> Self {
        Self(date.and_time(timestamp.time()))
    }
}

impl Display for LocalTimestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format(Self::FORMAT))
    }
}

impl Serialize for LocalTimestamp {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Single power reading of one entity.
#[must_use]
#[derive(Clone, Debug, PartialEq, Builder)]
pub struct PowerSample {
    #[builder(into)]
    pub entity_id: EntityId,

    pub timestamp: NaiveDateTime,

    #[builder(default)]
    pub consumption: Watts,

    #[builder(default)]
    pub production: Watts,

    /// Net power exchanged with the grid.
    ///
    /// Positive means drawing from the grid, negative means injecting into it.
    /// Measured independently, so it is not necessarily `consumption - production`.
    #[builder(default)]
    pub total: Watts,
}

/// Raw per-phase reading of one entity.
#[must_use]
#[derive(Clone, Debug, PartialEq, Builder)]
pub struct RawPhaseSample {
    #[builder(into)]
    pub entity_id: EntityId,

    pub timestamp: NaiveDateTime,

    /// Phase values by their position: `phase0`, `phase1`, and so on.
    ///
    /// Gaps are [`None`].
    #[builder(default)]
    pub phases: Vec<Option<f64>>,
}

impl RawPhaseSample {
    pub fn phase(&self, index: usize) -> Option<f64> {
        self.phases.get(index).copied().flatten()
    }
}
