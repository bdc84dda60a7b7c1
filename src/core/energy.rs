use chrono::NaiveDateTime;
use serde::Serialize;

use crate::{
    core::{sample::PowerSample, split::split_total},
    quantity::{energy::KilowattHours, power::Watts, time::Hours},
};

/// Power component which the energy can be totalled for.
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
pub enum Component {
    Consumption,
    Production,

    /// Net grid power.
    Total,

    /// Sum of the negative net grid power.
    Injection,

    /// Sum of the positive net grid power.
    Draw,
}

impl Component {
    /// In the order of the totals table.
    pub const ALL: [Self; 5] =
        [Self::Consumption, Self::Production, Self::Injection, Self::Draw, Self::Total];

    pub fn of(self, sample: &PowerSample) -> Watts {
        match self {
            Self::Consumption => sample.consumption,
            Self::Production => sample.production,
            Self::Total => sample.total,
            Self::Injection => split_total(sample.total).injection,
            Self::Draw => split_total(sample.total).draw,
        }
    }

    pub const fn caption(self) -> &'static str {
        match self {
            Self::Consumption => "Consumption",
            Self::Production => "Production",
            Self::Total => "Net",
            Self::Injection => "Injection",
            Self::Draw => "Draw",
        }
    }
}

/// Sample count and elapsed time of a series.
#[must_use]
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Span {
    pub n_samples: usize,

    /// Absolute time between the first and the last sample.
    pub elapsed: Hours,
}

impl Span {
    pub fn new(first: NaiveDateTime, last: NaiveDateTime, n_samples: usize) -> Self {
        Self { n_samples, elapsed: Hours::from((last - first).abs()) }
    }

    pub fn of(samples: &[PowerSample]) -> Self {
        match (samples.first(), samples.last()) {
            (Some(first), Some(last)) => Self::new(first.timestamp, last.timestamp, samples.len()),
            _ => Self::default(),
        }
    }

    /// Mean absolute power given the sum of the component over all the samples.
    pub fn mean_power(self, sum: Watts) -> Option<Watts> {
        #[expect(clippy::cast_precision_loss)]
        let n_samples = self.n_samples as f64;
        (self.n_samples != 0).then(|| sum.abs() / n_samples)
    }

    /// Estimate the energy in whole kilowatt-hours from the sum of the component values.
    ///
    /// This is the mean power times the elapsed time, which assumes uniform sampling.
    /// Irregular sampling intervals are not weighted. Degenerate series yield zero.
    pub fn energy(self, sum: Watts) -> u64 {
        self.mean_power(sum)
            .map_or(KilowattHours::ZERO, |power| power * self.elapsed)
            .round_to_units()
    }
}

/// Total energy of the component over the series, in whole kilowatt-hours.
pub fn energy_from_series(samples: &[PowerSample], component: Component) -> u64 {
    let sum = samples.iter().map(|sample| component.of(sample)).sum::<Watts>();
    Span::of(samples).energy(sum)
}

/// Running sums of every component.
#[must_use]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct PowerSums {
    pub consumption: Watts,
    pub production: Watts,
    pub total: Watts,
    pub injection: Watts,
    pub draw: Watts,
}

impl PowerSums {
    pub fn accumulate(&mut self, sample: &PowerSample) {
        let split = split_total(sample.total);
        self.consumption += sample.consumption;
        self.production += sample.production;
        self.total += sample.total;
        self.injection += split.injection;
        self.draw += split.draw;
    }

    pub fn summarize(&self, span: Span) -> EnergySummary {
        EnergySummary {
            consumption: span.energy(self.consumption),
            production: span.energy(self.production),
            total: span.energy(self.total),
            injection: span.energy(self.injection),
            draw: span.energy(self.draw),
        }
    }
}

/// Daily energy totals in whole kilowatt-hours.
#[must_use]
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct EnergySummary {
    #[serde(rename = "p_cons")]
    pub consumption: u64,

    #[serde(rename = "p_prod")]
    pub production: u64,

    /// Net energy exchanged with the grid.
    #[serde(rename = "p_tot")]
    pub total: u64,

    #[serde(rename = "inj")]
    pub injection: u64,

    #[serde(rename = "pre")]
    pub draw: u64,
}

impl EnergySummary {
    pub const fn get(&self, component: Component) -> u64 {
        match component {
            Component::Consumption => self.consumption,
            Component::Production => self.production,
            Component::Total => self.total,
            Component::Injection => self.injection,
            Component::Draw => self.draw,
        }
    }
}
