use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::{
    core::{
        energy::{Component, EnergySummary, PowerSums, Span},
        sample::{EntityId, LocalTimestamp, PowerSample},
        split::split_total,
    },
    quantity::power::Watts,
};

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct ChartPoint {
    pub x: LocalTimestamp,
    pub y: f64,
}

/// Point arrays of a power chart, one per component.
#[must_use]
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PowerDatasets {
    pub p_cons: Vec<ChartPoint>,
    pub p_prod: Vec<ChartPoint>,
    pub p_tot: Vec<ChartPoint>,
    pub pre: Vec<ChartPoint>,
    pub inj: Vec<ChartPoint>,
}

impl PowerDatasets {
    fn push(&mut self, x: LocalTimestamp, sample: &PowerSample) {
        let split = split_total(sample.total);
        let point = |y: Watts| ChartPoint { x, y: y.0 };
        self.p_cons.push(point(sample.consumption));
        self.p_prod.push(point(sample.production));
        self.p_tot.push(point(sample.total));
        self.pre.push(point(split.draw));
        self.inj.push(point(split.injection));
    }

    pub fn get(&self, component: Component) -> &[ChartPoint] {
        match component {
            Component::Consumption => &self.p_cons,
            Component::Production => &self.p_prod,
            Component::Total => &self.p_tot,
            Component::Draw => &self.pre,
            Component::Injection => &self.inj,
        }
    }

    pub const fn len(&self) -> usize {
        self.p_tot.len()
    }

    pub const fn is_empty(&self) -> bool {
        self.p_tot.is_empty()
    }
}

/// Chart-ready power series and daily energy totals of a single entity.
#[must_use]
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PowerChart {
    pub entity_id: EntityId,
    pub datasets: PowerDatasets,
    pub totals: EnergySummary,
}

struct Entry {
    entity_id: EntityId,
    datasets: PowerDatasets,
    sums: PowerSums,
    first: Option<NaiveDateTime>,
    last: Option<NaiveDateTime>,
}

impl Entry {
    fn new(entity_id: EntityId) -> Self {
        Self {
            entity_id,
            datasets: PowerDatasets::default(),
            sums: PowerSums::default(),
            first: None,
            last: None,
        }
    }

    fn push(&mut self, x: LocalTimestamp, sample: &PowerSample) {
        self.datasets.push(x, sample);
        self.sums.accumulate(sample);
        self.first.get_or_insert(sample.timestamp);
        self.last = Some(sample.timestamp);
    }

    fn span(&self) -> Span {
        match (self.first, self.last) {
            (Some(first), Some(last)) => Span::new(first, last, self.datasets.len()),
            _ => Span::default(),
        }
    }

    fn finish(self) -> PowerChart {
        let totals = self.sums.summarize(self.span());
        PowerChart { entity_id: self.entity_id, datasets: self.datasets, totals }
    }
}

/// Reshapes power samples of a single day into per-entity charts.
///
/// Entities keep the order in which they were declared or first seen.
#[must_use]
pub struct PowerSeriesBuilder {
    date: NaiveDate,
    entries: Vec<Entry>,
    indices: HashMap<EntityId, usize>,
}

impl PowerSeriesBuilder {
    pub fn new(date: NaiveDate) -> Self {
        Self { date, entries: Vec::new(), indices: HashMap::new() }
    }

    /// Declare the entities which must have a chart even when they have no samples.
    pub fn with_entities(mut self, entity_ids: impl IntoIterator<Item = EntityId>) -> Self {
        for entity_id in entity_ids {
            self.entry(entity_id);
        }
        self
    }

    fn entry(&mut self, entity_id: EntityId) -> &mut Entry {
        let index = *self.indices.entry(entity_id).or_insert_with_key(|entity_id| {
            self.entries.push(Entry::new(entity_id.clone()));
            self.entries.len() - 1
        });
        &mut self.entries[index]
    }

    pub fn push(&mut self, sample: &PowerSample) {
        let x = LocalTimestamp::on(self.date, sample.timestamp);
        self.entry(sample.entity_id.clone()).push(x, sample);
    }

    pub fn build(self) -> Vec<PowerChart> {
        self.entries.into_iter().map(Entry::finish).collect()
    }
}

impl<'a> Extend<&'a PowerSample> for PowerSeriesBuilder {
    fn extend<T: IntoIterator<Item = &'a PowerSample>>(&mut self, samples: T) {
        for sample in samples {
            self.push(sample);
        }
    }
}

/// Build the charts of the declared entities followed by those only seen in the samples.
pub fn build_power_series(
    samples: &[PowerSample],
    date: NaiveDate,
    entity_ids: impl IntoIterator<Item = EntityId>,
) -> Vec<PowerChart> {
    let mut builder = PowerSeriesBuilder::new(date).with_entities(entity_ids);
    builder.extend(samples);
    builder.build()
}
