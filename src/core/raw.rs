use std::collections::HashMap;

use serde::Serialize;

use crate::{
    core::sample::{EntityId, LocalTimestamp, RawPhaseSample},
    prelude::*,
};

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct RawPoint {
    pub x: LocalTimestamp,
    pub y: f64,
}

/// Points of a single named phase channel.
#[must_use]
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Dataset {
    pub label: String,
    pub data: Vec<RawPoint>,
}

#[must_use]
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RawChart {
    pub entity_id: EntityId,
    pub datasets: Vec<Dataset>,
}

/// Spread the raw samples over the declared channels of each entity.
///
/// Channels map onto the phase values by position. A channel without a value in some row gets no
/// point for that row, and phase values beyond the declared channels are ignored. Rows of
/// entities without a channel layout are skipped.
pub fn build_raw_series(
    samples: &[RawPhaseSample],
    channel_names: &[(EntityId, Vec<String>)],
) -> Vec<RawChart> {
    let mut charts: Vec<RawChart> = channel_names
        .iter()
        .map(|(entity_id, names)| RawChart {
            entity_id: entity_id.clone(),
            datasets: names
                .iter()
                .map(|name| Dataset { label: name.clone(), data: Vec::new() })
                .collect(),
        })
        .collect();
    let indices: HashMap<&EntityId, usize> =
        channel_names.iter().enumerate().map(|(index, (entity_id, _))| (entity_id, index)).collect();

    let mut n_skipped = 0_usize;
    for sample in samples {
        let Some(&index) = indices.get(&sample.entity_id) else {
            n_skipped += 1;
            continue;
        };
        let x = LocalTimestamp(sample.timestamp);
        for (channel, dataset) in charts[index].datasets.iter_mut().enumerate() {
            if let Some(y) = sample.phase(channel) {
                dataset.data.push(RawPoint { x, y });
            }
        }
    }
    if n_skipped != 0 {
        debug!(n_skipped, "skipped rows of entities without a channel layout");
    }

    charts
}
