use std::{
    fs::File,
    io::Write,
    path::{Path, PathBuf},
};

use chrono::NaiveDate;
use serde::Serialize;

use crate::{
    core::{
        energy::{Component, energy_from_series},
        sample::{EntityId, LocalTimestamp, PowerSample},
    },
    prelude::*,
};

#[derive(Serialize)]
struct Record<'a> {
    entity_id: &'a EntityId,
    ts: LocalTimestamp,
    p_cons: f64,
    p_prod: f64,
    p_tot: f64,
}

impl<'a> From<&'a PowerSample> for Record<'a> {
    fn from(sample: &'a PowerSample) -> Self {
        Self {
            entity_id: &sample.entity_id,
            ts: LocalTimestamp(sample.timestamp),
            p_cons: sample.consumption.0,
            p_prod: sample.production.0,
            p_tot: sample.total.0,
        }
    }
}

/// Write the samples as CSV with a header row.
pub fn write_csv<'a>(
    writer: impl Write,
    samples: impl IntoIterator<Item = &'a PowerSample>,
) -> Result {
    let mut writer = csv::Writer::from_writer(writer);
    for sample in samples {
        writer.serialize(Record::from(sample))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn file_name(entity_id: &EntityId, date: NaiveDate) -> String {
    format!("data_{entity_id}_{date}.csv")
}

/// Write one file per entity into the directory and return the written paths.
#[instrument(skip_all, fields(directory = %directory.display(), date = %date))]
pub fn export_to(
    directory: &Path,
    date: NaiveDate,
    samples: &[PowerSample],
) -> Result<Vec<PathBuf>> {
    let mut entity_ids: Vec<&EntityId> = Vec::new();
    for sample in samples {
        if !entity_ids.contains(&&sample.entity_id) {
            entity_ids.push(&sample.entity_id);
        }
    }
    let mut paths = Vec::with_capacity(entity_ids.len());
    for entity_id in entity_ids {
        let path = directory.join(file_name(entity_id, date));
        let file = File::create(&path)
            .with_context(|| format!("failed to create `{}`", path.display()))?;
        let entity_samples: Vec<PowerSample> =
            samples.iter().filter(|sample| &sample.entity_id == entity_id).cloned().collect();
        write_csv(file, &entity_samples)
            .with_context(|| format!("failed to write `{}`", path.display()))?;
        info!(
            path = %path.display(),
            n_rows = entity_samples.len(),
            consumption_kwh = energy_from_series(&entity_samples, Component::Consumption),
            "exported",
        );
        paths.push(path);
    }
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quantity::power::Watts;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 1, 5).unwrap()
    }

    #[test]
    fn test_write_csv() -> Result {
        let sample = PowerSample::builder()
            .entity_id("H1")
            .timestamp(date().and_hms_opt(8, 30, 0).unwrap())
            .consumption(Watts(120.5))
            .total(Watts(-40.0))
            .build();
        let mut buffer = Vec::new();
        write_csv(&mut buffer, [&sample])?;
        assert_eq!(
            String::from_utf8(buffer)?,
            "entity_id,ts,p_cons,p_prod,p_tot\nH1,2023-01-05T08:30:00,120.5,0.0,-40.0\n",
        );
        Ok(())
    }

    #[test]
    fn test_file_name() {
        assert_eq!(file_name(&EntityId::from("CDB001"), date()), "data_CDB001_2023-01-05.csv");
    }
}
