//! Metering backend which answers `POST /date` with the rows of one day partition.

use std::{collections::BTreeMap, time::Duration};

use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::serde_as;

use crate::{
    core::{
        request::DataKind,
        sample::{EntityId, PowerSample, RawPhaseSample},
    },
    prelude::*,
    quantity::power::Watts,
};

#[async_trait]
pub trait Storage: Sync {
    /// Fetch the rows of the date partition.
    ///
    /// Without an entity, the backend returns the rows of every entity it knows for the kind.
    async fn fetch(
        &self,
        kind: DataKind,
        date: NaiveDate,
        entity_id: Option<&EntityId>,
    ) -> Result<Vec<Row>>;
}

pub struct Client {
    inner: reqwest::Client,
    url: Url,
}

impl Client {
    #[instrument(skip_all, fields(base_url = %base_url))]
    pub fn new(base_url: &Url, timeout: Duration) -> Result<Self> {
        let inner = reqwest::Client::builder().timeout(timeout).build()?;
        let url = base_url
            .join("date")
            .with_context(|| format!("`{base_url}` cannot be used as a base URL"))?;
        Ok(Self { inner, url })
    }
}

#[async_trait]
impl Storage for Client {
    #[instrument(skip_all, fields(kind = %kind, date = %date, entity_id = ?entity_id))]
    async fn fetch(
        &self,
        kind: DataKind,
        date: NaiveDate,
        entity_id: Option<&EntityId>,
    ) -> Result<Vec<Row>> {
        info!("fetching…");
        let rows = self
            .inner
            .post(self.url.clone())
            .json(&Request { date, data_type: kind, home_id: entity_id })
            .send()
            .await
            .with_context(|| format!("failed to call `{}`", self.url))?
            .error_for_status()
            .context("request failed")?
            .json::<Response>()
            .await
            .context("failed to deserialize the response")?
            .into_rows();
        info!(n_rows = rows.len(), "fetched");
        Ok(rows)
    }
}

#[derive(Serialize)]
struct Request<'a> {
    date: NaiveDate,
    data_type: DataKind,

    #[serde(skip_serializing_if = "Option::is_none")]
    home_id: Option<&'a EntityId>,
}

#[derive(Deserialize)]
struct Response {
    #[serde(default)]
    data: Option<Data>,
}

impl Response {
    fn into_rows(self) -> Vec<Row> {
        match self.data {
            Some(Data::Wrapped { rows } | Data::Bare(rows)) => rows,
            None => Vec::new(),
        }
    }
}

/// Older backends return the bare row array instead of the query result.
#[serde_as]
#[derive(Deserialize)]
#[serde(untagged)]
enum Data {
    Wrapped {
        #[serde_as(as = "serde_with::VecSkipError<_>")]
        rows: Vec<Row>,
    },

    Bare(#[serde_as(as = "serde_with::VecSkipError<_>")] Vec<Row>),
}

/// Row record as the backend returns it.
///
/// Every field is optional: numeric fields default to zero when the samples are built,
/// and rows without a usable timestamp are dropped.
#[serde_as]
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Row {
    #[serde(default, alias = "home_id")]
    pub entity_id: Option<EntityId>,

    #[serde(default)]
    pub ts: Option<String>,

    #[serde_as(as = "serde_with::DefaultOnError")]
    #[serde(default)]
    pub p_cons: Option<f64>,

    #[serde_as(as = "serde_with::DefaultOnError")]
    #[serde(default)]
    pub p_prod: Option<f64>,

    #[serde_as(as = "serde_with::DefaultOnError")]
    #[serde(default)]
    pub p_tot: Option<f64>,

    /// Remaining columns, among them `phase0`, `phase1`, and so on.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Row {
    /// Phase columns at or beyond this index are ignored.
    pub const MAX_PHASES: usize = 64;

    /// Timestamp on the local clock.
    ///
    /// Bare times of day are placed on the queried `date`.
    pub fn timestamp(&self, date: NaiveDate) -> Option<NaiveDateTime> {
        parse_timestamp(self.ts.as_deref()?, date)
    }

    /// Phase values by their position, with [`None`] for the missing ones.
    pub fn phases(&self) -> Vec<Option<f64>> {
        let indexed: Vec<(usize, f64)> = self
            .extra
            .iter()
            .filter_map(|(key, value)| {
                let index = key.strip_prefix("phase")?.parse::<usize>().ok()?;
                if index >= Self::MAX_PHASES {
                    debug!(%key, "ignoring the out-of-range phase");
                    return None;
                }
                Some((index, value.as_f64()?))
            })
            .collect();
        let Some(n_phases) = indexed.iter().map(|(index, _)| index + 1).max() else {
            return Vec::new();
        };
        let mut phases = vec![None; n_phases];
        for (index, value) in indexed {
            phases[index] = Some(value);
        }
        phases
    }
}

fn parse_timestamp(ts: &str, date: NaiveDate) -> Option<NaiveDateTime> {
    let ts = ts.trim();
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(ts) {
        return Some(timestamp.with_timezone(&Local).naive_local());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .into_iter()
        .find_map(|format| NaiveDateTime::parse_from_str(ts, format).ok())
        .or_else(|| {
            NaiveTime::parse_from_str(ts, "%H:%M:%S%.f").ok().map(|time| date.and_time(time))
        })
}

/// Turns backend rows into samples, dropping the rows without a usable timestamp.
///
/// Rows without an entity belong to `fallback`, the entity the rows were requested for.
pub struct RowConverter<'a> {
    pub date: NaiveDate,
    pub fallback: Option<&'a EntityId>,
}

impl RowConverter<'_> {
    fn entity_and_timestamp(&self, index: usize, row: &Row) -> Option<(EntityId, NaiveDateTime)> {
        let Some(entity_id) = row.entity_id.as_ref().or(self.fallback).cloned() else {
            warn!(index, "dropped a row without an entity");
            return None;
        };
        let Some(timestamp) = row.timestamp(self.date) else {
            warn!(index, ts = ?row.ts, %entity_id, "dropped a row without a usable timestamp");
            return None;
        };
        Some((entity_id, timestamp))
    }

    pub fn power_samples(&self, rows: &[Row]) -> Vec<PowerSample> {
        rows.iter()
            .enumerate()
            .filter_map(|(index, row)| {
                let (entity_id, timestamp) = self.entity_and_timestamp(index, row)?;
                Some(
                    PowerSample::builder()
                        .entity_id(entity_id)
                        .timestamp(timestamp)
                        .consumption(Watts(row.p_cons.unwrap_or_default()))
                        .production(Watts(row.p_prod.unwrap_or_default()))
                        .total(Watts(row.p_tot.unwrap_or_default()))
                        .build(),
                )
            })
            .collect()
    }

    pub fn raw_samples(&self, rows: &[Row]) -> Vec<RawPhaseSample> {
        rows.iter()
            .enumerate()
            .filter_map(|(index, row)| {
                let (entity_id, timestamp) = self.entity_and_timestamp(index, row)?;
                Some(
                    RawPhaseSample::builder()
                        .entity_id(entity_id)
                        .timestamp(timestamp)
                        .phases(row.phases())
                        .build(),
                )
            })
            .collect()
    }
}
