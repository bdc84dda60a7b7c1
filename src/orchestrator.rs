use chrono::NaiveDate;
use futures_util::future::join_all;
use serde::Serialize;

use crate::{
    api::{
        directory::Directory,
        storage::{Row, RowConverter, Storage},
    },
    core::{
        chart::{PowerChart, build_power_series},
        raw::{RawChart, build_raw_series},
        request::{DataKind, Scope, SeriesRequest},
        sample::{EntityId, PowerSample},
    },
    prelude::*,
};

/// Result of a request which reached the storage.
#[must_use]
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    /// Nothing is recorded for the date.
    NoData { date: NaiveDate },

    Delivered(SeriesResponse),
}

#[must_use]
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SeriesResponse {
    Power(Vec<PowerChart>),
    Raw(Vec<RawChart>),
}

/// Entities which a request resolves into.
struct Plan {
    /// Entity to pass to the storage, [`None`] fetches every entity.
    fetch_id: Option<EntityId>,

    /// Entities which get a chart, in the display order.
    declared: Vec<EntityId>,

    /// Drop the rows of entities other than the declared ones.
    is_exclusive: bool,
}

pub struct Orchestrator<S, D> {
    storage: S,
    directory: D,
}

impl<S: Storage, D: Directory> Orchestrator<S, D> {
    pub const fn new(storage: S, directory: D) -> Self {
        Self { storage, directory }
    }

    pub const fn directory(&self) -> &D {
        &self.directory
    }

    fn plan(&self, request: &SeriesRequest) -> Result<Plan> {
        let plan = match (&request.scope, request.kind) {
            (Scope::Entity(entity_id), _) => Plan {
                fetch_id: Some(entity_id.clone()),
                declared: vec![entity_id.clone()],
                is_exclusive: true,
            },
            (Scope::All, DataKind::Groups) => {
                Plan { fetch_id: None, declared: self.directory.list_groups(), is_exclusive: false }
            }
            (Scope::All, DataKind::Power | DataKind::Raw) => Plan {
                fetch_id: None,
                declared: self.directory.list_entities(),
                is_exclusive: false,
            },
            (Scope::Group(group_id), DataKind::Groups) => {
                self.directory.list_group_members(group_id)?;
                Plan {
                    fetch_id: Some(group_id.clone()),
                    declared: vec![group_id.clone()],
                    is_exclusive: false,
                }
            }
            (Scope::Group(group_id), DataKind::Power | DataKind::Raw) => Plan {
                fetch_id: None,
                declared: self.directory.list_group_members(group_id)?,
                is_exclusive: true,
            },
        };
        Ok(plan)
    }

    async fn fetch(&self, request: &SeriesRequest, plan: &Plan) -> Result<Vec<Row>> {
        self.storage
            .fetch(request.kind, request.date, plan.fetch_id.as_ref())
            .await
            .with_context(|| format!("failed to fetch {request}"))
    }

    async fn power_samples(
        &self,
        request: &SeriesRequest,
        plan: &Plan,
    ) -> Result<Vec<PowerSample>> {
        let rows = self.fetch(request, plan).await?;
        let mut samples = RowConverter { date: request.date, fallback: plan.fetch_id.as_ref() }
            .power_samples(&rows);
        if plan.is_exclusive {
            samples.retain(|sample| plan.declared.contains(&sample.entity_id));
        }
        Ok(samples)
    }

    /// Fetch and convert the power rows without building the charts.
    #[instrument(skip_all, fields(request = %request))]
    pub async fn fetch_power_samples(&self, request: &SeriesRequest) -> Result<Vec<PowerSample>> {
        ensure!(request.kind != DataKind::Raw, "raw rows do not carry power samples");
        let plan = self.plan(request)?;
        self.power_samples(request, &plan).await
    }

    /// Fetch the request scope once and shape the rows into charts.
    ///
    /// Transport failures are returned as errors and never retried.
    #[instrument(skip_all, fields(request = %request))]
    pub async fn handle(&self, request: &SeriesRequest) -> Result<Outcome> {
        let plan = self.plan(request)?;
        let response = match request.kind {
            DataKind::Power | DataKind::Groups => {
                let samples = self.power_samples(request, &plan).await?;
                if samples.is_empty() {
                    info!(date = %request.date, "no data");
                    return Ok(Outcome::NoData { date: request.date });
                }
                SeriesResponse::Power(build_power_series(&samples, request.date, plan.declared))
            }
            DataKind::Raw => {
                let mut channel_names = Vec::with_capacity(plan.declared.len());
                for entity_id in &plan.declared {
                    let names = self.directory.list_channels(entity_id)?;
                    channel_names.push((entity_id.clone(), names));
                }
                let rows = self.fetch(request, &plan).await?;
                let mut samples = RowConverter { date: request.date, fallback: plan.fetch_id.as_ref() }
                    .raw_samples(&rows);
                samples.retain(|sample| plan.declared.contains(&sample.entity_id));
                if samples.is_empty() {
                    info!(date = %request.date, "no data");
                    return Ok(Outcome::NoData { date: request.date });
                }
                SeriesResponse::Raw(build_raw_series(&samples, &channel_names))
            }
        };
        Ok(Outcome::Delivered(response))
    }

    /// Handle the requests concurrently. The outcomes follow the request order.
    pub async fn handle_all(&self, requests: &[SeriesRequest]) -> Vec<Result<Outcome>> {
        join_all(requests.iter().map(|request| self.handle(request))).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::{DateTime, Local, TimeDelta};
    use serde_json::json;

    use super::*;
    use crate::{
        api::directory::Roster,
        core::{
            energy::{Component, EnergySummary, energy_from_series},
            sample::LocalTimestamp,
        },
    };

    #[derive(Default)]
    struct FakeStorage {
        rows: Vec<Row>,
        is_down: bool,
        calls: Mutex<Vec<(DataKind, NaiveDate, Option<EntityId>)>>,
    }

    impl FakeStorage {
        fn with_rows(json: &str) -> Self {
            Self { rows: serde_json::from_str(json).unwrap(), ..Self::default() }
        }

        fn calls(&self) -> Vec<(DataKind, NaiveDate, Option<EntityId>)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Storage for FakeStorage {
        async fn fetch(
            &self,
            kind: DataKind,
            date: NaiveDate,
            entity_id: Option<&EntityId>,
        ) -> Result<Vec<Row>> {
            self.calls.lock().unwrap().push((kind, date, entity_id.cloned()));
            if self.is_down {
                bail!("connection refused");
            }
            Ok(self.rows.clone())
        }
    }

    // language=TOML
    const ROSTER: &str = r#"
        [homes.H1]
        channels = ["phase0", "phase1"]

        [homes.H2]
        channels = ["phase0"]

        [homes.H3]

        [groups.G1]
        caption = "Street"
        members = ["H2", "H1"]
    "#;

    fn orchestrator(storage: FakeStorage) -> Orchestrator<FakeStorage, Roster> {
        Orchestrator::new(storage, Roster::from_toml(ROSTER).unwrap())
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 1, 5).unwrap()
    }

    fn request(scope: Scope, kind: DataKind) -> SeriesRequest {
        SeriesRequest::new(scope, date(), kind)
    }

    fn power_charts(outcome: Outcome) -> Vec<PowerChart> {
        match outcome {
            Outcome::Delivered(SeriesResponse::Power(charts)) => charts,
            outcome => panic!("unexpected outcome: {outcome:?}"),
        }
    }

    #[tokio::test]
    async fn test_no_rows_is_no_data() -> Result {
        let orchestrator = orchestrator(FakeStorage::default());
        let outcome =
            orchestrator.handle(&request(Scope::Entity("H1".into()), DataKind::Power)).await?;
        assert_eq!(outcome, Outcome::NoData { date: date() });
        assert_eq!(
            orchestrator.storage.calls(),
            [(DataKind::Power, date(), Some(EntityId::from("H1")))],
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_single_home_power() -> Result {
        // language=JSON
        let storage = FakeStorage::with_rows(
            r#"[
                {"entity_id": "H1", "ts": "2023-01-05T00:00:00", "p_cons": 100, "p_prod": 0, "p_tot": 100},
                {"entity_id": "H1", "ts": "2023-01-05T01:00:00", "p_cons": 50, "p_prod": 0, "p_tot": 50}
            ]"#,
        );
        let outcome = orchestrator(storage)
            .handle(&request(Scope::Entity("H1".into()), DataKind::Power))
            .await?;
        let charts = power_charts(outcome);
        assert_eq!(charts.len(), 1);
        let ys = |points: &[crate::core::chart::ChartPoint]| {
            points.iter().map(|point| point.y).collect::<Vec<_>>()
        };
        assert_eq!(ys(&charts[0].datasets.pre), [100.0, 50.0]);
        assert_eq!(ys(&charts[0].datasets.inj), [0.0, 0.0]);
        assert_eq!(charts[0].totals, EnergySummary::default());
        Ok(())
    }

    #[tokio::test]
    async fn test_single_home_ignores_other_homes() -> Result {
        // language=JSON
        let storage = FakeStorage::with_rows(
            r#"[
                {"home_id": "H1", "ts": "00:00:00", "p_tot": 10},
                {"home_id": "H2", "ts": "00:00:00", "p_tot": 20},
                {"ts": "01:00:00", "p_tot": 30}
            ]"#,
        );
        let charts = power_charts(
            orchestrator(storage).handle(&request(Scope::Entity("H1".into()), DataKind::Power)).await?,
        );
        assert_eq!(charts.len(), 1);
        assert_eq!(charts[0].entity_id, EntityId::from("H1"));
        assert_eq!(charts[0].datasets.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_utc_rows_are_shown_on_the_local_clock() -> Result {
        let start = DateTime::parse_from_rfc3339("2023-01-04T23:30:00.000Z")?;
        let timestamps: Vec<_> = (0..25).map(|hour| start + TimeDelta::hours(hour)).collect();
        let rows: Vec<_> = timestamps
            .iter()
            .map(|timestamp| {
                json!({
                    "home_id": "H1",
                    "ts": timestamp.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
                    "p_cons": 1000,
                    "p_tot": 1000,
                })
            })
            .collect();
        let orchestrator = orchestrator(FakeStorage::with_rows(&json!(rows).to_string()));
        let request = request(Scope::Entity("H1".into()), DataKind::Power);

        let charts = power_charts(orchestrator.handle(&request).await?);
        assert_eq!(charts.len(), 1);
        let xs: Vec<_> = charts[0].datasets.p_cons.iter().map(|point| point.x).collect();
        let expected: Vec<_> = timestamps
            .iter()
            .map(|timestamp| {
                LocalTimestamp::on(date(), timestamp.with_timezone(&Local).naive_local())
            })
            .collect();
        assert_eq!(xs, expected);

        let samples = orchestrator.fetch_power_samples(&request).await?;
        assert_eq!(samples.len(), 25);
        assert_eq!(charts[0].totals.consumption, 24);
        assert_eq!(charts[0].totals.draw, 24);
        for component in Component::ALL {
            assert_eq!(charts[0].totals.get(component), energy_from_series(&samples, component));
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_transport_failure_is_an_error() {
        let storage = FakeStorage { is_down: true, ..FakeStorage::default() };
        let orchestrator = orchestrator(storage);
        let result = orchestrator.handle(&request(Scope::All, DataKind::Power)).await;
        assert!(result.is_err());
        assert_eq!(orchestrator.storage.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_all_homes_power() -> Result {
        // language=JSON
        let storage = FakeStorage::with_rows(
            r#"[
                {"home_id": "H2", "ts": "00:00:00", "p_tot": 10},
                {"home_id": "H9", "ts": "00:00:00", "p_tot": 10}
            ]"#,
        );
        let orchestrator = orchestrator(storage);
        let charts =
            power_charts(orchestrator.handle(&request(Scope::All, DataKind::Power)).await?);
        let entity_ids: Vec<_> = charts.iter().map(|chart| chart.entity_id.to_string()).collect();
        assert_eq!(entity_ids, ["H1", "H2", "H3", "H9"]);
        assert!(charts[0].datasets.is_empty());
        assert_eq!(charts[1].datasets.len(), 1);
        assert_eq!(orchestrator.storage.calls(), [(DataKind::Power, date(), None)]);
        Ok(())
    }

    #[tokio::test]
    async fn test_group_members_power() -> Result {
        // language=JSON
        let storage = FakeStorage::with_rows(
            r#"[
                {"home_id": "H3", "ts": "00:00:00", "p_tot": 10},
                {"home_id": "H1", "ts": "00:00:00", "p_tot": 10}
            ]"#,
        );
        let charts = power_charts(
            orchestrator(storage).handle(&request(Scope::Group("G1".into()), DataKind::Power)).await?,
        );
        let entity_ids: Vec<_> = charts.iter().map(|chart| chart.entity_id.to_string()).collect();
        assert_eq!(entity_ids, ["H2", "H1"]);
        assert!(charts[0].datasets.is_empty());
        assert_eq!(charts[1].datasets.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_group_aggregate() -> Result {
        let storage = FakeStorage::with_rows(r#"[{"ts": "00:00:00", "p_tot": -10}]"#);
        let orchestrator = orchestrator(storage);
        let charts = power_charts(
            orchestrator.handle(&request(Scope::Group("G1".into()), DataKind::Groups)).await?,
        );
        assert_eq!(charts.len(), 1);
        assert_eq!(charts[0].entity_id, EntityId::from("G1"));
        assert_eq!(charts[0].datasets.inj[0].y, -10.0);
        assert_eq!(
            orchestrator.storage.calls(),
            [(DataKind::Groups, date(), Some(EntityId::from("G1")))],
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_group_fails_before_fetching() {
        let orchestrator = orchestrator(FakeStorage::default());
        let result = orchestrator.handle(&request(Scope::Group("G9".into()), DataKind::Power)).await;
        assert!(result.is_err());
        assert!(orchestrator.storage.calls().is_empty());
    }

    #[tokio::test]
    async fn test_raw_home() -> Result {
        // language=JSON
        let storage = FakeStorage::with_rows(
            r#"[
                {"home_id": "H1", "ts": "2023-01-05T00:00:00", "phase0": 5, "phase1": 7},
                {"home_id": "H2", "ts": "2023-01-05T00:00:00", "phase0": 1}
            ]"#,
        );
        let outcome =
            orchestrator(storage).handle(&request(Scope::Entity("H1".into()), DataKind::Raw)).await?;
        let Outcome::Delivered(SeriesResponse::Raw(charts)) = outcome else {
            panic!("unexpected outcome: {outcome:?}");
        };
        assert_eq!(charts.len(), 1);
        assert_eq!(charts[0].datasets[0].data[0].y, 5.0);
        assert_eq!(charts[0].datasets[1].data[0].y, 7.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_raw_without_own_rows_is_no_data() -> Result {
        let storage =
            FakeStorage::with_rows(r#"[{"home_id": "H2", "ts": "00:00:00", "phase0": 1}]"#);
        let outcome =
            orchestrator(storage).handle(&request(Scope::Entity("H1".into()), DataKind::Raw)).await?;
        assert_eq!(outcome, Outcome::NoData { date: date() });
        Ok(())
    }

    #[tokio::test]
    async fn test_handle_all_keeps_request_order() {
        let storage = FakeStorage::with_rows(r#"[{"ts": "00:00:00", "p_tot": 1}]"#);
        let orchestrator = orchestrator(storage);
        let requests = [
            request(Scope::Entity("H1".into()), DataKind::Power),
            request(Scope::Group("G9".into()), DataKind::Groups),
            request(Scope::Group("G1".into()), DataKind::Groups),
        ];
        let outcomes = orchestrator.handle_all(&requests).await;
        assert_eq!(outcomes.len(), 3);
        assert_eq!(power_charts(outcomes[0].as_ref().unwrap().clone())[0].entity_id, "H1".into());
        assert!(outcomes[1].is_err());
        assert_eq!(power_charts(outcomes[2].as_ref().unwrap().clone())[0].entity_id, "G1".into());
    }

    #[tokio::test]
    async fn test_fetch_power_samples_rejects_raw() {
        let orchestrator = orchestrator(FakeStorage::default());
        let result =
            orchestrator.fetch_power_samples(&request(Scope::All, DataKind::Raw)).await;
        assert!(result.is_err());
        assert!(orchestrator.storage.calls().is_empty());
    }
}
