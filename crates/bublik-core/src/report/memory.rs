//! In-memory [`ReportDataSource`] for tests and embedding hosts.

use std::collections::{BTreeMap, HashMap};

use bublik_common::{
    Iteration, IterationId, MeasurementResult, MeasurementSeries, Meta, MetaType, RunId, SeriesId,
};

use crate::errors::{ReportError, Result};
use crate::report::{ReportDataSource, ReportScope};

#[derive(Debug, Default)]
pub struct InMemorySource {
    series: HashMap<RunId, Vec<MeasurementSeries>>,
    points: HashMap<SeriesId, Vec<MeasurementResult>>,
    iterations: HashMap<IterationId, Iteration>,
    run_metas: HashMap<RunId, Vec<Meta>>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_series(&mut self, run: impl Into<RunId>, series: MeasurementSeries) -> &mut Self {
        self.series.entry(run.into()).or_default().push(series);
        self
    }

    pub fn add_iteration(&mut self, iteration: Iteration) -> &mut Self {
        self.iterations.insert(iteration.id, iteration);
        self
    }

    pub fn add_point(
        &mut self,
        series: impl Into<SeriesId>,
        iteration: impl Into<IterationId>,
        value: f64,
    ) -> &mut Self {
        let series = series.into();
        self.points.entry(series).or_default().push(MeasurementResult {
            series,
            iteration: iteration.into(),
            value,
        });
        self
    }

    pub fn add_run_meta(&mut self, run: impl Into<RunId>, meta: Meta) -> &mut Self {
        self.run_metas.entry(run.into()).or_default().push(meta);
        self
    }
}

impl ReportDataSource for InMemorySource {
    fn series_for_test(
        &self,
        scope: &ReportScope,
        test_name: &str,
    ) -> Result<Vec<MeasurementSeries>> {
        Ok(self
            .series
            .get(&scope.run)
            .map(|all| {
                all.iter()
                    .filter(|s| s.test_name == test_name)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn points(&self, series: SeriesId) -> Result<Vec<MeasurementResult>> {
        Ok(self.points.get(&series).cloned().unwrap_or_default())
    }

    fn iteration_args(&self, iteration: IterationId) -> Result<BTreeMap<String, String>> {
        self.iterations
            .get(&iteration)
            .map(|it| it.arguments.clone())
            .ok_or_else(|| ReportError::Storage(format!("unknown iteration {iteration}")))
    }

    fn run_metas(&self, scope: &ReportScope, meta_type: Option<MetaType>) -> Result<Vec<Meta>> {
        Ok(self
            .run_metas
            .get(&scope.run)
            .map(|metas| {
                metas
                    .iter()
                    .filter(|m| meta_type.map_or(true, |t| m.meta_type == t))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}
