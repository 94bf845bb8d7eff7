//! The report assembly pipeline.
//!
//! [`assemble::assemble_report`] orchestrates the components in this module:
//! axis-y series filtering ([`axis`]), label/unit derivation ([`label`]),
//! argument normalization ([`args`]), and common-argument extraction
//! ([`common_args`]). Data comes in through [`ReportDataSource`]; the
//! produced [`Report`] is ready for front-end rendering.

pub mod args;
pub mod assemble;
pub mod axis;
pub mod common_args;
pub mod label;
pub mod memory;

use std::collections::BTreeMap;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use bublik_common::{
    ArgValue, IterationId, MeasurementResult, MeasurementSeries, Meta, MetaType, ProjectId, RunId,
    SeriesId,
};

use crate::errors::Result;

pub use assemble::{assemble_report, build_report_title};
pub use memory::InMemorySource;

/// What one report run reads from: a run, optionally narrowed to a project.
///
/// Threaded explicitly through the whole call chain; the engine holds no
/// ambient request state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportScope {
    pub run: RunId,
    pub project: Option<ProjectId>,
}

impl ReportScope {
    pub fn new(run: impl Into<RunId>) -> Self {
        Self {
            run: run.into(),
            project: None,
        }
    }

    pub fn with_project(mut self, project: impl Into<ProjectId>) -> Self {
        self.project = Some(project.into());
        self
    }
}

/// Read access to materialized test results. All methods are reads; the
/// engine never writes through this boundary.
pub trait ReportDataSource {
    /// Measurement series of one test within the scope.
    fn series_for_test(
        &self,
        scope: &ReportScope,
        test_name: &str,
    ) -> Result<Vec<MeasurementSeries>>;

    /// Data points of one series.
    fn points(&self, series: SeriesId) -> Result<Vec<MeasurementResult>>;

    /// Arguments of one iteration, keyed by name.
    fn iteration_args(&self, iteration: IterationId) -> Result<BTreeMap<String, String>>;

    /// Run-level tags, optionally narrowed to one type.
    fn run_metas(&self, scope: &ReportScope, meta_type: Option<MetaType>) -> Result<Vec<Meta>>;
}

/// An argument map in display order. Serializes as a JSON object whose keys
/// keep this order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderedArgs(pub Vec<(String, ArgValue)>);

impl OrderedArgs {
    pub fn get(&self, name: &str) -> Option<&ArgValue> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for OrderedArgs {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in &self.0 {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// The assembled report payload.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub title: String,
    pub config_name: String,
    pub tests: Vec<TestReport>,
    /// Iterations that could not be placed on the configured axes, with
    /// human-readable reasons. The designed way of surfacing partial
    /// failures; never an error.
    pub invalid_iterations: Vec<InvalidIteration>,
}

/// One test's block of the report.
#[derive(Debug, Clone, Serialize)]
pub struct TestReport {
    pub test_name: String,
    pub table_view: bool,
    pub chart_view: bool,
    /// Arguments constant across every iteration of the test; hidden from
    /// per-point display.
    pub common_args: OrderedArgs,
    pub series: Vec<SeriesBlock>,
}

/// One plotted series: a measurement series, possibly narrowed to one
/// sequence-group value.
#[derive(Debug, Clone, Serialize)]
pub struct SeriesBlock {
    pub label: String,
    pub axis_name: String,
    /// Name of the argument on the x axis.
    pub axis_x: String,
    /// Display name of the sequence when sequence grouping is active.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence: Option<String>,
    /// Per-series arguments that vary but sit on neither axis.
    #[serde(skip_serializing_if = "OrderedArgs::is_empty")]
    pub args: OrderedArgs,
    pub points: Vec<PointRecord>,
}

/// One rendered data point.
#[derive(Debug, Clone, Serialize)]
pub struct PointRecord {
    pub x: ArgValue,
    pub y: f64,
    /// Percentage relative to the configured base sequence at the same x.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percent: Option<f64>,
}

/// Diagnostic record for an iteration that does not fit the configured axes.
#[derive(Debug, Clone, Serialize)]
pub struct InvalidIteration {
    pub test_name: String,
    pub common_args: OrderedArgs,
    pub args_vals: OrderedArgs,
    pub reasons: Vec<String>,
}
