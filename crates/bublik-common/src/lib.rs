//! Shared data model for the Bublik report engine.
//!
//! Storage-agnostic types: typed tags ([`Meta`]), measurement series and
//! results, iterations with their arguments, and the [`ArgValue`] scalar used
//! for normalized argument values.

pub mod model;

pub use model::{
    ArgValue, Iteration, IterationId, MeasurementResult, MeasurementSeries, Meta, MetaType,
    ProjectId, RunId, SeriesId,
};
