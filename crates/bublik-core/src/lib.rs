//! Report/measurement aggregation engine for Bublik test results.
//!
//! The engine is a pure, synchronous transformation: it consumes a set of
//! measurement series and points materialized by the caller (through
//! [`report::ReportDataSource`]) together with a validated
//! [`config::ReportConfig`], and produces a [`report::Report`] payload plus a
//! diagnostic list of iterations that could not be placed on the configured
//! axes. Storage query execution, HTTP routing, and rendering belong to the
//! host service.

pub mod config;
pub mod errors;
pub mod meta;
pub mod report;
pub mod storage;

pub use errors::{ConfigError, ReportError, Result};
