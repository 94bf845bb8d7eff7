//! Error taxonomy of the report engine.
//!
//! Configuration and tag-integrity errors abort the affected report and carry
//! enough context (config name, test name, series id) to act on. Per-point
//! resolution failures are NOT errors: they are collected as
//! [`crate::report::InvalidIteration`] diagnostics and never abort the batch.

use bublik_common::SeriesId;
use thiserror::Error;

/// A malformed report configuration. Fatal to the single report, not the
/// service.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config '{config}': missing required key '{key}'")]
    MissingKey { config: String, key: String },

    #[error(
        "config '{config}', test '{test}': unknown axis_y selector key '{key}' \
         (expected one of: tool, type, name, keys, aggr)"
    )]
    UnknownSelectorKey {
        config: String,
        test: String,
        key: String,
    },

    #[error("config '{config}', test '{test}': axis_y selector key '{key}': {detail}")]
    SelectorShape {
        config: String,
        test: String,
        key: String,
        detail: String,
    },

    #[error("config '{config}': schema validation failed:\n{details}")]
    Schema { config: String, details: String },

    #[error("config '{config}': {source}")]
    Parse {
        config: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors of a single report assembly.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A series lacks both the `name` and `type` measurement subject tags, so
    /// no axis name can be derived. Data-integrity error; labels are never
    /// guessed.
    #[error(
        "test '{test}', series {series}: neither 'name' nor 'type' \
         measurement subject tag is present"
    )]
    MissingRequiredTag { test: String, series: SeriesId },

    #[error("storage: {0}")]
    Storage(String),
}

pub type Result<T> = std::result::Result<T, ReportError>;
