use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(v: i64) -> Self {
                Self(v)
            }
        }
    };
}

id_type!(
    /// Identifier of a measurement series.
    SeriesId
);
id_type!(
    /// Identifier of a test iteration result.
    IterationId
);
id_type!(
    /// Identifier of a test run.
    RunId
);
id_type!(
    /// Identifier of a project; runs may be scoped to one.
    ProjectId
);

/// Tag categories. A tag of a given type is attached to either a measurement
/// series (`tool`, `measurement_subject`, `measurement_key`) or a run
/// (`label`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetaType {
    Tool,
    MeasurementSubject,
    MeasurementKey,
    Label,
}

impl MetaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetaType::Tool => "tool",
            MetaType::MeasurementSubject => "measurement_subject",
            MetaType::MeasurementKey => "measurement_key",
            MetaType::Label => "label",
        }
    }
}

impl fmt::Display for MetaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed key-value annotation attached to a series or a run.
///
/// Immutable once created; its lifecycle is tied to the owning entity. A given
/// entity holds at most one value per `(name, type)` pair, except
/// `measurement_key` and `tool` tags, which may repeat under different names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Meta {
    pub name: String,
    #[serde(rename = "type")]
    pub meta_type: MetaType,
    pub value: String,
}

impl Meta {
    pub fn new(name: impl Into<String>, meta_type: MetaType, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            meta_type,
            value: value.into(),
        }
    }
}

/// One logical metric stream (e.g. "throughput/pps") with its tags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementSeries {
    pub id: SeriesId,
    pub test_name: String,
    pub metas: Vec<Meta>,
}

impl MeasurementSeries {
    pub fn new(id: impl Into<SeriesId>, test_name: impl Into<String>, metas: Vec<Meta>) -> Self {
        Self {
            id: id.into(),
            test_name: test_name.into(),
            metas,
        }
    }
}

/// One data point: the value a series took on one test iteration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeasurementResult {
    pub series: SeriesId,
    pub iteration: IterationId,
    pub value: f64,
}

/// A test iteration: the test name plus its arguments, ordered by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Iteration {
    pub id: IterationId,
    pub test_name: String,
    pub arguments: BTreeMap<String, String>,
}

impl Iteration {
    pub fn new(
        id: impl Into<IterationId>,
        test_name: impl Into<String>,
        arguments: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        Self {
            id: id.into(),
            test_name: test_name.into(),
            arguments: arguments.into_iter().collect(),
        }
    }
}

/// A normalized argument value: an integer when every occurrence of the
/// argument is integer-like, text otherwise.
///
/// Total order: integers first (numeric order), then text (lexicographic), so
/// a mixed collection still sorts deterministically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArgValue {
    Int(i64),
    Text(String),
}

impl ArgValue {
    pub fn as_display_string(&self) -> String {
        match self {
            ArgValue::Int(v) => v.to_string(),
            ArgValue::Text(v) => v.clone(),
        }
    }
}

impl Ord for ArgValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (ArgValue::Int(a), ArgValue::Int(b)) => a.cmp(b),
            (ArgValue::Text(a), ArgValue::Text(b)) => a.cmp(b),
            (ArgValue::Int(_), ArgValue::Text(_)) => Ordering::Less,
            (ArgValue::Text(_), ArgValue::Int(_)) => Ordering::Greater,
        }
    }
}

impl PartialOrd for ArgValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgValue::Int(v) => write!(f, "{}", v),
            ArgValue::Text(v) => f.write_str(v),
        }
    }
}

impl From<i64> for ArgValue {
    fn from(v: i64) -> Self {
        ArgValue::Int(v)
    }
}

impl From<&str> for ArgValue {
    fn from(v: &str) -> Self {
        ArgValue::Text(v.to_string())
    }
}
