//! Report configuration model.
//!
//! A report config is a versioned JSON document. [`ReportConfig::from_value`]
//! schema-validates it (see [`schema`]), deserializes it, and converts the
//! `axis_y` selector maps into typed [`AxisYSelector`]s, rejecting unknown
//! selector keys with a structured error.

pub mod reformat;
mod schema;

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::ConfigError;

pub use schema::validate_report_config;

/// Current report-config document version. Documents below it are migrated by
/// the reformat pipeline before use.
pub const REPORT_CONFIG_VERSION: u64 = 1;

/// A validated report configuration document.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportConfig {
    pub id: String,
    pub name: String,
    pub description: String,
    pub version: u64,
    /// Names of run `label` tags concatenated into the report title.
    pub title_content: Vec<String>,
    pub test_names_order: Vec<String>,
    pub tests: BTreeMap<String, TestReportConfig>,
}

/// Per-test report configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct TestReportConfig {
    pub table_view: bool,
    pub chart_view: bool,
    pub axis_x: AxisX,
    pub axis_y: Vec<AxisYSelector>,
    /// Iteration argument splitting one logical test into plotted sequences.
    pub sequence_group_arg: Option<String>,
    /// Raw `sequence_group_arg` value of the baseline sequence for percent
    /// rendering.
    pub percentage_base_value: Option<String>,
    /// Display remapping of the sequence group argument's raw values.
    pub sequence_name_conversion: BTreeMap<String, String>,
    /// Iterations carrying any of these argument values are dropped from the
    /// report.
    pub not_show_args: BTreeMap<String, BTreeSet<String>>,
    /// Argument names shown first, in this order; the rest follow
    /// lexicographically.
    pub records_order: Vec<String>,
}

/// The x axis: one iteration argument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisX {
    pub arg: String,
}

/// One measurement selector of an `axis_y` specification.
///
/// `tool` narrows by the `tool` tag, `keys` sub-constraints are unioned (a
/// series matches if ANY requested measurement key matches), subject
/// constraints (`type`, `name`, `aggr`) all have to hold.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AxisYSelector {
    pub tool: Option<BTreeSet<String>>,
    pub keys: BTreeMap<String, BTreeSet<String>>,
    pub subjects: BTreeMap<String, BTreeSet<String>>,
}

#[derive(Debug, Deserialize)]
struct RawReportConfig {
    id: String,
    name: String,
    description: String,
    version: u64,
    title_content: Vec<String>,
    test_names_order: Vec<String>,
    tests: BTreeMap<String, RawTestConfig>,
}

#[derive(Debug, Deserialize)]
struct RawTestConfig {
    table_view: bool,
    chart_view: bool,
    axis_x: AxisX,
    axis_y: Vec<serde_json::Map<String, Value>>,
    sequence_group_arg: Option<String>,
    percentage_base_value: Value,
    sequence_name_conversion: BTreeMap<String, Value>,
    not_show_args: BTreeMap<String, Vec<Value>>,
    records_order: Vec<String>,
}

impl ReportConfig {
    /// Build a validated config from a raw JSON document (e.g. the active
    /// content resolved from the config store).
    pub fn from_value(value: &Value) -> Result<Self, ConfigError> {
        let config_name = value
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or("<unnamed>")
            .to_string();

        const REQUIRED_KEYS: &[&str] = &[
            "id",
            "name",
            "description",
            "version",
            "title_content",
            "test_names_order",
            "tests",
        ];
        for key in REQUIRED_KEYS {
            if value.get(key).is_none() {
                return Err(ConfigError::MissingKey {
                    config: config_name,
                    key: (*key).to_string(),
                });
            }
        }

        schema::validate_report_config(&config_name, value)?;

        let raw: RawReportConfig =
            serde_json::from_value(value.clone()).map_err(|source| ConfigError::Parse {
                config: config_name.clone(),
                source,
            })?;

        let mut tests = BTreeMap::new();
        for (test_name, raw_test) in raw.tests {
            let test = convert_test(&config_name, &test_name, raw_test)?;
            tests.insert(test_name, test);
        }

        Ok(Self {
            id: raw.id,
            name: raw.name,
            description: raw.description,
            version: raw.version,
            title_content: raw.title_content,
            test_names_order: raw.test_names_order,
            tests,
        })
    }
}

fn convert_test(
    config: &str,
    test: &str,
    raw: RawTestConfig,
) -> Result<TestReportConfig, ConfigError> {
    let axis_y = raw
        .axis_y
        .iter()
        .map(|selector| convert_selector(config, test, selector))
        .collect::<Result<Vec<_>, _>>()?;

    let sequence_name_conversion = raw
        .sequence_name_conversion
        .into_iter()
        .map(|(k, v)| (k, scalar_string(&v)))
        .collect();

    let not_show_args = raw
        .not_show_args
        .into_iter()
        .map(|(arg, vals)| (arg, vals.iter().map(scalar_string).collect()))
        .collect();

    Ok(TestReportConfig {
        table_view: raw.table_view,
        chart_view: raw.chart_view,
        axis_x: raw.axis_x,
        axis_y,
        sequence_group_arg: raw.sequence_group_arg,
        percentage_base_value: match raw.percentage_base_value {
            Value::Null => None,
            other => Some(scalar_string(&other)),
        },
        sequence_name_conversion,
        not_show_args,
        records_order: raw.records_order,
    })
}

fn convert_selector(
    config: &str,
    test: &str,
    selector: &serde_json::Map<String, Value>,
) -> Result<AxisYSelector, ConfigError> {
    let mut converted = AxisYSelector::default();

    for (key, value) in selector {
        match key.as_str() {
            "tool" => {
                converted.tool = Some(value_set(config, test, key, value)?);
            }
            "keys" => {
                let map = value.as_object().ok_or_else(|| ConfigError::SelectorShape {
                    config: config.to_string(),
                    test: test.to_string(),
                    key: key.clone(),
                    detail: "expected an object mapping key names to accepted values".to_string(),
                })?;
                for (key_name, key_vals) in map {
                    converted
                        .keys
                        .insert(key_name.clone(), value_set(config, test, key_name, key_vals)?);
                }
            }
            "type" | "name" | "aggr" => {
                converted
                    .subjects
                    .insert(key.clone(), value_set(config, test, key, value)?);
            }
            other => {
                return Err(ConfigError::UnknownSelectorKey {
                    config: config.to_string(),
                    test: test.to_string(),
                    key: other.to_string(),
                });
            }
        }
    }

    Ok(converted)
}

/// Accepted-value sets may be written as a list or a single scalar.
fn value_set(
    config: &str,
    test: &str,
    key: &str,
    value: &Value,
) -> Result<BTreeSet<String>, ConfigError> {
    match value {
        Value::Array(items) => Ok(items.iter().map(scalar_string).collect()),
        Value::String(_) | Value::Number(_) | Value::Bool(_) => {
            Ok([scalar_string(value)].into_iter().collect())
        }
        _ => Err(ConfigError::SelectorShape {
            config: config.to_string(),
            test: test.to_string(),
            key: key.to_string(),
            detail: "expected a scalar or a list of scalars".to_string(),
        }),
    }
}

fn scalar_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_doc() -> Value {
        json!({
            "id": "report-perf",
            "name": "perf",
            "description": "throughput report",
            "version": 1,
            "title_content": ["branch", "setup"],
            "test_names_order": ["udp_tput"],
            "tests": {
                "udp_tput": {
                    "table_view": true,
                    "chart_view": true,
                    "axis_x": {"arg": "frame_size"},
                    "axis_y": [
                        {
                            "tool": ["netperf"],
                            "keys": {"side": ["tx", "rx"]},
                            "type": ["throughput"]
                        }
                    ],
                    "sequence_group_arg": "streams",
                    "percentage_base_value": 1,
                    "sequence_name_conversion": {"1": "single stream"},
                    "not_show_args": {"dry_run": ["yes"]},
                    "records_order": ["streams", "frame_size"]
                }
            }
        })
    }

    #[test]
    fn parses_a_valid_document() {
        let config = ReportConfig::from_value(&sample_doc()).unwrap();
        assert_eq!(config.name, "perf");
        assert_eq!(config.test_names_order, vec!["udp_tput"]);

        let test = &config.tests["udp_tput"];
        assert_eq!(test.axis_x.arg, "frame_size");
        assert_eq!(test.percentage_base_value.as_deref(), Some("1"));
        assert_eq!(
            test.sequence_name_conversion.get("1").map(String::as_str),
            Some("single stream")
        );

        let selector = &test.axis_y[0];
        assert!(selector.tool.as_ref().unwrap().contains("netperf"));
        assert!(selector.keys["side"].contains("rx"));
        assert!(selector.subjects["type"].contains("throughput"));
    }

    #[test]
    fn unknown_selector_key_is_a_config_error() {
        let mut doc = sample_doc();
        doc["tests"]["udp_tput"]["axis_y"][0]["units"] = json!(["pps"]);

        let err = ReportConfig::from_value(&doc).unwrap_err();
        match err {
            ConfigError::UnknownSelectorKey { test, key, .. } => {
                assert_eq!(test, "udp_tput");
                assert_eq!(key, "units");
            }
            other => panic!("expected UnknownSelectorKey, got: {other}"),
        }
    }

    #[test]
    fn selector_accepts_single_scalar_values() {
        let mut doc = sample_doc();
        doc["tests"]["udp_tput"]["axis_y"][0]["tool"] = json!("netperf");

        let config = ReportConfig::from_value(&doc).unwrap();
        let selector = &config.tests["udp_tput"].axis_y[0];
        assert!(selector.tool.as_ref().unwrap().contains("netperf"));
    }

    #[test]
    fn malformed_keys_shape_is_rejected() {
        let mut doc = sample_doc();
        doc["tests"]["udp_tput"]["axis_y"][0]["keys"] = json!(["side"]);

        let err = ReportConfig::from_value(&doc).unwrap_err();
        assert!(matches!(err, ConfigError::SelectorShape { .. }), "got: {err}");
    }

    #[test]
    fn missing_top_level_key_is_reported_by_name() {
        let mut doc = sample_doc();
        doc.as_object_mut().unwrap().remove("test_names_order");

        let err = ReportConfig::from_value(&doc).unwrap_err();
        match err {
            ConfigError::MissingKey { key, .. } => assert_eq!(key, "test_names_order"),
            other => panic!("expected MissingKey, got: {other}"),
        }
    }

    #[test]
    fn missing_per_test_key_fails_schema_validation() {
        let mut doc = sample_doc();
        doc["tests"]["udp_tput"]
            .as_object_mut()
            .unwrap()
            .remove("records_order");

        let err = ReportConfig::from_value(&doc).unwrap_err();
        assert!(matches!(err, ConfigError::Schema { .. }), "got: {err}");
    }
}
