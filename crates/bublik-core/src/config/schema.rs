//! Embedded JSON Schema for report configuration documents.

use std::sync::OnceLock;

use jsonschema::Draft;
use serde_json::Value;

use crate::errors::ConfigError;

/// Embedded schema for report_config_v1.
///
/// NOTE: Use CARGO_MANIFEST_DIR to avoid fragile relative paths from src/.
const REPORT_CONFIG_V1_SCHEMA_JSON: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../../schemas/report_config_v1.schema.json"
));

static VALIDATOR: OnceLock<jsonschema::Validator> = OnceLock::new();
static VALIDATOR_RESULT: OnceLock<Result<jsonschema::Validator, String>> = OnceLock::new();

fn compiled_validator() -> Result<&'static jsonschema::Validator, String> {
    let init = VALIDATOR_RESULT
        .get_or_init(|| {
            let schema: Value = serde_json::from_str(REPORT_CONFIG_V1_SCHEMA_JSON)
                .map_err(|e| format!("failed to parse embedded report_config_v1 schema: {e}"))?;

            // Our schema strategy is Draft 2020-12.
            jsonschema::options()
                .with_draft(Draft::Draft202012)
                .build(&schema)
                .map_err(|e| format!("failed to compile report_config_v1 schema: {e}"))
        })
        .as_ref()
        .map_err(|e| e.clone())?;

    Ok(VALIDATOR.get_or_init(|| init.clone()))
}

/// Validate a report config document against report_config_v1.
///
/// Collects a bounded list of violations into one structured error; unknown
/// `axis_y` selector keys are deliberately NOT schema-enforced, they get a
/// more precise [`ConfigError::UnknownSelectorKey`] during conversion.
pub fn validate_report_config(config_name: &str, instance: &Value) -> Result<(), ConfigError> {
    let validator = compiled_validator().map_err(|e| ConfigError::Schema {
        config: config_name.to_string(),
        details: e,
    })?;

    if validator.is_valid(instance) {
        return Ok(());
    }

    const MAX_ERRORS: usize = 10;
    let lines: Vec<String> = validator
        .iter_errors(instance)
        .take(MAX_ERRORS)
        .enumerate()
        .map(|(i, e)| format!("{:02}: {} (at {})", i + 1, e, e.instance_path()))
        .collect();

    Err(ConfigError::Schema {
        config: config_name.to_string(),
        details: lines.join("\n"),
    })
}
