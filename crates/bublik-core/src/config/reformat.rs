//! Config reformatting: migrates stored configuration documents to the
//! current shape.
//!
//! A strategy table keyed by config data type dispatches each stored record
//! to its pipeline. Pipelines mutate the document in place and report whether
//! anything changed; the dispatcher writes changed documents back to the
//! store. This stays outside the aggregation core, which only ever reads
//! already-reformatted active snapshots.

use std::collections::HashMap;

use serde_json::Value;
use tracing::{error, info, warn};

use crate::config::REPORT_CONFIG_VERSION;
use crate::storage::{global_names, ConfigKind, ConfigRecord, ConfigStore};

/// Outcome of reformatting one stored config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReformatStatus {
    Success,
    Skipped,
    Failed,
}

/// One migration strategy. `run` upgrades `content` in place and returns
/// whether it changed anything.
pub trait ReformatPipeline {
    fn run(&self, content: &mut Value) -> anyhow::Result<bool>;
}

/// Report configs: lift legacy bare-string `axis_x` into `{"arg": ...}` and
/// stamp the document version.
pub struct ReportConfigReformatPipeline;

impl ReformatPipeline for ReportConfigReformatPipeline {
    fn run(&self, content: &mut Value) -> anyhow::Result<bool> {
        let mut changed = false;

        if let Some(tests) = content.get_mut("tests").and_then(Value::as_object_mut) {
            for (test_name, test) in tests.iter_mut() {
                let Some(axis_x) = test.get_mut("axis_x") else {
                    anyhow::bail!("test '{test_name}' has no axis_x");
                };
                if axis_x.is_string() {
                    let arg = axis_x.as_str().unwrap_or_default().to_string();
                    *axis_x = serde_json::json!({ "arg": arg });
                    changed = true;
                }
            }
        }

        changed |= stamp_version(content, REPORT_CONFIG_VERSION);
        Ok(changed)
    }
}

/// `per_conf` global configs predate document versioning; stamping the
/// version is the only migration they need so far.
pub struct PerConfReformatPipeline;

impl ReformatPipeline for PerConfReformatPipeline {
    fn run(&self, content: &mut Value) -> anyhow::Result<bool> {
        Ok(stamp_version(content, 1))
    }
}

fn stamp_version(content: &mut Value, version: u64) -> bool {
    let Some(doc) = content.as_object_mut() else {
        return false;
    };
    match doc.get("version").and_then(Value::as_u64) {
        Some(current) if current >= version => false,
        _ => {
            doc.insert("version".to_string(), serde_json::json!(version));
            true
        }
    }
}

/// Dispatches stored configs to their reformat pipelines.
pub struct ConfigReformatDispatcher {
    pipelines: HashMap<&'static str, Box<dyn ReformatPipeline>>,
}

impl Default for ConfigReformatDispatcher {
    fn default() -> Self {
        let mut pipelines: HashMap<&'static str, Box<dyn ReformatPipeline>> = HashMap::new();
        pipelines.insert("report", Box::new(ReportConfigReformatPipeline));
        pipelines.insert(global_names::PER_CONF, Box::new(PerConfReformatPipeline));
        Self { pipelines }
    }
}

impl ConfigReformatDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// The pipeline table key for a record: report configs share one
    /// pipeline, global configs dispatch by name.
    fn data_type(record: &ConfigRecord) -> &str {
        match record.kind {
            ConfigKind::Report => "report",
            ConfigKind::Global => record.name.as_str(),
        }
    }

    /// Reformat one stored config, writing the upgraded content back on
    /// change. Never propagates pipeline errors; they are logged and reported
    /// as [`ReformatStatus::Failed`].
    pub fn reformat(&self, store: &ConfigStore, record: &ConfigRecord) -> ReformatStatus {
        let data_type = Self::data_type(record);
        let Some(pipeline) = self.pipelines.get(data_type) else {
            warn!(data_type, "no reformat pipeline defined for config data type");
            return ReformatStatus::Skipped;
        };

        let mut content = record.content.clone();
        match pipeline.run(&mut content) {
            Ok(true) => {
                if let Err(err) = store.update_content(record.id, &content) {
                    error!(id = record.id, %err, "failed to persist reformatted config");
                    return ReformatStatus::Failed;
                }
                info!(id = record.id, data_type, "reformatted config");
                ReformatStatus::Success
            }
            Ok(false) => ReformatStatus::Skipped,
            Err(err) => {
                error!(id = record.id, data_type, %err, "config reformatting failed");
                ReformatStatus::Failed
            }
        }
    }
}
