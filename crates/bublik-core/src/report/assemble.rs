//! Report assembly: orchestrates filtering, labeling, and normalization into
//! the rendered payload.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::{debug, warn};

use bublik_common::{ArgValue, IterationId, MetaType};

use crate::config::{ReportConfig, TestReportConfig};
use crate::errors::Result;
use crate::meta::MetaIndex;
use crate::report::args::{args_sort, convert_sequence_name, CoercionPlan};
use crate::report::axis::{filter_by_axis_y, iteration_excluded};
use crate::report::common_args::common_args;
use crate::report::label::{self, SeriesLabels};
use crate::report::{
    InvalidIteration, OrderedArgs, PointRecord, Report, ReportDataSource, ReportScope, SeriesBlock,
    TestReport,
};

/// Assemble the full report for a validated config.
///
/// Tests appear in `test_names_order`. Iterations that cannot be placed on
/// the configured axes land in `invalid_iterations` with one reason per
/// missing requirement; they never abort the batch.
pub fn assemble_report(
    source: &dyn ReportDataSource,
    scope: &ReportScope,
    config: &ReportConfig,
) -> Result<Report> {
    let title = build_report_title(source, scope, &config.title_content)?;

    let mut tests = Vec::new();
    let mut invalid_iterations = Vec::new();
    for test_name in &config.test_names_order {
        let Some(test_config) = config.tests.get(test_name) else {
            warn!(
                test = %test_name,
                config = %config.name,
                "test_names_order entry has no test config, skipping"
            );
            continue;
        };
        tests.push(assemble_test(
            source,
            scope,
            test_name,
            test_config,
            &mut invalid_iterations,
        )?);
    }

    Ok(Report {
        title,
        config_name: config.name.clone(),
        tests,
        invalid_iterations,
    })
}

/// Resolve each `title_content` name against the run's `label` tags and join
/// the present values with `-`. Absent names are silently skipped.
pub fn build_report_title(
    source: &dyn ReportDataSource,
    scope: &ReportScope,
    title_content: &[String],
) -> Result<String> {
    let metas = source.run_metas(scope, Some(MetaType::Label))?;
    let index = MetaIndex::new(&metas);
    let parts: Vec<&str> = title_content
        .iter()
        .filter_map(|name| index.value(MetaType::Label, name))
        .collect();
    Ok(parts.join("-"))
}

/// Accumulation key of one plotted sequence: a series, narrowed by the
/// sequence-group value and by the arguments sitting on neither axis.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct GroupKey {
    series_idx: usize,
    sequence: Option<ArgValue>,
    rest: BTreeMap<String, ArgValue>,
}

#[derive(Debug, Default)]
struct GroupData {
    sequence_raw: Option<String>,
    points: BTreeMap<ArgValue, f64>,
}

fn assemble_test(
    source: &dyn ReportDataSource,
    scope: &ReportScope,
    test_name: &str,
    cfg: &TestReportConfig,
    invalid_iterations: &mut Vec<InvalidIteration>,
) -> Result<TestReport> {
    let all_series = source.series_for_test(scope, test_name)?;
    let selected = filter_by_axis_y(&all_series, &cfg.axis_y);

    let group_arg = cfg.sequence_group_arg.as_deref();

    // Label resolution is fatal for a selected series even before any point
    // lands on it.
    let labels: Vec<SeriesLabels> = selected
        .iter()
        .map(|series| label::build(series, group_arg))
        .collect::<Result<_>>()?;

    // Materialize the surviving points; iteration arguments are fetched once
    // per iteration.
    let mut args_cache: HashMap<IterationId, BTreeMap<String, String>> = HashMap::new();
    let mut surviving: Vec<IterationId> = Vec::new();
    let mut seen: BTreeSet<IterationId> = BTreeSet::new();
    let mut per_series: Vec<Vec<(IterationId, f64)>> = Vec::with_capacity(selected.len());

    for series in &selected {
        let mut kept = Vec::new();
        for point in source.points(series.id)? {
            if !args_cache.contains_key(&point.iteration) {
                args_cache.insert(point.iteration, source.iteration_args(point.iteration)?);
            }
            let args = &args_cache[&point.iteration];
            if iteration_excluded(args, &cfg.not_show_args) {
                continue;
            }
            if seen.insert(point.iteration) {
                surviving.push(point.iteration);
            }
            kept.push((point.iteration, point.value));
        }
        per_series.push(kept);
    }

    let arg_maps: Vec<&BTreeMap<String, String>> =
        surviving.iter().map(|id| &args_cache[id]).collect();
    let plan = CoercionPlan::infer(arg_maps.iter().copied());
    let common = common_args(arg_maps.iter().copied());
    let common_ordered = args_sort(&common, &cfg.records_order, &plan);

    let axis_x = cfg.axis_x.arg.as_str();

    let mut groups: BTreeMap<GroupKey, GroupData> = BTreeMap::new();
    for (series_idx, points) in per_series.iter().enumerate() {
        for (iteration, value) in points {
            let args = &args_cache[iteration];

            let mut reasons = Vec::new();
            let sequence_raw = match group_arg {
                Some(arg) => {
                    let found = args.get(arg).cloned();
                    if found.is_none() {
                        reasons
                            .push(format!("the sequence group argument '{arg}' is missing"));
                    }
                    found
                }
                None => None,
            };
            let x_raw = args.get(axis_x).cloned();
            if x_raw.is_none() {
                reasons.push(format!("the axis x argument '{axis_x}' is missing"));
            }

            if !reasons.is_empty() {
                invalid_iterations.push(InvalidIteration {
                    test_name: test_name.to_string(),
                    common_args: common_ordered.clone(),
                    args_vals: args_sort(args, &cfg.records_order, &plan),
                    reasons,
                });
                continue;
            }
            let x_raw = x_raw.expect("checked above");

            let rest: BTreeMap<String, ArgValue> = args
                .iter()
                .filter(|(name, _)| {
                    name.as_str() != axis_x
                        && group_arg.map_or(true, |g| name.as_str() != g)
                        && !common.contains_key(name.as_str())
                })
                .map(|(name, raw)| (name.clone(), plan.coerce(name, raw)))
                .collect();

            let key = GroupKey {
                series_idx,
                sequence: sequence_raw
                    .as_deref()
                    .map(|raw| plan.coerce(group_arg.expect("sequence implies group arg"), raw)),
                rest,
            };
            let x = plan.coerce(axis_x, &x_raw);

            let group = groups.entry(key).or_default();
            group.sequence_raw = sequence_raw;
            if group.points.insert(x.clone(), *value).is_some() {
                debug!(
                    test = test_name,
                    x = %x,
                    "duplicate x value within one sequence, keeping the latest point"
                );
            }
        }
    }

    // Baselines for percent rendering: the sequence whose raw group value
    // equals the configured base, per (series, rest-args).
    let base_value = group_arg.and(cfg.percentage_base_value.as_deref());
    let mut baselines: BTreeMap<(usize, BTreeMap<String, ArgValue>), BTreeMap<ArgValue, f64>> =
        BTreeMap::new();
    if let Some(base_raw) = base_value {
        for (key, group) in &groups {
            if group.sequence_raw.as_deref() == Some(base_raw) {
                baselines.insert((key.series_idx, key.rest.clone()), group.points.clone());
            }
        }
    }

    let mut series_blocks = Vec::new();
    for (key, group) in &groups {
        let series_labels = &labels[key.series_idx];
        let sequence = group
            .sequence_raw
            .as_deref()
            .map(|raw| convert_sequence_name(&cfg.sequence_name_conversion, raw));

        let is_base = match (base_value, group.sequence_raw.as_deref()) {
            (Some(base), Some(raw)) => base == raw,
            _ => false,
        };
        let baseline = if is_base {
            None
        } else {
            baselines.get(&(key.series_idx, key.rest.clone()))
        };

        let points = group
            .points
            .iter()
            .map(|(x, y)| PointRecord {
                x: x.clone(),
                y: *y,
                percent: baseline
                    .and_then(|base| base.get(x))
                    .filter(|base_y| **base_y != 0.0)
                    .map(|base_y| *y / *base_y * 100.0),
            })
            .collect();

        series_blocks.push(SeriesBlock {
            label: series_labels.label.clone(),
            axis_name: series_labels.axis_name.clone(),
            axis_x: axis_x.to_string(),
            sequence,
            args: order_coerced(&key.rest, &cfg.records_order),
            points,
        });
    }

    Ok(TestReport {
        test_name: test_name.to_string(),
        table_view: cfg.table_view,
        chart_view: cfg.chart_view,
        common_args: common_ordered,
        series: series_blocks,
    })
}

/// `records_order`-first ordering for an already-coerced argument map.
fn order_coerced(args: &BTreeMap<String, ArgValue>, records_order: &[String]) -> OrderedArgs {
    let mut ordered: Vec<(String, ArgValue)> = Vec::with_capacity(args.len());
    for name in records_order {
        if let Some(value) = args.get(name) {
            ordered.push((name.clone(), value.clone()));
        }
    }
    for (name, value) in args {
        if !records_order.contains(name) {
            ordered.push((name.clone(), value.clone()));
        }
    }
    OrderedArgs(ordered)
}
