//! Axis-y series filtering.
//!
//! Each selector narrows the full candidate set: first by the `tool` tag,
//! then by measurement keys (sub-constraints unioned, so a series qualifies
//! if any requested key matches), then by measurement subject attributes,
//! all of which must hold. Per-selector results are unioned; a series
//! satisfying any selector is selected. The keys-union versus
//! subjects-intersection asymmetry is deliberate: different measurement keys
//! are alternative dimensions.

use std::collections::BTreeSet;

use bublik_common::{MeasurementSeries, MetaType, SeriesId};

use crate::config::AxisYSelector;
use crate::meta::MetaIndex;

/// Select the series matching an `axis_y` specification.
///
/// Set semantics: each series appears at most once, in candidate order. An
/// empty selector list selects nothing.
pub fn filter_by_axis_y<'a>(
    series: &'a [MeasurementSeries],
    axis_y: &[AxisYSelector],
) -> Vec<&'a MeasurementSeries> {
    let mut selected: BTreeSet<SeriesId> = BTreeSet::new();

    for selector in axis_y {
        let mut current: Vec<&MeasurementSeries> = series.iter().collect();

        if let Some(tools) = &selector.tool {
            current.retain(|s| MetaIndex::new(&s.metas).matches(MetaType::Tool, "tool", tools));
        }

        if !selector.keys.is_empty() {
            let mut key_matched: BTreeSet<SeriesId> = BTreeSet::new();
            for (key_name, accepted) in &selector.keys {
                for s in &current {
                    if MetaIndex::new(&s.metas).matches(
                        MetaType::MeasurementKey,
                        key_name,
                        accepted,
                    ) {
                        key_matched.insert(s.id);
                    }
                }
            }
            current.retain(|s| key_matched.contains(&s.id));
        }

        for (subject, accepted) in &selector.subjects {
            current.retain(|s| {
                MetaIndex::new(&s.metas).matches(MetaType::MeasurementSubject, subject, accepted)
            });
        }

        selected.extend(current.iter().map(|s| s.id));
    }

    let mut seen: BTreeSet<SeriesId> = BTreeSet::new();
    series
        .iter()
        .filter(|s| selected.contains(&s.id) && seen.insert(s.id))
        .collect()
}

/// Whether an iteration is excluded by `not_show_args`: true when ANY of the
/// configured `(argument, values)` pairs matches the iteration's arguments.
pub fn iteration_excluded<'a>(
    args: &std::collections::BTreeMap<String, String>,
    not_show_args: impl IntoIterator<Item = (&'a String, &'a BTreeSet<String>)>,
) -> bool {
    not_show_args
        .into_iter()
        .any(|(arg, values)| args.get(arg).map_or(false, |v| values.contains(v)))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use bublik_common::{Meta, MeasurementSeries, MetaType};

    use super::*;

    fn set(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn series(id: i64, metas: Vec<Meta>) -> MeasurementSeries {
        MeasurementSeries::new(id, "udp_tput", metas)
    }

    fn fixture() -> Vec<MeasurementSeries> {
        vec![
            series(
                1,
                vec![
                    Meta::new("tool", MetaType::Tool, "netperf"),
                    Meta::new("type", MetaType::MeasurementSubject, "throughput"),
                    Meta::new("aggr", MetaType::MeasurementSubject, "mean"),
                    Meta::new("side", MetaType::MeasurementKey, "tx"),
                ],
            ),
            series(
                2,
                vec![
                    Meta::new("tool", MetaType::Tool, "netperf"),
                    Meta::new("type", MetaType::MeasurementSubject, "throughput"),
                    Meta::new("aggr", MetaType::MeasurementSubject, "max"),
                    Meta::new("side", MetaType::MeasurementKey, "rx"),
                ],
            ),
            series(
                3,
                vec![
                    Meta::new("tool", MetaType::Tool, "iperf"),
                    Meta::new("type", MetaType::MeasurementSubject, "latency"),
                    Meta::new("direction", MetaType::MeasurementKey, "forward"),
                ],
            ),
        ]
    }

    fn ids(selected: &[&MeasurementSeries]) -> Vec<i64> {
        selected.iter().map(|s| s.id.0).collect()
    }

    #[test]
    fn empty_selector_list_selects_nothing() {
        let all = fixture();
        assert!(filter_by_axis_y(&all, &[]).is_empty());
    }

    #[test]
    fn empty_selector_matches_everything() {
        // A selector with no constraints narrows nothing.
        let all = fixture();
        let selected = filter_by_axis_y(&all, &[AxisYSelector::default()]);
        assert_eq!(ids(&selected), vec![1, 2, 3]);
    }

    #[test]
    fn tool_constraint_narrows() {
        let all = fixture();
        let selector = AxisYSelector {
            tool: Some(set(&["netperf"])),
            ..Default::default()
        };
        assert_eq!(ids(&filter_by_axis_y(&all, &[selector])), vec![1, 2]);
    }

    #[test]
    fn keys_union_then_subjects_intersect() {
        let all = fixture();
        // Both sides match the keys union, but only aggr=mean survives the
        // subject intersection.
        let selector = AxisYSelector {
            tool: None,
            keys: [("side".to_string(), set(&["tx", "rx"]))].into_iter().collect(),
            subjects: [("aggr".to_string(), set(&["mean"]))].into_iter().collect(),
        };
        assert_eq!(ids(&filter_by_axis_y(&all, &[selector])), vec![1]);
    }

    #[test]
    fn different_key_names_are_alternatives() {
        let all = fixture();
        // side=tx and direction=forward are orthogonal dimensions; matching
        // either one qualifies.
        let selector = AxisYSelector {
            tool: None,
            keys: [
                ("side".to_string(), set(&["tx"])),
                ("direction".to_string(), set(&["forward"])),
            ]
            .into_iter()
            .collect(),
            subjects: BTreeMap::new(),
        };
        assert_eq!(ids(&filter_by_axis_y(&all, &[selector])), vec![1, 3]);
    }

    #[test]
    fn selectors_union_and_order_does_not_matter() {
        let all = fixture();
        let a = AxisYSelector {
            subjects: [("type".to_string(), set(&["throughput"]))].into_iter().collect(),
            ..Default::default()
        };
        let b = AxisYSelector {
            tool: Some(set(&["iperf"])),
            ..Default::default()
        };

        let forward = ids(&filter_by_axis_y(&all, &[a.clone(), b.clone()]));
        let reversed = ids(&filter_by_axis_y(&all, &[b, a]));
        assert_eq!(forward, vec![1, 2, 3]);
        assert_eq!(forward, reversed);
    }

    #[test]
    fn overlapping_selectors_yield_each_series_once() {
        let all = fixture();
        let wide = AxisYSelector::default();
        let narrow = AxisYSelector {
            tool: Some(set(&["netperf"])),
            ..Default::default()
        };
        let selected = filter_by_axis_y(&all, &[wide, narrow]);
        assert_eq!(ids(&selected), vec![1, 2, 3]);
    }

    #[test]
    fn refiltering_the_selection_is_idempotent() {
        let all = fixture();
        let selector = AxisYSelector {
            tool: Some(set(&["netperf"])),
            ..Default::default()
        };

        let first: Vec<MeasurementSeries> = filter_by_axis_y(&all, std::slice::from_ref(&selector))
            .into_iter()
            .cloned()
            .collect();
        let second = filter_by_axis_y(&first, std::slice::from_ref(&selector));
        assert_eq!(ids(&second), ids(&first.iter().collect::<Vec<_>>()));
    }

    #[test]
    fn not_show_args_excludes_on_any_match() {
        let mut args = BTreeMap::new();
        args.insert("dry_run".to_string(), "yes".to_string());
        args.insert("proto".to_string(), "udp".to_string());

        let not_show: BTreeMap<String, BTreeSet<String>> =
            [("dry_run".to_string(), set(&["yes"]))].into_iter().collect();
        assert!(iteration_excluded(&args, &not_show));

        let not_matching: BTreeMap<String, BTreeSet<String>> =
            [("proto".to_string(), set(&["tcp"]))].into_iter().collect();
        assert!(!iteration_excluded(&args, &not_matching));
    }
}
