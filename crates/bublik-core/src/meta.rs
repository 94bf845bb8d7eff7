//! Read-only index over the tags of a series or a run.
//!
//! The primitive every other report component queries against. Missing tags
//! are absence, not an error: callers must tolerate partial tag sets (a
//! series without `base_units`, a run without some label).

use std::collections::{BTreeSet, HashMap};

use bublik_common::{Meta, MetaType};

/// Tags of one entity, grouped by type for cheap repeated lookups.
#[derive(Debug, Clone)]
pub struct MetaIndex<'a> {
    by_type: HashMap<MetaType, Vec<&'a Meta>>,
}

impl<'a> MetaIndex<'a> {
    pub fn new(metas: &'a [Meta]) -> Self {
        let mut by_type: HashMap<MetaType, Vec<&'a Meta>> = HashMap::new();
        for meta in metas {
            by_type.entry(meta.meta_type).or_default().push(meta);
        }
        Self { by_type }
    }

    /// All tags of the given type, in the entity's own order.
    pub fn of_type(&self, meta_type: MetaType) -> &[&'a Meta] {
        self.by_type
            .get(&meta_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Tags of the given type whose name is in `names`.
    pub fn named(&self, meta_type: MetaType, names: &BTreeSet<String>) -> Vec<&'a Meta> {
        self.of_type(meta_type)
            .iter()
            .filter(|m| names.contains(&m.name))
            .copied()
            .collect()
    }

    /// The value of the first tag of the given `(type, name)`, if any.
    pub fn value(&self, meta_type: MetaType, name: &str) -> Option<&'a str> {
        self.of_type(meta_type)
            .iter()
            .find(|m| m.name == name)
            .map(|m| m.value.as_str())
    }

    /// Whether a tag of the given `(type, name)` exists with a value in
    /// `accepted`.
    pub fn matches(&self, meta_type: MetaType, name: &str, accepted: &BTreeSet<String>) -> bool {
        self.of_type(meta_type)
            .iter()
            .any(|m| m.name == name && accepted.contains(&m.value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Meta> {
        vec![
            Meta::new("tool", MetaType::Tool, "netperf"),
            Meta::new("type", MetaType::MeasurementSubject, "throughput"),
            Meta::new("aggr", MetaType::MeasurementSubject, "mean"),
            Meta::new("side", MetaType::MeasurementKey, "tx"),
            Meta::new("proto", MetaType::MeasurementKey, "udp"),
        ]
    }

    #[test]
    fn groups_by_type_and_looks_up_by_name() {
        let metas = sample();
        let index = MetaIndex::new(&metas);

        assert_eq!(index.of_type(MetaType::MeasurementSubject).len(), 2);
        assert_eq!(
            index.value(MetaType::MeasurementSubject, "type"),
            Some("throughput")
        );
        assert_eq!(index.value(MetaType::Tool, "tool"), Some("netperf"));
    }

    #[test]
    fn absence_is_none_not_error() {
        let metas = sample();
        let index = MetaIndex::new(&metas);

        assert_eq!(index.value(MetaType::MeasurementSubject, "base_units"), None);
        assert!(index.of_type(MetaType::Label).is_empty());
    }

    #[test]
    fn name_filter_keeps_only_requested_tags() {
        let metas = sample();
        let index = MetaIndex::new(&metas);

        let names: BTreeSet<String> = ["side".to_string()].into_iter().collect();
        let found = index.named(MetaType::MeasurementKey, &names);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].value, "tx");
    }

    #[test]
    fn matches_checks_value_membership() {
        let metas = sample();
        let index = MetaIndex::new(&metas);

        let accepted: BTreeSet<String> = ["netperf".to_string()].into_iter().collect();
        assert!(index.matches(MetaType::Tool, "tool", &accepted));

        let rejected: BTreeSet<String> = ["iperf".to_string()].into_iter().collect();
        assert!(!index.matches(MetaType::Tool, "tool", &rejected));
    }
}
