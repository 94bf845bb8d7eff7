//! Axis names, series labels, and unit-prefix normalization.

use bublik_common::{MeasurementSeries, MetaType};

use crate::errors::{ReportError, Result};
use crate::meta::MetaIndex;

/// Subject attributes consumed by label/unit derivation and therefore kept
/// out of the label body.
const CONSUMED_SUBJECTS: &[&str] = &["name", "type", "base_units", "multiplier"];

/// Canonical unit prefixes by multiplier. A `(multiplier, base_units)` pair
/// outside this table falls back to the literal `"<base_units> * <multiplier>"`.
const UNIT_PREFIXES: &[(&str, &str)] = &[
    ("0.000000001", "n"),
    ("0.000001", "u"),
    ("0.001", "m"),
    ("1", ""),
    ("1000", "K"),
    ("1000000", "M"),
    ("1000000000", "G"),
    ("1000000000000", "T"),
];

/// Resolve the canonical prefixed unit for `(multiplier, base_units)`, e.g.
/// `("1000", "bps") -> "Kbps"`. `None` on a table miss.
pub fn unit_prefix(multiplier: &str, base_units: &str) -> Option<String> {
    UNIT_PREFIXES
        .iter()
        .find(|(m, _)| *m == multiplier)
        .map(|(_, prefix)| format!("{prefix}{base_units}"))
}

/// The unit suffix of a series, when both `base_units` and `multiplier`
/// subject attributes are present and non-empty. A prefix-table miss is
/// recoverable: the literal composed string is used instead.
pub fn unit_suffix(index: &MetaIndex<'_>) -> Option<String> {
    let base_units = index
        .value(MetaType::MeasurementSubject, "base_units")
        .filter(|v| !v.is_empty())?;
    let multiplier = index
        .value(MetaType::MeasurementSubject, "multiplier")
        .filter(|v| !v.is_empty())?;

    Some(
        unit_prefix(multiplier, base_units)
            .unwrap_or_else(|| format!("{base_units} * {multiplier}")),
    )
}

/// Display strings of one series.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesLabels {
    pub axis_name: String,
    pub label: String,
}

/// Derive the axis name and series label from a series' tags.
///
/// Fails fast with [`ReportError::MissingRequiredTag`] when the series has
/// neither `name` nor `type` subject attribute; labels are never guessed.
pub fn build(
    series: &MeasurementSeries,
    sequence_group_arg: Option<&str>,
) -> Result<SeriesLabels> {
    let index = MetaIndex::new(&series.metas);

    let name = index.value(MetaType::MeasurementSubject, "name");
    let subject_type = index.value(MetaType::MeasurementSubject, "type");

    let axis_name = name
        .or(subject_type)
        .ok_or_else(|| ReportError::MissingRequiredTag {
            test: series.test_name.clone(),
            series: series.id,
        })?
        .to_string();

    let mut parts: Vec<String> = Vec::new();
    if let Some(subject_type) = subject_type {
        parts.push(subject_type.to_string());
    }

    let mut remaining: Vec<_> = index
        .of_type(MetaType::MeasurementSubject)
        .iter()
        .filter(|m| !CONSUMED_SUBJECTS.contains(&m.name.as_str()))
        .collect();
    remaining.sort_by(|a, b| a.name.cmp(&b.name));
    parts.extend(remaining.iter().map(|m| m.value.clone()));

    let mut keys: Vec<_> = index.of_type(MetaType::MeasurementKey).to_vec();
    keys.sort_by(|a, b| a.name.cmp(&b.name));
    parts.extend(keys.iter().map(|m| format!("{}={}", m.name, m.value)));

    let mut label = parts.join(" - ");

    if let Some(suffix) = unit_suffix(&index) {
        label.push_str(&format!(" ({suffix})"));
    }
    if let Some(group_arg) = sequence_group_arg {
        label.push_str(&format!(" by {group_arg}"));
    }

    Ok(SeriesLabels { axis_name, label })
}
