//! Argument normalization: type coercion, display ordering, and
//! sequence-name conversion.

use std::collections::{BTreeMap, BTreeSet};

use lazy_static::lazy_static;
use regex::Regex;

use bublik_common::ArgValue;

use crate::report::OrderedArgs;

lazy_static! {
    static ref INTEGER_LIKE: Regex = Regex::new(r"^[0-9]+$").unwrap();
}

/// Whether a raw value coerces to an integer. Values matching `^[0-9]+$` but
/// overflowing i64 are treated as textual.
fn integer_like(raw: &str) -> bool {
    INTEGER_LIKE.is_match(raw) && raw.parse::<i64>().is_ok()
}

/// Which arguments of one test coerce to integers.
///
/// All-or-nothing per `(test, argument)`: an argument is numeric only when
/// EVERY occurrence across all of the test's iterations is integer-like.
/// Mixed occurrences keep the whole argument textual, so sorting stays
/// stable.
#[derive(Debug, Clone, Default)]
pub struct CoercionPlan {
    numeric: BTreeSet<String>,
}

impl CoercionPlan {
    pub fn infer<'a, I>(arg_maps: I) -> Self
    where
        I: IntoIterator<Item = &'a BTreeMap<String, String>>,
    {
        let mut numeric: BTreeSet<String> = BTreeSet::new();
        let mut demoted: BTreeSet<String> = BTreeSet::new();

        for args in arg_maps {
            for (name, value) in args {
                if demoted.contains(name) {
                    continue;
                }
                if integer_like(value) {
                    numeric.insert(name.clone());
                } else {
                    numeric.remove(name);
                    demoted.insert(name.clone());
                }
            }
        }

        Self { numeric }
    }

    pub fn is_numeric(&self, name: &str) -> bool {
        self.numeric.contains(name)
    }

    pub fn coerce(&self, name: &str, raw: &str) -> ArgValue {
        if self.is_numeric(name) {
            if let Ok(v) = raw.parse::<i64>() {
                return ArgValue::Int(v);
            }
        }
        ArgValue::Text(raw.to_string())
    }
}

/// Order an argument map for display: names listed in `records_order` come
/// first, in that order (only those present in the map), the rest follow in
/// ascending lexicographic order. Values are coerced per `plan`.
pub fn args_sort(
    args: &BTreeMap<String, String>,
    records_order: &[String],
    plan: &CoercionPlan,
) -> OrderedArgs {
    let mut ordered: Vec<(String, ArgValue)> = Vec::with_capacity(args.len());

    for name in records_order {
        if let Some(raw) = args.get(name) {
            ordered.push((name.clone(), plan.coerce(name, raw)));
        }
    }
    // BTreeMap iteration supplies the lexicographic remainder.
    for (name, raw) in args {
        if !records_order.contains(name) {
            ordered.push((name.clone(), plan.coerce(name, raw)));
        }
    }

    OrderedArgs(ordered)
}

/// Display remapping of a sequence group value: mapped values are replaced,
/// everything else passes through unchanged.
pub fn convert_sequence_name(conversion: &BTreeMap<String, String>, raw: &str) -> String {
    conversion
        .get(raw)
        .cloned()
        .unwrap_or_else(|| raw.to_string())
}
