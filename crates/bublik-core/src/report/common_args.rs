//! Common-argument extraction: arguments whose value never varies across a
//! test's iterations are hoisted out of per-point display.

use std::collections::BTreeMap;

/// Arguments present on EVERY iteration with exactly one distinct value
/// (exact string equality, before any type coercion). Empty input yields the
/// empty map.
pub fn common_args<'a, I>(arg_maps: I) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = &'a BTreeMap<String, String>>,
{
    let mut iter = arg_maps.into_iter();
    let Some(first) = iter.next() else {
        return BTreeMap::new();
    };

    let mut common = first.clone();
    for args in iter {
        common.retain(|name, value| args.get(name) == Some(value));
        if common.is_empty() {
            break;
        }
    }
    common
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn constant_arguments_survive() {
        let maps = [
            args(&[("speed", "100"), ("frame", "64")]),
            args(&[("speed", "100"), ("frame", "128")]),
            args(&[("speed", "100"), ("frame", "256")]),
        ];
        assert_eq!(common_args(maps.iter()), args(&[("speed", "100")]));
    }

    #[test]
    fn one_deviation_excludes_the_argument() {
        let maps = [
            args(&[("speed", "100")]),
            args(&[("speed", "100")]),
            args(&[("speed", "200")]),
        ];
        assert!(common_args(maps.iter()).is_empty());
    }

    #[test]
    fn absence_on_one_iteration_excludes_the_argument() {
        let maps = [args(&[("speed", "100"), ("mtu", "1500")]), args(&[("speed", "100")])];
        assert_eq!(common_args(maps.iter()), args(&[("speed", "100")]));
    }

    #[test]
    fn equality_is_exact_string_comparison() {
        // "100" and "0100" are the same integer but different strings.
        let maps = [args(&[("speed", "100")]), args(&[("speed", "0100")])];
        assert!(common_args(maps.iter()).is_empty());
    }

    #[test]
    fn empty_input_yields_empty_map() {
        assert!(common_args(std::iter::empty::<&BTreeMap<String, String>>()).is_empty());
    }
}
