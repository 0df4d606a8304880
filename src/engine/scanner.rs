//! Rule application and per-match dispatch.

use tracing::debug;

use super::reduce;
use crate::api::MatchFlags;
use crate::catalog::Catalog;
use crate::geocoding::GeocoordMatch;
use crate::geodesy::GridGeodesy;
use crate::normalize::filters::{self, SpecificityPolicy};
use crate::{Family, RawMatch, normalize};

/// A match glued to preceding alphanumeric text is part of a longer token,
/// e.g. the tail of a part number.
fn preceded_by_alphanumeric(text: &str, start: usize) -> bool {
    text[..start].chars().next_back().is_some_and(char::is_alphanumeric)
}

/// Scan a buffer with every enabled rule, optionally restricted to one
/// family. Normalization failures drop the single match; the scan always
/// runs the buffer to completion.
pub(crate) fn scan(
    catalog: &Catalog,
    text: &str,
    family: Option<Family>,
    flags: MatchFlags,
    geodesy: &dyn GridGeodesy,
    specificity: &dyn SpecificityPolicy,
) -> Vec<GeocoordMatch> {
    let mut results = Vec::new();

    for rule in catalog.rules() {
        if !rule.enabled {
            continue;
        }
        if family.is_some_and(|f| f != rule.family) {
            continue;
        }

        for caps in rule.pattern.captures_iter(text) {
            let Some(whole) = caps.get(0) else { continue };

            if flags.contains(MatchFlags::CONTEXT_FILTERS)
                && preceded_by_alphanumeric(text, whole.start())
            {
                debug!(rule = %rule.key, at = whole.start(), "dropped by context filter");
                continue;
            }

            let raw = RawMatch {
                rule_id: rule.key.clone(),
                family: rule.family,
                text: whole.as_str().to_string(),
                start: whole.start(),
                end: whole.end(),
                groups: rule.group_map(&caps),
            };

            let mut m = match normalize::normalize(rule, &raw, geodesy, flags) {
                Ok(m) => m,
                Err(err) => {
                    debug!(rule = %rule.key, %err, "match dropped");
                    continue;
                }
            };
            match filters::validate(&mut m, flags, specificity) {
                Ok(()) => results.push(m),
                Err(err) => {
                    debug!(rule = %rule.key, %err, "validation could not run");
                }
            }
        }
    }

    reduce::flag_reductions(&mut results);
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::geodesy::Wgs84;
    use crate::normalize::filters::AdjacentResolution;

    const SRC: &str = "\
#DEFINE decDegLat \\d{1,2}\\.\\d{1,12}
#DEFINE decDegLon [0-1]?\\d?\\d\\.\\d{1,12}
#DEFINE hemiLat [NS]
#DEFINE hemiLon [EW]
#RULE DD 01 <decDegLat><hemiLat>\\s{1,2}<decDegLon><hemiLon>
";

    fn run(text: &str, flags: MatchFlags) -> Vec<GeocoordMatch> {
        let catalog = Catalog::from_source(SRC).unwrap();
        scan(&catalog, text, None, flags, &Wgs84, &AdjacentResolution)
    }

    #[test]
    fn matches_carry_buffer_offsets() {
        let hits = run("seen at 42.30N 102.44W today", MatchFlags::default());
        assert_eq!(hits.len(), 1);
        let m = &hits[0];
        assert_eq!(m.text, "42.30N 102.44W");
        assert_eq!(m.start, 8);
        assert_eq!(m.end, 22);
        assert!((m.latitude - 42.30).abs() < 1e-9);
        assert!((m.longitude + 102.44).abs() < 1e-9);
        assert!(!m.filtered_out);
    }

    #[test]
    fn context_filter_drops_glued_matches() {
        let text = "SKU9942.30N 102.44W";
        assert!(run(text, MatchFlags::default()).is_empty());
        let kept = run(text, MatchFlags::default() - MatchFlags::CONTEXT_FILTERS);
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn disabled_rules_do_not_match() {
        let mut catalog = Catalog::from_source(SRC).unwrap();
        catalog.disable_all();
        let hits = scan(
            &catalog,
            "42.30N 102.44W",
            None,
            MatchFlags::default(),
            &Wgs84,
            &AdjacentResolution,
        );
        assert!(hits.is_empty());
    }

    #[test]
    fn family_scope_excludes_other_families() {
        let catalog = Catalog::from_source(SRC).unwrap();
        let hits = scan(
            &catalog,
            "42.30N 102.44W",
            Some(Family::Mgrs),
            MatchFlags::default(),
            &Wgs84,
            &AdjacentResolution,
        );
        assert!(hits.is_empty());
    }

    #[test]
    fn out_of_range_match_retained_but_filtered() {
        let hits = run("95.00N 102.44W", MatchFlags::default());
        assert_eq!(hits.len(), 1);
        assert!(hits[0].filtered_out);
    }
}
