//! Public surface: the [`Extractor`], behavior flags and the one-shot
//! [`extract`] helper.

use crate::catalog::{Catalog, CatalogPolicy, CompileOptions};
use crate::engine;
use crate::errors::ConfigError;
use crate::geocoding::GeocoordMatch;
use crate::geodesy::{GridGeodesy, Wgs84};
use crate::normalize::filters::{AdjacentResolution, SpecificityPolicy};
use crate::Family;

/// The built-in rule set for the five coordinate families.
pub const DEFAULT_PATTERNS: &str = include_str!("../etc/geocoord_patterns.cfg");

bitflags::bitflags! {
    /// Scan and validation behavior toggles.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MatchFlags: u32 {
        /// Filter bare decimal pairs that carry neither hemispheres nor
        /// coordinate symbology.
        const DD_FILTERS = 1;
        /// Dash and punctuation symmetry heuristics for DM/DMS.
        const DMS_FILTERS = 1 << 1;
        /// MGRS false-positive filter: dates, serials, rates, units.
        const MGRS_FILTERS = 1 << 2;
        /// Reject odd-length MGRS offset runs instead of repairing them
        /// into two interpretations.
        const MGRS_STRICT = 1 << 3;
        /// Drop matches glued to preceding alphanumeric text.
        const CONTEXT_FILTERS = 1 << 4;
    }
}

impl Default for MatchFlags {
    fn default() -> Self {
        MatchFlags::DD_FILTERS
            | MatchFlags::DMS_FILTERS
            | MatchFlags::MGRS_FILTERS
            | MatchFlags::CONTEXT_FILTERS
    }
}

/// A compiled catalog plus the collaborators a scan needs. Cheap to scan
/// with repeatedly; compile once and reuse.
pub struct Extractor {
    catalog: Catalog,
    flags: MatchFlags,
    geodesy: Box<dyn GridGeodesy>,
    specificity: Box<dyn SpecificityPolicy>,
}

impl Extractor {
    /// Compile the built-in patterns.
    pub fn new() -> Result<Extractor, ConfigError> {
        Extractor::with_patterns(DEFAULT_PATTERNS)
    }

    /// Compile a caller-supplied pattern DSL.
    pub fn with_patterns(src: &str) -> Result<Extractor, ConfigError> {
        Extractor::with_options(src, &CompileOptions::default(), &crate::catalog::DefaultPolicy)
    }

    /// Full-control construction: compile options plus a catalog policy.
    pub fn with_options(
        src: &str,
        options: &CompileOptions,
        policy: &dyn CatalogPolicy,
    ) -> Result<Extractor, ConfigError> {
        Ok(Extractor {
            catalog: Catalog::compile(src, options, policy)?,
            flags: MatchFlags::default(),
            geodesy: Box::new(Wgs84),
            specificity: Box::new(AdjacentResolution),
        })
    }

    pub fn flags(&self) -> MatchFlags {
        self.flags
    }

    pub fn set_flags(&mut self, flags: MatchFlags) {
        self.flags = flags;
    }

    /// Swap the specificity-balance policy used by validation.
    pub fn set_specificity(&mut self, policy: Box<dyn SpecificityPolicy>) {
        self.specificity = policy;
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Mutable catalog access, for rule toggling between scans.
    pub fn catalog_mut(&mut self) -> &mut Catalog {
        &mut self.catalog
    }

    /// Scan a buffer with every enabled rule.
    pub fn extract(&self, text: &str) -> Vec<GeocoordMatch> {
        engine::scan(&self.catalog, text, None, self.flags, &*self.geodesy, &*self.specificity)
    }

    /// Scan with one family's rules only.
    pub fn extract_family(&self, text: &str, family: Family) -> Vec<GeocoordMatch> {
        engine::scan(
            &self.catalog,
            text,
            Some(family),
            self.flags,
            &*self.geodesy,
            &*self.specificity,
        )
    }
}

/// One-shot extraction with the built-in patterns and default flags. For
/// repeated scans build an [`Extractor`] once instead.
pub fn extract(text: &str) -> Result<Vec<GeocoordMatch>, ConfigError> {
    Ok(Extractor::new()?.extract(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::DefaultPolicy;
    use crate::precision;

    #[test]
    fn default_patterns_compile() {
        let ex = Extractor::new().unwrap();
        assert!(ex.catalog().rules().len() >= 10);
        assert!(ex.catalog().rule("MGRS-01").is_some());
    }

    #[test]
    fn single_placeholder_rule_end_to_end() {
        let src = "#DEFINE DEGLAT [0-8]?\\d\n#RULE DD latlon <DEGLAT>\\.\\d+\n";
        let catalog = Catalog::from_source(src).unwrap();
        let rule = catalog.rule("DD-latlon").unwrap();
        assert_eq!(rule.group_names, vec!["DEGLAT"]);
        assert_eq!(rule.pattern.captures_len() - 1, 1);

        let caps = rule.pattern.captures("lat is 42.1234 here").unwrap();
        let text = caps.get(0).unwrap().as_str();
        assert_eq!(text, "42.1234");

        let est = precision::decimal_degrees(Some(text), None);
        assert_eq!(est.digits, 4);
        assert!((est.meters - 5.55).abs() < 1e-12);
    }

    #[test]
    fn dms_pair_extracted_and_reduced() {
        let ex = Extractor::new().unwrap();
        let hits = ex.extract("coordinates 34-12-45N 118-09-30W here");
        // The span reads as both degrees-fractional-minutes and DMS.
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].start, hits[1].start);
        assert_eq!(hits[0].end, hits[1].end);
        assert!(!hits[0].is_duplicate);
        assert!(hits[1].is_duplicate);

        let dms = hits.iter().find(|m| m.family == Family::Dms).unwrap();
        assert!((dms.latitude - 34.2125).abs() < 1e-9);
        assert!((dms.longitude + 118.158333333).abs() < 1e-6);
        assert!(!dms.filtered_out);
        assert_eq!(dms.precision.meters, 15.0);
    }

    #[test]
    fn mgrs_extracted_from_prose() {
        let ex = Extractor::new().unwrap();
        let hits = ex.extract("unit reported at 38SMB 46110 36560 overnight");
        assert_eq!(hits.len(), 1);
        let m = &hits[0];
        assert_eq!(m.family, Family::Mgrs);
        assert_eq!(m.grid_zone.as_deref(), Some("38S"));
        assert!(!m.filtered_out);
    }

    #[test]
    fn utm_extracted() {
        let ex = Extractor::new().unwrap();
        let hits = ex.extract("grid 17T 630084 4833438");
        assert_eq!(hits.len(), 1);
        assert!((hits[0].latitude - 43.64).abs() < 0.05);
    }

    #[test]
    fn family_toggle_is_scoped() {
        let mut ex = Extractor::new().unwrap();
        ex.catalog_mut().set_family_enabled(Family::Dms, false);
        ex.catalog_mut().set_family_enabled(Family::Dm, false);
        let hits = ex.extract("34-12-45N 118-09-30W");
        assert!(hits.is_empty());
        ex.catalog_mut().enable_all();
        assert!(!ex.extract("34-12-45N 118-09-30W").is_empty());
    }

    #[test]
    fn one_shot_helper() {
        let hits = extract("N42.3 W102.4").unwrap();
        assert_eq!(hits.len(), 1);
        assert!((hits[0].latitude - 42.3).abs() < 1e-9);
        assert!((hits[0].longitude + 102.4).abs() < 1e-9);
    }

    // Every #TEST line in the built-in patterns must behave as declared: a
    // truth-marked sample yields at least one unfiltered match of its
    // family, a "fail" sample yields none.
    #[test]
    fn builtin_fixtures_hold() {
        let options = CompileOptions { load_fixtures: true };
        let ex = Extractor::with_options(DEFAULT_PATTERNS, &options, &DefaultPolicy).unwrap();
        for fixture in ex.catalog().fixtures() {
            let hits = ex.extract_family(&fixture.text, fixture.family);
            let found = hits.iter().any(|m| !m.filtered_out);
            assert_eq!(
                found, fixture.true_positive,
                "fixture {} over {:?}: got {:?}",
                fixture.id,
                fixture.text,
                hits.iter().map(|m| (&m.rule_key, m.filtered_out)).collect::<Vec<_>>()
            );
        }
    }
}
