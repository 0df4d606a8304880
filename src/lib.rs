extern crate self as coordex;

#[macro_use]
mod macros;
mod api;
mod catalog;
mod engine;
mod errors;
mod geocoding;
mod geodesy;
mod normalize;
mod precision;

pub use api::{DEFAULT_PATTERNS, Extractor, MatchFlags, extract};
pub use catalog::{
    Catalog, CatalogPolicy, CompileOptions, DefaultPolicy, HandlerKind, PlaceholderDefinition,
    Rule, TestFixture,
};
pub use errors::{ConfigError, NormalizeError};
pub use geocoding::{Geocoding, GeocoordMatch, Place, PrecisionEstimate};
pub use geodesy::{GridGeodesy, Wgs84};
pub use normalize::Resolution;
pub use normalize::filters::{AdjacentResolution, SpecificityPolicy};

use std::collections::HashMap;

// --- Internal types ---------------------------------------------------------

/// Coordinate notation family. Every rule in the catalog belongs to exactly
/// one family, and the family selects the normalizer handler by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    /// Decimal degrees, e.g. `+42.3 -102.4`.
    Dd,
    /// Degrees with decimal minutes, e.g. `34:56.78N`.
    Dm,
    /// Degrees, minutes, seconds, e.g. `34-12-45N`.
    Dms,
    /// Military Grid Reference System, e.g. `38SMB4611036560`.
    Mgrs,
    /// Universal Transverse Mercator, e.g. `17T 630084 4833438`.
    Utm,
}

impl Family {
    /// Parse the family label used in the pattern DSL.
    pub fn from_label(label: &str) -> Option<Family> {
        match label.to_ascii_uppercase().as_str() {
            "DD" => Some(Family::Dd),
            "DM" => Some(Family::Dm),
            "DMS" => Some(Family::Dms),
            "MGRS" => Some(Family::Mgrs),
            "UTM" => Some(Family::Utm),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Family::Dd => "DD",
            Family::Dm => "DM",
            Family::Dms => "DMS",
            Family::Mgrs => "MGRS",
            Family::Utm => "UTM",
        }
    }
}

impl std::fmt::Display for Family {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A captured field: the substring plus its absolute byte span in the
/// scanned buffer. The matching primitive has no named groups, so fields are
/// recovered by zipping a rule's ordered group names against capture
/// ordinals (see `catalog::compile`).
#[derive(Debug, Clone)]
pub struct GroupSpan {
    pub text: String,
    /// Start byte index (inclusive), absolute within the scanned buffer.
    pub start: usize,
    /// End byte index (exclusive).
    pub end: usize,
}

/// Field name -> captured span, for one raw match.
pub type GroupMap = HashMap<String, GroupSpan>;

/// A raw, un-normalized hit produced by the scanner. Transient: consumed
/// immediately by the per-family normalizer.
#[derive(Debug, Clone)]
pub struct RawMatch {
    pub rule_id: String,
    pub family: Family,
    pub text: String,
    pub start: usize,
    pub end: usize,
    pub groups: GroupMap,
}

impl RawMatch {
    /// Value of a named field, if that group participated in the match.
    pub fn value(&self, name: &str) -> Option<&str> {
        self.groups.get(name).map(|g| g.text.as_str())
    }
}
