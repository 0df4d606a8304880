//! Finished coordinate matches and the geocoding surface consumed by
//! downstream collaborators.

use crate::normalize::Resolution;
use crate::{Family, GroupMap, NormalizeError, precision};

/// Inherent positional uncertainty implied by the text of a match.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrecisionEstimate {
    pub meters: f64,
    /// Normalized significant-digit count, comparable across families.
    pub digits: i32,
}

impl Default for PrecisionEstimate {
    fn default() -> Self {
        PrecisionEstimate { meters: precision::DEFAULT_PRECISION, digits: 0 }
    }
}

/// Lat/lon field separator groups, most specific first. The first group
/// present in a match wins.
const SEPARATOR_PRIORITY: [&str; 6] =
    ["trivialSep", "xySep", "latlonSep", "latlonSep3", "latlonSep03", "latlonSepNoDash"];

/// A normalized, validated coordinate match. Created by the per-family
/// normalizers, mutated once by validation, then owned by the caller.
#[derive(Debug, Clone)]
pub struct GeocoordMatch {
    pub family: Family,
    /// Catalog key of the originating rule, e.g. `DMS-01`.
    pub rule_key: String,
    /// The matched span of the scanned buffer, verbatim.
    pub text: String,
    /// Absolute byte offsets of the span.
    pub start: usize,
    pub end: usize,

    pub latitude: f64,
    pub longitude: f64,
    pub lat_text: Option<String>,
    pub lon_text: Option<String>,
    /// Family-normalized coordinate text, e.g. `+34:12:45.000 -118:09:30.000`
    /// or a whitespace-stripped MGRS grid.
    pub coord_text: Option<String>,
    /// MGRS grid zone designator, e.g. `38S`.
    pub grid_zone: Option<String>,

    pub precision: PrecisionEstimate,
    /// Lat and lon fields carry comparable resolution.
    pub balanced: bool,
    /// Failed a validation heuristic. The match is retained regardless.
    pub filtered_out: bool,

    /// Set by result reduction, never by normalization.
    pub is_duplicate: bool,
    pub is_submatch: bool,
    pub is_overlap: bool,

    /// Alternate readings of the same span, e.g. both repairs of an
    /// odd-length MGRS easting/northing run.
    pub other_interpretations: Vec<GeocoordMatch>,

    // Ordinate metadata carried for validation.
    pub(crate) lat_hemi: bool,
    pub(crate) lon_hemi: bool,
    pub(crate) lat_resolution: Option<Resolution>,
    pub(crate) lon_resolution: Option<Resolution>,

    // Field offsets, absolute at construction, match-relative after
    // rebase_offsets(). The dash and punctuation checks refuse to run on
    // un-rebased offsets.
    pub(crate) offset_lat: Option<usize>,
    /// Start of the longitude ordinate including any hemisphere prefix.
    pub(crate) offset_lon: Option<usize>,
    /// End of the latitude's postfix hemisphere symbol, when it has one.
    pub(crate) offset_lat_hemi: Option<usize>,
    pub(crate) offset_separator: Option<usize>,
    pub(crate) lon_hemi_dash: bool,
    pub(crate) dm_lat_sep: Option<String>,
    pub(crate) dm_lon_sep: Option<String>,
    offsets_rebased: bool,
}

impl GeocoordMatch {
    pub(crate) fn new(family: Family, rule_key: &str, text: &str, start: usize, end: usize) -> Self {
        GeocoordMatch {
            family,
            rule_key: rule_key.to_string(),
            text: text.to_string(),
            start,
            end,
            latitude: 0.0,
            longitude: 0.0,
            lat_text: None,
            lon_text: None,
            coord_text: None,
            grid_zone: None,
            precision: PrecisionEstimate::default(),
            balanced: true,
            filtered_out: false,
            is_duplicate: false,
            is_submatch: false,
            is_overlap: false,
            other_interpretations: Vec::new(),
            lat_hemi: false,
            lon_hemi: false,
            lat_resolution: None,
            lon_resolution: None,
            offset_lat: None,
            offset_lon: None,
            offset_lat_hemi: None,
            offset_separator: None,
            lon_hemi_dash: false,
            dm_lat_sep: None,
            dm_lon_sep: None,
            offsets_rebased: false,
        }
    }

    /// Record the absolute offset of the lat/lon field separator, taking the
    /// first separator group present in priority order.
    pub(crate) fn set_separator(&mut self, groups: &GroupMap) {
        for name in SEPARATOR_PRIORITY {
            if let Some(span) = groups.get(name) {
                self.offset_separator = Some(span.start);
                return;
            }
        }
    }

    /// Rebase all recorded field offsets to be relative to the match start.
    /// Runs at most once; a second call is a no-op, never a double shift.
    pub(crate) fn rebase_offsets(&mut self) {
        if self.offsets_rebased {
            return;
        }
        let base = self.start;
        for slot in [
            &mut self.offset_lat,
            &mut self.offset_lon,
            &mut self.offset_lat_hemi,
            &mut self.offset_separator,
        ] {
            if let Some(off) = slot {
                *off = off.saturating_sub(base);
            }
        }
        self.offsets_rebased = true;
    }

    fn dash_count(&self, from: usize, to: usize) -> usize {
        self.text.char_indices().filter(|(i, c)| *c == '-' && *i >= from && *i < to).count()
    }

    /// Dash-consistency heuristic: a real DMS coordinate uses dashes
    /// symmetrically in its two ordinates; a dashed serial number does not.
    /// Returns true when dash usage is inconsistent.
    pub(crate) fn evaluate_invalid_dashes(&self) -> Result<bool, NormalizeError> {
        if !self.offsets_rebased {
            return Err(NormalizeError::OffsetsNotSet { check: "dash-consistency" });
        }
        let (lat_at, lon_at) = match (self.offset_lat, self.offset_lon) {
            (Some(a), Some(b)) => (a, b),
            _ => return Err(NormalizeError::OffsetsNotSet { check: "dash-consistency" }),
        };

        // Latitude text ends at the explicit separator when one matched,
        // else just past the latitude's hemisphere letter, else at the
        // longitude ordinate.
        let lat_end =
            self.offset_separator.or(self.offset_lat_hemi).unwrap_or(lon_at).min(lon_at);
        let lat_dashes = self.dash_count(lat_at, lat_end.max(lat_at));
        let mut lon_dashes = self.dash_count(lon_at, self.text.len());
        // A dash acting as the longitude's hemisphere sign is not a field
        // separator.
        if self.lon_hemi_dash && lon_dashes > 0 {
            lon_dashes -= 1;
        }
        Ok(lat_dashes != lon_dashes)
    }

    /// Punctuation-symmetry heuristic for DM/DMS: the intra-ordinate field
    /// separator must be the same character on both sides. Returns true when
    /// asymmetric.
    pub(crate) fn evaluate_invalid_punctuation(&self) -> bool {
        match (&self.dm_lat_sep, &self.dm_lon_sep) {
            (Some(a), Some(b)) => a != b,
            (None, None) => false,
            _ => true,
        }
    }

    /// Convert to a generic place record for collaborators that only speak
    /// place-like entities.
    pub fn as_place(&self) -> Place {
        Place {
            id: format!("{},{}", self.latitude, self.longitude),
            name: self.text.clone(),
            latitude: self.latitude,
            longitude: self.longitude,
            precision_meters: (self.precision.meters as i64).max(1),
        }
    }
}

/// Capability exposed to downstream disambiguation and output collaborators.
pub trait Geocoding {
    fn is_coordinate(&self) -> bool;
    fn is_place(&self) -> bool;
    fn is_country(&self) -> bool;
    fn feature_class(&self) -> &str;
    fn feature_code(&self) -> &str;
    fn latitude(&self) -> f64;
    fn longitude(&self) -> f64;
    /// Positional uncertainty in whole meters.
    fn precision_meters(&self) -> i64;
    /// The extraction method: the originating rule's catalog key.
    fn method(&self) -> &str;
    /// Raw coordinate matches carry no administrative context.
    fn country_code(&self) -> Option<&str> {
        None
    }
    fn admin1_code(&self) -> Option<&str> {
        None
    }
}

impl Geocoding for GeocoordMatch {
    fn is_coordinate(&self) -> bool {
        true
    }
    fn is_place(&self) -> bool {
        true
    }
    fn is_country(&self) -> bool {
        false
    }
    fn feature_class(&self) -> &str {
        "S"
    }
    fn feature_code(&self) -> &str {
        "COORD"
    }
    fn latitude(&self) -> f64 {
        self.latitude
    }
    fn longitude(&self) -> f64 {
        self.longitude
    }
    fn precision_meters(&self) -> i64 {
        self.precision.meters as i64
    }
    fn method(&self) -> &str {
        &self.rule_key
    }
}

/// A generic place record derived from a coordinate match.
#[derive(Debug, Clone)]
pub struct Place {
    /// `"{lat},{lon}"`.
    pub id: String,
    /// The matched text, verbatim.
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Floor of 1: a place is never more precise than a meter here.
    pub precision_meters: i64,
}
