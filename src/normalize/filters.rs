//! Validation heuristics. Every check here is advisory: a failing match is
//! marked `filtered_out` and retained, so callers can audit false positives.

use chrono::{Datelike, NaiveDate, Utc};

use crate::api::MatchFlags;
use crate::geocoding::GeocoordMatch;
use crate::normalize::Resolution;
use crate::{Family, NormalizeError};

/// Tokens whose presence marks text as coordinate-like. A bare number pair
/// with none of these is indistinguishable from arbitrary data.
const COORDINATE_SYMBOLS: [&str; 10] =
    ["°", "º", "'", "\"", ":", "lat", "lon", "geo", "coord", "deg"];

pub(crate) fn has_coordinate_symbols(text: &str) -> bool {
    let lower = text.to_lowercase();
    COORDINATE_SYMBOLS.iter().any(|s| lower.contains(s))
}

/// Decides whether the two ordinates of one match carry comparable
/// resolution.
pub trait SpecificityPolicy {
    fn is_balanced(&self, lat: Resolution, lon: Resolution) -> bool;
}

/// Default policy: resolutions may differ by at most one level. Whole
/// degrees paired with sub-second precision is a mismatch; minutes paired
/// with decimal minutes is not.
#[derive(Debug, Default)]
pub struct AdjacentResolution;

impl SpecificityPolicy for AdjacentResolution {
    fn is_balanced(&self, lat: Resolution, lon: Resolution) -> bool {
        (lat as i32 - lon as i32).abs() <= 1
    }
}

/// Run the validation cascade over one normalized match, short-circuiting
/// at the first failing check.
pub(crate) fn validate(
    m: &mut GeocoordMatch,
    flags: MatchFlags,
    policy: &dyn SpecificityPolicy,
) -> Result<(), NormalizeError> {
    let degree_family = matches!(m.family, Family::Dd | Family::Dm | Family::Dms);

    if degree_family
        && flags.contains(MatchFlags::DD_FILTERS)
        && !m.lat_hemi
        && !m.lon_hemi
        && !has_coordinate_symbols(&m.text)
    {
        m.filtered_out = true;
        return Ok(());
    }

    if m.latitude.abs() > 90.0 || m.longitude.abs() > 180.0 {
        m.filtered_out = true;
        return Ok(());
    }

    // The null island reading is always an artifact in running text.
    if m.latitude == 0.0 && m.longitude == 0.0 {
        m.filtered_out = true;
        return Ok(());
    }

    if matches!(m.family, Family::Dm | Family::Dms) {
        if let (Some(lat), Some(lon)) = (m.lat_resolution, m.lon_resolution) {
            m.balanced = policy.is_balanced(lat, lon);
            if !m.balanced {
                m.filtered_out = true;
                return Ok(());
            }
        }
        if flags.contains(MatchFlags::DMS_FILTERS) && m.evaluate_invalid_punctuation() {
            m.filtered_out = true;
            return Ok(());
        }
    }

    if m.family == Family::Dms
        && flags.contains(MatchFlags::DMS_FILTERS)
        && m.evaluate_invalid_dashes()?
    {
        m.filtered_out = true;
        return Ok(());
    }

    if m.family == Family::Mgrs
        && flags.contains(MatchFlags::MGRS_FILTERS)
        && looks_like_mgrs_noise(m)
    {
        m.filtered_out = true;
    }

    Ok(())
}

/// Keyboard-walk digit runs that show up in serials and examples.
const ROTE_SEQUENCES: [&str; 4] = ["1234", "123456", "12345678", "1234567890"];

fn looks_like_mgrs_noise(m: &GeocoordMatch) -> bool {
    let text = &m.text;
    // Real grid references are written in uppercase.
    if text.chars().any(|c| c.is_ascii_lowercase()) {
        return true;
    }
    if text.chars().filter(|c| !c.is_whitespace()).count() < 6 {
        return true;
    }
    // A line break inside the grid prefix means two unrelated lines.
    if text.chars().take(5).any(|c| c == '\n' || c == '\r') {
        return true;
    }
    if text.contains(" PER ") {
        return true;
    }

    let stripped: String =
        text.chars().filter(|c| !c.is_whitespace()).collect::<String>().to_ascii_uppercase();

    // "30SEC" and friends read as zone 30S + square EC.
    if regex!(r"^\d{1,2}SEC").is_match(&stripped) {
        return true;
    }

    if let Some(coord) = m.coord_text.as_deref() {
        if let Some(at) = coord.rfind(|c: char| c.is_alphabetic()) {
            let digits = &coord[at + 1..];
            if ROTE_SEQUENCES.contains(&digits) {
                return true;
            }
        }
    }

    looks_like_date(&stripped)
}

/// Date and date-time look-alikes: `14DEC1990`, `1JAN21`, `1JAN211530`,
/// `12GMT2021`. Only plausible values count, and only years within living
/// memory.
fn looks_like_date(s: &str) -> bool {
    let this_year = Utc::now().year();
    let recent = |y: i32| y > this_year - 80 && y <= this_year + 1;

    for fmt in ["%d%b%Y", "%d%b%y"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            if recent(d.year()) {
                return true;
            }
        }
    }

    // Date plus an HHMM time suffix.
    if s.len() >= 9 {
        let (head, tail) = s.split_at(s.len() - 4);
        if tail.chars().all(|c| c.is_ascii_digit()) {
            if let Ok(d) = NaiveDate::parse_from_str(head, "%d%b%y") {
                let hhmm: u32 = tail.parse().unwrap_or(9999);
                if recent(d.year()) && hhmm / 100 < 24 && hhmm % 100 < 60 {
                    return true;
                }
            }
        }
    }

    // Hour plus timezone plus year.
    if let Some(caps) =
        regex!(r"^(\d{1,2})(GMT|UTC|EST|EDT|CST|CDT|MST|MDT|PST|PDT)(\d{4})$").captures(s)
    {
        let hour: u32 = caps[1].parse().unwrap_or(99);
        let year: i32 = caps[3].parse().unwrap_or(0);
        if hour < 24 && recent(year) {
            return true;
        }
    }

    false
}
