//! MGRS text heuristics and parsing.
//!
//! MGRS references are the richest source of false positives in plain text
//! (dates, serial numbers, bearings all look grid-like), so the parser is
//! deliberately suspicious: grid zone sanity rules run before any geodesy,
//! and odd-length easting/northing runs are either repaired into two
//! candidate readings or rejected outright in strict mode.

use crate::geocoding::GeocoordMatch;
use crate::geodesy::GridGeodesy;
use crate::{Family, NormalizeError, RawMatch, precision};

/// Month and timezone abbreviations that masquerade as a band letter plus
/// 100 km square, e.g. `04JAN2021` or `12GMT0400`.
const DATE_TOKENS: [&str; 24] = [
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC", "GMT",
    "UTC", "EST", "EDT", "CST", "CDT", "MST", "MDT", "PST", "PDT", "AKS", "HST",
];

fn unparseable(raw: &RawMatch) -> NormalizeError {
    NormalizeError::Unparseable { family: Family::Mgrs, text: raw.text.clone() }
}

fn field<'a>(raw: &'a RawMatch, name: &str) -> Result<&'a str, NormalizeError> {
    raw.value(name).ok_or_else(|| NormalizeError::UnparsedOrdinate {
        family: Family::Mgrs,
        ordinate: "grid",
        text: raw.text.clone(),
    })
}

/// Scale a digit run to meters within the 100 km square: `"46110"` is
/// 46,110 m, `"46"` is 46,000 m.
fn offset_meters(digits: &str) -> Result<f64, NormalizeError> {
    if digits.is_empty() {
        return Ok(0.0);
    }
    let value: f64 = digits
        .parse()
        .map_err(|_| NormalizeError::BadNumber { field: "grid offset", value: digits.to_string() })?;
    let shift = 5i32 - digits.len() as i32;
    if shift < 0 {
        return Err(NormalizeError::BadNumber {
            field: "grid offset",
            value: digits.to_string(),
        });
    }
    Ok(value * 10f64.powi(shift))
}

fn token_at(stripped: &str, range: std::ops::Range<usize>) -> Option<&str> {
    stripped.get(range)
}

pub(super) fn normalize(
    rule_key: &str,
    raw: &RawMatch,
    geodesy: &dyn GridGeodesy,
    strict: bool,
) -> Result<GeocoordMatch, NormalizeError> {
    let zone_text = field(raw, "MGRSZone")?;
    let quad = field(raw, "MGRSQuad")?.to_ascii_uppercase();
    let offsets = field(raw, "Easting_Northing")?;

    let stripped: String =
        raw.text.chars().filter(|c| !c.is_whitespace()).collect::<String>().to_ascii_uppercase();
    if stripped.len() < 6 {
        return Err(unparseable(raw));
    }
    // Bearings: 14DEG30 reads as zone 14D, square EG.
    if stripped.len() < 8 && token_at(&stripped, 2..5) == Some("DEG") {
        return Err(unparseable(raw));
    }
    for range in [2..5, 1..4] {
        if let Some(tok) = token_at(&stripped, range) {
            if DATE_TOKENS.contains(&tok) {
                return Err(unparseable(raw));
            }
        }
    }

    // Easting/northing runs must not straddle lines or tab stops.
    if offsets.contains(['\n', '\r', '\t']) {
        return Err(unparseable(raw));
    }

    let zone_text = zone_text.to_ascii_uppercase();
    let band = zone_text.chars().last().ok_or_else(|| unparseable(raw))?;
    let digits = &zone_text[..zone_text.len() - band.len_utf8()];
    let zone: u8 = digits
        .parse()
        .map_err(|_| NormalizeError::BadNumber { field: "zone", value: digits.to_string() })?;
    if zone == 0 || zone > 60 {
        return Err(NormalizeError::BadNumber { field: "zone", value: digits.to_string() });
    }

    let parts: Vec<&str> = offsets.split_whitespace().collect();
    let candidates: Vec<(String, String)> = match parts.as_slice() {
        [easting, northing] => {
            // A spaced pair with unequal widths is a measurement or a list,
            // not a grid reference.
            if easting.len() != northing.len() {
                return Err(unparseable(raw));
            }
            vec![(easting.to_string(), northing.to_string())]
        }
        [run] => {
            let run = *run;
            if run.len() % 2 == 0 {
                let half = run.len() / 2;
                vec![(run[..half].to_string(), run[half..].to_string())]
            } else if strict {
                return Err(unparseable(raw));
            } else {
                // An odd run has a digit missing from one side. Offer both
                // repairs and let the caller disambiguate.
                let half = run.len() / 2;
                vec![
                    (run[..=half].to_string(), run[half + 1..].to_string()),
                    (run[..half].to_string(), run[half..].to_string()),
                ]
            }
        }
        _ => return Err(unparseable(raw)),
    };

    let mut readings = Vec::with_capacity(candidates.len());
    for (e_digits, n_digits) in &candidates {
        let easting = offset_meters(e_digits)?;
        let northing = offset_meters(n_digits)?;
        let (lat, lon) = geodesy.mgrs_to_geodetic(zone, band, &quad, easting, northing)?;

        let mut m = GeocoordMatch::new(Family::Mgrs, rule_key, &raw.text, raw.start, raw.end);
        m.latitude = lat;
        m.longitude = lon;
        m.grid_zone = Some(zone_text.clone());
        m.coord_text = Some(format!("{zone_text}{quad}{e_digits}{n_digits}"));
        m.precision = precision::mgrs(m.coord_text.as_deref().unwrap_or_default());
        readings.push(m);
    }

    let mut primary = readings.remove(0);
    primary.other_interpretations = readings;
    Ok(primary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geodesy::Wgs84;
    use crate::{GroupMap, GroupSpan};

    fn raw(text: &str, zone: &str, quad: &str, offsets: &str) -> RawMatch {
        let mut groups = GroupMap::new();
        for (name, val) in [("MGRSZone", zone), ("MGRSQuad", quad), ("Easting_Northing", offsets)]
        {
            let at = text.find(val).unwrap_or(0);
            groups.insert(
                name.to_string(),
                GroupSpan { text: val.to_string(), start: at, end: at + val.len() },
            );
        }
        RawMatch {
            rule_id: "MGRS-01".to_string(),
            family: Family::Mgrs,
            text: text.to_string(),
            start: 0,
            end: text.len(),
            groups,
        }
    }

    #[test]
    fn full_grid_resolves_near_baghdad() {
        let r = raw("38SMB4611036560", "38S", "MB", "4611036560");
        let m = normalize("MGRS-01", &r, &Wgs84, false).unwrap();
        assert!((m.latitude - 33.3).abs() < 0.3, "lat={}", m.latitude);
        assert!((m.longitude - 44.4).abs() < 0.3, "lon={}", m.longitude);
        assert_eq!(m.grid_zone.as_deref(), Some("38S"));
        assert_eq!(m.coord_text.as_deref(), Some("38SMB4611036560"));
        assert_eq!(m.precision.meters, 1.0);
        assert!(m.other_interpretations.is_empty());
    }

    #[test]
    fn spaced_grid_is_equivalent() {
        let r = raw("38SMB 46110 36560", "38S", "MB", "46110 36560");
        let m = normalize("MGRS-01", &r, &Wgs84, false).unwrap();
        assert_eq!(m.coord_text.as_deref(), Some("38SMB4611036560"));
    }

    #[test]
    fn odd_run_yields_two_readings() {
        let r = raw("38SMB461103656", "38S", "MB", "461103656");
        let m = normalize("MGRS-01", &r, &Wgs84, false).unwrap();
        assert_eq!(m.other_interpretations.len(), 1);
        // The repairs assign the stray digit to opposite sides, so the two
        // readings land at different northings.
        let alt = &m.other_interpretations[0];
        assert!((m.latitude - alt.latitude).abs() > 1e-6);
    }

    #[test]
    fn strict_mode_rejects_odd_runs() {
        let r = raw("38SMB461103656", "38S", "MB", "461103656");
        assert!(normalize("MGRS-01", &r, &Wgs84, true).is_err());
    }

    #[test]
    fn calendar_dates_rejected() {
        let r = raw("04JAN2021", "04J", "AN", "2021");
        assert!(matches!(
            normalize("MGRS-01", &r, &Wgs84, false),
            Err(NormalizeError::Unparseable { .. })
        ));
    }

    #[test]
    fn bearings_rejected() {
        let r = raw("14DEG30", "14D", "EG", "30");
        assert!(normalize("MGRS-01", &r, &Wgs84, false).is_err());
    }

    #[test]
    fn zone_zero_rejected() {
        let r = raw("00CMB4611036560", "00C", "MB", "4611036560");
        assert!(matches!(
            normalize("MGRS-01", &r, &Wgs84, false),
            Err(NormalizeError::BadNumber { field: "zone", .. })
        ));
    }

    #[test]
    fn asymmetric_spaced_offsets_rejected() {
        let r = raw("38SMB 46110 365", "38S", "MB", "46110 365");
        assert!(normalize("MGRS-01", &r, &Wgs84, false).is_err());
    }

    #[test]
    fn too_short_text_rejected() {
        let r = raw("8QM12", "8Q", "M1", "2");
        assert!(normalize("MGRS-01", &r, &Wgs84, false).is_err());
    }
}
