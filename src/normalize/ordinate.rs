//! Degree-field digestion for the DD, DM and DMS families.
//!
//! One ordinate (latitude or longitude) is assembled from whichever degree,
//! minute, second and fraction groups the rule captured, cascading coarse to
//! fine. Field names are fixed by convention: a rule that wants its captures
//! digested here must use the `*Lat` / `*Lon` placeholder names below.

use crate::geocoding::GeocoordMatch;
use crate::normalize::Resolution;
use crate::{Family, GroupMap, GroupSpan, NormalizeError, RawMatch, precision};

/// Placeholder names for one side of a coordinate pair.
struct Side {
    ordinate: &'static str,
    dec_deg: &'static str,
    deg: [&'static str; 2],
    dec_min: &'static str,
    min: [&'static str; 2],
    fract_min: &'static str,
    sec: [&'static str; 2],
    fract_sec: &'static str,
    /// Hemisphere groups in priority order: postfix letter, numeric sign,
    /// prefix letter-or-sign.
    hemi: [&'static str; 3],
    dm_sep: &'static str,
}

const LAT: Side = Side {
    ordinate: "latitude",
    dec_deg: "decDegLat",
    deg: ["degLat", "dmsDegLat"],
    dec_min: "decMinLat",
    min: ["minLat", "dmsMinLat"],
    fract_min: "fractMinLat",
    sec: ["secLat", "dmsSecLat"],
    fract_sec: "fractSecLat",
    hemi: ["hemiLat", "hemiLatSign", "hemiLatPre"],
    dm_sep: "dmLatSep",
};

const LON: Side = Side {
    ordinate: "longitude",
    dec_deg: "decDegLon",
    deg: ["degLon", "dmsDegLon"],
    dec_min: "decMinLon",
    min: ["minLon", "dmsMinLon"],
    fract_min: "fractMinLon",
    sec: ["secLon", "dmsSecLon"],
    fract_sec: "fractSecLon",
    hemi: ["hemiLon", "hemiLonSign", "hemiLonPre"],
    dm_sep: "dmLonSep",
};

/// One digested ordinate. Spans are absolute buffer offsets of the numeric
/// fields only; hemisphere symbols are excluded.
struct Ordinate {
    value: f64,
    start: usize,
    end: usize,
    deg_end: usize,
    min_start: Option<usize>,
    has_minutes: bool,
    has_seconds: bool,
    has_hemisphere: bool,
    hemi_dash: bool,
    /// Span of the hemisphere symbol, prefix or postfix.
    hemi_span: Option<(usize, usize)>,
    resolution: Resolution,
    normalized: String,
    separator: Option<String>,
}

fn first<'a>(groups: &'a GroupMap, names: &[&str]) -> Option<&'a GroupSpan> {
    names.iter().find_map(|n| groups.get(*n))
}

fn num_f64(field: &'static str, text: &str) -> Result<f64, NormalizeError> {
    text.parse()
        .map_err(|_| NormalizeError::BadNumber { field, value: text.to_string() })
}

fn num_u32(field: &'static str, text: &str) -> Result<u32, NormalizeError> {
    text.parse()
        .map_err(|_| NormalizeError::BadNumber { field, value: text.to_string() })
}

/// Parse a bare digit run as a decimal fraction: `"7890"` is 0.789.
fn fraction(field: &'static str, text: &str) -> Result<f64, NormalizeError> {
    format!("0.{text}")
        .parse()
        .map_err(|_| NormalizeError::BadNumber { field, value: text.to_string() })
}

fn digest(groups: &GroupMap, side: &Side) -> Result<Option<Ordinate>, NormalizeError> {
    let mut resolution;
    let start;
    let mut end;

    let deg_value;
    let deg_text;
    if let Some(g) = groups.get(side.dec_deg) {
        deg_value = num_f64("degrees", &g.text)?;
        deg_text = g.text.clone();
        resolution = Resolution::SubDegree;
        start = g.start;
        end = g.end;
    } else if let Some(g) = first(groups, &side.deg) {
        deg_value = f64::from(num_u32("degrees", &g.text)?);
        deg_text = g.text.clone();
        resolution = Resolution::Degree;
        start = g.start;
        end = g.end;
    } else {
        return Ok(None);
    }
    let deg_end = end;

    let mut minutes = 0.0;
    let mut has_minutes = false;
    let mut min_start = None;
    if let Some(g) = groups.get(side.dec_min) {
        minutes = num_f64("minutes", &g.text)?;
        has_minutes = true;
        min_start = Some(g.start);
        resolution = Resolution::SubMinute;
        end = end.max(g.end);
    } else if let Some(g) = first(groups, &side.min) {
        minutes = f64::from(num_u32("minutes", &g.text)?);
        has_minutes = true;
        min_start = Some(g.start);
        resolution = Resolution::Minute;
        end = end.max(g.end);
    }
    if let Some(g) = groups.get(side.fract_min) {
        minutes += fraction("minutes", &g.text)?;
        has_minutes = true;
        resolution = Resolution::SubMinute;
        end = end.max(g.end);
    }
    if !(0.0..60.0).contains(&minutes) {
        return Err(NormalizeError::BadNumber { field: "minutes", value: minutes.to_string() });
    }

    let mut seconds = 0.0;
    let mut has_seconds = false;
    if let Some(g) = first(groups, &side.sec) {
        seconds = f64::from(num_u32("seconds", &g.text)?);
        has_seconds = true;
        resolution = Resolution::Second;
        end = end.max(g.end);
    }
    if let Some(g) = groups.get(side.fract_sec) {
        seconds += fraction("seconds", &g.text)?;
        has_seconds = true;
        resolution = Resolution::SubSecond;
        end = end.max(g.end);
    }
    if !(0.0..60.0).contains(&seconds) {
        return Err(NormalizeError::BadNumber { field: "seconds", value: seconds.to_string() });
    }

    let mut sign = 1.0;
    let mut has_hemisphere = false;
    let mut hemi_dash = false;
    let mut hemi_span = None;
    if let Some(g) = first(groups, &side.hemi) {
        let symbol = g.text.trim();
        if !symbol.is_empty() {
            has_hemisphere = true;
            hemi_span = Some((g.start, g.end));
            match symbol.to_ascii_uppercase().as_str() {
                "S" | "W" | "-" => {
                    sign = -1.0;
                    hemi_dash = symbol == "-";
                }
                _ => {}
            }
        }
    }
    let value = sign * (deg_value + minutes / 60.0 + seconds / 3600.0);

    let sign_char = if sign < 0.0 { '-' } else { '+' };
    let normalized = if resolution == Resolution::SubDegree {
        format!("{sign_char}{deg_text}")
    } else {
        // Fold decimal minutes into the seconds place for a uniform
        // DD:MM:SS.sss rendering.
        let min_whole = minutes.floor();
        let sec_norm = seconds + (minutes - min_whole) * 60.0;
        format!("{sign_char}{deg_text}:{min_whole:02}:{sec_norm:06.3}")
    };

    let separator = groups.get(side.dm_sep).map(|g| g.text.clone());

    Ok(Some(Ordinate {
        value,
        start,
        end,
        deg_end,
        min_start,
        has_minutes,
        has_seconds,
        has_hemisphere,
        hemi_dash,
        hemi_span,
        resolution,
        normalized,
        separator,
    }))
}

fn sub_text(raw: &RawMatch, start: usize, end: usize) -> Option<String> {
    let a = start.checked_sub(raw.start)?;
    let b = end.checked_sub(raw.start)?;
    raw.text.get(a..b).map(str::to_string)
}

/// Text between the degree and minute fields, trimmed; the intra-ordinate
/// delimiter when the rule spells it as a literal rather than a group.
fn derived_separator(raw: &RawMatch, deg_end: usize, min_start: Option<usize>) -> Option<String> {
    let min_start = min_start?;
    if min_start <= deg_end {
        return None;
    }
    let gap = sub_text(raw, deg_end, min_start)?;
    let gap = gap.trim();
    if gap.is_empty() { None } else { Some(gap.to_string()) }
}

pub(super) fn normalize_degrees(
    family: Family,
    rule_key: &str,
    raw: &RawMatch,
) -> Result<GeocoordMatch, NormalizeError> {
    let lat = digest(&raw.groups, &LAT)?.ok_or_else(|| NormalizeError::UnparsedOrdinate {
        family,
        ordinate: "latitude",
        text: raw.text.clone(),
    })?;
    let lon = digest(&raw.groups, &LON)?.ok_or_else(|| NormalizeError::UnparsedOrdinate {
        family,
        ordinate: "longitude",
        text: raw.text.clone(),
    })?;

    let mut m = GeocoordMatch::new(family, rule_key, &raw.text, raw.start, raw.end);
    m.latitude = lat.value;
    m.longitude = lon.value;
    m.lat_text = sub_text(raw, lat.start, lat.end);
    m.lon_text = sub_text(raw, lon.start, lon.end);
    m.coord_text = Some(format!("{} {}", lat.normalized, lon.normalized));
    m.lat_hemi = lat.has_hemisphere;
    m.lon_hemi = lon.has_hemisphere;
    m.lon_hemi_dash = lon.hemi_dash;
    m.lat_resolution = Some(lat.resolution);
    m.lon_resolution = Some(lon.resolution);
    m.offset_lat = Some(lat.start);
    // The longitude ordinate opens at its hemisphere prefix, so a sign dash
    // is counted as part of the longitude, never the latitude.
    m.offset_lon = Some(match lon.hemi_span {
        Some((s, _)) => s.min(lon.start),
        None => lon.start,
    });
    m.offset_lat_hemi = lat.hemi_span.map(|(_, e)| e).filter(|e| *e >= lat.end);
    m.set_separator(&raw.groups);
    m.dm_lat_sep =
        lat.separator.clone().or_else(|| derived_separator(raw, lat.deg_end, lat.min_start));
    m.dm_lon_sep =
        lon.separator.clone().or_else(|| derived_separator(raw, lon.deg_end, lon.min_start));
    m.rebase_offsets();

    m.precision = match family {
        Family::Dd => precision::decimal_degrees(m.lat_text.as_deref(), m.lon_text.as_deref()),
        _ => precision::degrees_minutes_seconds(
            m.lat_text.as_deref(),
            lat.deg_end - lat.start,
            lat.has_minutes,
            lat.has_seconds,
        ),
    };

    Ok(m)
}
