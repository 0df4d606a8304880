//! UTM field parsing. The projection itself belongs to the geodesy
//! collaborator; this module only assembles zone, band and offsets.

use crate::geocoding::GeocoordMatch;
use crate::geodesy::GridGeodesy;
use crate::{Family, NormalizeError, RawMatch, precision};

fn field<'a>(raw: &'a RawMatch, name: &str) -> Result<&'a str, NormalizeError> {
    raw.value(name).ok_or_else(|| NormalizeError::UnparsedOrdinate {
        family: Family::Utm,
        ordinate: "grid",
        text: raw.text.clone(),
    })
}

pub(super) fn normalize(
    rule_key: &str,
    raw: &RawMatch,
    geodesy: &dyn GridGeodesy,
) -> Result<GeocoordMatch, NormalizeError> {
    let zone_text = field(raw, "UTMZone")?;
    let band_text = field(raw, "UTMBand")?;
    let easting_text = field(raw, "UTMEasting")?;
    let northing_text = field(raw, "UTMNorthing")?;

    let zone: u8 = zone_text
        .parse()
        .map_err(|_| NormalizeError::BadNumber { field: "zone", value: zone_text.to_string() })?;
    if zone == 0 || zone > 60 {
        return Err(NormalizeError::BadNumber { field: "zone", value: zone_text.to_string() });
    }
    let band = band_text
        .chars()
        .next()
        .ok_or_else(|| NormalizeError::Unparseable {
            family: Family::Utm,
            text: raw.text.clone(),
        })?
        .to_ascii_uppercase();

    let easting: f64 = easting_text.parse().map_err(|_| NormalizeError::BadNumber {
        field: "easting",
        value: easting_text.to_string(),
    })?;
    let northing: f64 = northing_text.parse().map_err(|_| NormalizeError::BadNumber {
        field: "northing",
        value: northing_text.to_string(),
    })?;

    let north = band >= 'N';
    let (lat, lon) = geodesy.utm_to_geodetic(zone, north, easting, northing)?;

    let mut m = GeocoordMatch::new(Family::Utm, rule_key, &raw.text, raw.start, raw.end);
    m.latitude = lat;
    m.longitude = lon;
    m.coord_text = Some(format!("{zone}{band} {easting_text} {northing_text}"));
    m.precision = precision::utm();
    Ok(m)
}
