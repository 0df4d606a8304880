//! Precision inference: meters of positional uncertainty implied by the
//! textual form of a match, plus a normalized digit count for cross-family
//! comparison.
//!
//! All functions here are total. Malformed or missing sub-text falls back to
//! [`DEFAULT_PRECISION`], never to an unset estimate.

use crate::geocoding::PrecisionEstimate;

/// Half a degree of latitude. The unknown-resolution fallback.
pub const DEFAULT_PRECISION: f64 = 111_000.0;

/// One whole degree of latitude, halved: the error of a bare degree value.
const DEGREE_PRECISION: f64 = 55_500.0;
const DMS_MINUTE_PRECISION: f64 = 900.0;
const DMS_SECOND_PRECISION: f64 = 15.0;

/// Decimal-degree precision by count of digits after the decimal point.
/// Index d holds 55,500 / 10^d.
const DD_PRECISION: [f64; 13] = [
    55_500.0, 5_550.0, 555.0, 55.5, 5.55, 0.555, 0.0555, 0.005_55, 0.000_555, 0.000_055_5,
    0.000_005_55, 0.000_000_555, 0.000_000_055_5,
];

/// MGRS precision and digit-equivalent, indexed by the whitespace-stripped
/// coordinate length. Resolution improves by 10x every two characters past
/// the grid zone and 100 km square prefix.
const MGRS_PRECISION: [f64; 17] = [
    100_000.0, 100_000.0, 100_000.0, 100_000.0, 100_000.0, 100_000.0, 100_000.0, 10_000.0,
    10_000.0, 1_000.0, 1_000.0, 100.0, 100.0, 10.0, 10.0, 1.0, 1.0,
];
const MGRS_DIGITS: [i32; 17] = [0, 0, 0, 0, 0, 0, 0, 1, 1, 3, 3, 4, 4, 6, 6, 7, 7];

/// Eastings and northings are captured as whole integers; no sub-meter
/// modeling. A documented approximation.
const UTM_PRECISION: f64 = 100.0;

fn count_decimal_digits(text: &str) -> Option<usize> {
    let dot = text.find('.')?;
    Some(text[dot + 1..].chars().filter(|c| c.is_ascii_digit()).count())
}

fn count_digits(text: &str) -> usize {
    text.chars().filter(|c| c.is_ascii_digit()).count()
}

/// Decimal-degree precision from the fractional digit counts of the two
/// ordinate texts. When both carry a decimal point the finer one wins; the
/// pair was written at one nominal precision.
pub fn decimal_degrees(lat_text: Option<&str>, lon_text: Option<&str>) -> PrecisionEstimate {
    let lat_digits = lat_text.and_then(count_decimal_digits);
    let lon_digits = lon_text.and_then(count_decimal_digits);
    let digits = match (lat_digits, lon_digits) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    };
    match digits {
        Some(d) if d < DD_PRECISION.len() => {
            PrecisionEstimate { meters: DD_PRECISION[d], digits: d as i32 }
        }
        Some(d) => PrecisionEstimate { meters: DEFAULT_PRECISION, digits: d as i32 },
        None => PrecisionEstimate { meters: DEFAULT_PRECISION, digits: 0 },
    }
}

/// DMS/DM precision from the latitude text's digit count, corrected for the
/// textual width of the degree field. Falls back to the minutes/seconds
/// presence flags when no latitude text survived normalization.
pub fn degrees_minutes_seconds(
    lat_text: Option<&str>,
    degree_digits: usize,
    has_minutes: bool,
    has_seconds: bool,
) -> PrecisionEstimate {
    if let Some(text) = lat_text {
        let mut dig = count_digits(text) as i32;
        // Degree digits carry no sub-degree significance. A zero-padded
        // "08" still spends two of them.
        dig -= if degree_digits < 2 { 1 } else { 2 };
        if dig >= 4 {
            return PrecisionEstimate { meters: DMS_SECOND_PRECISION, digits: 5 };
        }
        if dig >= 2 {
            return PrecisionEstimate { meters: DMS_MINUTE_PRECISION, digits: 2 };
        }
        return PrecisionEstimate { meters: DEGREE_PRECISION, digits: 0 };
    }
    if has_seconds {
        PrecisionEstimate { meters: DMS_SECOND_PRECISION, digits: 5 }
    } else if has_minutes {
        PrecisionEstimate { meters: DMS_MINUTE_PRECISION, digits: 2 }
    } else {
        PrecisionEstimate { meters: DEGREE_PRECISION, digits: 0 }
    }
}

/// MGRS precision from the whitespace-stripped coordinate length. Lengths
/// past the table (17+) are malformed grids; they get the unknown default.
pub fn mgrs(coord_text: &str) -> PrecisionEstimate {
    let len = coord_text.chars().filter(|c| !c.is_whitespace()).count();
    if len < MGRS_PRECISION.len() {
        PrecisionEstimate { meters: MGRS_PRECISION[len], digits: MGRS_DIGITS[len] }
    } else {
        PrecisionEstimate { meters: DEFAULT_PRECISION, digits: 0 }
    }
}

pub fn utm() -> PrecisionEstimate {
    PrecisionEstimate { meters: UTM_PRECISION, digits: 5 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dd_follows_power_of_ten_table() {
        for d in 0..=12usize {
            let text = format!("42.{}", "1".repeat(d));
            let text = if d == 0 { "42.".to_string() } else { text };
            let est = decimal_degrees(Some(&text), None);
            assert_eq!(est.digits, d as i32);
            let expected = 55_500.0 / 10f64.powi(d as i32);
            assert!((est.meters - expected).abs() / expected < 1e-9, "d={d}");
        }
    }

    #[test]
    fn dd_example_four_fraction_digits() {
        let est = decimal_degrees(Some("42.1234"), None);
        assert_eq!(est.digits, 4);
        assert!((est.meters - 5.55).abs() < 1e-12);
    }

    #[test]
    fn dd_uses_longitude_when_latitude_is_whole() {
        let est = decimal_degrees(Some("42"), Some("-102.44"));
        assert_eq!(est.digits, 2);
        assert!((est.meters - 555.0).abs() < 1e-9);
    }

    #[test]
    fn dd_takes_the_finer_ordinate() {
        let est = decimal_degrees(Some("42.1"), Some("-102.4332"));
        assert_eq!(est.digits, 4);
        assert!((est.meters - 5.55).abs() < 1e-12);
    }

    #[test]
    fn dd_without_decimal_point_is_the_default() {
        let est = decimal_degrees(Some("42"), Some("-102"));
        assert_eq!(est.meters, DEFAULT_PRECISION);
        assert_eq!(est.digits, 0);
    }

    #[test]
    fn dd_past_table_is_the_default() {
        let est = decimal_degrees(Some("42.1111111111111"), None);
        assert_eq!(est.digits, 13);
        assert_eq!(est.meters, DEFAULT_PRECISION);
    }

    #[test]
    fn dms_second_level_from_digit_count() {
        // 34-12-45: six digits, two-digit degrees, four significant.
        let est = degrees_minutes_seconds(Some("34-12-45"), 2, true, true);
        assert_eq!(est.meters, 15.0);
        assert_eq!(est.digits, 5);
    }

    #[test]
    fn dm_minute_level_from_digit_count() {
        let est = degrees_minutes_seconds(Some("34-12"), 2, true, false);
        assert_eq!(est.meters, 900.0);
        assert_eq!(est.digits, 2);
    }

    #[test]
    fn single_digit_degrees_keep_one_more_significant_digit() {
        // 8-09: three digits minus one degree digit leaves two.
        let est = degrees_minutes_seconds(Some("8-09"), 1, true, false);
        assert_eq!(est.meters, 900.0);
    }

    #[test]
    fn zero_padded_degrees_spend_two_digits() {
        // 08-09.5: five digits, two of them the degree field.
        let est = degrees_minutes_seconds(Some("08-09.5"), 2, true, false);
        assert_eq!(est.meters, 900.0);
        // Unpadded, the same value keeps one more significant digit.
        let est = degrees_minutes_seconds(Some("8-09.55"), 1, true, false);
        assert_eq!(est.meters, 15.0);
    }

    #[test]
    fn dms_flag_fallback_without_text() {
        assert_eq!(degrees_minutes_seconds(None, 2, true, true).meters, 15.0);
        assert_eq!(degrees_minutes_seconds(None, 2, true, false).meters, 900.0);
        assert_eq!(degrees_minutes_seconds(None, 2, false, false).meters, 55_500.0);
    }

    #[test]
    fn mgrs_length_brackets() {
        // Full 5+5 grid: 38SMB4611036560 is 15 chars.
        let fine = mgrs("38SMB4611036560");
        assert_eq!(fine.digits, 7);
        assert_eq!(fine.meters, 1.0);

        // 38SMB4636 is 9 chars, a 1 km square.
        let coarse = mgrs("38SMB4636");
        assert_eq!(coarse.digits, 3);
        assert_eq!(coarse.meters, 1_000.0);
        assert!(fine.meters < coarse.meters);
    }

    #[test]
    fn mgrs_ignores_interior_whitespace() {
        assert_eq!(mgrs("38SMB 46110 36560").meters, 1.0);
    }

    #[test]
    fn mgrs_overlong_is_the_default() {
        assert_eq!(mgrs("38SMB461103656099").meters, DEFAULT_PRECISION);
    }

    #[test]
    fn utm_is_fixed() {
        let est = utm();
        assert_eq!(est.meters, 100.0);
        assert_eq!(est.digits, 5);
    }
}
