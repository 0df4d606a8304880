//! Grid-to-geodetic resolution: MGRS 100 km square arithmetic and the
//! inverse transverse-Mercator projection on the WGS84 ellipsoid.
//!
//! The normalizers own format bookkeeping; everything that is actually
//! projection mathematics lives behind [`GridGeodesy`] so tests can swap in
//! a stub.

use crate::NormalizeError;

/// Latitude bands, south to north, I and O excluded.
pub const BANDS: &str = "CDEFGHJKLMNPQRSTUVWX";

/// 100 km row letters cycle through this 20-letter alphabet.
const ROW_LETTERS: &str = "ABCDEFGHJKLMNPQRSTUV";

/// Column letter sets, selected by `(zone - 1) % 3`.
const COLUMN_SETS: [&str; 3] = ["ABCDEFGH", "JKLMNPQR", "STUVWXYZ"];

/// Minimum UTM northing of each latitude band, in band order. Southern
/// bands include the 10,000,000 m false northing.
const BAND_MIN_NORTHING: [f64; 20] = [
    1_100_000.0, // C
    2_000_000.0, // D
    2_800_000.0, // E
    3_700_000.0, // F
    4_600_000.0, // G
    5_500_000.0, // H
    6_400_000.0, // J
    7_300_000.0, // K
    8_200_000.0, // L
    9_100_000.0, // M
    0.0,         // N
    800_000.0,   // P
    1_700_000.0, // Q
    2_600_000.0, // R
    3_500_000.0, // S
    4_400_000.0, // T
    5_300_000.0, // U
    6_200_000.0, // V
    7_000_000.0, // W
    7_900_000.0, // X
];

/// Projection seam between the grid normalizers and the ellipsoid math.
pub trait GridGeodesy {
    /// Resolve a UTM position to signed decimal degrees.
    fn utm_to_geodetic(
        &self,
        zone: u8,
        north: bool,
        easting: f64,
        northing: f64,
    ) -> Result<(f64, f64), NormalizeError>;

    /// Resolve an MGRS reference (zone, band letter, 100 km square letters,
    /// offsets within the square in meters) to signed decimal degrees.
    fn mgrs_to_geodetic(
        &self,
        zone: u8,
        band: char,
        square: &str,
        easting: f64,
        northing: f64,
    ) -> Result<(f64, f64), NormalizeError>;
}

/// The WGS84 ellipsoid.
#[derive(Debug, Clone, Copy, Default)]
pub struct Wgs84;

const A: f64 = 6_378_137.0;
const F: f64 = 1.0 / 298.257_223_563;
const K0: f64 = 0.9996;
const FALSE_EASTING: f64 = 500_000.0;
const FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

fn bad(msg: String) -> NormalizeError {
    NormalizeError::Geodesy(msg)
}

impl GridGeodesy for Wgs84 {
    fn utm_to_geodetic(
        &self,
        zone: u8,
        north: bool,
        easting: f64,
        northing: f64,
    ) -> Result<(f64, f64), NormalizeError> {
        if !(1..=60).contains(&zone) {
            return Err(bad(format!("UTM zone {zone} out of range")));
        }

        let e2 = F * (2.0 - F);
        let ep2 = e2 / (1.0 - e2);
        let e1 = (1.0 - (1.0 - e2).sqrt()) / (1.0 + (1.0 - e2).sqrt());

        let x = easting - FALSE_EASTING;
        let mut y = northing;
        if !north {
            y -= FALSE_NORTHING_SOUTH;
        }

        // Footpoint latitude from the meridional arc (Snyder 1987, eq. 3-26).
        let m = y / K0;
        let mu = m
            / (A * (1.0 - e2 / 4.0 - 3.0 * e2 * e2 / 64.0 - 5.0 * e2 * e2 * e2 / 256.0));
        let phi1 = mu
            + (3.0 * e1 / 2.0 - 27.0 * e1.powi(3) / 32.0) * (2.0 * mu).sin()
            + (21.0 * e1 * e1 / 16.0 - 55.0 * e1.powi(4) / 32.0) * (4.0 * mu).sin()
            + (151.0 * e1.powi(3) / 96.0) * (6.0 * mu).sin()
            + (1097.0 * e1.powi(4) / 512.0) * (8.0 * mu).sin();

        let sin1 = phi1.sin();
        let cos1 = phi1.cos();
        let tan1 = phi1.tan();
        let c1 = ep2 * cos1 * cos1;
        let t1 = tan1 * tan1;
        let n1 = A / (1.0 - e2 * sin1 * sin1).sqrt();
        let r1 = A * (1.0 - e2) / (1.0 - e2 * sin1 * sin1).powf(1.5);
        let d = x / (n1 * K0);

        let lat = phi1
            - (n1 * tan1 / r1)
                * (d * d / 2.0
                    - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * ep2) * d.powi(4) / 24.0
                    + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1
                        - 252.0 * ep2
                        - 3.0 * c1 * c1)
                        * d.powi(6)
                        / 720.0);
        let dlon = (d - (1.0 + 2.0 * t1 + c1) * d.powi(3) / 6.0
            + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * ep2 + 24.0 * t1 * t1)
                * d.powi(5)
                / 120.0)
            / cos1;

        let lon0 = f64::from(zone - 1) * 6.0 - 180.0 + 3.0;
        Ok((lat.to_degrees(), lon0 + dlon.to_degrees()))
    }

    fn mgrs_to_geodetic(
        &self,
        zone: u8,
        band: char,
        square: &str,
        easting: f64,
        northing: f64,
    ) -> Result<(f64, f64), NormalizeError> {
        if !(1..=60).contains(&zone) {
            return Err(bad(format!("MGRS zone {zone} out of range")));
        }
        let band = band.to_ascii_uppercase();
        let band_idx =
            BANDS.find(band).ok_or_else(|| bad(format!("bad latitude band {band:?}")))?;

        let mut squares = square.chars().map(|c| c.to_ascii_uppercase());
        let (col, row) = match (squares.next(), squares.next()) {
            (Some(c), Some(r)) => (c, r),
            _ => return Err(bad(format!("bad 100km square {square:?}"))),
        };

        let col_set = COLUMN_SETS[usize::from(zone - 1) % 3];
        let col_idx =
            col_set.find(col).ok_or_else(|| bad(format!("bad column letter {col:?}")))?;
        let e100k = (col_idx as f64 + 1.0) * 100_000.0;

        let row_idx =
            ROW_LETTERS.find(row).ok_or_else(|| bad(format!("bad row letter {row:?}")))?;
        // Even zones shift the row cycle by five letters.
        let shift = if zone % 2 == 0 { 5 } else { 0 };
        let n100k = f64::from((row_idx as i32 - shift).rem_euclid(20)) * 100_000.0;

        // The row cycle repeats every 2,000 km; the band pins which cycle.
        let mut full_northing = n100k + northing;
        let min = BAND_MIN_NORTHING[band_idx];
        while full_northing < min {
            full_northing += 2_000_000.0;
        }

        let north = band >= 'N';
        self.utm_to_geodetic(zone, north, e100k + easting, full_northing)
    }
}
