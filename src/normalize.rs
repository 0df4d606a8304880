//! Per-family normalization: raw group values in, signed decimal degrees
//! and family metadata out.
//!
//! ```text
//! RawMatch ──▶ handler dispatch (rule's #CLASS binding)
//!                │
//!                ├── degree-fields ──▶ ordinate digestion (DD / DM / DMS)
//!                ├── military-grid ──▶ MGRS parse + geodesy
//!                └── utm-grid ───────▶ UTM parse + geodesy
//!                                          │
//!                                          ▼
//!                                   GeocoordMatch ──▶ filters::validate
//! ```
//!
//! A [`NormalizeError`] here drops one match; the scan continues.

#[path = "normalize/filters.rs"]
pub(crate) mod filters;
#[path = "normalize/mgrs.rs"]
mod mgrs;
#[path = "normalize/ordinate.rs"]
mod ordinate;
#[path = "normalize/utm.rs"]
mod utm;

use crate::api::MatchFlags;
use crate::catalog::{HandlerKind, Rule};
use crate::geocoding::GeocoordMatch;
use crate::geodesy::GridGeodesy;
use crate::{NormalizeError, RawMatch};

/// Finest field resolution seen in one ordinate, coarse to fine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Resolution {
    Degree,
    SubDegree,
    Minute,
    SubMinute,
    Second,
    SubSecond,
}

pub(crate) fn normalize(
    rule: &Rule,
    raw: &RawMatch,
    geodesy: &dyn GridGeodesy,
    flags: MatchFlags,
) -> Result<GeocoordMatch, NormalizeError> {
    match rule.handler {
        HandlerKind::DegreeFields => ordinate::normalize_degrees(rule.family, &rule.key, raw),
        HandlerKind::MilitaryGrid => {
            mgrs::normalize(&rule.key, raw, geodesy, flags.contains(MatchFlags::MGRS_STRICT))
        }
        HandlerKind::UtmGrid => utm::normalize(&rule.key, raw, geodesy),
    }
}
