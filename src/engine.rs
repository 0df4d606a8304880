//! The scan loop: compiled rules applied to a text buffer.
//!
//! ```text
//! text ──▶ scanner::scan
//!            │  per enabled rule, declaration order:
//!            │    captures ─▶ context filter ─▶ RawMatch
//!            │               ─▶ normalize ─▶ validate
//!            ▼
//!        reduce::flag_reductions (duplicates / submatches / overlaps)
//!            │
//!            ▼
//!        Vec<GeocoordMatch>
//! ```
//!
//! Scanning borrows the catalog immutably; enable/disable toggles need
//! `&mut Catalog`, so the borrow checker keeps them out of concurrent scans.

#[path = "engine/reduce.rs"]
mod reduce;
#[path = "engine/scanner.rs"]
mod scanner;

pub(crate) use scanner::scan;
