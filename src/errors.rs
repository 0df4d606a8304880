//! Error taxonomy.
//!
//! Two failure classes exist, with deliberately different blast radii:
//!
//! - [`ConfigError`]: any defect in the pattern DSL. Always fatal to
//!   compilation — a half-built catalog with misaligned group identities is
//!   unsafe to scan with, so no catalog is produced on error.
//! - [`NormalizeError`]: one raw match had a field that could not be parsed
//!   into the expected numeric/textual form. Caught per match; the match is
//!   dropped and the scan continues.
//!
//! Matches that are structurally valid but fail a validation heuristic are
//! not errors at all: they are retained with `filtered_out = true`.

use thiserror::Error;

use crate::Family;

/// Fatal pattern-DSL configuration error. Compilation is all-or-nothing.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{directive} entry must have {expected} fields for LINE: {line}")]
    FieldCount { directive: &'static str, expected: usize, line: String },

    #[error("duplicate rule key {key}")]
    DuplicateRule { key: String },

    #[error("unknown pattern family {family:?} for LINE: {line}")]
    UnknownFamily { family: String, line: String },

    #[error("unknown normalizer handler {name:?} for family {family}")]
    UnknownHandler { name: String, family: String },

    #[error("rule {key}: bad pattern: {source}")]
    BadPattern {
        key: String,
        #[source]
        source: regex::Error,
    },

    #[error(
        "rule {key}: compiled group count {compiled} does not match {declared} declared \
         placeholders (fragments must not contain capturing groups)"
    )]
    GroupCountMismatch { key: String, declared: usize, compiled: usize },

    #[error("rule {key}: unresolved placeholder {placeholder:?} (undefined or nested DEFINE)")]
    UnresolvedPlaceholder { key: String, placeholder: String },

    #[error("rule {key} rejected by catalog policy: {reason}")]
    RejectedByPolicy { key: String, reason: String },
}

/// Per-match normalization failure. Drops one match, never the scan.
#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("unable to parse {ordinate} fields of {family} match {text:?}")]
    UnparsedOrdinate { family: Family, ordinate: &'static str, text: String },

    #[error("bad numeric field {field}={value:?}")]
    BadNumber { field: &'static str, value: String },

    #[error("not a valid {family} coordinate: {text:?}")]
    Unparseable { family: Family, text: String },

    #[error("{0}")]
    Geodesy(String),

    /// Raised when a check that needs match-relative offsets runs before the
    /// offsets were computed. Indicates a call-order defect, not bad input.
    #[error("offsets not set before {check} check")]
    OffsetsNotSet { check: &'static str },
}
