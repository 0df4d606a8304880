//! Pattern catalog: DSL parsing and rule compilation.
//!
//! The catalog is the *static* side of the engine: it turns an external,
//! human-editable pattern-definition file into compiled, executable matching
//! rules. Scanning (the dynamic side) lives in `crate::engine`.
//!
//! ## How the parts work together
//!
//! ```text
//! DSL source ── dsl::parse ──▶ directives (#DEFINE / #RULE / #TEST / #CLASS)
//!                                   │
//!                                   ▼
//!                        compile::Catalog::compile
//!                          - placeholder scan (group-identity tracking)
//!                          - textual substitution, one capture group each
//!                          - case-insensitive compile
//!                          - capture-count invariant check
//!                          - handler resolution + policy hooks
//!                                   │
//!                                   ▼
//!                               Catalog
//! ```
//!
//! The matching primitive offers no named captures, so each rule records its
//! placeholder names in order of appearance; at scan time the i-th capture
//! group (1-based) is paired with `group_names[i-1]`. That pairing is
//! established exactly once here and never changes.
//!
//! Compilation is all-or-nothing: any malformed line, duplicate rule key,
//! unresolved handler, or capture-count mismatch aborts with a
//! [`crate::ConfigError`] and no catalog is produced.

#[path = "catalog/compile.rs"]
mod compile;
#[path = "catalog/dsl.rs"]
mod dsl;

pub use compile::{
    Catalog, CatalogPolicy, CompileOptions, DefaultPolicy, HandlerKind, PlaceholderDefinition,
    Rule, TestFixture,
};
