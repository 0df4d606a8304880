//! Rule compilation and group-identity tracking.

use std::collections::HashMap;

use regex::{Captures, Regex, RegexBuilder};
use tracing::debug;

use super::dsl;
use crate::{ConfigError, Family, GroupMap, GroupSpan};

/// A named reusable pattern fragment (`#DEFINE`). Fragments must not contain
/// capturing groups of their own; use `(?:...)` inside a fragment.
#[derive(Debug, Clone)]
pub struct PlaceholderDefinition {
    pub name: String,
    pub fragment: String,
}

/// A truth-marked sample text (`#TEST`) attached to one rule.
#[derive(Debug, Clone)]
pub struct TestFixture {
    /// Rule key plus a running per-rule counter, e.g. `DD-01#2`.
    pub id: String,
    pub family: Family,
    pub rule_key: String,
    pub text: String,
    /// False when the sample text declares itself a negative case by
    /// containing the word "fail".
    pub true_positive: bool,
}

/// Which normalizer digests matches of a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerKind {
    /// Degree/minute/second field assembly (DD, DM, DMS).
    DegreeFields,
    /// MGRS grid reference parsing.
    MilitaryGrid,
    /// UTM zone/easting/northing parsing.
    UtmGrid,
}

impl HandlerKind {
    fn from_name(name: &str) -> Option<HandlerKind> {
        match name {
            "degree-fields" => Some(HandlerKind::DegreeFields),
            "military-grid" => Some(HandlerKind::MilitaryGrid),
            "utm-grid" => Some(HandlerKind::UtmGrid),
            _ => None,
        }
    }

    fn default_for(family: Family) -> HandlerKind {
        match family {
            Family::Dd | Family::Dm | Family::Dms => HandlerKind::DegreeFields,
            Family::Mgrs => HandlerKind::MilitaryGrid,
            Family::Utm => HandlerKind::UtmGrid,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            HandlerKind::DegreeFields => "degree-fields",
            HandlerKind::MilitaryGrid => "military-grid",
            HandlerKind::UtmGrid => "utm-grid",
        }
    }
}

/// One compiled matching rule.
#[derive(Debug, Clone)]
pub struct Rule {
    pub family: Family,
    pub id: String,
    /// `<FAMILY>-<id>`, unique across the catalog.
    pub key: String,
    /// Free-text note. The DSL carries no description column, so every rule
    /// starts with the same placeholder text.
    pub description: String,
    /// The raw template before placeholder substitution, kept for diagnostics.
    pub template: String,
    pub pattern: Regex,
    /// Placeholder names in order of appearance in the template. The i-th
    /// name (0-based) corresponds to capture group i+1.
    pub group_names: Vec<String>,
    pub enabled: bool,
    pub handler: HandlerKind,
}

impl Rule {
    /// Pair named fields with the capture groups of one match. Spans are
    /// absolute byte offsets within the scanned buffer. Groups that did not
    /// participate in the match are absent from the map.
    pub fn group_map(&self, caps: &Captures<'_>) -> GroupMap {
        let mut map = GroupMap::with_capacity(self.group_names.len());
        for (i, name) in self.group_names.iter().enumerate() {
            if let Some(m) = caps.get(i + 1) {
                map.insert(
                    name.clone(),
                    GroupSpan { text: m.as_str().to_string(), start: m.start(), end: m.end() },
                );
            }
        }
        map
    }
}

/// Hooks invoked during compilation. The default accepts every rule and
/// enables every family.
pub trait CatalogPolicy {
    /// Veto a rule before it is compiled. Returning `Err(reason)` aborts
    /// compilation with [`ConfigError::RejectedByPolicy`].
    fn accept(&self, _family: Family, _id: &str, _template: &str) -> Result<(), String> {
        Ok(())
    }

    /// Initial enabled state for rules of a family.
    fn enabled_by_default(&self, _family: Family) -> bool {
        true
    }
}

/// The permissive policy: everything accepted, everything enabled.
#[derive(Debug, Default)]
pub struct DefaultPolicy;

impl CatalogPolicy for DefaultPolicy {}

/// Compilation switches.
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// Parse and retain `#TEST` fixtures. Off for production scanning, on
    /// when exercising the catalog's own samples.
    pub load_fixtures: bool,
}

/// The compiled rule set plus its supporting tables. Rules keep the order
/// they were declared in; the scanner honors that order.
#[derive(Debug)]
pub struct Catalog {
    rules: Vec<Rule>,
    defines: Vec<PlaceholderDefinition>,
    fixtures: Vec<TestFixture>,
}

impl Catalog {
    /// Compile with default options and policy.
    pub fn from_source(src: &str) -> Result<Catalog, ConfigError> {
        Catalog::compile(src, &CompileOptions::default(), &DefaultPolicy)
    }

    /// Compile a DSL source into an executable catalog. All-or-nothing: any
    /// defect aborts and no catalog is produced.
    pub fn compile(
        src: &str,
        options: &CompileOptions,
        policy: &dyn CatalogPolicy,
    ) -> Result<Catalog, ConfigError> {
        let parsed = dsl::parse(src, options.load_fixtures)?;

        // Later #DEFINEs shadow earlier ones of the same name.
        let mut fragments: HashMap<&str, &str> = HashMap::new();
        for (name, fragment) in &parsed.defines {
            fragments.insert(name.as_str(), fragment.as_str());
        }

        let mut handlers: HashMap<Family, HandlerKind> = HashMap::new();
        for (family_label, handler_name) in &parsed.classes {
            let family = Family::from_label(family_label).ok_or_else(|| {
                ConfigError::UnknownFamily {
                    family: family_label.clone(),
                    line: format!("#CLASS {family_label} {handler_name}"),
                }
            })?;
            let kind =
                HandlerKind::from_name(handler_name).ok_or_else(|| ConfigError::UnknownHandler {
                    name: handler_name.clone(),
                    family: family.label().to_string(),
                })?;
            handlers.insert(family, kind);
        }

        let mut rules = Vec::with_capacity(parsed.rules.len());
        for decl in &parsed.rules {
            let family = Family::from_label(&decl.family_label).ok_or_else(|| {
                ConfigError::UnknownFamily {
                    family: decl.family_label.clone(),
                    line: format!("line {}: {}", decl.line_no, decl.template),
                }
            })?;
            let key = format!("{}-{}", family.label(), decl.id);

            policy
                .accept(family, &decl.id, &decl.template)
                .map_err(|reason| ConfigError::RejectedByPolicy { key: key.clone(), reason })?;

            let (pattern_src, group_names) =
                substitute(&key, &decl.template, &fragments)?;

            let pattern = RegexBuilder::new(&pattern_src)
                .case_insensitive(true)
                .build()
                .map_err(|source| ConfigError::BadPattern { key: key.clone(), source })?;

            // Every capture group must be accounted for by a placeholder,
            // otherwise name/ordinal pairing drifts silently.
            let compiled = pattern.captures_len() - 1;
            if compiled != group_names.len() {
                return Err(ConfigError::GroupCountMismatch {
                    key,
                    declared: group_names.len(),
                    compiled,
                });
            }

            debug!(rule = %key, groups = group_names.len(), "compiled rule");
            rules.push(Rule {
                family,
                id: decl.id.clone(),
                key,
                description: "No description yet".to_string(),
                template: decl.template.clone(),
                pattern,
                group_names,
                enabled: policy.enabled_by_default(family),
                handler: handlers.get(&family).copied().unwrap_or_else(|| {
                    HandlerKind::default_for(family)
                }),
            });
        }

        let mut fixtures = Vec::with_capacity(parsed.tests.len());
        let mut per_rule: HashMap<String, usize> = HashMap::new();
        for t in &parsed.tests {
            let family = Family::from_label(&t.family_label).ok_or_else(|| {
                ConfigError::UnknownFamily {
                    family: t.family_label.clone(),
                    line: format!("#TEST {} {}", t.family_label, t.rule_id),
                }
            })?;
            let rule_key = format!("{}-{}", family.label(), t.rule_id);
            let n = per_rule.entry(rule_key.clone()).or_insert(0);
            *n += 1;
            fixtures.push(TestFixture {
                id: format!("{rule_key}#{n}"),
                family,
                rule_key,
                text: t.text.clone(),
                true_positive: !t.text.to_lowercase().contains("fail"),
            });
        }

        let defines = parsed
            .defines
            .iter()
            .map(|(name, fragment)| PlaceholderDefinition {
                name: name.clone(),
                fragment: fragment.clone(),
            })
            .collect();

        Ok(Catalog { rules, defines, fixtures })
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn rule(&self, key: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.key == key)
    }

    pub fn defines(&self) -> &[PlaceholderDefinition] {
        &self.defines
    }

    pub fn fixtures(&self) -> &[TestFixture] {
        &self.fixtures
    }

    /// Enable or disable every rule of one family. Idempotent.
    pub fn set_family_enabled(&mut self, family: Family, enabled: bool) {
        for rule in &mut self.rules {
            if rule.family == family {
                rule.enabled = enabled;
            }
        }
    }

    /// Enable or disable a single rule by key. Returns false if no such
    /// rule exists.
    pub fn set_rule_enabled(&mut self, key: &str, enabled: bool) -> bool {
        match self.rules.iter_mut().find(|r| r.key == key) {
            Some(rule) => {
                rule.enabled = enabled;
                true
            }
            None => false,
        }
    }

    pub fn enable_all(&mut self) {
        for rule in &mut self.rules {
            rule.enabled = true;
        }
    }

    pub fn disable_all(&mut self) {
        for rule in &mut self.rules {
            rule.enabled = false;
        }
    }
}

/// Replace each `<name>` placeholder with `(` fragment `)` and record the
/// names in order of appearance. Nested or undefined placeholders survive
/// substitution and are reported as unresolved.
fn substitute(
    key: &str,
    template: &str,
    fragments: &HashMap<&str, &str>,
) -> Result<(String, Vec<String>), ConfigError> {
    let placeholder = regex!("<[A-Za-z0-9_]+>");

    let mut group_names = Vec::new();
    let mut out = String::with_capacity(template.len());
    let mut cursor = 0;
    for m in placeholder.find_iter(template) {
        let name = &template[m.start() + 1..m.end() - 1];
        let fragment = fragments.get(name).ok_or_else(|| ConfigError::UnresolvedPlaceholder {
            key: key.to_string(),
            placeholder: name.to_string(),
        })?;
        out.push_str(&template[cursor..m.start()]);
        out.push('(');
        out.push_str(fragment);
        out.push(')');
        cursor = m.end();
        group_names.push(name.to_string());
    }
    out.push_str(&template[cursor..]);

    // A fragment that itself contains `<x>` leaves it behind here; one level
    // of substitution is all the DSL promises.
    if let Some(left) = placeholder.find(&out) {
        return Err(ConfigError::UnresolvedPlaceholder {
            key: key.to_string(),
            placeholder: left.as_str().trim_matches(['<', '>']).to_string(),
        });
    }

    Ok((out, group_names))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SRC: &str = "\
#DEFINE a \\d{2}
#DEFINE b [NS]
#DEFINE c \\d{1,3}
#RULE DD 01 <a><b><c>
#TEST DD 01 42N102
#TEST DD 01 bogus, should FAIL
";

    #[test]
    fn group_names_follow_order_of_appearance() {
        let cat = Catalog::from_source(SRC).unwrap();
        let rule = cat.rule("DD-01").unwrap();
        assert_eq!(rule.group_names, vec!["a", "b", "c"]);
        assert_eq!(rule.pattern.captures_len() - 1, 3);
        assert_eq!(rule.description, "No description yet");

        let caps = rule.pattern.captures("42N102").unwrap();
        let map = rule.group_map(&caps);
        assert_eq!(map["a"].text, "42");
        assert_eq!(map["b"].text, "N");
        assert_eq!(map["c"].text, "102");
        assert_eq!(map["c"].start, 3);
        assert_eq!(map["c"].end, 6);
    }

    #[test]
    fn repeated_placeholder_keeps_two_ordinals() {
        // A placeholder used twice occupies two ordinals under one name;
        // capture counts still line up, and the group map keeps whichever
        // occurrence participated in the match.
        let src = "#DEFINE a \\d\n#RULE DD 01 <a>-<a>\n";
        let cat = Catalog::from_source(src).unwrap();
        let rule = cat.rule("DD-01").unwrap();
        assert_eq!(rule.group_names.len(), 2);
    }

    #[test]
    fn undefined_placeholder_is_fatal() {
        let src = "#RULE DD 01 <nosuch>\n";
        assert!(matches!(
            Catalog::from_source(src),
            Err(ConfigError::UnresolvedPlaceholder { .. })
        ));
    }

    #[test]
    fn nested_placeholder_is_fatal() {
        let src = "#DEFINE outer x<inner>y\n#RULE DD 01 <outer>\n";
        assert!(matches!(
            Catalog::from_source(src),
            Err(ConfigError::UnresolvedPlaceholder { .. })
        ));
    }

    #[test]
    fn capturing_group_in_fragment_breaks_alignment() {
        let src = "#DEFINE a (\\d)\\d\n#RULE DD 01 <a>\n";
        assert!(matches!(
            Catalog::from_source(src),
            Err(ConfigError::GroupCountMismatch { declared: 1, compiled: 2, .. })
        ));
    }

    #[test]
    fn noncapturing_groups_in_fragment_are_fine() {
        let src = "#DEFINE a (?:\\d|x)+\n#RULE DD 01 <a>\n";
        let cat = Catalog::from_source(src).unwrap();
        assert_eq!(cat.rule("DD-01").unwrap().group_names, vec!["a"]);
    }

    #[test]
    fn later_define_shadows_earlier() {
        let src = "#DEFINE a x\n#DEFINE a y\n#RULE DD 01 <a>\n";
        let cat = Catalog::from_source(src).unwrap();
        assert!(cat.rule("DD-01").unwrap().pattern.is_match("y"));
        assert!(!cat.rule("DD-01").unwrap().pattern.is_match("x"));
    }

    #[test]
    fn matching_is_case_insensitive() {
        let src = "#DEFINE h [NS]\n#RULE DD 01 <h>\\d+\n";
        let cat = Catalog::from_source(src).unwrap();
        assert!(cat.rule("DD-01").unwrap().pattern.is_match("n42"));
    }

    #[test]
    fn fixtures_carry_truth_marking_and_running_ids() {
        let opts = CompileOptions { load_fixtures: true };
        let cat = Catalog::compile(SRC, &opts, &DefaultPolicy).unwrap();
        let fx = cat.fixtures();
        assert_eq!(fx.len(), 2);
        assert_eq!(fx[0].id, "DD-01#1");
        assert!(fx[0].true_positive);
        assert_eq!(fx[1].id, "DD-01#2");
        assert!(!fx[1].true_positive);
    }

    #[test]
    fn fixtures_skipped_by_default() {
        let cat = Catalog::from_source(SRC).unwrap();
        assert!(cat.fixtures().is_empty());
    }

    #[test]
    fn toggles_are_idempotent() {
        let mut cat = Catalog::from_source(SRC).unwrap();
        cat.set_family_enabled(Family::Dd, false);
        cat.set_family_enabled(Family::Dd, false);
        assert!(!cat.rule("DD-01").unwrap().enabled);
        cat.enable_all();
        cat.enable_all();
        assert!(cat.rule("DD-01").unwrap().enabled);
        assert!(!cat.set_rule_enabled("DD-99", false));
    }

    #[test]
    fn policy_can_reject_rules() {
        struct NoDd;
        impl CatalogPolicy for NoDd {
            fn accept(&self, family: Family, _: &str, _: &str) -> Result<(), String> {
                if family == Family::Dd {
                    return Err("decimal degrees disabled".to_string());
                }
                Ok(())
            }
        }
        assert!(matches!(
            Catalog::compile(SRC, &CompileOptions::default(), &NoDd),
            Err(ConfigError::RejectedByPolicy { .. })
        ));
    }
}
