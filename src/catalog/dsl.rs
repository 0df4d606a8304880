//! Line-oriented parsing of the pattern-definition DSL.
//!
//! Four directives exist, tab/space-delimited:
//!
//! ```text
//! #DEFINE <name> <fragment>        3 fields
//! #RULE   <family> <id> <template> 4 fields
//! #TEST   <family> <id> <text>     4 fields ($NL expands to newline)
//! #CLASS  <family> <handler>       3 fields
//! ```
//!
//! Blank lines and anything not starting with a directive prefix are
//! ignored, so the file can carry free-form commentary. The final field of a
//! directive is the remainder of the line and may itself contain spaces.

use crate::ConfigError;

#[derive(Debug, Clone)]
pub(super) struct RuleDecl {
    pub family_label: String,
    pub id: String,
    pub template: String,
    pub line_no: usize,
}

#[derive(Debug, Clone)]
pub(super) struct TestDecl {
    pub family_label: String,
    pub rule_id: String,
    pub text: String,
}

/// Parsed DSL source, declaration order preserved.
#[derive(Debug, Default)]
pub(super) struct DslFile {
    /// `#DEFINE` name/fragment pairs. Duplicate names overwrite: last wins.
    pub defines: Vec<(String, String)>,
    pub rules: Vec<RuleDecl>,
    pub tests: Vec<TestDecl>,
    /// `#CLASS` family label -> handler name.
    pub classes: Vec<(String, String)>,
}

/// Split a directive line into at most `n` fields on runs of tabs/spaces.
/// The last field is the untruncated remainder, trimmed at both ends.
fn split_fields(line: &str, n: usize) -> Vec<&str> {
    let mut fields = Vec::with_capacity(n);
    let mut rest = line.trim();
    while fields.len() + 1 < n {
        match rest.find([' ', '\t']) {
            Some(at) => {
                fields.push(&rest[..at]);
                rest = rest[at..].trim_start_matches([' ', '\t']);
                if rest.is_empty() {
                    return fields;
                }
            }
            None => {
                fields.push(rest);
                return fields;
            }
        }
    }
    fields.push(rest.trim_end());
    fields
}

pub(super) fn parse(src: &str, load_tests: bool) -> Result<DslFile, ConfigError> {
    let mut out = DslFile::default();
    let mut seen_rule_keys: Vec<String> = Vec::new();

    for (idx, raw) in src.lines().enumerate() {
        let line = raw.trim();

        if line.starts_with("#DEFINE") {
            let fields = split_fields(line, 3);
            if fields.len() != 3 {
                return Err(ConfigError::FieldCount {
                    directive: "DEFINE",
                    expected: 3,
                    line: line.to_string(),
                });
            }
            out.defines.push((fields[1].to_string(), fields[2].to_string()));
        } else if line.starts_with("#RULE") {
            let fields = split_fields(line, 4);
            if fields.len() != 4 {
                return Err(ConfigError::FieldCount {
                    directive: "RULE",
                    expected: 4,
                    line: line.to_string(),
                });
            }
            let key = format!("{}-{}", fields[1], fields[2]);
            if seen_rule_keys.contains(&key) {
                return Err(ConfigError::DuplicateRule { key });
            }
            seen_rule_keys.push(key);
            out.rules.push(RuleDecl {
                family_label: fields[1].to_string(),
                id: fields[2].to_string(),
                template: fields[3].to_string(),
                line_no: idx + 1,
            });
        } else if line.starts_with("#TEST") {
            if !load_tests {
                continue;
            }
            let fields = split_fields(line, 4);
            if fields.len() != 4 {
                return Err(ConfigError::FieldCount {
                    directive: "TEST",
                    expected: 4,
                    line: line.to_string(),
                });
            }
            out.tests.push(TestDecl {
                family_label: fields[1].to_string(),
                rule_id: fields[2].to_string(),
                text: fields[3].replace("$NL", "\n"),
            });
        } else if line.starts_with("#CLASS") {
            let fields = split_fields(line, 3);
            if fields.len() != 3 {
                return Err(ConfigError::FieldCount {
                    directive: "CLASS",
                    expected: 3,
                    line: line.to_string(),
                });
            }
            out.classes.push((fields[1].to_string(), fields[2].to_string()));
        }
        // Anything else is commentary.
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_keeps_remainder_intact() {
        let f = split_fields("#RULE  DD  01  <a>\\s <b>", 4);
        assert_eq!(f, vec!["#RULE", "DD", "01", "<a>\\s <b>"]);
    }

    #[test]
    fn non_directives_are_ignored() {
        let src = "// commentary\n\nplain text\n#DEFINE x \\d+\n";
        let parsed = parse(src, true).unwrap();
        assert_eq!(parsed.defines.len(), 1);
        assert!(parsed.rules.is_empty());
    }

    #[test]
    fn field_count_is_enforced() {
        assert!(matches!(
            parse("#DEFINE onlyname", false),
            Err(ConfigError::FieldCount { directive: "DEFINE", .. })
        ));
        assert!(matches!(
            parse("#RULE DD 01", false),
            Err(ConfigError::FieldCount { directive: "RULE", .. })
        ));
    }

    #[test]
    fn duplicate_rule_key_is_fatal() {
        let src = "#RULE DD 01 a\n#RULE DD 01 b\n";
        assert!(matches!(parse(src, false), Err(ConfigError::DuplicateRule { .. })));
    }

    #[test]
    fn tests_only_loaded_on_request() {
        let src = "#TEST DD 01 42.3N$NL102.4W\n";
        assert!(parse(src, false).unwrap().tests.is_empty());
        let parsed = parse(src, true).unwrap();
        assert_eq!(parsed.tests[0].text, "42.3N\n102.4W");
    }
}
