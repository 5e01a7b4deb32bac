//! The validator's rule-string grammar: `name` or `name:arg1,arg2`.
use std::fmt;

use crate::error::RuleError;

/// A rule split into its name and arguments.
///
/// `name` is kept as written (trimmed) so serialization reproduces the
/// author's spelling; `canonical` is the StudlyCase form used for lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRule {
    pub name: String,
    pub canonical: String,
    pub args: Vec<String>,
}

impl ParsedRule {
    pub fn parse(rule: &str) -> Result<Self, RuleError> {
        let malformed = |reason: &'static str| RuleError::Malformed { rule: rule.to_owned(), reason };
        let rule_text = rule.trim();

        let (name, params) = match rule_text.split_once(':') {
            Some((name, params)) => (name.trim(), Some(params)),
            None => (rule_text, None),
        };
        if name.is_empty() {
            return Err(malformed("missing rule name"));
        }
        let canonical = canonical_name(name);

        let args = match params {
            None => Vec::new(),
            Some("") => return Err(malformed("missing arguments after `:`")),
            // patterns may contain commas
            Some(params) if matches!(name.to_ascii_lowercase().as_str(), "regex" | "not_regex" | "notregex") => {
                vec![params.to_owned()]
            }
            Some(params) => {
                let args = params.split(',').map(str::to_owned).collect::<Vec<_>>();
                if args.iter().any(String::is_empty) {
                    return Err(malformed("empty argument"));
                }
                args
            }
        };

        Ok(Self { name: name.to_owned(), canonical, args })
    }

    /// Array form: the first part is the rule name, the rest are its arguments.
    pub fn from_parts(parts: Vec<String>, rule: &str) -> Result<Self, RuleError> {
        let mut parts = parts.into_iter();
        let name = parts.next().map(|n| n.trim().to_owned()).unwrap_or_default();
        if name.is_empty() {
            return Err(RuleError::Malformed { rule: rule.to_owned(), reason: "missing rule name" });
        }
        Ok(Self { canonical: canonical_name(&name), name, args: parts.collect() })
    }
}

impl fmt::Display for ParsedRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.args.is_empty() {
            write!(f, ":{}", self.args.join(","))?;
        }
        Ok(())
    }
}

/// `required_with` → `RequiredWith`, `lt` → `Lt`, `int` → `Integer`.
pub fn canonical_name(name: &str) -> String {
    let studly = studly(name);
    match studly.as_str() {
        "Int" => "Integer".to_owned(),
        "Bool" => "Boolean".to_owned(),
        _ => studly,
    }
}

fn studly(name: &str) -> String {
    name.split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}
