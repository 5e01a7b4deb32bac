//! Rewrites field references inside rules into paths relative to a prefix.
//!
//! Rules are authored as if their field were top-level (`gt:start`). Once the
//! field sits under `contract`, the validator needs `gt:contract.start`. Which
//! arguments are field references depends only on the rule name, looked up in
//! the fixed tables below.
use super::date::DateRecognizer;
use super::parse::ParsedRule;
use crate::error::RuleError;

// ------------------------------- Tables ---------------------------------- //

/// Rewrites the listed positions of another rule's arguments:
/// `WithReference:<rule>,<i_j_..>,<args..>`.
pub const BACK_REFERENCE: &str = "WithReference";

/// The first argument names another field.
pub const FIRST_ARG_REFERENCE: &[&str] = &[
    "Different",
    "Gt",
    "Gte",
    "Lt",
    "Lte",
    "ProhibitedIf",
    "ProhibitedUnless",
    "RequiredIf",
    "RequiredUnless",
    "Same",
];

/// Every argument names another field.
pub const ALL_ARGS_REFERENCE: &[&str] = &[
    "Prohibits",
    "RequiredWith",
    "RequiredWithAll",
    "RequiredWithout",
    "RequiredWithoutAll",
];

/// The first argument is either a date literal or another field.
pub const DATE_OR_REFERENCE: &[&str] = &["After", "AfterOrEqual", "Before", "BeforeOrEqual"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Strategy {
    FirstArg,
    AllArgs,
    DateOrField,
    Untouched,
}

fn strategy(canonical: &str) -> Strategy {
    if FIRST_ARG_REFERENCE.contains(&canonical) {
        Strategy::FirstArg
    } else if ALL_ARGS_REFERENCE.contains(&canonical) {
        Strategy::AllArgs
    } else if DATE_OR_REFERENCE.contains(&canonical) {
        Strategy::DateOrField
    } else {
        Strategy::Untouched
    }
}

// ------------------------------ Rewriting --------------------------------- //

/// Qualify every rule in `rules` under `prefix`, keeping positions.
///
/// Without a prefix (or with an empty one) the rules come back unchanged.
pub fn qualify_rules(
    rules: Vec<String>,
    prefix: Option<&str>,
    dates: &dyn DateRecognizer,
) -> Result<Vec<String>, RuleError> {
    let Some(prefix) = prefix.filter(|p| !p.is_empty()) else {
        return Ok(rules);
    };
    rules.into_iter()
        .map(|rule| qualify_rule(&rule, prefix, dates))
        .collect()
}

/// Qualify a single rule string under a non-empty `prefix`.
pub fn qualify_rule(rule: &str, prefix: &str, dates: &dyn DateRecognizer) -> Result<String, RuleError> {
    let mut parsed = ParsedRule::parse(rule)?;

    if parsed.canonical == BACK_REFERENCE {
        parsed = expand_back_reference(parsed.args, prefix, rule)?;
    }

    // produced by an enclosing rewrite already
    if let Some(first) = parsed.args.first() {
        if is_qualified(first, prefix) {
            return Ok(rule.to_owned());
        }
    }

    match strategy(&parsed.canonical) {
        Strategy::FirstArg => {
            if let Some(first) = parsed.args.first_mut() {
                *first = join(prefix, first);
            }
        }
        Strategy::AllArgs => {
            for arg in &mut parsed.args {
                *arg = join(prefix, arg);
            }
        }
        Strategy::DateOrField => {
            if let Some(first) = parsed.args.first_mut() {
                if !dates.is_date(first) {
                    *first = join(prefix, first);
                }
            }
        }
        Strategy::Untouched => {}
    }

    let qualified = parsed.to_string();
    tracing::trace!(rule, %qualified, prefix, "qualified rule");
    Ok(qualified)
}

/// `args` is `[target_rule, positions, target_args..]`; positions are
/// `_`-separated zero-based indices into `target_args`.
fn expand_back_reference(mut args: Vec<String>, prefix: &str, rule: &str) -> Result<ParsedRule, RuleError> {
    let bad = |reason: String| RuleError::BackReference { rule: rule.to_owned(), reason };

    if args.len() < 2 {
        return Err(bad("expected a rule name and argument positions".to_owned()));
    }
    let positions = args.remove(1);

    for position in positions.split('_') {
        let index = position
            .trim()
            .parse::<usize>()
            .map_err(|_| bad(format!("position `{position}` is not a number")))?;
        // slot 0 holds the target rule name
        let slot = index + 1;
        match args.get_mut(slot) {
            Some(arg) => *arg = join(prefix, arg),
            None => return Err(bad(format!("position {index} is out of range"))),
        }
    }

    ParsedRule::from_parts(args, rule)
}

/// True for `<base>.*.rest` (where `base` is the first segment of `prefix`)
/// and for paths starting with a numeric segment (`0.rest`).
fn is_qualified(arg: &str, prefix: &str) -> bool {
    let base = prefix.split('.').next().unwrap_or(prefix);
    let wildcard = arg
        .strip_prefix(base)
        .is_some_and(|rest| rest.starts_with(".*."));

    let digits = arg.bytes().take_while(u8::is_ascii_digit).count();
    let numeric = digits > 0 && arg.as_bytes().get(digits) == Some(&b'.');

    wildcard || numeric
}

fn join(prefix: &str, field: &str) -> String {
    format!("{prefix}.{field}")
}

// ------------------------------- Tests ------------------------------------ //
