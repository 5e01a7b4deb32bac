use serde_json::Value;

use super::qualify::qualify_rules;
use super::walk::Walker;
use crate::error::RuleError;
use crate::schema::{RuleSpec, RuleValue};

impl Walker<'_> {
    /// Turn a field's declared rules into what the validator receives at `key`.
    ///
    /// Computed rules see the local values and the whole request, and their
    /// output is used verbatim. Declarative rules are qualified under `prefix`.
    pub(super) fn resolve(
        &self,
        spec: &RuleSpec,
        key: &str,
        prefix: Option<&str>,
        values: &Value,
    ) -> Result<RuleValue, RuleError> {
        let rules = match spec {
            RuleSpec::Computed(compute) => {
                return (**compute)(values, self.request)
                    .map_err(|source| RuleError::Computed { key: key.to_owned(), source });
            }
            RuleSpec::Single(rule) => vec![rule.clone()],
            RuleSpec::List(rules) => rules.clone(),
        };
        let rules = qualify_rules(rules, prefix, &*self.config.dates)?;
        Ok(RuleValue::List(rules))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::rules::RulesConfig;

    fn walker<'a>(request: &'a Value, config: &'a RulesConfig) -> Walker<'a> {
        Walker::new(request, config)
    }

    #[test]
    fn single_rule_becomes_a_qualified_list() {
        let request = json!({});
        let config = RulesConfig::default();
        let out = walker(&request, &config)
            .resolve(&RuleSpec::from("gt:start"), "c.end", Some("c"), &json!({}))
            .unwrap();
        assert_eq!(out, RuleValue::List(vec!["gt:c.start".into()]));
    }

    #[test]
    fn list_passes_through_without_prefix() {
        let request = json!({});
        let config = RulesConfig::default();
        let spec = RuleSpec::from(["required", "gt:start"]);
        let out = walker(&request, &config).resolve(&spec, "end", None, &request).unwrap();
        assert_eq!(out, RuleValue::List(vec!["required".into(), "gt:start".into()]));
    }

    #[test]
    fn computed_rules_see_local_and_full_values_and_are_not_rewritten() {
        let request = json!({ "mode": "strict", "c": { "start": 1 } });
        let config = RulesConfig::default();
        let spec = RuleSpec::computed(|local, full| {
            let start = local["start"].as_i64().unwrap_or_default();
            let mode = full["mode"].as_str().unwrap_or("loose");
            Ok(RuleValue::One(format!("gt:start,{mode},{start}")))
        });
        let out = walker(&request, &config)
            .resolve(&spec, "c.end", Some("c"), &request["c"])
            .unwrap();
        assert_eq!(out, RuleValue::One("gt:start,strict,1".into()));
    }

    #[test]
    fn computed_failures_carry_the_key() {
        let request = json!({});
        let config = RulesConfig::default();
        let spec = RuleSpec::computed(|_, _| Err(anyhow::anyhow!("no rules today")));
        let err = walker(&request, &config).resolve(&spec, "a.b", Some("a"), &request).unwrap_err();
        match err {
            RuleError::Computed { key, source } => {
                assert_eq!(key, "a.b");
                assert_eq!(source.to_string(), "no rules today");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
