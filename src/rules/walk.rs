//! Walks a field set together with the submitted values.
use indexmap::IndexMap;
use serde_json::Value;

use super::{RuleMap, RulesConfig};
use crate::error::RuleError;
use crate::schema::{FieldDef, TypeRef, unwrap_to_base};

/// State shared by one derivation pass.
pub(crate) struct Walker<'a> {
    pub(super) request: &'a Value,
    pub(super) config: &'a RulesConfig,
}

impl<'a> Walker<'a> {
    pub(crate) fn new(request: &'a Value, config: &'a RulesConfig) -> Self {
        Self { request, config }
    }

    /// Rules for `fields` under `prefix`, in declaration order.
    ///
    /// A field's own rules are stored first; rules found by descending into
    /// its submitted value only fill keys that are still vacant.
    pub(crate) fn collect_rules(
        &self,
        fields: &IndexMap<String, FieldDef>,
        prefix: Option<&str>,
        values: &Value,
        depth: usize,
    ) -> Result<RuleMap, RuleError> {
        let mut rules = RuleMap::default();

        for field in fields.values() {
            let key = match prefix {
                Some(prefix) => format!("{prefix}.{}", field.name),
                None => field.name.clone(),
            };

            if let Some(spec) = &field.rules {
                let resolved = self.resolve(spec, &key, prefix, values)?;
                rules.insert(key.clone(), resolved);
            }

            if let Some(nested @ (Value::Object(_) | Value::Array(_))) = values.get(field.name.as_str()) {
                let inferred = self.infer_from_type(&field.ty, &key, nested, depth)?;
                rules.merge_absent(inferred);
            }
        }

        Ok(rules)
    }

    /// Only composite types carry nested rules; list-typed fields are
    /// expanded per submitted element, skipping nulls.
    fn infer_from_type(
        &self,
        ty: &TypeRef,
        key: &str,
        values: &Value,
        depth: usize,
    ) -> Result<RuleMap, RuleError> {
        let (base, is_list) = unwrap_to_base(ty);
        let Some(input) = base.as_composite() else {
            return Ok(RuleMap::default());
        };

        let depth = depth + 1;
        if depth > self.config.max_depth {
            return Err(RuleError::DepthExceeded { path: key.to_owned(), limit: self.config.max_depth });
        }
        tracing::debug!(path = key, input = input.name(), is_list, "entering input type");

        if !is_list {
            return self.collect_rules(input.fields(), Some(key), values, depth);
        }

        let mut rules = RuleMap::default();
        let mut element = |segment: &dyn std::fmt::Display, item: &Value| -> Result<(), RuleError> {
            if item.is_null() {
                return Ok(());
            }
            let path = format!("{key}.{segment}");
            let nested = self.collect_rules(input.fields(), Some(&path), item, depth)?;
            rules.merge_absent(nested);
            Ok(())
        };

        match values {
            Value::Array(items) => {
                for (index, item) in items.iter().enumerate() {
                    element(&index, item)?;
                }
            }
            Value::Object(entries) => {
                tracing::warn!(path = key, "list-typed field received an object; walking its entries");
                for (name, item) in entries {
                    element(name, item)?;
                }
            }
            _ => {}
        }

        Ok(rules)
    }
}
