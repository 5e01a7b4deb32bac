//! Derive the flat `path → rules` mapping a validator consumes.
//!
//! Pipeline for one request:
//! - walk the operation's arguments alongside the submitted values ([`walk`]);
//! - resolve each field's declared rules ([`resolve`]);
//! - qualify field references inside those rules with the current path ([`qualify`]).
//!
//! Nothing is cached between requests; a [`Rules`] value lives for one call.
pub mod date;
pub mod parse;
pub mod qualify;
mod resolve;
mod walk;

use std::sync::Arc;

use indexmap::IndexMap;
use indexmap::map::Entry;
use serde::Serialize;
use serde_json::Value;

use crate::error::RuleError;
use crate::schema::{FieldDef, RuleValue};

pub use date::{ChronoDates, DateRecognizer};
pub use parse::ParsedRule;
pub use qualify::{qualify_rule, qualify_rules};

// ------------------------------- Policy ---------------------------------- //

/// Nesting levels of composite input allowed before a walk is refused.
pub const DEFAULT_MAX_DEPTH: usize = 32;

#[derive(Clone)]
pub struct RulesConfig {
    pub max_depth: usize,
    pub dates: Arc<dyn DateRecognizer>,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self { max_depth: DEFAULT_MAX_DEPTH, dates: Arc::new(ChronoDates) }
    }
}

impl RulesConfig {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_dates(mut self, dates: impl DateRecognizer + 'static) -> Self {
        self.dates = Arc::new(dates);
        self
    }
}

impl std::fmt::Debug for RulesConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RulesConfig").field("max_depth", &self.max_depth).finish_non_exhaustive()
    }
}

// ------------------------------- RuleMap --------------------------------- //

/// Dotted path → rules, in the order paths were discovered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RuleMap(IndexMap<String, RuleValue>);

impl RuleMap {
    pub fn insert(&mut self, key: String, rules: RuleValue) -> Option<RuleValue> {
        self.0.insert(key, rules)
    }

    /// Add entries from `other` whose keys are not present yet.
    pub fn merge_absent(&mut self, other: RuleMap) {
        for (key, rules) in other.0 {
            if let Entry::Vacant(slot) = self.0.entry(key) {
                slot.insert(rules);
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&RuleValue> {
        self.0.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RuleValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> IndexMap<String, RuleValue> {
        self.0
    }
}

impl IntoIterator for RuleMap {
    type Item = (String, RuleValue);
    type IntoIter = indexmap::map::IntoIter<String, RuleValue>;
    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

// ------------------------------- Front API -------------------------------- //

/// Rules for one request: an operation's arguments plus the submitted values.
pub struct Rules<'a> {
    arguments: &'a IndexMap<String, FieldDef>,
    request: &'a Value,
    config: RulesConfig,
}

impl<'a> Rules<'a> {
    pub fn new(arguments: &'a IndexMap<String, FieldDef>, request: &'a Value) -> Self {
        Self { arguments, request, config: RulesConfig::default() }
    }

    pub fn with_config(mut self, config: RulesConfig) -> Self {
        self.config = config;
        self
    }

    pub fn get(&self) -> Result<RuleMap, RuleError> {
        walk::Walker::new(self.request, &self.config)
            .collect_rules(self.arguments, None, self.request, 0)
    }
}

// ------------------------------- Tests ------------------------------------ //
