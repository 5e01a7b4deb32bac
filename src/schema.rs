//! Input schema model: the type graph that rule derivation walks.
//!
//! - `TypeRef` is a plain sum type; wrapping (`NonNull`, `List`) is structural.
//! - Composite types are shared behind `Arc` and their field sets are bound
//!   once, after construction, so a type may reference itself.
//! - Fields keep their declaration order (`IndexMap`), which is also the order
//!   rules are emitted in.
pub mod load;
pub mod notation;

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use once_cell::sync::{Lazy, OnceCell};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use load::{Schema, load_schema, parse_schema};

// ------------------------------- Types ----------------------------------- //

#[derive(Clone, Debug)]
pub enum TypeRef {
    NonNull(Box<TypeRef>),
    List(Box<TypeRef>),
    Composite(Arc<InputObjectType>),
    /// Scalars and enums; opaque to rule derivation.
    Leaf(String),
}

/// A named input type with an ordered field set.
pub struct InputObjectType {
    name: String,
    fields: OnceCell<IndexMap<String, FieldDef>>,
}

#[derive(Clone, Debug)]
pub struct FieldDef {
    pub name: String,
    pub ty: TypeRef,
    pub rules: Option<RuleSpec>,
}

/// Signature of a computed rule: `(local values, full request values)`.
pub type ComputedRule =
    Arc<dyn Fn(&Value, &Value) -> anyhow::Result<RuleValue> + Send + Sync>;

/// Rules attached to a field at schema-definition time.
#[derive(Clone)]
pub enum RuleSpec {
    Single(String),
    List(Vec<String>),
    Computed(ComputedRule),
}

/// A rule set as the validation engine consumes it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleValue {
    One(String),
    List(Vec<String>),
}

// ---------------------------- Construction ------------------------------- //

impl TypeRef {
    pub fn leaf(name: impl Into<String>) -> Self {
        TypeRef::Leaf(name.into())
    }
    pub fn non_null(inner: TypeRef) -> Self {
        TypeRef::NonNull(Box::new(inner))
    }
    pub fn list_of(inner: TypeRef) -> Self {
        TypeRef::List(Box::new(inner))
    }
    pub fn composite(ty: &Arc<InputObjectType>) -> Self {
        TypeRef::Composite(Arc::clone(ty))
    }

    pub fn as_composite(&self) -> Option<&Arc<InputObjectType>> {
        match self {
            TypeRef::Composite(ty) => Some(ty),
            _ => None,
        }
    }

    /// Strip every wrapper layer. Always ends at a `Composite` or `Leaf`.
    pub fn base(&self) -> &TypeRef {
        match self {
            TypeRef::NonNull(inner) | TypeRef::List(inner) => inner.base(),
            other => other,
        }
    }
}

impl InputObjectType {
    /// A composite whose fields are known up front.
    pub fn new<I>(name: impl Into<String>, fields: I) -> Arc<Self>
    where
        I: IntoIterator<Item = FieldDef>,
    {
        let ty = Self::declare(name);
        ty.define(fields);
        ty
    }

    /// A composite whose fields are bound later via [`InputObjectType::define`].
    pub fn declare(name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self { name: name.into(), fields: OnceCell::new() })
    }

    /// Bind the field set. Returns `false` if fields were already bound.
    pub fn define<I>(&self, fields: I) -> bool
    where
        I: IntoIterator<Item = FieldDef>,
    {
        let fields = fields
            .into_iter()
            .map(|field| (field.name.clone(), field))
            .collect::<IndexMap<_, _>>();
        self.fields.set(fields).is_ok()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared fields; empty while the type is only declared.
    pub fn fields(&self) -> &IndexMap<String, FieldDef> {
        static EMPTY: Lazy<IndexMap<String, FieldDef>> = Lazy::new(IndexMap::new);
        self.fields.get().unwrap_or(&EMPTY)
    }
}

impl FieldDef {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self { name: name.into(), ty, rules: None }
    }

    pub fn with_rules(mut self, rules: impl Into<RuleSpec>) -> Self {
        self.rules = Some(rules.into());
        self
    }
}

impl RuleSpec {
    pub fn computed<F>(f: F) -> Self
    where
        F: Fn(&Value, &Value) -> anyhow::Result<RuleValue> + Send + Sync + 'static,
    {
        RuleSpec::Computed(Arc::new(f))
    }
}

impl From<&str> for RuleSpec {
    fn from(rule: &str) -> Self {
        RuleSpec::Single(rule.to_owned())
    }
}

impl From<String> for RuleSpec {
    fn from(rule: String) -> Self {
        RuleSpec::Single(rule)
    }
}

impl From<Vec<String>> for RuleSpec {
    fn from(rules: Vec<String>) -> Self {
        RuleSpec::List(rules)
    }
}

impl<const N: usize> From<[&str; N]> for RuleSpec {
    fn from(rules: [&str; N]) -> Self {
        RuleSpec::List(rules.iter().map(|r| r.to_string()).collect())
    }
}

impl RuleValue {
    pub fn rules(&self) -> impl Iterator<Item = &str> {
        let xs: &[String] = match self {
            RuleValue::One(rule) => std::slice::from_ref(rule),
            RuleValue::List(rules) => rules,
        };
        xs.iter().map(String::as_str)
    }
}

// ------------------------------ Unwrapping -------------------------------- //

/// Find the type a field's rules are inferred from.
///
/// Strips an outer `NonNull`, then one `List` layer, then an inner `NonNull`.
/// The flag reports whether the list layer was present; nullability never
/// affects it. Anything still wrapped after that (a list of lists) is returned
/// as is and is never treated as composite.
pub fn unwrap_to_base(ty: &TypeRef) -> (&TypeRef, bool) {
    let mut ty = ty;
    let mut is_list = false;

    if let TypeRef::NonNull(inner) = ty {
        ty = inner.as_ref();
    }
    if let TypeRef::List(inner) = ty {
        ty = inner.as_ref();
        is_list = true;
    }
    if let TypeRef::NonNull(inner) = ty {
        ty = inner.as_ref();
    }

    (ty, is_list)
}

// ------------------------------- Display ---------------------------------- //

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::NonNull(inner) => write!(f, "{inner}!"),
            TypeRef::List(inner) => write!(f, "[{inner}]"),
            TypeRef::Composite(ty) => f.write_str(&ty.name),
            TypeRef::Leaf(name) => f.write_str(name),
        }
    }
}

// Field sets may be cyclic; print names only.
impl fmt::Debug for InputObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputObjectType")
            .field("name", &self.name)
            .field("fields", &self.fields().keys().collect::<Vec<_>>())
            .finish()
    }
}

impl fmt::Debug for RuleSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleSpec::Single(rule) => f.debug_tuple("Single").field(rule).finish(),
            RuleSpec::List(rules) => f.debug_tuple("List").field(rules).finish(),
            RuleSpec::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

// ------------------------------- Tests ------------------------------------ //
