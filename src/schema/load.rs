//! Build a [`Schema`] from a JSON document.
//!
//! ```json
//! {
//!   "types": {
//!     "ContractInput": {
//!       "fields": {
//!         "start": { "type": "Int", "rules": ["lt:end"] },
//!         "end":   { "type": "Int", "rules": "gt:start" }
//!       }
//!     }
//!   },
//!   "arguments": {
//!     "contract": { "type": "ContractInput!" }
//!   }
//! }
//! ```
//!
//! Names declared under `types` become composites; every other name is a leaf.
use std::fmt;
use std::marker::PhantomData;
use std::path::Path;
use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;

use super::notation::parse_type;
use super::{FieldDef, InputObjectType, RuleSpec, TypeRef};
use crate::error::SchemaError;

// ------------------------------- Document --------------------------------- //

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct SchemaDoc {
    #[serde(default)]
    types: Entries<TypeDoc>,
    arguments: Entries<FieldDoc>,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct TypeDoc {
    fields: Entries<FieldDoc>,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct FieldDoc {
    #[serde(rename = "type")]
    ty: String,
    #[serde(default)]
    rules: Option<RulesDoc>,
}

#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum RulesDoc {
    One(String),
    Many(Vec<String>),
}

/// A JSON object read entry by entry, so repeated keys survive until
/// [`Entries::unique`] can report them against their owner.
#[derive(Debug)]
struct Entries<T>(Vec<(String, T)>);

impl<T> Default for Entries<T> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<T> Entries<T> {
    fn unique(&self, owner: &str) -> Result<&[(String, T)], SchemaError> {
        let mut seen = IndexSet::with_capacity(self.0.len());
        for (name, _) in &self.0 {
            if !seen.insert(name.as_str()) {
                return Err(SchemaError::Duplicate { owner: owner.to_owned(), name: name.clone() });
            }
        }
        Ok(&self.0)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Entries<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntriesVisitor<T>(PhantomData<T>);

        impl<'de, T: Deserialize<'de>> Visitor<'de> for EntriesVisitor<T> {
            type Value = Entries<T>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry::<String, T>()? {
                    entries.push(entry);
                }
                Ok(Entries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor(PhantomData))
    }
}

// -------------------------------- Schema ---------------------------------- //

/// Top-level arguments of one operation plus the composites they reach.
#[derive(Debug, Clone)]
pub struct Schema {
    types: IndexMap<String, Arc<InputObjectType>>,
    arguments: IndexMap<String, FieldDef>,
}

impl Schema {
    pub fn new(arguments: impl IntoIterator<Item = FieldDef>) -> Self {
        Self {
            types: IndexMap::new(),
            arguments: arguments.into_iter().map(|f| (f.name.clone(), f)).collect(),
        }
    }

    pub fn arguments(&self) -> &IndexMap<String, FieldDef> {
        &self.arguments
    }

    pub fn input_type(&self, name: &str) -> Option<&Arc<InputObjectType>> {
        self.types.get(name)
    }
}

pub fn load_schema(path: impl AsRef<Path>) -> anyhow::Result<Schema> {
    use anyhow::Context;
    let path = path.as_ref();
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read schema file {}", path.display()))?;
    parse_schema(&source)
        .with_context(|| format!("invalid schema file {}", path.display()))
}

pub fn parse_schema(source: &str) -> Result<Schema, SchemaError> {
    let doc: SchemaDoc = crate::path_de::from_str_with_path(source)?;

    let type_docs = doc.types.unique("types")?;
    let argument_docs = doc.arguments.unique("arguments")?;

    // declare first so fields may reference any type, including their own
    let types = type_docs
        .iter()
        .map(|(name, _)| (name.clone(), InputObjectType::declare(name.as_str())))
        .collect::<IndexMap<_, _>>();

    let named = |name: &str| match types.get(name) {
        Some(ty) => TypeRef::composite(ty),
        None => TypeRef::leaf(name),
    };

    for (type_name, type_doc) in type_docs {
        let fields = build_fields(type_name, type_doc.fields.unique(type_name)?, &named)?;
        types[type_name.as_str()].define(fields);
    }
    let arguments = build_fields("arguments", argument_docs, &named)?;

    tracing::debug!(types = types.len(), arguments = arguments.len(), "schema loaded");

    Ok(Schema {
        arguments: arguments.into_iter().map(|f| (f.name.clone(), f)).collect(),
        types,
    })
}

fn build_fields<F>(
    owner: &str,
    docs: &[(String, FieldDoc)],
    named: &F,
) -> Result<Vec<FieldDef>, SchemaError>
where
    F: Fn(&str) -> TypeRef,
{
    docs.iter()
        .map(|(name, doc)| {
            let ty = parse_type(&doc.ty, named).map_err(|source| SchemaError::Field {
                owner: owner.to_owned(),
                field: name.clone(),
                source: Box::new(source),
            })?;
            let mut field = FieldDef::new(name.as_str(), ty);
            field.rules = doc.rules.as_ref().map(|rules| match rules {
                RulesDoc::One(rule) => RuleSpec::Single(rule.clone()),
                RulesDoc::Many(rules) => RuleSpec::List(rules.clone()),
            });
            Ok(field)
        })
        .collect()
}
