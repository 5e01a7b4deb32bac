//! Derive validator rule sets for nested input from a typed input schema.
//!
//! ```
//! use input_rules::rules::Rules;
//! use input_rules::schema::parse_schema;
//! use serde_json::json;
//!
//! let schema = parse_schema(r#"{
//!     "types": { "ContractInput": { "fields": {
//!         "start": { "type": "Int", "rules": ["lt:end"] },
//!         "end":   { "type": "Int", "rules": ["gt:start"] }
//!     } } },
//!     "arguments": { "contract": { "type": "ContractInput" } }
//! }"#).unwrap();
//!
//! let request = json!({ "contract": { "start": null, "end": 2 } });
//! let rules = Rules::new(schema.arguments(), &request).get().unwrap();
//! assert_eq!(serde_json::to_value(&rules).unwrap(), json!({
//!     "contract.start": ["lt:contract.end"],
//!     "contract.end": ["gt:contract.start"],
//! }));
//! ```
pub mod error;
pub mod path_de;
pub mod rules;
pub mod schema;

pub use error::{RuleError, SchemaError};
pub use rules::{RuleMap, Rules, RulesConfig};
pub use schema::{FieldDef, InputObjectType, RuleSpec, RuleValue, Schema, TypeRef};
