use thiserror::Error;

/// Failures of a single rule-derivation pass.
#[derive(Error, Debug)]
pub enum RuleError {
    #[error("malformed rule `{rule}`: {reason}")]
    Malformed { rule: String, reason: &'static str },

    #[error("bad back-reference in `{rule}`: {reason}")]
    BackReference { rule: String, reason: String },

    #[error("computed rule for `{key}` failed")]
    Computed {
        key: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("input nesting at `{path}` exceeds the depth limit of {limit}")]
    DepthExceeded { path: String, limit: usize },
}

/// Failures while building a schema from a document.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("invalid type notation `{notation}`: {reason}")]
    Notation { notation: String, reason: &'static str },

    #[error("field `{field}` of `{owner}`: {source}")]
    Field {
        owner: String,
        field: String,
        #[source]
        source: Box<SchemaError>,
    },

    #[error("`{owner}` declares `{name}` more than once")]
    Duplicate { owner: String, name: String },

    #[error("at JSON path {path} → {message}")]
    Document { path: String, message: String },
}
