use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{Error, Result};

/// A single scalar field value.
///
/// Remote schemas are only known at runtime (see the describe endpoints),
/// so records carry no compile-time shape beyond "name to scalar".
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Bool(value) => write!(f, "{value}"),
            FieldValue::Integer(value) => write!(f, "{value}"),
            FieldValue::Float(value) => write!(f, "{value}"),
            FieldValue::Text(value) => f.write_str(value),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

/// A record to be written, keyed by remote field name.
pub type Fields = BTreeMap<String, FieldValue>;

/// Parses `field=value` expressions into a record.
///
/// Every argument may hold several comma-separated expressions.
/// Empty expressions and those without `=` are ignored, and each
/// expression is split at its first `=` so values may contain one.
pub fn parse_field_spec<S: AsRef<str>>(args: &[S]) -> Fields {
    let mut fields = Fields::new();
    for arg in args {
        for expression in arg.as_ref().split(',') {
            let Some((field, value)) = expression.split_once('=') else {
                continue;
            };
            let field = field.trim();
            if field.is_empty() {
                continue;
            }
            fields.insert(field.to_string(), FieldValue::from(value.trim()));
        }
    }
    fields
}

/// A single field/value pair used to search or delete custom object records.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub value: String,
}

impl Filter {
    /// Extracts the one filter from `fields`, which must hold exactly one
    /// key drawn from `allowed`.
    pub fn from_fields(fields: &Fields, allowed: &[&str]) -> Result<Self> {
        let mut entries = fields.iter();
        let (field, value) = match (entries.next(), entries.next()) {
            (Some(entry), None) => entry,
            (None, _) => {
                return Err(Error::InvalidFilter(format!(
                    "expected exactly one filter field, one of: {}",
                    allowed.join(", ")
                )))
            }
            (Some(_), Some(_)) => {
                let names: Vec<&str> = fields.keys().map(String::as_str).collect();
                return Err(Error::InvalidFilter(format!(
                    "expected exactly one filter field, got {} ({})",
                    names.len(),
                    names.join(", ")
                )));
            }
        };

        if !allowed.contains(&field.as_str()) {
            return Err(Error::InvalidFilter(format!(
                "`{}` cannot be used as a filter, expected one of: {}",
                field,
                allowed.join(", ")
            )));
        }

        Ok(Self {
            field: field.clone(),
            value: value.to_string(),
        })
    }
}
