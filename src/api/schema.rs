use serde::Deserialize;

use super::ApiResponse;
use crate::error::{Error, Result};

/// One field as reported by a describe endpoint.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    pub name: String,
    #[serde(default)]
    pub updateable: bool,
    #[serde(default)]
    pub crm_managed: bool,
}

/// The schema of a lead or custom object, from the first describe record.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ObjectSchema {
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub id_field: Option<String>,
    #[serde(default)]
    pub dedupe_fields: Vec<String>,
    #[serde(default)]
    pub searchable_fields: Vec<Vec<String>>,
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
}

impl ObjectSchema {
    pub fn from_response(response: &ApiResponse) -> Result<Self> {
        let record = response
            .result()
            .first()
            .ok_or_else(|| Error::MalformedResponse("describe returned no schema".to_string()))?;
        serde_json::from_value(record.clone())
            .map_err(|err| Error::MalformedResponse(format!("unrecognised schema: {err}")))
    }

    /// Lead describes only carry `name`, custom objects also a `displayName`.
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }

    /// Fields a caller may set or request: everything the CRM does not own.
    pub fn available_fields(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .fields
            .iter()
            .filter(|field| !field.crm_managed)
            .map(|field| field.name.clone())
            .collect();
        names.sort();
        names
    }

    pub fn updateable_fields(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .fields
            .iter()
            .filter(|field| field.updateable && !field.crm_managed)
            .map(|field| field.name.clone())
            .collect();
        names.sort();
        names
    }

    /// Whether `field` alone is listed as a search key.
    pub fn is_searchable(&self, field: &str) -> bool {
        self.searchable_fields
            .iter()
            .any(|keys| keys.len() == 1 && keys[0] == field)
    }

    pub fn is_dedupe_field(&self, field: &str) -> bool {
        self.dedupe_fields.iter().any(|name| name == field)
    }

    /// Describes every way the remote schema disagrees with the keys a
    /// client filters on. Empty when everything lines up.
    pub fn filter_mismatches(
        &self,
        id_field: &str,
        search: &[&str],
        delete: &[&str],
    ) -> Vec<String> {
        let mut mismatches = Vec::new();
        if let Some(actual) = self.id_field.as_deref().filter(|actual| *actual != id_field) {
            mismatches.push(format!("id field is `{actual}`, expected `{id_field}`"));
        }
        for field in search.iter().filter(|field| !self.is_searchable(field)) {
            mismatches.push(format!("`{field}` is not searchable"));
        }
        for field in delete.iter().filter(|field| !self.is_dedupe_field(field)) {
            mismatches.push(format!("`{field}` is not a dedupe field"));
        }
        mismatches
    }

    pub fn info(&self) -> ObjectInfo {
        ObjectInfo {
            display_name: self.label().to_string(),
            available_fields: self.available_fields(),
            updateable_fields: self.updateable_fields(),
        }
    }
}

/// What the CLI shows when an object is named without any fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectInfo {
    pub display_name: String,
    pub available_fields: Vec<String>,
    pub updateable_fields: Vec<String>,
}
