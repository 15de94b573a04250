//! Schema registry: a thin façade over structural JSON validation.
//!
//! Providers declare one or more schema source directories; every `*.json`
//! document in those directories is loaded and keyed by the identifier the
//! document itself carries (`id`, or `$id`). Validation applies structural
//! checks (type, required fields, per-property schemas, array items)
//! and an unknown schema name validates successfully, so endpoints opt in
//! by naming a schema that exists.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::CambioError;

/// Union of all schema documents across a provider's source directories.
#[derive(Debug, Default, Clone)]
pub struct SchemaRegistry {
    schemas: HashMap<String, Value>,
}

impl SchemaRegistry {
    /// Empty registry; every validation is a no-op success.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every `*.json` document under each source directory.
    ///
    /// # Errors
    /// `Config` when a directory cannot be read, a document is not valid
    /// JSON, or a document carries no `id`/`$id` identifier.
    pub fn load(sources: &[PathBuf]) -> Result<Self, CambioError> {
        let mut registry = Self::new();
        for source in sources {
            registry.load_dir(source)?;
        }
        Ok(registry)
    }

    fn load_dir(&mut self, dir: &Path) -> Result<(), CambioError> {
        let entries = std::fs::read_dir(dir).map_err(|e| {
            CambioError::config(format!("unreadable schema source {}: {e}", dir.display()))
        })?;
        for entry in entries {
            let path = entry
                .map_err(|e| CambioError::config(format!("schema source walk failed: {e}")))?
                .path();
            if !path.is_file() || path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }
            let text = std::fs::read_to_string(&path).map_err(|e| {
                CambioError::config(format!("unreadable schema {}: {e}", path.display()))
            })?;
            let doc: Value = serde_json::from_str(&text).map_err(|e| {
                CambioError::config(format!("invalid schema json {}: {e}", path.display()))
            })?;
            self.add(doc).map_err(|e| match e {
                CambioError::Config(msg) => {
                    CambioError::config(format!("{msg} (in {})", path.display()))
                }
                other => other,
            })?;
        }
        Ok(())
    }

    /// Register a schema document under the identifier it carries.
    ///
    /// Later documents with the same identifier replace earlier ones
    /// (union semantics across source directories).
    ///
    /// # Errors
    /// `Config` when the document has no `id`/`$id` string field.
    pub fn add(&mut self, doc: Value) -> Result<(), CambioError> {
        let id = doc
            .get("id")
            .or_else(|| doc.get("$id"))
            .and_then(Value::as_str)
            .ok_or_else(|| CambioError::config("schema document without an id"))?
            .to_string();
        self.schemas.insert(id, doc);
        Ok(())
    }

    /// `true` when a schema with this identifier is registered.
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    /// Registered identifiers, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    /// Validate `data` against the named schema.
    ///
    /// An unregistered name is a success: endpoints without a schema of
    /// that name are simply unvalidated.
    ///
    /// # Errors
    /// `Validation` carrying the schema name and the offending path.
    pub fn validate(&self, data: &Value, name: &str) -> Result<(), CambioError> {
        let Some(schema) = self.schemas.get(name) else {
            return Ok(());
        };
        let Some(schema) = schema.as_object() else {
            return Err(CambioError::validation(name, "schema must be an object"));
        };
        check_value(data, schema, "$").map_err(|detail| CambioError::validation(name, detail))
    }
}

fn check_value(value: &Value, schema: &Map<String, Value>, path: &str) -> Result<(), String> {
    if let Some(expected) = schema.get("type").and_then(Value::as_str) {
        check_type(value, expected, path)?;
    }

    if let (Some(required), Value::Object(obj)) = (schema.get("required"), value) {
        for field in required.as_array().into_iter().flatten() {
            if let Some(field) = field.as_str()
                && !obj.contains_key(field)
            {
                return Err(format!("{path}/{field}: required field is missing"));
            }
        }
    }

    if let (Some(props), Value::Object(obj)) = (schema.get("properties"), value) {
        for (key, prop_schema) in props.as_object().into_iter().flatten() {
            if let (Some(prop_value), Some(prop_schema)) = (obj.get(key), prop_schema.as_object())
            {
                check_value(prop_value, prop_schema, &format!("{path}/{key}"))?;
            }
        }
    }

    if let (Some(items), Value::Array(arr)) = (schema.get("items"), value)
        && let Some(items) = items.as_object()
    {
        for (i, item) in arr.iter().enumerate() {
            check_value(item, items, &format!("{path}/{i}"))?;
        }
    }

    Ok(())
}

fn check_type(value: &Value, expected: &str, path: &str) -> Result<(), String> {
    let ok = match expected {
        "object" => value.is_object(),
        "array" => value.is_array(),
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64(),
        "boolean" => value.is_boolean(),
        "null" => value.is_null(),
        _ => true,
    };
    if ok {
        Ok(())
    } else {
        Err(format!("{path}: expected {expected}"))
    }
}
