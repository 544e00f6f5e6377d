//! Embedded JSON Schema used to validate catalogs and snapshots read from disk.
//!
//! A single schema document carries every definition; callers pick the
//! definition that describes their document (`Environment`, `ModuleCatalog`,
//! `Infrastructure`) and get a compiled validator rooted at it.

use anyhow::{Context, Result, anyhow, bail};
use jsonschema::JSONSchema;
use serde_json::{Value, json};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

const ENVIRONMENT_SCHEMA: &str = include_str!("../schema/environment.schema.json");

/// Definitions in the embedded schema that documents may be validated against.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SchemaDefinition {
    Environment,
    ModuleCatalog,
    Infrastructure,
}

impl SchemaDefinition {
    fn as_str(&self) -> &'static str {
        match self {
            SchemaDefinition::Environment => "Environment",
            SchemaDefinition::ModuleCatalog => "ModuleCatalog",
            SchemaDefinition::Infrastructure => "Infrastructure",
        }
    }
}

/// Compile a validator whose root is the requested definition.
pub(crate) fn compile_definition(definition: SchemaDefinition) -> Result<JSONSchema> {
    let document: Value =
        serde_json::from_str(ENVIRONMENT_SCHEMA).context("parsing embedded environment schema")?;
    let definitions = document
        .get("definitions")
        .cloned()
        .ok_or_else(|| anyhow!("embedded schema has no definitions"))?;
    let name = definition.as_str();
    if definitions.get(name).is_none() {
        bail!("embedded schema has no definition '{name}'");
    }
    let rooted = json!({
        "$schema": document.get("$schema").cloned().unwrap_or(Value::Null),
        "allOf": [{ "$ref": format!("#/definitions/{name}") }],
        "definitions": definitions,
    });
    JSONSchema::compile(&rooted).map_err(|err| anyhow!("compiling schema for {name}: {err}"))
}

/// Validate an in-memory document, collecting every schema violation.
pub(crate) fn validate_value(
    definition: SchemaDefinition,
    value: &Value,
    origin: &str,
) -> Result<()> {
    let schema = compile_definition(definition)?;
    if let Err(errors) = schema.validate(value) {
        let details = errors
            .map(|err| format!("{}: {}", err.instance_path, err))
            .collect::<Vec<_>>()
            .join("\n");
        bail!(
            "{origin} failed {} schema validation:\n{details}",
            definition.as_str()
        );
    }
    Ok(())
}

/// Read a JSON document from disk and validate it against a definition.
pub(crate) fn read_validated(definition: SchemaDefinition, path: &Path) -> Result<Value> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let value: Value = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing {}", path.display()))?;
    validate_value(definition, &value, &path.display().to_string())?;
    Ok(value)
}
