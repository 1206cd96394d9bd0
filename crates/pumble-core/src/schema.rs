//! Editor support for the config file: a JSON schema generated from
//! [`AppConfig`] and an example TOML that points at it.

use std::fs;
use std::path::Path;

use schemars::generate::SchemaSettings;
use serde_json::{Value, json};

use crate::config::AppConfig;
use crate::{CoreError, Result};

/// Generated schema filename.
pub const SCHEMA_FILENAME: &str = "config.schema.json";

/// Generated config filename.
pub const CONFIG_FILENAME: &str = "config.toml";

fn schema_url(repo_url: &str) -> String {
    format!("{repo_url}/schemas/{SCHEMA_FILENAME}")
}

/// JSON schema (draft-07, which TOML language servers understand) for the config file.
///
/// # Errors
///
/// Returns [`CoreError::Serialization`] if the schema cannot be encoded.
pub fn generate_schema(project_name: &str, repo_url: &str) -> Result<String> {
    let mut schema = SchemaSettings::draft07()
        .into_generator()
        .into_root_schema_for::<AppConfig>();

    for (key, value) in [
        ("$id", json!(schema_url(repo_url))),
        ("title", json!(format!("{project_name} configuration"))),
        (
            "description",
            json!(format!("Configuration schema for {project_name}")),
        ),
    ] {
        schema.insert(key.to_string(), value);
    }

    // `$schema` is skipped on the struct but must validate in the file.
    if let Some(properties) = schema
        .get_mut("properties")
        .and_then(Value::as_object_mut)
    {
        properties.insert(
            "$schema".to_string(),
            json!({
                "type": "string",
                "description": "JSON Schema reference for editor support"
            }),
        );
    }

    serde_json::to_string_pretty(&schema)
        .map_err(|e| CoreError::Serialization(format!("encoding JSON schema: {e}")))
}

/// Example config: the defaults, a `$schema` reference and a short header.
///
/// # Errors
///
/// Returns [`CoreError::Serialization`] if TOML encoding fails.
pub fn generate_example_config(project_name: &str, repo_url: &str) -> Result<String> {
    Ok(format!(
        "\"$schema\" = \"{}\"\n\n\
         # Configuration for {project_name}.\n\
         # Copy to $XDG_CONFIG_HOME/{project_name}/config.toml and adjust.\n\
         # The API key is read from PUMBLE_API_KEY, or from api.api_key below.\n\n{}",
        schema_url(repo_url),
        AppConfig::default().to_toml()?
    ))
}

/// Write the schema and example config into `output_dir`, creating it if needed.
///
/// # Errors
///
/// Returns an IO error if the directory or a file cannot be written.
pub fn write_generated_files(output_dir: &Path, project_name: &str, repo_url: &str) -> Result<()> {
    fs::create_dir_all(output_dir)?;
    let files = [
        (SCHEMA_FILENAME, generate_schema(project_name, repo_url)?),
        (
            CONFIG_FILENAME,
            generate_example_config(project_name, repo_url)?,
        ),
    ];
    for (name, body) in files {
        let target = output_dir.join(name);
        fs::write(&target, body)?;
        log::debug!("wrote {}", target.display());
    }
    Ok(())
}
