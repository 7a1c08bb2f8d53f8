use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::config::schema::Config;
use crate::error::ConfigError;

const SCHEMA_JSON: &str = include_str!("../../../../schema/config-v1.json");

const CONFIG_FILENAME: &str = "config.json";

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let json_value: serde_json::Value = serde_json::from_str(content)?;

    validate_schema(&json_value)?;

    let config: Config = serde_json::from_value(json_value)?;

    validate_config(&config)?;

    Ok(config)
}

/// `<config dir>/labelsort/config.json`, e.g. `~/.config/labelsort/config.json` on Linux.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("labelsort").join(CONFIG_FILENAME))
}

fn validate_schema(json_value: &serde_json::Value) -> Result<(), ConfigError> {
    let schema: serde_json::Value =
        serde_json::from_str(SCHEMA_JSON).map_err(|e| ConfigError::Validation {
            message: format!("Invalid embedded schema JSON: {}", e),
        })?;

    let validator = jsonschema::validator_for(&schema).map_err(|e| ConfigError::Validation {
        message: format!("Failed to compile JSON schema: {}", e),
    })?;

    let error_messages: Vec<String> = validator
        .iter_errors(json_value)
        .map(|e| e.to_string())
        .collect();
    if !error_messages.is_empty() {
        return Err(ConfigError::SchemaValidation {
            errors: error_messages.join("; "),
        });
    }

    Ok(())
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.version != "1.0" {
        return Err(ConfigError::Validation {
            message: format!("Unsupported config version: {}", config.version),
        });
    }

    // Two roles reading the same column would silently alias each other.
    let mut seen: HashMap<usize, &str> = HashMap::new();
    for (name, position) in config.manifest.columns.named() {
        if let Some(other) = seen.insert(position, name) {
            return Err(ConfigError::InvalidLayout {
                reason: format!(
                    "columns '{}' and '{}' both read position {}",
                    other, name, position
                ),
            });
        }
    }

    let output = &config.output;
    let mut filenames = vec![&output.manifest_filename, &output.document_filename];
    if let Some(report) = &output.report_filename {
        filenames.push(report);
    }
    for (i, name) in filenames.iter().enumerate() {
        if filenames[..i].contains(name) {
            return Err(ConfigError::Validation {
                message: format!("Output filename '{}' is used more than once", name),
            });
        }
    }

    if config.inbox_directory == config.outbox_directory {
        return Err(ConfigError::Validation {
            message: "inbox_directory and outbox_directory must differ".to_string(),
        });
    }

    Ok(())
}
