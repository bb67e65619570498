//! Configuration management for round-table
//!
//! A config file lists the children to spawn, in order. Two formats are
//! accepted, chosen by extension:
//!
//! - `.toml`: a [`RoundTableConfig`] with `[[children]]` tables
//! - anything else: JSON, either a bare array of child specs or a full
//!   [`RoundTableConfig`] object. `//` and `/* */` comments are allowed.

mod child;
mod jsonc;
mod round_table;
pub mod serde_utils;

pub use child::{split_command_line, ChildSpec, CommandArgs};
pub use jsonc::strip_comments;
pub use round_table::{
    RoundTableConfig, SchedulerConfig, DEFAULT_LOOP_PROMPT, DEFAULT_OPERATOR_NAME,
};

use crate::error::ConfigError;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

/// On-disk config format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML document
    Toml,
    /// JSON with comments
    Json,
}

impl ConfigFormat {
    /// Pick the format from a file extension
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => ConfigFormat::Toml,
            _ => ConfigFormat::Json,
        }
    }
}

/// JSON documents may be a bare array of children or a full object
#[derive(Deserialize)]
#[serde(untagged)]
enum JsonDocument {
    Children(Vec<ChildSpec>),
    Full(RoundTableConfig),
}

/// Load and validate configuration from a file
pub fn load_config(path: &Path) -> Result<RoundTableConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::Invalid(format!("Failed to read config: {}", e)))?;

    parse_config(&content, ConfigFormat::from_path(path))
}

/// Parse and validate configuration text
pub fn parse_config(content: &str, format: ConfigFormat) -> Result<RoundTableConfig, ConfigError> {
    let config = match format {
        ConfigFormat::Toml => toml::from_str::<RoundTableConfig>(content)?,
        ConfigFormat::Json => match serde_json::from_str(&strip_comments(content))? {
            JsonDocument::Children(children) => RoundTableConfig::with_children(children),
            JsonDocument::Full(config) => config,
        },
    };

    validate(&config)?;
    Ok(config)
}

/// Check a configuration before anything is spawned
pub fn validate(config: &RoundTableConfig) -> Result<(), ConfigError> {
    if config.operator_name.trim().is_empty() {
        return Err(ConfigError::Invalid("operator_name must not be empty".into()));
    }
    if config.scheduler.tick.is_zero() {
        return Err(ConfigError::Invalid("scheduler tick_ms must be at least 1".into()));
    }

    let mut seen = HashSet::new();
    for spec in &config.children {
        if spec.name.trim().is_empty() {
            return Err(ConfigError::MissingField("name".into()));
        }
        if spec.name.contains(':') || spec.name.chars().any(char::is_whitespace) {
            return Err(ConfigError::Invalid(format!(
                "child name \"{}\" must not contain ':' or whitespace",
                spec.name
            )));
        }
        if spec.cmd.trim().is_empty() {
            return Err(ConfigError::MissingField(format!("cmd (child \"{}\")", spec.name)));
        }
        if !seen.insert(spec.name.to_lowercase()) {
            return Err(ConfigError::DuplicateName(spec.name.clone()));
        }
    }

    Ok(())
}
