use std::env;

use csv_relay_core::transform::TransformOptions;
use thiserror::Error;

pub const QUEUE_URL_VAR: &str = "QUEUE_URL";
pub const CSV_DELIMITER_VAR: &str = "CSV_DELIMITER";
pub const CSV_TRIM_VAR: &str = "CSV_TRIM";
pub const JSON_INDENT_VAR: &str = "JSON_INDENT";
pub const MESSAGE_GROUP_ID_VAR: &str = "MESSAGE_GROUP_ID";

pub const DEFAULT_JSON_INDENT: usize = 4;
pub const DEFAULT_MESSAGE_GROUP_ID: &str = "csv-relay";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} must be configured")]
    Missing(&'static str),
    #[error("{var}={value:?} is invalid: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    pub queue_url: String,
    pub transform: TransformOptions,
    /// `None` renders compact JSON.
    pub json_indent: Option<usize>,
    pub message_group_id: String,
}

impl RelayConfig {
    pub fn new(queue_url: impl Into<String>) -> Self {
        Self {
            queue_url: queue_url.into(),
            transform: TransformOptions::default(),
            json_indent: Some(DEFAULT_JSON_INDENT),
            message_group_id: DEFAULT_MESSAGE_GROUP_ID.to_string(),
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let queue_url = lookup(QUEUE_URL_VAR)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .ok_or(ConfigError::Missing(QUEUE_URL_VAR))?;

        let mut config = Self::new(queue_url);

        if let Some(value) = lookup(CSV_DELIMITER_VAR) {
            config.transform.delimiter = parse_delimiter(&value)?;
        }
        if let Some(value) = lookup(CSV_TRIM_VAR) {
            config.transform.trim = parse_flag(CSV_TRIM_VAR, &value)?;
        }
        if let Some(value) = lookup(JSON_INDENT_VAR) {
            config.json_indent = parse_indent(&value)?;
        }
        if let Some(value) = lookup(MESSAGE_GROUP_ID_VAR) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                config.message_group_id = trimmed.to_string();
            }
        }

        Ok(config)
    }
}

fn parse_delimiter(value: &str) -> Result<u8, ConfigError> {
    let invalid = |reason: &str| ConfigError::Invalid {
        var: CSV_DELIMITER_VAR,
        value: value.to_string(),
        reason: reason.to_string(),
    };

    match value {
        "\t" | "\\t" | "tab" => Ok(b'\t'),
        _ => match value.as_bytes() {
            [b'"' | b'\n' | b'\r'] => Err(invalid("quote and line breaks cannot delimit fields")),
            [byte] if byte.is_ascii() => Ok(*byte),
            _ => Err(invalid("expected a single ASCII character")),
        },
    }
}

fn parse_flag(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "" | "0" | "false" | "no" => Ok(false),
        "1" | "true" | "yes" => Ok(true),
        _ => Err(ConfigError::Invalid {
            var,
            value: value.to_string(),
            reason: "expected true or false".to_string(),
        }),
    }
}

fn parse_indent(value: &str) -> Result<Option<usize>, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "" => Ok(Some(DEFAULT_JSON_INDENT)),
        "none" | "0" => Ok(None),
        other => other
            .parse()
            .map(Some)
            .map_err(|error| ConfigError::Invalid {
                var: JSON_INDENT_VAR,
                value: value.to_string(),
                reason: format!("{error}"),
            }),
    }
}
