/// `load_config` module: gathers settings from an optional YAML file, CLI flags
/// and the environment, and validates them into a [`RunConfig`].
///
/// Secrets never live in the file: the store token and base id come from the
/// environment only. The date window comes from `--start`/`--end`, falling
/// back to `START_DATE`/`END_DATE`, falling back to month-to-date.
///
/// # Errors
/// Every failure surfaces as `anyhow::Error` at the CLI boundary. Validation
/// failures wrap the core `ConfigError`, so callers can still downcast.
use anyhow::Result;
use chrono::NaiveDate;
use council_votes_core::config::{MinutesConfig, RunConfig, Settings, SourceConfig, StoreTarget};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{error, info};

pub const TOKEN_VAR: &str = "AIRTABLE_TOKEN";
pub const BASE_ID_VAR: &str = "AIRTABLE_BASE_ID";
pub const START_DATE_VAR: &str = "START_DATE";
pub const END_DATE_VAR: &str = "END_DATE";

/// Non-secret settings read from the YAML file. Every section is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub source: SourceConfig,
    pub minutes: MinutesConfig,
    pub store: StoreTarget,
}

/// Date bounds given on the command line; they win over the environment.
#[derive(Debug, Default, Clone)]
pub struct WindowOverrides {
    pub start: Option<String>,
    pub end: Option<String>,
}

pub fn load_file<P: AsRef<Path>>(path: P) -> Result<FileConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let content = match fs::read_to_string(path_ref) {
        Ok(content) => content,
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    // an empty file parses as YAML null, which means "all defaults"
    if content.trim().is_empty() {
        return Ok(FileConfig::default());
    }

    match serde_yaml::from_str(&content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            Ok(conf)
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            Err(anyhow::anyhow!("Failed to parse config YAML: {e}"))
        }
    }
}

/// Merges file, flags and environment into unvalidated [`Settings`].
pub fn load_settings(path: Option<&Path>, overrides: WindowOverrides) -> Result<Settings> {
    let file = match path {
        Some(path) => load_file(path)?,
        None => FileConfig::default(),
    };

    Ok(Settings {
        token: env_var(TOKEN_VAR),
        base_id: env_var(BASE_ID_VAR),
        start_date: overrides.start.or_else(|| env_var(START_DATE_VAR)),
        end_date: overrides.end.or_else(|| env_var(END_DATE_VAR)),
        source: file.source,
        minutes: file.minutes,
        store: file.store,
    })
}

pub fn load_config(
    path: Option<&Path>,
    overrides: WindowOverrides,
    today: NaiveDate,
) -> Result<RunConfig> {
    let settings = load_settings(path, overrides)?;
    settings.validate(today).map_err(|e| {
        error!(error = %e, "Invalid configuration");
        anyhow::Error::new(e)
    })
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok()
}
