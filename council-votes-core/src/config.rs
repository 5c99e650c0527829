//! Run configuration.
//!
//! [`Settings`] is whatever the caller collected from files, flags and the
//! environment, with nothing checked yet. [`Settings::validate`] turns it into
//! a [`RunConfig`] or fails with a [`ConfigError`] before any client exists.

use chrono::{Datelike, NaiveDate};
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::ConfigError;
use crate::locate::{DocumentCriteria, Locale};
use crate::parse::LabelPolicy;
use crate::synchronise::PipelineSettings;

pub const DEFAULT_PORTAL_URL: &str = "https://pub-ottawa.escribemeetings.com/";
pub const DEFAULT_UTC_OFFSET: &str = "-04:00";
pub const DEFAULT_STORE_API_URL: &str = "https://api.airtable.com/v0";
/// Value shipped in example environments; never a real base.
pub const PLACEHOLDER_BASE_ID: &str = "appXXXXXXXXXXXXXX";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Where meetings come from.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub base_url: String,
    /// Offset appended to the calendar query timestamps, e.g. `-04:00`.
    pub utc_offset: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_PORTAL_URL.to_string(),
            utc_offset: DEFAULT_UTC_OFFSET.to_string(),
        }
    }
}

/// Which document counts as the minutes and how its vote labels are read.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MinutesConfig {
    pub doc_type: String,
    pub format: String,
    pub locale: Locale,
    pub label_policy: LabelPolicy,
}

impl Default for MinutesConfig {
    fn default() -> Self {
        let criteria = DocumentCriteria::default();
        Self {
            doc_type: criteria.doc_type,
            format: criteria.format,
            locale: criteria.locale,
            label_policy: LabelPolicy::default(),
        }
    }
}

impl MinutesConfig {
    pub fn criteria(&self) -> DocumentCriteria {
        DocumentCriteria {
            doc_type: self.doc_type.clone(),
            format: self.format.clone(),
            locale: self.locale,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TableNames {
    pub meetings: String,
    pub motions: String,
    pub votes: String,
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            meetings: "Meetings".to_string(),
            motions: "Motions".to_string(),
            votes: "Votes".to_string(),
        }
    }
}

/// Non-secret store settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StoreTarget {
    pub api_url: String,
    pub tables: TableNames,
}

impl Default for StoreTarget {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_STORE_API_URL.to_string(),
            tables: TableNames::default(),
        }
    }
}

/// Validated store settings, secrets included.
#[derive(Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub token: String,
    pub base_id: String,
    pub api_url: String,
    pub tables: TableNames,
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConfig")
            .field("token", &"<redacted>")
            .field("base_id", &self.base_id)
            .field("api_url", &self.api_url)
            .field("tables", &self.tables)
            .finish()
    }
}

/// Inclusive range of calendar dates to scrape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ConfigError> {
        if start > end {
            return Err(ConfigError::InvertedWindow { start, end });
        }
        Ok(Self { start, end })
    }

    /// First day of `today`'s month through `today`.
    pub fn month_to_date(today: NaiveDate) -> Self {
        Self {
            start: today.with_day(1).unwrap_or(today),
            end: today,
        }
    }

    /// Builds a window from optional `YYYY-MM-DD` bounds, defaulting each
    /// missing bound to the month-to-date window around `today`.
    pub fn resolve(
        start: Option<&str>,
        end: Option<&str>,
        today: NaiveDate,
    ) -> Result<Self, ConfigError> {
        let default = Self::month_to_date(today);
        let start = match start {
            Some(raw) => parse_date("start date", raw)?,
            None => default.start,
        };
        let end = match end {
            Some(raw) => parse_date("end date", raw)?,
            None => default.end,
        };
        Self::new(start, end)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

fn parse_date(key: &'static str, raw: &str) -> Result<NaiveDate, ConfigError> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).map_err(|_| ConfigError::InvalidDate {
        key,
        value: raw.to_string(),
    })
}

/// Unvalidated settings as gathered by the caller.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub token: Option<String>,
    pub base_id: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub source: SourceConfig,
    pub minutes: MinutesConfig,
    pub store: StoreTarget,
}

/// Everything one run needs, checked.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub source: SourceConfig,
    pub store: StoreConfig,
    pub window: DateWindow,
    pub minutes: MinutesConfig,
}

impl Settings {
    /// Fails on the first missing or invalid required setting, token first.
    pub fn validate(self, today: NaiveDate) -> Result<RunConfig, ConfigError> {
        let token = non_empty(self.token).ok_or(ConfigError::MissingToken)?;
        let base_id = non_empty(self.base_id).ok_or(ConfigError::MissingBaseId)?;
        if base_id == PLACEHOLDER_BASE_ID {
            return Err(ConfigError::PlaceholderBaseId(base_id));
        }

        let window = DateWindow::resolve(
            non_empty(self.start_date).as_deref(),
            non_empty(self.end_date).as_deref(),
            today,
        )?;

        check_url("source.base_url", &self.source.base_url)?;
        check_url("store.api_url", &self.store.api_url)?;

        Ok(RunConfig {
            source: self.source,
            store: StoreConfig {
                token,
                base_id,
                api_url: self.store.api_url,
                tables: self.store.tables,
            },
            window,
            minutes: self.minutes,
        })
    }
}

impl RunConfig {
    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            window: self.window,
            criteria: self.minutes.criteria(),
            label_policy: self.minutes.label_policy,
        }
    }

    pub fn trace_loaded(&self) {
        info!(
            portal = %self.source.base_url,
            start = %self.window.start(),
            end = %self.window.end(),
            base_id = %self.store.base_id,
            "Loaded run configuration"
        );
        debug!(?self, "Run configuration (full debug)");
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn check_url(key: &'static str, value: &str) -> Result<(), ConfigError> {
    reqwest::Url::parse(value)
        .map(|_| ())
        .map_err(|_| ConfigError::InvalidUrl {
            key,
            value: value.to_string(),
        })
}
