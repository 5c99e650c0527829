//! Typed failures for each pipeline stage.
//!
//! Configuration problems are raised before any client exists. Fetch and
//! upload failures are fatal for the run. Parse anomalies are not errors at
//! all: the parser degrades the affected motion and moves on.

use thiserror::Error;

use crate::model::RecordKind;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("AIRTABLE_TOKEN is not set")]
    MissingToken,

    #[error("AIRTABLE_BASE_ID is not set")]
    MissingBaseId,

    #[error("AIRTABLE_BASE_ID is still the placeholder value {0:?}")]
    PlaceholderBaseId(String),

    #[error("{key} is not a YYYY-MM-DD date: {value:?}")]
    InvalidDate { key: &'static str, value: String },

    #[error("start date {start} is after end date {end}")]
    InvertedWindow {
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },

    #[error("{key} is not a valid URL: {value:?}")]
    InvalidUrl { key: &'static str, value: String },
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} returned {status}: {body}")]
    Server {
        url: String,
        status: u16,
        body: String,
    },

    #[error("could not decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("malformed meeting descriptor: {reason}")]
    Descriptor { reason: String },

    #[error("cannot resolve document URL {url:?}")]
    InvalidUrl { url: String },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("table {table} rejected create with {status}: {body}")]
    Rejected {
        table: String,
        status: u16,
        body: String,
    },
}

/// A create failed partway through one meeting. Records already written stay.
#[derive(Debug, Error)]
#[error("creating {kind} record failed after {written} records were written: {source}")]
pub struct UploadError {
    pub kind: RecordKind,
    pub written: usize,
    #[source]
    pub source: StoreError,
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("upload for meeting {meeting_id} failed: {source}")]
    Upload {
        meeting_id: String,
        #[source]
        source: UploadError,
    },
}
