//! # contract: collaborator interfaces for the scrape pipeline
//!
//! The pipeline talks to two outside systems, both hidden behind a trait so
//! the orchestration in [`crate::synchronise`] can run against real clients,
//! a dry-run store, or `mockall` mocks:
//!
//! - [`MeetingSource`]: lists meetings for a date window and fetches minutes
//!   markup. Implemented by [`crate::download::EscribeClient`].
//! - [`RecordStore`]: creates one record in one of the three linked tables
//!   and returns its id. Implemented in the CLI crate.
//!
//! The `*Fields` structs serialise to the exact column names of the store.
//! Mocks are exported under the default `test-export-mocks` feature.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

use crate::config::DateWindow;
use crate::error::{FetchError, StoreError};
use crate::model::{DocumentLink, MeetingDescriptor, RecordId, VoteValue};

/// Columns of a row in the Meetings table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MeetingFields {
    #[serde(rename = "Meeting ID")]
    pub meeting_id: String,
    #[serde(rename = "Meeting Name")]
    pub name: String,
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "URL")]
    pub url: String,
}

/// Columns of a row in the Motions table. Absent title or result is sent as null.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MotionFields {
    #[serde(rename = "Meeting")]
    pub meeting: Vec<RecordId>,
    #[serde(rename = "Motion Title")]
    pub title: Option<String>,
    #[serde(rename = "Result")]
    pub result: Option<String>,
    #[serde(rename = "For Count")]
    pub for_count: usize,
    #[serde(rename = "Against Count")]
    pub against_count: usize,
}

/// Columns of a row in the Votes table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VoteFields {
    #[serde(rename = "Motion")]
    pub motion: Vec<RecordId>,
    #[serde(rename = "Councillor")]
    pub councillor: String,
    #[serde(rename = "Vote")]
    pub vote: VoteValue,
}

/// Source of meetings and their minutes documents.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait MeetingSource: Send + Sync {
    /// Issue one calendar query for the window and return the meetings in
    /// the order the endpoint lists them.
    async fn list_meetings(&self, window: &DateWindow)
        -> Result<Vec<MeetingDescriptor>, FetchError>;

    /// Download the markup behind a document link.
    async fn fetch_document(&self, link: &DocumentLink) -> Result<String, FetchError>;
}

/// Linked-table store. Every call is an unconditional create.
///
/// Each successful call consumes one unit of the store's API quota.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn create_meeting(&self, fields: &MeetingFields) -> Result<RecordId, StoreError>;

    async fn create_motion(&self, fields: &MotionFields) -> Result<RecordId, StoreError>;

    async fn create_vote(&self, fields: &VoteFields) -> Result<RecordId, StoreError>;
}
