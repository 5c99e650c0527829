//! Domain types shared by every pipeline stage.
//!
//! All of these live for a single run: they are built from the calendar
//! response or the minutes markup, uploaded, and dropped.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One council meeting as listed by the calendar endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Meeting {
    pub id: String,
    pub name: String,
    pub date: NaiveDate,
    pub url: String,
}

/// A meeting together with the documents published for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeetingDescriptor {
    pub meeting: Meeting,
    pub documents: Vec<DocumentLink>,
}

/// A single entry of a meeting's `MeetingDocumentLink` list.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct DocumentLink {
    #[serde(rename = "Type", default)]
    pub doc_type: String,
    #[serde(rename = "Format", default)]
    pub format: String,
    #[serde(rename = "Url", default)]
    pub url: String,
    #[serde(rename = "Language", alias = "Lang", default)]
    pub language: Option<String>,
}

/// Parses the date part of an eScribe `StartDate` such as `2025/10/01 09:30:00`.
pub fn parse_meeting_date(raw: &str) -> Option<NaiveDate> {
    let date_part = raw.trim().get(..10)?;
    NaiveDate::parse_from_str(date_part, "%Y/%m/%d")
        .or_else(|_| NaiveDate::parse_from_str(date_part, "%Y-%m-%d"))
        .ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum VoteValue {
    For,
    Against,
}

impl VoteValue {
    pub fn as_str(self) -> &'static str {
        match self {
            VoteValue::For => "For",
            VoteValue::Against => "Against",
        }
    }
}

impl fmt::Display for VoteValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vote {
    pub councillor: String,
    pub value: VoteValue,
}

/// One agenda item's decision with its recorded votes.
///
/// The for/against tallies are fixed when the motion is built and always
/// agree with `votes`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Motion {
    title: Option<String>,
    result: Option<String>,
    votes: Vec<Vote>,
    for_count: usize,
    against_count: usize,
}

impl Motion {
    pub fn new(title: Option<String>, result: Option<String>, votes: Vec<Vote>) -> Self {
        let for_count = votes.iter().filter(|v| v.value == VoteValue::For).count();
        let against_count = votes.len() - for_count;
        Self {
            title,
            result,
            votes,
            for_count,
            against_count,
        }
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn result(&self) -> Option<&str> {
        self.result.as_deref()
    }

    pub fn votes(&self) -> &[Vote] {
        &self.votes
    }

    pub fn for_count(&self) -> usize {
        self.for_count
    }

    pub fn against_count(&self) -> usize {
        self.against_count
    }

    /// Names recorded with the given value, in markup order.
    pub fn names_for(&self, value: VoteValue) -> Vec<&str> {
        self.votes
            .iter()
            .filter(|v| v.value == value)
            .map(|v| v.councillor.as_str())
            .collect()
    }
}

/// Identifier the records store hands back for a created record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for RecordId {
    fn from(id: String) -> Self {
        RecordId(id)
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        RecordId(id.to_string())
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Meeting,
    Motion,
    Vote,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RecordKind::Meeting => "meeting",
            RecordKind::Motion => "motion",
            RecordKind::Vote => "vote",
        })
    }
}
