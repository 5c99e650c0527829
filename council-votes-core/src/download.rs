//! eScribe portal client: meeting listing and minutes download.
//!
//! The calendar endpoint is an ASP.NET page method. Depending on the portal
//! it answers either with a bare JSON array or with the array wrapped in
//! `{"d": [...]}`; both are accepted. Every response is decoded into typed
//! [`MeetingDescriptor`]s here, so later stages never look at raw JSON.

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::config::{DateWindow, SourceConfig};
use crate::contract::MeetingSource;
use crate::error::FetchError;
use crate::model::{parse_meeting_date, DocumentLink, Meeting, MeetingDescriptor};

const CALENDAR_PATH: &str = "MeetingsCalendarView.aspx/GetCalendarMeetings";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CalendarQuery {
    calendar_start_date: String,
    calendar_end_date: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CalendarResponse {
    Wrapped { d: Vec<RawMeeting> },
    Bare(Vec<RawMeeting>),
}

impl CalendarResponse {
    fn into_meetings(self) -> Vec<RawMeeting> {
        match self {
            CalendarResponse::Wrapped { d } => d,
            CalendarResponse::Bare(meetings) => meetings,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(i64),
}

#[derive(Debug, Deserialize)]
struct RawMeeting {
    #[serde(rename = "ID")]
    id: RawId,
    #[serde(rename = "MeetingName", default)]
    name: String,
    #[serde(rename = "StartDate")]
    start_date: String,
    #[serde(rename = "Url", default)]
    url: String,
    #[serde(rename = "MeetingDocumentLink", default)]
    documents: Option<Vec<DocumentLink>>,
}

impl TryFrom<RawMeeting> for MeetingDescriptor {
    type Error = FetchError;

    fn try_from(raw: RawMeeting) -> Result<Self, Self::Error> {
        let id = match raw.id {
            RawId::Text(id) => id,
            RawId::Number(id) => id.to_string(),
        };
        let date = parse_meeting_date(&raw.start_date).ok_or_else(|| FetchError::Descriptor {
            reason: format!("meeting {id} has unreadable StartDate {:?}", raw.start_date),
        })?;
        Ok(MeetingDescriptor {
            meeting: Meeting {
                id,
                name: raw.name,
                date,
                url: raw.url,
            },
            documents: raw.documents.unwrap_or_default(),
        })
    }
}

/// Decodes a calendar response body.
pub fn decode_calendar(url: &str, body: &str) -> Result<Vec<MeetingDescriptor>, FetchError> {
    let response: CalendarResponse =
        serde_json::from_str(body).map_err(|source| FetchError::Decode {
            url: url.to_string(),
            source,
        })?;
    response
        .into_meetings()
        .into_iter()
        .map(MeetingDescriptor::try_from)
        .collect()
}

/// [`MeetingSource`] backed by a live eScribe portal.
pub struct EscribeClient {
    client: Client,
    base_url: Url,
    utc_offset: String,
}

impl EscribeClient {
    pub fn new(config: &SourceConfig) -> Result<Self, FetchError> {
        Self::with_client(config, Client::new())
    }

    /// Uses a caller-built HTTP client, e.g. one with proxies disabled.
    pub fn with_client(config: &SourceConfig, client: Client) -> Result<Self, FetchError> {
        let mut base = config.base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base).map_err(|_| FetchError::InvalidUrl {
            url: base.clone(),
        })?;
        info!(base_url = %base_url, "Initialized eScribe client");
        Ok(Self {
            client,
            base_url,
            utc_offset: config.utc_offset.clone(),
        })
    }

    /// Absolute URL for a document link; relative links hang off the portal root.
    pub fn document_url(&self, link: &DocumentLink) -> Result<Url, FetchError> {
        self.base_url
            .join(link.url.trim())
            .map_err(|_| FetchError::InvalidUrl {
                url: link.url.clone(),
            })
    }

    fn calendar_query(&self, window: &DateWindow) -> CalendarQuery {
        CalendarQuery {
            calendar_start_date: format!("{}T00:00:00{}", window.start(), self.utc_offset),
            calendar_end_date: format!("{}T23:59:59{}", window.end(), self.utc_offset),
        }
    }

    async fn read_success(url: &str, resp: reqwest::Response) -> Result<String, FetchError> {
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            error!(status = %status, url = %url, "eScribe returned an error status");
            return Err(FetchError::Server {
                url: url.to_string(),
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }
}

#[async_trait]
impl MeetingSource for EscribeClient {
    async fn list_meetings(
        &self,
        window: &DateWindow,
    ) -> Result<Vec<MeetingDescriptor>, FetchError> {
        let url = self
            .base_url
            .join(CALENDAR_PATH)
            .map_err(|_| FetchError::InvalidUrl {
                url: CALENDAR_PATH.to_string(),
            })?;
        let query = self.calendar_query(window);
        info!(
            url = %url,
            start = %query.calendar_start_date,
            end = %query.calendar_end_date,
            "[SCRAPE] Querying meeting calendar"
        );

        let resp = self
            .client
            .post(url.clone())
            .json(&query)
            .send()
            .await
            .map_err(|e| {
                error!(error = ?e, url = %url, "Calendar request failed");
                FetchError::Http(e)
            })?;
        let body = Self::read_success(url.as_str(), resp).await?;
        let meetings = decode_calendar(url.as_str(), &body)?;
        info!(count = meetings.len(), "[SCRAPE] Calendar listed meetings");
        Ok(meetings)
    }

    async fn fetch_document(&self, link: &DocumentLink) -> Result<String, FetchError> {
        let url = self.document_url(link)?;
        info!(url = %url, "[SCRAPE] Fetching minutes document");
        let resp = self.client.get(url.clone()).send().await.map_err(|e| {
            error!(error = ?e, url = %url, "Document request failed");
            FetchError::Http(e)
        })?;
        let body = Self::read_success(url.as_str(), resp).await?;
        info!(url = %url, bytes = body.len(), "[SCRAPE] Fetched minutes document");
        Ok(body)
    }
}
