#![doc = "Record store clients for the CLI: the Airtable REST client and a dry-run store."]
//
//! # Record stores
//!
//! Both types implement [`RecordStore`] from `council-votes-core`:
//!
//! - [`AirtableClient`] creates rows through the Airtable REST API
//!   (`POST {api_url}/{base_id}/{table}` with a bearer token and a
//!   `{"fields": {...}}` body) and returns the new record's id.
//! - [`DryRunStore`] writes nothing. It logs each record and hands out
//!   sequential ids so the pipeline can run end to end against a live portal
//!   without spending store quota.

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};

use council_votes_core::config::StoreConfig;
use council_votes_core::contract::{MeetingFields, MotionFields, RecordStore, VoteFields};
use council_votes_core::error::{ConfigError, StoreError};
use council_votes_core::model::RecordId;

#[derive(Serialize)]
struct CreateRequest<'a, F> {
    fields: &'a F,
}

#[derive(Deserialize)]
struct CreatedRecord {
    id: RecordId,
}

struct TableEndpoint {
    name: String,
    url: Url,
}

pub struct AirtableClient {
    client: Client,
    token: String,
    meetings: TableEndpoint,
    motions: TableEndpoint,
    votes: TableEndpoint,
}

impl AirtableClient {
    pub fn new(config: &StoreConfig) -> Result<Self, ConfigError> {
        Self::with_client(config, Client::new())
    }

    pub fn with_client(config: &StoreConfig, client: Client) -> Result<Self, ConfigError> {
        let api = Url::parse(&config.api_url).map_err(|_| invalid_api_url(&config.api_url))?;
        let endpoint = |table: &str| -> Result<TableEndpoint, ConfigError> {
            let mut url = api.clone();
            url.path_segments_mut()
                .map_err(|_| invalid_api_url(&config.api_url))?
                .pop_if_empty()
                .push(&config.base_id)
                .push(table);
            Ok(TableEndpoint {
                name: table.to_string(),
                url,
            })
        };

        let client = AirtableClient {
            client,
            token: config.token.clone(),
            meetings: endpoint(&config.tables.meetings)?,
            motions: endpoint(&config.tables.motions)?,
            votes: endpoint(&config.tables.votes)?,
        };
        tracing::info!(
            token_set = !client.token.is_empty(),
            base_id = %config.base_id,
            "Initialized AirtableClient"
        );
        Ok(client)
    }

    async fn create<F>(&self, table: &TableEndpoint, fields: &F) -> Result<RecordId, StoreError>
    where
        F: Serialize + Sync,
    {
        let resp = self
            .client
            .post(table.url.clone())
            .bearer_auth(&self.token)
            .json(&CreateRequest { fields })
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = ?e, table = %table.name, "Airtable request failed");
                StoreError::Http(e)
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = match resp.text().await {
                Ok(body) => body,
                Err(e) => {
                    tracing::error!(
                        error = ?e,
                        table = %table.name,
                        "Failed to read Airtable error body"
                    );
                    format!("<unreadable body: {e}>")
                }
            };
            tracing::error!(
                status = %status,
                table = %table.name,
                body = %body,
                "Airtable rejected create"
            );
            return Err(StoreError::Rejected {
                table: table.name.clone(),
                status: status.as_u16(),
                body,
            });
        }

        let created: CreatedRecord = resp.json().await?;
        tracing::debug!(table = %table.name, record = %created.id, "Created Airtable record");
        Ok(created.id)
    }
}

fn invalid_api_url(value: &str) -> ConfigError {
    ConfigError::InvalidUrl {
        key: "store.api_url",
        value: value.to_string(),
    }
}

#[async_trait]
impl RecordStore for AirtableClient {
    async fn create_meeting(&self, fields: &MeetingFields) -> Result<RecordId, StoreError> {
        self.create(&self.meetings, fields).await
    }

    async fn create_motion(&self, fields: &MotionFields) -> Result<RecordId, StoreError> {
        self.create(&self.motions, fields).await
    }

    async fn create_vote(&self, fields: &VoteFields) -> Result<RecordId, StoreError> {
        self.create(&self.votes, fields).await
    }
}

/// Logs records instead of writing them.
#[derive(Debug, Default)]
pub struct DryRunStore {
    issued: AtomicUsize,
}

impl DryRunStore {
    fn record<F: Serialize>(&self, table: &str, fields: &F) -> RecordId {
        let n = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        match serde_json::to_string(fields) {
            Ok(json) => {
                tracing::info!(table, record = n, fields = %json, "[DRY-RUN] Would create record")
            }
            Err(e) => tracing::error!(table, error = ?e, "[DRY-RUN] Failed to serialize fields"),
        }
        RecordId::from(format!("dry-run-{n}"))
    }

    pub fn issued(&self) -> usize {
        self.issued.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecordStore for DryRunStore {
    async fn create_meeting(&self, fields: &MeetingFields) -> Result<RecordId, StoreError> {
        Ok(self.record("Meetings", fields))
    }

    async fn create_motion(&self, fields: &MotionFields) -> Result<RecordId, StoreError> {
        Ok(self.record("Motions", fields))
    }

    async fn create_vote(&self, fields: &VoteFields) -> Result<RecordId, StoreError> {
        Ok(self.record("Votes", fields))
    }
}
