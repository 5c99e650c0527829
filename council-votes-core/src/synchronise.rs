//! High-level pipeline: list → locate → fetch → parse → upload, one meeting at a time.
//!
//! # Responsibilities
//! - One calendar query for the configured window
//! - For each meeting in listed order: pick the minutes document, download
//!   it, parse motions and votes, and upload them through a [`RecordStore`]
//! - Skip meetings that have no minutes document, or whose minutes yield no
//!   motions, without failing the run
//! - Stop at the first fetch or upload failure. Meetings uploaded before the
//!   failure stay uploaded and later ones are never attempted
//!
//! Nothing here deduplicates: running the same window twice writes every
//! record twice.
//!
//! # Navigation
//! - Main entrypoint: [`synchronise`]
//! - Supporting types: [`PipelineSettings`], [`SynchroniseReport`]

use tracing::{error, info, warn};

use crate::config::DateWindow;
use crate::contract::{MeetingSource, RecordStore};
use crate::error::SyncError;
use crate::locate::{locate_minutes, DocumentCriteria};
use crate::parse::{parse_votes, LabelPolicy};
use crate::uploader::{upload_meeting, UploadReport};

/// The part of the run configuration the pipeline itself consumes.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub window: DateWindow,
    pub criteria: DocumentCriteria,
    pub label_policy: LabelPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MeetingOutcome {
    /// No document link matched the minutes criteria.
    SkippedNoMinutes,
    /// Minutes were fetched but contained no motion containers.
    SkippedNoMotions,
    Uploaded(UploadReport),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeetingReport {
    pub meeting_id: String,
    pub meeting_name: String,
    pub outcome: MeetingOutcome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SynchroniseReport {
    pub meetings: Vec<MeetingReport>,
}

impl SynchroniseReport {
    fn uploads(&self) -> impl Iterator<Item = &UploadReport> {
        self.meetings.iter().filter_map(|m| match &m.outcome {
            MeetingOutcome::Uploaded(report) => Some(report),
            _ => None,
        })
    }

    pub fn uploaded_meetings(&self) -> usize {
        self.uploads().count()
    }

    pub fn skipped_meetings(&self) -> usize {
        self.meetings.len() - self.uploaded_meetings()
    }

    pub fn motion_count(&self) -> usize {
        self.uploads().map(|u| u.motions.len()).sum()
    }

    pub fn vote_count(&self) -> usize {
        self.uploads().map(UploadReport::vote_count).sum()
    }
}

pub async fn synchronise<M, S>(
    settings: &PipelineSettings,
    source: &M,
    store: &S,
) -> Result<SynchroniseReport, SyncError>
where
    M: MeetingSource + ?Sized,
    S: RecordStore + ?Sized,
{
    info!(
        start = %settings.window.start(),
        end = %settings.window.end(),
        "[SCRAPE] Starting scrape pipeline"
    );

    let descriptors = source.list_meetings(&settings.window).await.map_err(|e| {
        error!(error = %e, "[SCRAPE][ERROR] Listing meetings failed");
        e
    })?;

    let mut report = SynchroniseReport::default();
    for descriptor in descriptors {
        let meeting = &descriptor.meeting;
        info!(
            meeting_id = %meeting.id,
            name = %meeting.name,
            date = %meeting.date,
            "[SCRAPE] Processing meeting"
        );
        if !settings.window.contains(meeting.date) {
            warn!(
                meeting_id = %meeting.id,
                date = %meeting.date,
                "[SCRAPE] Calendar listed a meeting outside the window"
            );
        }

        let outcome = match locate_minutes(&descriptor.documents, &settings.criteria) {
            None => {
                info!(meeting_id = %meeting.id, "[SCRAPE] No minutes document, skipping meeting");
                MeetingOutcome::SkippedNoMinutes
            }
            Some(link) => {
                let html = source.fetch_document(link).await.map_err(|e| {
                    error!(
                        meeting_id = %meeting.id,
                        error = %e,
                        "[SCRAPE][ERROR] Fetching minutes failed"
                    );
                    e
                })?;
                let motions = parse_votes(&html, settings.label_policy);
                if motions.is_empty() {
                    warn!(
                        meeting_id = %meeting.id,
                        url = %link.url,
                        "[SCRAPE] Minutes contained no motions, skipping upload"
                    );
                    MeetingOutcome::SkippedNoMotions
                } else {
                    info!(
                        meeting_id = %meeting.id,
                        motions = motions.len(),
                        "[SCRAPE] Found motions, uploading"
                    );
                    let uploaded = upload_meeting(store, meeting, &motions)
                        .await
                        .map_err(|source| SyncError::Upload {
                            meeting_id: meeting.id.clone(),
                            source,
                        })?;
                    MeetingOutcome::Uploaded(uploaded)
                }
            }
        };

        report.meetings.push(MeetingReport {
            meeting_id: meeting.id.clone(),
            meeting_name: meeting.name.clone(),
            outcome,
        });
    }

    info!(
        meetings = report.meetings.len(),
        uploaded = report.uploaded_meetings(),
        motions = report.motion_count(),
        votes = report.vote_count(),
        "[SCRAPE] Scrape pipeline finished"
    );
    Ok(report)
}
