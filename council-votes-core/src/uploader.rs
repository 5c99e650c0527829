//! Writes one meeting and everything parsed from its minutes to the store.
//!
//! Three tiers of creates, parents first: the meeting, then each motion
//! linked to the meeting's record id, then that motion's votes linked to the
//! motion's record id. Nothing is looked up, updated or deleted. The first
//! failed create stops the meeting; records already written stay behind.

use tracing::{error, info};

use crate::contract::{MeetingFields, MotionFields, RecordStore, VoteFields};
use crate::error::{StoreError, UploadError};
use crate::model::{Meeting, Motion, RecordId, RecordKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReport {
    pub meeting_record: RecordId,
    pub motions: Vec<MotionReport>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MotionReport {
    pub record: RecordId,
    pub title: Option<String>,
    pub votes: Vec<RecordId>,
}

impl UploadReport {
    pub fn vote_count(&self) -> usize {
        self.motions.iter().map(|m| m.votes.len()).sum()
    }

    /// Records created for this meeting, all tiers.
    pub fn records_written(&self) -> usize {
        1 + self.motions.len() + self.vote_count()
    }
}

pub fn meeting_fields(meeting: &Meeting) -> MeetingFields {
    MeetingFields {
        meeting_id: meeting.id.clone(),
        name: meeting.name.clone(),
        date: meeting.date,
        url: meeting.url.clone(),
    }
}

pub fn motion_fields(meeting_record: &RecordId, motion: &Motion) -> MotionFields {
    MotionFields {
        meeting: vec![meeting_record.clone()],
        title: motion.title().map(str::to_string),
        result: motion.result().map(str::to_string),
        for_count: motion.for_count(),
        against_count: motion.against_count(),
    }
}

pub async fn upload_meeting<S>(
    store: &S,
    meeting: &Meeting,
    motions: &[Motion],
) -> Result<UploadReport, UploadError>
where
    S: RecordStore + ?Sized,
{
    let mut written = 0usize;
    let fail = |kind: RecordKind, written: usize| {
        move |source: StoreError| {
            error!(
                meeting_id = %meeting.id,
                %kind,
                written,
                error = %source,
                "[UPLOAD][ERROR] create failed"
            );
            UploadError {
                kind,
                written,
                source,
            }
        }
    };

    info!(meeting_id = %meeting.id, motions = motions.len(), "[UPLOAD] Creating meeting record");
    let meeting_record = store
        .create_meeting(&meeting_fields(meeting))
        .await
        .map_err(fail(RecordKind::Meeting, written))?;
    written += 1;

    let mut motion_reports = Vec::with_capacity(motions.len());
    for motion in motions {
        let motion_record = store
            .create_motion(&motion_fields(&meeting_record, motion))
            .await
            .map_err(fail(RecordKind::Motion, written))?;
        written += 1;

        let mut vote_records = Vec::with_capacity(motion.votes().len());
        for vote in motion.votes() {
            let fields = VoteFields {
                motion: vec![motion_record.clone()],
                councillor: vote.councillor.clone(),
                vote: vote.value,
            };
            let record = store
                .create_vote(&fields)
                .await
                .map_err(fail(RecordKind::Vote, written))?;
            written += 1;
            vote_records.push(record);
        }

        info!(
            motion_record = %motion_record,
            for_count = motion.for_count(),
            against_count = motion.against_count(),
            "[UPLOAD] Motion and votes created"
        );
        motion_reports.push(MotionReport {
            record: motion_record,
            title: motion.title().map(str::to_string),
            votes: vote_records,
        });
    }

    info!(
        meeting_id = %meeting.id,
        meeting_record = %meeting_record,
        written,
        "[UPLOAD] Meeting uploaded"
    );
    Ok(UploadReport {
        meeting_record,
        motions: motion_reports,
    })
}
