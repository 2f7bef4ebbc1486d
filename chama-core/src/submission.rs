use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{FacilitatorId, GroupId, MeetingTotals, SubmissionId};

/// Visible state of a reconciliation event.
///
/// `Pending` is the in-flight state: a crash mid-sequence leaves the
/// submission pending or failed, never falsely submitted.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    Pending,
    Submitted,
    Failed,
}

impl SubmissionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SubmissionStatus::Pending => "pending",
            SubmissionStatus::Submitted => "submitted",
            SubmissionStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubmissionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(SubmissionStatus::Pending),
            "submitted" => Ok(SubmissionStatus::Submitted),
            "failed" => Ok(SubmissionStatus::Failed),
            other => Err(format!("unknown submission status: {other}")),
        }
    }
}

/// Immutable record of one reconciliation event, unique per (group, date).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub id: SubmissionId,
    pub group: GroupId,
    pub date: NaiveDate,
    pub facilitator: FacilitatorId,
    pub totals: MeetingTotals,
    pub status: SubmissionStatus,
    pub recorded_at: DateTime<Utc>,
}
