use serde::Serialize;
use std::str::FromStr;
use strum::{Display, EnumString};

/// Lifecycle states the PACS reports for an asynchronous job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, EnumString)]
pub enum JobState {
    Pending,
    Running,
    Success,
    Failure,
    Unknown,
}

impl JobState {
    /// Parse the raw `State` string of a PACS job payload. Anything the
    /// portal does not recognize maps to `Unknown`.
    pub fn parse(raw: &str) -> Self {
        Self::from_str(raw).unwrap_or(JobState::Unknown)
    }
}

/// Point-in-time status of a remote archive job, as returned by a poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobProgress {
    pub progress: u8,
    pub state: JobState,
}

/// Progress notification forwarded to a streaming client. Immutable snapshot,
/// never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProgressEvent {
    pub progress: u8,
    pub state: JobState,
}

impl From<JobProgress> for ProgressEvent {
    fn from(status: JobProgress) -> Self {
        Self {
            progress: status.progress,
            state: status.state,
        }
    }
}

/// Study summary exposed by `GET /api/v1/studies`.
#[derive(Debug, Clone, Serialize)]
pub struct StudySummary {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "LastUpdate")]
    pub last_update: String,
    #[serde(rename = "MedicalCardNumber")]
    pub medical_card_number: Option<String>,
    #[serde(rename = "StudyInstanceUID")]
    pub study_instance_uid: Option<String>,
    #[serde(rename = "PatientBirthDate")]
    pub patient_birth_date: Option<String>,
    #[serde(rename = "PatientName")]
    pub patient_name: Option<String>,
}

/// Series summary exposed by `GET /api/v1/studies/{id}/series`.
#[derive(Debug, Clone, Serialize)]
pub struct SeriesSummary {
    pub series_id: String,
    pub instance_number: Option<u32>,
    pub series_description: Option<String>,
    pub number_of_instances: Option<u32>,
}
