//! Imaging gateway client for an Orthanc-compatible PACS.
//!
//! A thin stateless wrapper over the PACS REST API. Every method maps to
//! exactly one HTTP request: no retries, no caching. Failures surface to the
//! caller immediately; polling cadence for asynchronous jobs is owned by
//! [`crate::services::archive`].

use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

use crate::models::dicom::{JobProgress, JobState, SeriesSummary, StudySummary};
use crate::services::archive::ArchiveBackend;

/// Client for the remote PACS REST API.
pub struct PacsClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct ArchiveJobCreated {
    #[serde(rename = "ID")]
    id: String,
}

#[derive(Deserialize)]
struct JobStatusDto {
    #[serde(rename = "Progress", default)]
    progress: u8,
    #[serde(rename = "State", default)]
    state: String,
}

/// Raw study record as returned by `GET /studies/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct StudyDetails {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "LastUpdate", default)]
    pub last_update: String,
    #[serde(rename = "MainDicomTags", default)]
    pub main_dicom_tags: HashMap<String, String>,
    #[serde(rename = "PatientMainDicomTags", default)]
    pub patient_main_dicom_tags: HashMap<String, String>,
    #[serde(rename = "Series", default)]
    pub series: Vec<String>,
}

/// Raw series record as returned by `GET /series/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct SeriesDetails {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "MainDicomTags", default)]
    pub main_dicom_tags: HashMap<String, String>,
    #[serde(rename = "NumberOfInstances", default)]
    pub number_of_instances: Option<u32>,
    #[serde(rename = "Instances", default)]
    pub instances: Vec<String>,
}

impl From<StudyDetails> for StudySummary {
    fn from(details: StudyDetails) -> Self {
        Self {
            id: details.id,
            last_update: details.last_update,
            medical_card_number: details.main_dicom_tags.get("MedicalCardNumber").cloned(),
            study_instance_uid: details.main_dicom_tags.get("StudyInstanceUID").cloned(),
            patient_birth_date: details
                .patient_main_dicom_tags
                .get("PatientBirthDate")
                .cloned(),
            patient_name: details.patient_main_dicom_tags.get("PatientName").cloned(),
        }
    }
}

impl From<SeriesDetails> for SeriesSummary {
    fn from(details: SeriesDetails) -> Self {
        Self {
            series_id: details.id,
            instance_number: details
                .main_dicom_tags
                .get("SeriesNumber")
                .and_then(|n| n.parse().ok()),
            series_description: details.main_dicom_tags.get("SeriesDescription").cloned(),
            number_of_instances: details.number_of_instances,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PacsError {
    #[error("PACS unreachable: {0}")]
    Unavailable(#[from] reqwest::Error),

    #[error("PACS rejected the request with status {0}")]
    Rejected(u16),

    #[error("not found on PACS: {0}")]
    NotFound(String),
}

impl PacsClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Non-success statuses become `Rejected`.
    fn accepted(response: reqwest::Response) -> Result<reqwest::Response, PacsError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(PacsError::Rejected(response.status().as_u16()))
        }
    }

    /// Like [`accepted`], but a 404-class status becomes `NotFound`.
    fn found(response: reqwest::Response, what: &str) -> Result<reqwest::Response, PacsError> {
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(PacsError::NotFound(what.to_string()));
        }
        Self::accepted(response)
    }

    /// Ask the PACS to build a compressed archive of a study. The remote
    /// operation runs asynchronously; the returned job id is polled with
    /// [`PacsClient::job_progress`].
    pub async fn create_archive_job(&self, study_id: &str) -> Result<String, PacsError> {
        let response = self
            .http
            .post(self.url(&format!("/studies/{study_id}/archive")))
            .json(&serde_json::json!({ "Asynchronous": true }))
            .send()
            .await?;

        let created: ArchiveJobCreated = Self::accepted(response)?.json().await?;
        Ok(created.id)
    }

    /// Current status of a previously created job. Missing fields in the
    /// PACS payload default to progress 0 / state `Unknown`.
    pub async fn job_progress(&self, job_id: &str) -> Result<JobProgress, PacsError> {
        let response = self
            .http
            .get(self.url(&format!("/jobs/{job_id}")))
            .send()
            .await?;

        let dto: JobStatusDto = Self::accepted(response)?.json().await?;
        Ok(JobProgress {
            progress: dto.progress,
            state: JobState::parse(&dto.state),
        })
    }

    /// Identifiers of every study the PACS holds.
    pub async fn list_studies(&self) -> Result<Vec<String>, PacsError> {
        let response = self.http.get(self.url("/studies")).send().await?;
        Ok(Self::accepted(response)?.json().await?)
    }

    pub async fn study_details(&self, study_id: &str) -> Result<StudyDetails, PacsError> {
        let response = self
            .http
            .get(self.url(&format!("/studies/{study_id}")))
            .send()
            .await?;

        Ok(Self::found(response, "study")?.json().await?)
    }

    pub async fn series_details(&self, series_id: &str) -> Result<SeriesDetails, PacsError> {
        let response = self
            .http
            .get(self.url(&format!("/series/{series_id}")))
            .send()
            .await?;

        Ok(Self::found(response, "series")?.json().await?)
    }

    /// Simplified DICOM tag map of one instance.
    pub async fn instance_tags(&self, instance_id: &str) -> Result<Value, PacsError> {
        let response = self
            .http
            .get(self.url(&format!("/instances/{instance_id}/simplified-tags")))
            .send()
            .await?;

        Ok(Self::found(response, "instance")?.json().await?)
    }

    pub async fn delete_study(&self, study_id: &str) -> Result<(), PacsError> {
        let response = self
            .http
            .delete(self.url(&format!("/studies/{study_id}")))
            .send()
            .await?;

        Self::found(response, "study")?;
        Ok(())
    }

    /// Synchronous archive download. Returns the upstream response so the
    /// caller can stream the zip body through without buffering it.
    pub async fn download_archive(&self, study_id: &str) -> Result<reqwest::Response, PacsError> {
        let response = self
            .http
            .get(self.url(&format!("/studies/{study_id}/archive")))
            .send()
            .await?;

        Self::found(response, "study")
    }

    /// Forward a raw DICOM file to the PACS instance store.
    pub async fn upload_instance(&self, dicom: Vec<u8>) -> Result<Value, PacsError> {
        let response = self
            .http
            .post(self.url("/instances"))
            .body(dicom)
            .send()
            .await?;

        Ok(Self::accepted(response)?.json().await?)
    }

    /// Reachability probe against the PACS system endpoint.
    pub async fn ping(&self) -> Result<(), PacsError> {
        let response = self.http.get(self.url("/system")).send().await?;
        Self::accepted(response)?;
        Ok(())
    }
}

impl ArchiveBackend for PacsClient {
    async fn create_archive_job(&self, study_id: &str) -> Result<String, PacsError> {
        PacsClient::create_archive_job(self, study_id).await
    }

    async fn job_progress(&self, job_id: &str) -> Result<JobProgress, PacsError> {
        PacsClient::job_progress(self, job_id).await
    }
}
