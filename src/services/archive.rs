//! Archive-job tracking over per-client streaming sessions.
//!
//! One WebSocket connection maps to one [`run_session`] call. The session is
//! strictly serial: it receives a study identifier, asks the gateway to
//! create a remote archive job, then drives an [`ArchiveTracker`] that polls
//! the job at a fixed interval until a terminal state, forwarding every
//! status snapshot to the peer as it is observed. Only then is the next
//! identifier read. A disconnected peer aborts the in-flight loop at the
//! next emit; the remote job itself is never cancelled.

use std::time::Duration;
use tokio::time::sleep;

use crate::models::dicom::{JobProgress, JobState, ProgressEvent};
use crate::services::pacs::PacsError;

/// Gateway operations the tracker needs. [`crate::services::pacs::PacsClient`]
/// is the production implementation; tests substitute a scripted one.
#[allow(async_fn_in_trait)]
pub trait ArchiveBackend {
    async fn create_archive_job(&self, study_id: &str) -> Result<String, PacsError>;
    async fn job_progress(&self, job_id: &str) -> Result<JobProgress, PacsError>;
}

/// Peer-facing side of one streaming session.
#[allow(async_fn_in_trait)]
pub trait SessionTransport {
    /// Wait for the next study identifier. `None` means the peer went away.
    async fn next_request(&mut self) -> Option<String>;

    /// Push a message to the peer. `Err` means the peer went away.
    async fn push(&mut self, msg: SessionMessage) -> Result<(), ChannelClosed>;
}

/// Messages flowing to the streaming peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionMessage {
    Progress(ProgressEvent),
    Completed { job_id: String },
    Error { detail: String },
}

/// The peer disconnected. Normal termination for a session, not a failure.
#[derive(Debug, PartialEq, Eq)]
pub struct ChannelClosed;

/// How one tracking run ended.
#[derive(Debug)]
pub enum TrackOutcome {
    /// The remote job reached progress 100 with state `Success`.
    Succeeded,
    /// The remote job reported a terminal `Failure` state.
    Failed,
    /// A status poll failed; the error was already reported to the peer.
    PollFailed(PacsError),
}

/// Polls a single remote archive job at a fixed interval until terminal.
#[derive(Debug, Clone)]
pub struct ArchiveTracker {
    poll_interval: Duration,
}

impl ArchiveTracker {
    pub fn new(poll_interval: Duration) -> Self {
        Self { poll_interval }
    }

    /// Drive one job to a terminal state, forwarding every status snapshot.
    ///
    /// Success requires progress 100 AND state `Success`; a mismatch (e.g.
    /// progress 100 while still `Running`) keeps the loop polling. There is
    /// no iteration cap: a stalled remote job polls until the owning session
    /// goes away. Returns `Err(ChannelClosed)` as soon as the peer is gone;
    /// no further polls are issued past that point. A poll failure is
    /// reported to the peer and ends the run without tearing down the
    /// session.
    pub async fn track<B, T>(
        &self,
        backend: &B,
        transport: &mut T,
        job_id: &str,
    ) -> Result<TrackOutcome, ChannelClosed>
    where
        B: ArchiveBackend,
        T: SessionTransport,
    {
        loop {
            let status = match backend.job_progress(job_id).await {
                Ok(status) => status,
                Err(err) => {
                    tracing::warn!(job_id, error = %err, "archive job poll failed");
                    transport
                        .push(SessionMessage::Error {
                            detail: err.to_string(),
                        })
                        .await?;
                    return Ok(TrackOutcome::PollFailed(err));
                }
            };

            transport
                .push(SessionMessage::Progress(ProgressEvent::from(status)))
                .await?;

            if status.progress == 100 && status.state == JobState::Success {
                transport
                    .push(SessionMessage::Completed {
                        job_id: job_id.to_string(),
                    })
                    .await?;
                return Ok(TrackOutcome::Succeeded);
            }

            if status.state == JobState::Failure {
                return Ok(TrackOutcome::Failed);
            }

            sleep(self.poll_interval).await;
        }
    }
}

/// Serve one streaming peer: study identifiers in, progress events out.
///
/// Identifiers are handled one at a time; the next request is only read once
/// the previous tracking run has ended. Returning means the peer closed the
/// connection or disconnected. Jobs already created on the PACS are left to
/// finish on their own.
pub async fn run_session<B, T>(backend: &B, transport: &mut T, tracker: &ArchiveTracker)
where
    B: ArchiveBackend,
    T: SessionTransport,
{
    while let Some(request) = transport.next_request().await {
        let study_id = request.trim();
        if study_id.is_empty() {
            let rejected = transport
                .push(SessionMessage::Error {
                    detail: "empty study identifier".to_string(),
                })
                .await;
            if rejected.is_err() {
                return;
            }
            continue;
        }

        metrics::counter!("archive_jobs_total").increment(1);

        let job_id = match backend.create_archive_job(study_id).await {
            Ok(job_id) => job_id,
            Err(err) => {
                tracing::warn!(study_id, error = %err, "archive job creation failed");
                let reported = transport
                    .push(SessionMessage::Error {
                        detail: err.to_string(),
                    })
                    .await;
                if reported.is_err() {
                    return;
                }
                continue;
            }
        };

        tracing::info!(study_id, job_id = %job_id, "archive job created, tracking");

        match tracker.track(backend, transport, &job_id).await {
            Ok(TrackOutcome::Succeeded) => {
                metrics::counter!("archive_jobs_completed").increment(1);
                tracing::info!(job_id = %job_id, "archive job completed");
            }
            Ok(TrackOutcome::Failed) => {
                metrics::counter!("archive_jobs_failed").increment(1);
                tracing::warn!(job_id = %job_id, "archive job failed on the PACS");
            }
            Ok(TrackOutcome::PollFailed(_)) => {
                metrics::counter!("archive_jobs_failed").increment(1);
            }
            Err(ChannelClosed) => {
                tracing::debug!(job_id = %job_id, "peer disconnected mid-tracking");
                return;
            }
        }
    }
}
