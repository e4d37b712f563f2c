//! Archive streaming-session tests against a scripted gateway.
//!
//! The gateway and the peer transport are both in-memory fakes, so these
//! tests exercise the real tracking loop (polling cadence, terminal
//! conditions, cancellation) without a PACS or a WebSocket. The tokio clock
//! is paused; the 2-second poll interval elapses instantly.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use pacs_portal::models::dicom::{JobProgress, JobState, ProgressEvent};
use pacs_portal::services::archive::{
    run_session, ArchiveBackend, ArchiveTracker, ChannelClosed, SessionMessage, SessionTransport,
};
use pacs_portal::services::pacs::PacsError;

#[derive(Clone, Copy)]
enum PollStep {
    Status(u8, JobState),
    Fail,
}

use PollStep::{Fail, Status};

/// Scripted gateway: each poll consumes one step; the last step repeats
/// forever. Job ids are handed out as job-1, job-2, ...
struct ScriptedGateway {
    steps: Mutex<VecDeque<PollStep>>,
    polls: AtomicUsize,
    jobs_created: AtomicUsize,
    reject_creates: usize,
}

impl ScriptedGateway {
    fn new(steps: Vec<PollStep>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            polls: AtomicUsize::new(0),
            jobs_created: AtomicUsize::new(0),
            reject_creates: 0,
        }
    }

    fn polls(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }

    fn jobs_created(&self) -> usize {
        self.jobs_created.load(Ordering::SeqCst)
    }
}

impl ArchiveBackend for ScriptedGateway {
    async fn create_archive_job(&self, _study_id: &str) -> Result<String, PacsError> {
        let n = self.jobs_created.fetch_add(1, Ordering::SeqCst);
        if n < self.reject_creates {
            return Err(PacsError::Rejected(503));
        }
        Ok(format!("job-{}", n + 1))
    }

    async fn job_progress(&self, _job_id: &str) -> Result<JobProgress, PacsError> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        let mut steps = self.steps.lock().unwrap();
        let step = if steps.len() > 1 {
            steps.pop_front().unwrap()
        } else {
            *steps.front().expect("poll script must not be empty")
        };
        match step {
            Status(progress, state) => Ok(JobProgress { progress, state }),
            Fail => Err(PacsError::Rejected(500)),
        }
    }
}

/// Scripted peer: a queue of incoming study identifiers, a log of outgoing
/// messages, and an optional cutoff simulating a disconnect.
struct FakeChannel {
    requests: VecDeque<String>,
    sent: Vec<SessionMessage>,
    close_after_sends: Option<usize>,
}

impl FakeChannel {
    fn with_requests(requests: &[&str]) -> Self {
        Self {
            requests: requests.iter().map(|r| r.to_string()).collect(),
            sent: Vec::new(),
            close_after_sends: None,
        }
    }
}

impl SessionTransport for FakeChannel {
    async fn next_request(&mut self) -> Option<String> {
        self.requests.pop_front()
    }

    async fn push(&mut self, msg: SessionMessage) -> Result<(), ChannelClosed> {
        if let Some(limit) = self.close_after_sends {
            if self.sent.len() >= limit {
                return Err(ChannelClosed);
            }
        }
        self.sent.push(msg);
        Ok(())
    }
}

fn tracker() -> ArchiveTracker {
    ArchiveTracker::new(Duration::from_secs(2))
}

fn progress(progress: u8, state: JobState) -> SessionMessage {
    SessionMessage::Progress(ProgressEvent { progress, state })
}

fn completed(job_id: &str) -> SessionMessage {
    SessionMessage::Completed {
        job_id: job_id.to_string(),
    }
}

#[tokio::test(start_paused = true)]
async fn forwards_each_status_then_completion() {
    let gateway = ScriptedGateway::new(vec![
        Status(0, JobState::Running),
        Status(50, JobState::Running),
        Status(100, JobState::Success),
    ]);
    let mut channel = FakeChannel::with_requests(&["study-1"]);

    run_session(&gateway, &mut channel, &tracker()).await;

    assert_eq!(
        channel.sent,
        vec![
            progress(0, JobState::Running),
            progress(50, JobState::Running),
            progress(100, JobState::Success),
            completed("job-1"),
        ]
    );
    assert_eq!(gateway.polls(), 3);
}

#[tokio::test(start_paused = true)]
async fn mismatched_success_never_terminates_without_disconnect() {
    // Progress 100 but state still Running: not terminal. The loop only ends
    // because the peer goes away after 25 deliveries.
    let gateway = ScriptedGateway::new(vec![Status(100, JobState::Running)]);
    let mut channel = FakeChannel::with_requests(&["study-1"]);
    channel.close_after_sends = Some(25);

    run_session(&gateway, &mut channel, &tracker()).await;

    assert_eq!(gateway.polls(), 26);
    assert_eq!(channel.sent.len(), 25);
    assert!(channel
        .sent
        .iter()
        .all(|m| matches!(m, SessionMessage::Progress(_))));
}

#[tokio::test(start_paused = true)]
async fn remote_failure_ends_tracking_and_keeps_session_alive() {
    let gateway = ScriptedGateway::new(vec![
        Status(10, JobState::Running),
        Status(50, JobState::Failure),
        Status(100, JobState::Success),
    ]);
    let mut channel = FakeChannel::with_requests(&["study-1", "study-2"]);

    run_session(&gateway, &mut channel, &tracker()).await;

    assert_eq!(
        channel.sent,
        vec![
            progress(10, JobState::Running),
            progress(50, JobState::Failure),
            progress(100, JobState::Success),
            completed("job-2"),
        ]
    );
    assert_eq!(gateway.polls(), 3);
}

#[tokio::test(start_paused = true)]
async fn poll_error_is_reported_and_next_identifier_is_served() {
    let gateway = ScriptedGateway::new(vec![Fail, Status(100, JobState::Success)]);
    let mut channel = FakeChannel::with_requests(&["study-1", "study-2"]);

    run_session(&gateway, &mut channel, &tracker()).await;

    assert!(matches!(&channel.sent[0], SessionMessage::Error { .. }));
    assert_eq!(
        &channel.sent[1..],
        &[progress(100, JobState::Success), completed("job-2")]
    );
    assert_eq!(gateway.polls(), 2);
}

#[tokio::test(start_paused = true)]
async fn sequential_requests_produce_non_interleaved_sequences() {
    let gateway = ScriptedGateway::new(vec![
        Status(0, JobState::Running),
        Status(100, JobState::Success),
        Status(30, JobState::Running),
        Status(100, JobState::Success),
    ]);
    let mut channel = FakeChannel::with_requests(&["study-a", "study-b"]);

    run_session(&gateway, &mut channel, &tracker()).await;

    assert_eq!(
        channel.sent,
        vec![
            progress(0, JobState::Running),
            progress(100, JobState::Success),
            completed("job-1"),
            progress(30, JobState::Running),
            progress(100, JobState::Success),
            completed("job-2"),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn disconnect_mid_poll_stops_promptly() {
    let gateway = ScriptedGateway::new(vec![Status(40, JobState::Running)]);
    let mut channel = FakeChannel::with_requests(&["study-1"]);
    channel.close_after_sends = Some(3);

    run_session(&gateway, &mut channel, &tracker()).await;

    // Three deliveries, then the fourth poll's emit observes the closed
    // channel and the session winds down without touching the gateway again.
    assert_eq!(gateway.polls(), 4);
    assert_eq!(channel.sent.len(), 3);
}

#[tokio::test(start_paused = true)]
async fn blank_identifier_is_rejected_without_gateway_call() {
    let gateway = ScriptedGateway::new(vec![Status(100, JobState::Success)]);
    let mut channel = FakeChannel::with_requests(&["   ", "study-1"]);

    run_session(&gateway, &mut channel, &tracker()).await;

    assert!(matches!(&channel.sent[0], SessionMessage::Error { .. }));
    assert_eq!(
        &channel.sent[1..],
        &[progress(100, JobState::Success), completed("job-1")]
    );
    assert_eq!(gateway.jobs_created(), 1);
}

#[tokio::test(start_paused = true)]
async fn rejected_creation_is_reported_and_session_continues() {
    let mut gateway = ScriptedGateway::new(vec![Status(100, JobState::Success)]);
    gateway.reject_creates = 1;
    let mut channel = FakeChannel::with_requests(&["study-1", "study-2"]);

    run_session(&gateway, &mut channel, &tracker()).await;

    assert!(matches!(&channel.sent[0], SessionMessage::Error { .. }));
    assert_eq!(
        &channel.sent[1..],
        &[progress(100, JobState::Success), completed("job-2")]
    );
    // The failed attempt never reached the polling stage.
    assert_eq!(gateway.polls(), 1);
}
