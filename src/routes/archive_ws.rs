use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use tracing::Instrument;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::services::archive::{self, ChannelClosed, SessionMessage, SessionTransport};

/// GET /api/v1/ws/archive-status — upgrade to the archive progress stream.
///
/// Protocol: the client sends study identifiers as text frames; the server
/// answers each with a sequence of `{"progress": n, "state": "..."}` frames
/// and a final `Job completed: <jobId>` text frame. Failures for a single
/// identifier arrive as `{"error": "..."}` and leave the stream open.
pub async fn archive_status(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let session_id = Uuid::new_v4();
    serve(socket, state)
        .instrument(tracing::info_span!("archive_session", %session_id))
        .await;
}

async fn serve(socket: WebSocket, state: AppState) {
    tracing::info!("archive status stream opened");
    let mut transport = WsTransport { socket };
    archive::run_session(state.pacs.as_ref(), &mut transport, &state.archive_tracker).await;
    tracing::info!("archive status stream closed");
}

/// [`SessionTransport`] over an accepted WebSocket.
struct WsTransport {
    socket: WebSocket,
}

impl SessionTransport for WsTransport {
    async fn next_request(&mut self) -> Option<String> {
        loop {
            match self.socket.recv().await? {
                Ok(Message::Text(text)) => return Some(text.to_string()),
                Ok(Message::Close(_)) | Err(_) => return None,
                // Pings are answered by the library; other frames carry no
                // study identifier.
                Ok(_) => continue,
            }
        }
    }

    async fn push(&mut self, msg: SessionMessage) -> Result<(), ChannelClosed> {
        let frame = match msg {
            SessionMessage::Progress(event) => match serde_json::to_string(&event) {
                Ok(payload) => Message::Text(payload.into()),
                Err(_) => return Err(ChannelClosed),
            },
            SessionMessage::Completed { job_id } => {
                Message::Text(format!("Job completed: {job_id}").into())
            }
            SessionMessage::Error { detail } => {
                Message::Text(serde_json::json!({ "error": detail }).to_string().into())
            }
        };

        self.socket.send(frame).await.map_err(|_| ChannelClosed)
    }
}
