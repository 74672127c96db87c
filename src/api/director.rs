//! Director API handlers
//!
//! Submitting user messages (JSON or SSE) and reading session activity.

use crate::api::utils::{session_or_default, sse_response, validate_request, SessionQuery};
use crate::error::AppError;
use crate::orchestrator::constants::SSE_DONE_SIGNAL;
use crate::services::DirectorReply;
use crate::session::{ActivityEntry, ActivityEvent};
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    response::{Json, Response},
};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::task::JoinError;

/// A user message
#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    /// Message text
    pub message: String,
    /// Session (defaults to "default")
    #[serde(default)]
    pub session_id: Option<String>,
    /// User, for compliance and audit
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Activity of one session
#[derive(Debug, Serialize)]
pub struct ActivityResponse {
    /// Session
    pub session_id: String,
    /// Whether a run is in progress
    pub is_processing: bool,
    /// Entries, newest first
    pub activities: Vec<ActivityEntry>,
}

/// POST /api/director/messages - Run the full orchestration for one message
pub async fn send_message(
    State(state): State<AppState>,
    Json(request): Json<MessageRequest>,
) -> Result<Json<DirectorReply>, AppError> {
    let session_id = session_or_default(request.session_id);
    let reply = state
        .director
        .handle_message(&session_id, request.user_id.as_deref(), &request.message)
        .await?;
    Ok(Json(reply))
}

enum StreamStep {
    Activity(Result<ActivityEvent, RecvError>),
    Finished(Result<Result<DirectorReply, AppError>, JoinError>),
}

/// POST /api/director/stream - Same as `send_message`, streamed as SSE
///
/// Emits the session's activity entries as they happen, then the reply,
/// then `[DONE]`.
pub async fn stream_message(
    State(state): State<AppState>,
    Json(request): Json<MessageRequest>,
) -> Result<Response, AppError> {
    let MessageRequest {
        message,
        session_id,
        user_id,
    } = request;
    let max_len = state.config.read().await.max_request_length;
    validate_request(&message, max_len)?;

    let session_id = session_or_default(session_id);
    let mut events = state.sessions.subscribe();
    let director = state.director.clone();
    let run_session = session_id.clone();
    let mut run = tokio::spawn(async move {
        director
            .handle_message(&run_session, user_id.as_deref(), &message)
            .await
    });

    use async_stream::stream;

    let stream = stream! {
        loop {
            let step = tokio::select! {
                event = events.recv() => StreamStep::Activity(event),
                finished = &mut run => StreamStep::Finished(finished),
            };

            match step {
                StreamStep::Activity(Ok(event)) => {
                    if event.session_id == session_id {
                        yield serde_json::to_string(&event).map_err(|e| AppError::Internal(e.into()));
                    }
                }
                StreamStep::Activity(Err(RecvError::Lagged(skipped))) => {
                    tracing::warn!(skipped, "Activity stream lagged");
                }
                StreamStep::Activity(Err(RecvError::Closed)) => {
                    // Feed gone; wait for the run itself
                    let finished = (&mut run).await;
                    yield finish_payload(finished);
                    break;
                }
                StreamStep::Finished(finished) => {
                    // Flush entries published just before the run ended
                    loop {
                        match events.try_recv() {
                            Ok(event) if event.session_id == session_id => {
                                yield serde_json::to_string(&event).map_err(|e| AppError::Internal(e.into()));
                            }
                            Ok(_) | Err(TryRecvError::Lagged(_)) => continue,
                            Err(_) => break,
                        }
                    }
                    yield finish_payload(finished);
                    break;
                }
            }
        }
        yield Ok(SSE_DONE_SIGNAL.to_string());
    };

    sse_response(stream)
}

fn finish_payload(finished: Result<Result<DirectorReply, AppError>, JoinError>) -> Result<String, AppError> {
    match finished {
        Ok(Ok(reply)) => serde_json::to_string(&reply).map_err(|e| AppError::Internal(e.into())),
        Ok(Err(e)) => Err(e),
        Err(e) => Err(AppError::Internal(anyhow::anyhow!("Orchestration task aborted: {}", e))),
    }
}

/// GET /api/activity - Activity log of a session, newest first
pub async fn get_activity(
    State(state): State<AppState>,
    Query(query): Query<SessionQuery>,
) -> Json<ActivityResponse> {
    let session_id = session_or_default(query.session_id);
    let session = state.sessions.get_or_create(&session_id).await;
    Json(ActivityResponse {
        is_processing: session.is_processing(),
        activities: session.activity().recent(),
        session_id,
    })
}
