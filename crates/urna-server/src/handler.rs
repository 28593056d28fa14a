use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::info;
use urna_store::StoreError;
use urna_types::{BallotBox, BallotBoxId, BallotBoxStatus, ElectionId};

use crate::backend::Backend;

/// Shared state of the admin router.
#[derive(Clone, Debug)]
pub struct AdminState {
    pub backend: Backend,
    /// Ballot boxes served by terminal listeners.
    pub terminals: Vec<BallotBoxId>,
}

/// JSON view of a ballot box.
#[derive(Debug, Serialize)]
pub struct BallotBoxView {
    pub id: BallotBoxId,
    pub name: String,
    pub group: String,
    pub election: ElectionId,
    pub status: BallotBoxStatus,
    pub credential: Option<String>,
    pub election_active: bool,
    pub available_for_voting_session: bool,
}

impl BallotBoxView {
    fn new(ballot_box: BallotBox, election_active: bool) -> Self {
        Self {
            available_for_voting_session: ballot_box.is_available_for_voting_session(),
            credential: ballot_box.credential.as_ref().map(|c| c.to_hex()),
            id: ballot_box.id,
            name: ballot_box.name,
            group: ballot_box.group,
            election: ballot_box.election,
            status: ballot_box.status,
            election_active,
        }
    }
}

/// Store failures as HTTP responses.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl From<StoreError> for ApiError {
    fn from(error: StoreError) -> Self {
        let status = match &error {
            StoreError::NotFound { .. } => StatusCode::NOT_FOUND,
            StoreError::Transition(_)
            | StoreError::Duplicate { .. }
            | StoreError::UniqueViolation { .. } => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: error.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

/// Health check handler.
pub async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Info handler.
pub async fn info_handler(State(state): State<AdminState>) -> Json<Value> {
    Json(json!({
        "name": "urna-server",
        "version": env!("CARGO_PKG_VERSION"),
        "terminals": state.terminals,
    }))
}

/// Ballot box status and availability.
pub async fn ballot_box_handler(
    State(state): State<AdminState>,
    Path(id): Path<BallotBoxId>,
) -> ApiResult<BallotBoxView> {
    let ballot_box = state
        .backend
        .registry
        .ballot_box(id)?
        .ok_or_else(|| StoreError::not_found("ballot box", id))?;
    view(&state, ballot_box)
}

/// Emit a ballot box to its polling station.
pub async fn emit_handler(
    State(state): State<AdminState>,
    Path(id): Path<BallotBoxId>,
) -> ApiResult<BallotBoxView> {
    let ballot_box = state.backend.registry.emit_ballot_box(id)?;
    view(&state, ballot_box)
}

/// Return a ballot box; running sessions see `-1001` on their next line.
pub async fn return_handler(
    State(state): State<AdminState>,
    Path(id): Path<BallotBoxId>,
) -> ApiResult<BallotBoxView> {
    let ballot_box = state.backend.registry.return_ballot_box(id)?;
    view(&state, ballot_box)
}

/// Stop the session running on the box. The engine notices through its
/// watcher and ends the session with `-1023`.
pub async fn stop_session_handler(
    State(state): State<AdminState>,
    Path(id): Path<BallotBoxId>,
) -> ApiResult<Value> {
    if state.backend.registry.ballot_box(id)?.is_none() {
        return Err(StoreError::not_found("ballot box", id).into());
    }
    let stopped = state.backend.sessions.stop(id)?;
    if let Some(session) = &stopped {
        info!(ballot_box = %id, session = %session.token, "session stopped by operator");
    }
    Ok(Json(json!({
        "ballot_box": id,
        "stopped": stopped.map(|s| s.token.to_string()),
    })))
}

fn view(state: &AdminState, ballot_box: BallotBox) -> ApiResult<BallotBoxView> {
    let election_active = state
        .backend
        .registry
        .election(ballot_box.election)?
        .is_some_and(|e| e.is_active());
    Ok(Json(BallotBoxView::new(ballot_box, election_active)))
}
