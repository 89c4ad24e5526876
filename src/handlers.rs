// handlers.rs
use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::{PollError, RejectedTransition};
use crate::models::{
    validate_student_name, JoinRequest, Poll, PollDraft, RoleRequest, ViewerQuery, VoteRequest,
};
use crate::results::{tally, PollResults, TimerDisplay};
use crate::routes::AppState;
use crate::session::{
    JoinOutcome, PollCreated, RemovedStudent, SessionSnapshot, TickOutcome, VoteOutcome,
};

type ApiResult<T> = Result<Json<T>, PollError>;

#[derive(Debug, Serialize)]
pub struct JoinResponse {
    pub name: String,
    pub outcome: JoinOutcome,
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Full session state for rendering. Individual votes are withheld from
/// students while results are hidden.
pub async fn get_session(
    State(state): State<AppState>,
    Query(viewer): Query<ViewerQuery>,
) -> Json<SessionSnapshot> {
    let mut snapshot = state.session.lock().await.snapshot();
    if !viewer.is_teacher() && !snapshot.results_visible {
        snapshot.votes.clear();
    }
    Json(snapshot)
}

pub async fn select_role(
    State(state): State<AppState>,
    Json(req): Json<RoleRequest>,
) -> Json<Value> {
    state.session.lock().await.select_role(req.role);
    Json(json!({ "role": req.role }))
}

/// Add a student to the roster. Rejoining with a known name is not an error.
pub async fn join_student(
    State(state): State<AppState>,
    Json(req): Json<JoinRequest>,
) -> ApiResult<JoinResponse> {
    let name = validate_student_name(&req.name)?;
    let outcome = state.session.lock().await.join(&name, Utc::now())?;
    Ok(Json(JoinResponse { name, outcome }))
}

pub async fn remove_student(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<RemovedStudent> {
    let removed = state.session.lock().await.remove_student(name.trim())?;
    Ok(Json(removed))
}

pub async fn create_poll(
    State(state): State<AppState>,
    Json(draft): Json<PollDraft>,
) -> ApiResult<PollCreated> {
    draft.validate()?;
    let created = state.session.lock().await.create_poll(&draft, Utc::now())?;
    Ok(Json(created))
}

pub async fn end_poll(State(state): State<AppState>) -> ApiResult<Poll> {
    let poll = state.session.lock().await.end_poll()?;
    Ok(Json(poll))
}

pub async fn get_history(State(state): State<AppState>) -> Json<Vec<Poll>> {
    Json(state.session.lock().await.history().to_vec())
}

pub async fn submit_vote(
    State(state): State<AppState>,
    Json(req): Json<VoteRequest>,
) -> ApiResult<VoteOutcome> {
    let name = req.student_name.trim();
    let outcome = state
        .session
        .lock()
        .await
        .submit_vote_as(name, req.selected_option, Utc::now())?;
    Ok(Json(outcome))
}

/// Tallies for the active poll. Students only see them once results are visible.
pub async fn get_results(
    State(state): State<AppState>,
    Query(query): Query<ViewerQuery>,
) -> ApiResult<PollResults> {
    let session = state.session.lock().await;
    let results = tally(&session).ok_or(RejectedTransition::NoActivePoll)?;
    if !query.is_teacher() && !results.results_visible {
        return Err(RejectedTransition::ResultsHidden.into());
    }
    Ok(Json(results))
}

pub async fn show_results(State(state): State<AppState>) -> ApiResult<SessionSnapshot> {
    let mut session = state.session.lock().await;
    session.show_results_now()?;
    Ok(Json(session.snapshot()))
}

pub async fn hide_results(State(state): State<AppState>) -> ApiResult<SessionSnapshot> {
    let mut session = state.session.lock().await;
    session.hide_results()?;
    Ok(Json(session.snapshot()))
}

pub async fn get_timer(State(state): State<AppState>) -> Json<TimerDisplay> {
    let session = state.session.lock().await;
    Json(TimerDisplay::from_session(&session))
}

pub async fn pause_timer(State(state): State<AppState>) -> ApiResult<TimerDisplay> {
    let mut session = state.session.lock().await;
    session.pause_timer()?;
    Ok(Json(TimerDisplay::from_session(&session)))
}

pub async fn resume_timer(State(state): State<AppState>) -> ApiResult<TimerDisplay> {
    let mut session = state.session.lock().await;
    session.resume_timer()?;
    Ok(Json(TimerDisplay::from_session(&session)))
}

/// Manual tick for deployments that drive the clock externally
pub async fn tick(State(state): State<AppState>) -> ApiResult<TickOutcome> {
    let outcome = state.session.lock().await.tick()?;
    Ok(Json(outcome))
}
