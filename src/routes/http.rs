//! HTTP endpoint handlers. These are thin wrappers that forward to core
//! logic; each handler is instrumented and logs parameters and basic result
//! info. Pipeline failures map to responses via `Error::into_response`.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::{info, instrument};

use crate::domain::NewProblem;
use crate::error::{Error, ErrorBody};
use crate::logic;
use crate::protocol::*;
use crate::state::AppState;

fn bad_request(message: &str) -> (StatusCode, Json<ErrorBody>) {
  (StatusCode::BAD_REQUEST, Json(ErrorBody { message: message.into() }))
}

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse {
  Json(HealthOut { ok: true })
}

#[instrument(level = "info", skip(state, body), fields(topic = %body.topic))]
pub async fn http_post_generate(
  State(state): State<Arc<AppState>>,
  Json(body): Json<GenerateIn>,
) -> Result<Json<ProblemOut>, Response> {
  let topic = body.topic.trim();
  if topic.is_empty() {
    return Err(bad_request("topic is required").into_response());
  }
  match logic::generate_problem(&state, topic).await {
    Ok(pair) => {
      info!(target: "problem", %topic, problem_len = pair.problem.len(), "HTTP generate served");
      Ok(Json(pair.into()))
    }
    Err(e) => Err(e.into_response()),
  }
}

#[instrument(level = "info", skip(state, body), fields(topic = %body.topic, difficulty = ?body.difficulty, problem_len = body.problem.len()))]
pub async fn http_post_similar(
  State(state): State<Arc<AppState>>,
  Json(body): Json<SimilarIn>,
) -> Result<Json<ProblemOut>, Response> {
  let topic = body.topic.trim();
  let problem = body.problem.trim();
  if topic.is_empty() || problem.is_empty() {
    return Err(bad_request("problem and topic are required").into_response());
  }
  match logic::generate_similar(&state, problem, topic, body.difficulty).await {
    Ok(pair) => {
      info!(target: "problem", %topic, difficulty = ?body.difficulty, "HTTP similar served");
      Ok(Json(pair.into()))
    }
    Err(e) => Err(e.into_response()),
  }
}

#[instrument(level = "info", skip(state, body), fields(topic = %body.topic, correct = body.is_correct))]
pub async fn http_post_history(
  State(state): State<Arc<AppState>>,
  Json(body): Json<NewProblem>,
) -> Result<Json<crate::domain::ProblemRecord>, Error> {
  let record = logic::record_result(&state, body)?;
  Ok(Json(record))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_history(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  let problems = logic::history(&state);
  info!(target: "history", count = problems.len(), "HTTP history served");
  Json(HistoryOut { problems })
}

#[instrument(level = "info", skip(state))]
pub async fn http_delete_history(
  State(state): State<Arc<AppState>>,
) -> Result<Json<ClearedOut>, Error> {
  logic::clear_history(&state)?;
  Ok(Json(ClearedOut { cleared: true }))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_stats(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  let stats = logic::user_stats(&state);
  Json(StatsOut::from_stats(stats))
}

#[instrument(level = "info", skip(state))]
pub async fn http_post_analyze(
  State(state): State<Arc<AppState>>,
) -> Result<Json<crate::domain::AnalysisResult>, Error> {
  let analysis = logic::analyze(&state).await?;
  info!(target: "analysis", "HTTP analyze served");
  Ok(Json(analysis))
}
