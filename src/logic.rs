//! Core behaviors behind the HTTP handlers: the three orchestrator
//! operations (generate, similar, analyze) plus the history/stats actions.
//!
//! One upstream call per invocation, no retry, no fallback content: every
//! failure surfaces as a typed error for the UI to present, and nothing is
//! committed to the history on a failed operation.

use tracing::{info, instrument};

use crate::domain::{AnalysisResult, Difficulty, NewProblem, ProblemPair, ProblemRecord, UserStats};
use crate::error::Error;
use crate::gemini::Gemini;
use crate::state::AppState;
use crate::stats;

fn upstream<'a>(state: &'a AppState) -> Result<&'a Gemini, Error> {
  state
    .gemini
    .as_ref()
    .ok_or_else(|| Error::Upstream("API key is not configured".into()))
}

/// Generate a fresh problem for a topic.
#[instrument(level = "info", skip(state), fields(%topic))]
pub async fn generate_problem(state: &AppState, topic: &str) -> Result<ProblemPair, Error> {
  upstream(state)?.generate_problem(&state.prompts, topic).await
}

/// Generate a variant of a given problem at the requested difficulty tier.
#[instrument(level = "info", skip(state, problem), fields(%topic, ?difficulty, problem_len = problem.len()))]
pub async fn generate_similar(
  state: &AppState,
  problem: &str,
  topic: &str,
  difficulty: Difficulty,
) -> Result<ProblemPair, Error> {
  upstream(state)?
    .generate_similar(&state.prompts, problem, topic, difficulty)
    .await
}

/// Record a solved problem once the user has marked it correct/incorrect.
#[instrument(level = "info", skip(state, input), fields(topic = %input.topic, correct = input.is_correct))]
pub fn record_result(state: &AppState, input: NewProblem) -> Result<ProblemRecord, Error> {
  state.history.append(input)
}

/// Full history, newest first.
#[instrument(level = "debug", skip(state))]
pub fn history(state: &AppState) -> Vec<ProblemRecord> {
  state.history.read_all()
}

/// Drop the whole history.
#[instrument(level = "info", skip(state))]
pub fn clear_history(state: &AppState) -> Result<(), Error> {
  state.history.clear()
}

/// Per-topic and overall statistics derived from the log.
#[instrument(level = "debug", skip(state))]
pub fn user_stats(state: &AppState) -> UserStats {
  stats::aggregate(&state.history.read_all())
}

/// Ask the model to analyze the recorded history.
#[instrument(level = "info", skip(state))]
pub async fn analyze(state: &AppState) -> Result<AnalysisResult, Error> {
  let log = state.history.read_all();
  if log.is_empty() {
    // Nothing to analyze; fail before spending an upstream call.
    return Err(Error::Validation("problem history is empty".into()));
  }
  let result = upstream(state)?.analyze_history(&state.prompts, &log).await?;
  info!(
    target: "analysis",
    strengths = result.strengths.len(),
    weaknesses = result.weaknesses.len(),
    recommendations = result.recommendations.len(),
    "Analysis validated"
  );
  Ok(result)
}
