//! Marker-based extraction of a problem/solution pair out of free-form
//! model text.
//!
//! The generation prompts instruct the model to answer as
//!   문제: [problem]
//!   해답: [solution]
//! and these two literal markers are the whole wire contract. The problem
//! segment runs from the first `문제:` to the first `해답:` after it; the
//! solution segment runs from that `해답:` to end of text. Both are trimmed.
//! Anything else (missing marker, empty segment, solution-only text) fails.

use crate::domain::ProblemPair;
use crate::error::Error;

/// Literal marker preceding the problem body.
pub const PROBLEM_MARKER: &str = "문제:";
/// Literal marker preceding the solution body.
pub const SOLUTION_MARKER: &str = "해답:";

pub fn extract(raw_text: &str) -> Result<ProblemPair, Error> {
  let p_start = raw_text
    .find(PROBLEM_MARKER)
    .ok_or_else(|| Error::Parse(format!("missing '{}' marker", PROBLEM_MARKER)))?;
  let after_problem = &raw_text[p_start + PROBLEM_MARKER.len()..];

  // The solution marker must come after the problem marker; an earlier one
  // (solution-first text) leaves no problem content and is rejected.
  let s_rel = after_problem
    .find(SOLUTION_MARKER)
    .ok_or_else(|| Error::Parse(format!("missing '{}' marker", SOLUTION_MARKER)))?;

  let problem = after_problem[..s_rel].trim();
  let solution = after_problem[s_rel + SOLUTION_MARKER.len()..].trim();

  if problem.is_empty() {
    return Err(Error::Parse("problem segment is empty".into()));
  }
  if solution.is_empty() {
    return Err(Error::Parse("solution segment is empty".into()));
  }

  Ok(ProblemPair { problem: problem.to_string(), solution: solution.to_string() })
}
