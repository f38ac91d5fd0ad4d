//! Domain models: solved-problem records, difficulty tiers, and the derived
//! statistics / analysis shapes. Wire names stay camelCase so the stored
//! history and the HTTP surface keep the original app's field names.

use serde::{Deserialize, Serialize};

/// One solved-problem entry in the user's history. Immutable once stored;
/// only removed by a full-history clear.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProblemRecord {
  pub id: String,
  pub topic: String,
  pub problem: String,
  pub solution: String,
  pub is_correct: bool,
  /// Epoch milliseconds. The canonical representation; ISO strings are
  /// neither read nor written.
  pub timestamp: i64,
}

/// Append input: everything the user supplies when recording a result.
/// Id and timestamp are assigned by the store.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProblem {
  pub topic: String,
  pub problem: String,
  pub solution: String,
  pub is_correct: bool,
}

/// Requested tier for a "similar problem" variant.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
  Easy,
  Similar,
  Hard,
}

impl Default for Difficulty {
  fn default() -> Self { Difficulty::Similar }
}

/// A generated problem/solution pair, straight out of the extractor.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct ProblemPair {
  pub problem: String,
  pub solution: String,
}

/// Derived per-topic attempt counters. Never authoritative; always
/// recomputed from the history log.
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TopicStat {
  pub topic: String,
  pub total_attempts: u32,
  pub correct_attempts: u32,
}

impl TopicStat {
  pub fn correct_rate(&self) -> f64 {
    if self.total_attempts == 0 {
      0.0
    } else {
      f64::from(self.correct_attempts) / f64::from(self.total_attempts) * 100.0
    }
  }
}

/// Aggregate view over the full log. Topics keep first-seen order.
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
  pub total_attempts: u32,
  pub correct_attempts: u32,
  pub overall_correct_rate: f64,
  pub topics: Vec<TopicStat>,
}

//
// Analysis shapes (ephemeral, produced per analysis request).
//

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TopicBreakdown {
  pub topic: String,
  /// 0–100, as reported by the upstream service.
  pub correct_rate: f64,
  pub total_problems: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OverallStats {
  pub total_problems: u32,
  pub average_correct_rate: f64,
  pub most_frequent_topics: Vec<String>,
}

/// The validated learning-progress analysis. The strength/weakness split is
/// the upstream service's classification; we only enforce the shape.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
  pub strengths: Vec<TopicBreakdown>,
  pub weaknesses: Vec<TopicBreakdown>,
  pub recommendations: Vec<String>,
  pub overall_stats: OverallStats,
}
