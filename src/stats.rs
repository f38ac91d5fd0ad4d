//! Aggregate statistics derived from the history log.
//!
//! Everything here is a pure view over the log: per-topic attempt counters,
//! the overall correct rate, and the "most frequent topics" ranking used by
//! the stats endpoint and surfaced in the analysis prompt context.

use std::collections::HashMap;

use crate::domain::{ProblemRecord, TopicStat, UserStats};

/// Fold the log into per-topic counters plus overall totals. Topics appear
/// in first-seen order over the given (newest-first) sequence.
pub fn aggregate(log: &[ProblemRecord]) -> UserStats {
  let mut topics: Vec<TopicStat> = Vec::new();
  let mut index: HashMap<&str, usize> = HashMap::new();

  for record in log {
    let i = match index.get(record.topic.as_str()) {
      Some(&i) => i,
      None => {
        index.insert(record.topic.as_str(), topics.len());
        topics.push(TopicStat {
          topic: record.topic.clone(),
          total_attempts: 0,
          correct_attempts: 0,
        });
        topics.len() - 1
      }
    };
    topics[i].total_attempts += 1;
    if record.is_correct {
      topics[i].correct_attempts += 1;
    }
  }

  let total_attempts: u32 = topics.iter().map(|t| t.total_attempts).sum();
  let correct_attempts: u32 = topics.iter().map(|t| t.correct_attempts).sum();
  let overall_correct_rate = if total_attempts == 0 {
    0.0
  } else {
    f64::from(correct_attempts) / f64::from(total_attempts) * 100.0
  };

  UserStats { total_attempts, correct_attempts, overall_correct_rate, topics }
}

/// Topics ranked by attempt count, descending; ties keep first-seen order
/// (stable sort).
pub fn most_frequent_topics(stats: &UserStats, limit: usize) -> Vec<String> {
  let mut ranked: Vec<&TopicStat> = stats.topics.iter().collect();
  ranked.sort_by(|a, b| b.total_attempts.cmp(&a.total_attempts));
  ranked.into_iter().take(limit).map(|t| t.topic.clone()).collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn record(topic: &str, correct: bool) -> ProblemRecord {
    ProblemRecord {
      id: format!("{}-{}", topic, correct),
      topic: topic.into(),
      problem: String::new(),
      solution: String::new(),
      is_correct: correct,
      timestamp: 0,
    }
  }

  #[test]
  fn empty_log_yields_zero_totals_and_zero_rate() {
    let stats = aggregate(&[]);
    assert_eq!(stats.total_attempts, 0);
    assert_eq!(stats.correct_attempts, 0);
    assert_eq!(stats.overall_correct_rate, 0.0);
    assert!(stats.topics.is_empty());
  }

  #[test]
  fn counts_per_topic_and_overall_rate() {
    let log = vec![
      record("algebra", true),
      record("algebra", false),
      record("geometry", true),
    ];
    let stats = aggregate(&log);

    let algebra = stats.topics.iter().find(|t| t.topic == "algebra").unwrap();
    assert_eq!((algebra.total_attempts, algebra.correct_attempts), (2, 1));
    let geometry = stats.topics.iter().find(|t| t.topic == "geometry").unwrap();
    assert_eq!((geometry.total_attempts, geometry.correct_attempts), (1, 1));

    assert_eq!(stats.total_attempts, 3);
    assert!((stats.overall_correct_rate - 200.0 / 3.0).abs() < 1e-9);
  }

  #[test]
  fn ranking_is_descending_with_stable_ties() {
    let log = vec![
      record("algebra", true),
      record("geometry", false),
      record("calculus", true),
      record("calculus", false),
    ];
    let stats = aggregate(&log);
    // calculus (2) first; algebra and geometry tie at 1 and keep the order
    // they were first seen in.
    assert_eq!(
      most_frequent_topics(&stats, 10),
      vec!["calculus".to_string(), "algebra".to_string(), "geometry".to_string()]
    );
    assert_eq!(most_frequent_topics(&stats, 1), vec!["calculus".to_string()]);
  }
}
