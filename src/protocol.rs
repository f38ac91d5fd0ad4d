//! Public request/response structs for the HTTP endpoints (serde ready).
//! Wire field names stay camelCase to match the original frontend.

use serde::{Deserialize, Serialize};

use crate::domain::{Difficulty, ProblemPair, ProblemRecord, TopicStat, UserStats};

#[derive(Debug, Deserialize)]
pub struct GenerateIn {
    pub topic: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimilarIn {
    pub problem: String,
    pub topic: String,
    #[serde(default)]
    pub difficulty: Difficulty,
}

/// Problem/solution pair returned by both generation endpoints.
#[derive(Serialize)]
pub struct ProblemOut {
    pub problem: String,
    pub solution: String,
}

impl From<ProblemPair> for ProblemOut {
    fn from(p: ProblemPair) -> Self {
        Self { problem: p.problem, solution: p.solution }
    }
}

/// History envelope, identical to the stored shape.
#[derive(Serialize)]
pub struct HistoryOut {
    pub problems: Vec<ProblemRecord>,
}

#[derive(Serialize)]
pub struct ClearedOut {
    pub cleared: bool,
}

/// Stats reply: aggregate counters plus the frequency ranking.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsOut {
    pub total_attempts: u32,
    pub correct_attempts: u32,
    pub overall_correct_rate: f64,
    pub topics: Vec<TopicStatOut>,
    pub most_frequent_topics: Vec<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicStatOut {
    pub topic: String,
    pub total_attempts: u32,
    pub correct_attempts: u32,
    pub correct_rate: f64,
}

impl StatsOut {
    pub fn from_stats(stats: UserStats) -> Self {
        let most_frequent_topics = crate::stats::most_frequent_topics(&stats, usize::MAX);
        Self {
            total_attempts: stats.total_attempts,
            correct_attempts: stats.correct_attempts,
            overall_correct_rate: stats.overall_correct_rate,
            most_frequent_topics,
            topics: stats.topics.into_iter().map(TopicStatOut::from).collect(),
        }
    }
}

impl From<TopicStat> for TopicStatOut {
    fn from(t: TopicStat) -> Self {
        let correct_rate = t.correct_rate();
        Self {
            topic: t.topic,
            total_attempts: t.total_attempts,
            correct_attempts: t.correct_attempts,
            correct_rate,
        }
    }
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}
