//! Minimal Gemini client for our use-cases.
//!
//! We only call `models/{model}:generateContent` and read the first
//! candidate's text back out. Calls are instrumented and log model names,
//! latencies, and token usage (not contents).
//!
//! NOTE: We never log the API key; the key travels as a query parameter,
//! which is how the generativelanguage API authenticates.

use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, instrument};

use crate::analysis::{locate_json_object, validate};
use crate::config::Prompts;
use crate::domain::{AnalysisResult, Difficulty, ProblemPair, ProblemRecord};
use crate::error::Error;
use crate::extract::extract;
use crate::util::{fill_template, trunc_for_log};

#[derive(Clone)]
pub struct Gemini {
  pub client: reqwest::Client,
  pub api_key: String,
  pub base_url: String,
  pub model: String,
}

impl Gemini {
  /// Construct the client if we find GOOGLE_API_KEY; otherwise return None.
  /// No client-side timeout: the pipeline relies on the transport defaults
  /// and the UI offers manual retry.
  pub fn from_env() -> Option<Self> {
    let api_key = std::env::var("GOOGLE_API_KEY").ok()?;
    let base_url = std::env::var("GEMINI_BASE_URL")
      .unwrap_or_else(|_| "https://generativelanguage.googleapis.com/v1beta".into());
    let model = std::env::var("GEMINI_MODEL").unwrap_or_else(|_| "gemini-2.0-flash".into());

    let client = reqwest::Client::builder().build().ok()?;

    Some(Self { client, api_key, base_url, model })
  }

  /// One text-completion round-trip. Exactly one call per invocation; any
  /// failure is an upstream error carrying the service's reported message.
  #[instrument(level = "info", skip(self, prompt, generation_config), fields(model = %self.model, prompt_len = prompt.len()))]
  async fn generate_text(
    &self,
    prompt: &str,
    generation_config: Option<GenerationConfig>,
  ) -> Result<String, Error> {
    let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
    let with_config = generation_config.is_some();
    let req = GenerateContentRequest {
      contents: vec![Content { parts: vec![Part { text: prompt.to_string() }] }],
      generation_config,
      safety_settings: if with_config { Some(default_safety_settings()) } else { None },
    };

    let res = self
      .client
      .post(&url)
      .query(&[("key", self.api_key.as_str())])
      .header(USER_AGENT, "mathmind-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .json(&req)
      .send()
      .await
      .map_err(|e| Error::Upstream(e.to_string()))?;

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      let msg = extract_gemini_error(&body).unwrap_or(body);
      return Err(Error::Upstream(format!("Gemini HTTP {}: {}", status, msg)));
    }

    let body: GenerateContentResponse = res
      .json()
      .await
      .map_err(|e| Error::Upstream(format!("invalid response envelope: {}", e)))?;

    if let Some(usage) = &body.usage_metadata {
      info!(
        prompt_tokens = ?usage.prompt_token_count,
        candidate_tokens = ?usage.candidates_token_count,
        total_tokens = ?usage.total_token_count,
        "Gemini usage"
      );
    }

    let text = body
      .candidates
      .first()
      .and_then(|c| c.content.as_ref())
      .and_then(|c| c.parts.first())
      .and_then(|p| p.text.clone())
      .filter(|t| !t.trim().is_empty())
      .ok_or_else(|| Error::Upstream("invalid response format from generation service".into()))?;

    Ok(text)
  }

  // --- High-level helpers (domain-specialized) ---

  /// Generate a fresh problem/solution pair for a topic.
  #[instrument(level = "info", skip(self, prompts), fields(%topic, model = %self.model))]
  pub async fn generate_problem(&self, prompts: &Prompts, topic: &str) -> Result<ProblemPair, Error> {
    let prompt = fill_template(&prompts.generate_template, &[("topic", topic)]);
    let start = std::time::Instant::now();
    let result = self.generate_text(&prompt, None).await;
    let elapsed = start.elapsed();

    let raw = match result {
      Ok(raw) => {
        info!(?elapsed, "Model response received successfully");
        raw
      }
      Err(e) => {
        error!(?elapsed, error = %e, "Model call failed during problem generation");
        return Err(e);
      }
    };

    let pair = extract(&raw)?;
    info!(
      problem_preview = %trunc_for_log(&pair.problem, 40),
      solution_len = pair.solution.len(),
      "Problem generated"
    );
    Ok(pair)
  }

  /// Generate a variant of an existing problem at the requested tier.
  #[instrument(level = "info", skip(self, prompts, problem), fields(%topic, ?difficulty, problem_len = problem.len()))]
  pub async fn generate_similar(
    &self,
    prompts: &Prompts,
    problem: &str,
    topic: &str,
    difficulty: Difficulty,
  ) -> Result<ProblemPair, Error> {
    let prompt = fill_template(
      &prompts.similar_template,
      &[
        ("problem", problem),
        ("topic", topic),
        ("difficulty_line", prompts.difficulty_line(difficulty)),
      ],
    );
    let raw = self.generate_text(&prompt, Some(GenerationConfig::default())).await?;
    extract(&raw)
  }

  /// Ask for a learning-progress analysis of the history and validate the
  /// JSON-shaped reply.
  #[instrument(level = "info", skip(self, prompts, records), fields(record_count = records.len(), model = %self.model))]
  pub async fn analyze_history(
    &self,
    prompts: &Prompts,
    records: &[ProblemRecord],
  ) -> Result<AnalysisResult, Error> {
    let history_json = serde_json::to_string_pretty(records)
      .map_err(|e| Error::Validation(format!("serialize history: {}", e)))?;
    let prompt = fill_template(&prompts.analyze_template, &[("history_json", &history_json)]);

    let raw = self.generate_text(&prompt, None).await?;

    // The model wraps the object in prose more often than not.
    let span = locate_json_object(&raw)
      .ok_or_else(|| Error::Validation("no JSON object found in analysis reply".into()))?;
    let parsed: Value = serde_json::from_str(span)
      .map_err(|e| Error::Validation(format!("analysis reply is not valid JSON: {}", e)))?;
    validate(&parsed)
  }
}

// --- Wire DTOs (generativelanguage.googleapis.com, minimal subset) ---

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
  contents: Vec<Content>,
  #[serde(skip_serializing_if = "Option::is_none")]
  generation_config: Option<GenerationConfig>,
  #[serde(skip_serializing_if = "Option::is_none")]
  safety_settings: Option<Vec<SafetySetting>>,
}

#[derive(Serialize, Deserialize)]
struct Content {
  parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
  text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
  temperature: f32,
  top_k: u32,
  top_p: f32,
  max_output_tokens: u32,
}

impl Default for GenerationConfig {
  fn default() -> Self {
    Self { temperature: 0.7, top_k: 40, top_p: 0.95, max_output_tokens: 1024 }
  }
}

#[derive(Serialize)]
struct SafetySetting {
  category: &'static str,
  threshold: &'static str,
}

fn default_safety_settings() -> Vec<SafetySetting> {
  const THRESHOLD: &str = "BLOCK_MEDIUM_AND_ABOVE";
  [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
  ]
  .into_iter()
  .map(|category| SafetySetting { category, threshold: THRESHOLD })
  .collect()
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
  #[serde(default)]
  candidates: Vec<Candidate>,
  #[serde(default)]
  usage_metadata: Option<UsageMetadata>,
}

#[derive(Deserialize)]
struct Candidate {
  #[serde(default)]
  content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
  #[serde(default)]
  parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
  #[serde(default)]
  text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
  #[serde(default)]
  prompt_token_count: Option<u32>,
  #[serde(default)]
  candidates_token_count: Option<u32>,
  #[serde(default)]
  total_token_count: Option<u32>,
}

/// Try to extract a clean error message from a Gemini error body.
fn extract_gemini_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap {
    error: EObj,
  }
  #[derive(Deserialize)]
  struct EObj {
    message: String,
  }
  match serde_json::from_str::<EWrap>(body) {
    Ok(w) => Some(w.error.message),
    Err(_) => None,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::Error;

  fn test_client(base_url: String) -> Gemini {
    Gemini {
      client: reqwest::Client::new(),
      api_key: "test-key".into(),
      base_url,
      model: "gemini-2.0-flash".into(),
    }
  }

  fn candidate_body(text: &str) -> String {
    serde_json::json!({
      "candidates": [
        { "content": { "parts": [ { "text": text } ] } }
      ],
      "usageMetadata": { "promptTokenCount": 10, "candidatesTokenCount": 20, "totalTokenCount": 30 }
    })
    .to_string()
  }

  #[tokio::test]
  async fn generate_problem_extracts_marker_segments() {
    let mut server = mockito::Server::new_async().await;
    let _m = server
      .mock("POST", "/models/gemini-2.0-flash:generateContent")
      .match_query(mockito::Matcher::UrlEncoded("key".into(), "test-key".into()))
      .with_status(200)
      .with_header("content-type", "application/json")
      .with_body(candidate_body("문제: $x + 1 = 3$\n해답: $x = 2$"))
      .create_async()
      .await;

    let client = test_client(server.url());
    let pair = client.generate_problem(&Prompts::default(), "일차방정식").await.unwrap();
    assert_eq!(pair.problem, "$x + 1 = 3$");
    assert_eq!(pair.solution, "$x = 2$");
  }

  #[tokio::test]
  async fn upstream_error_message_is_surfaced() {
    let mut server = mockito::Server::new_async().await;
    let _m = server
      .mock("POST", "/models/gemini-2.0-flash:generateContent")
      .match_query(mockito::Matcher::Any)
      .with_status(429)
      .with_header("content-type", "application/json")
      .with_body(r#"{"error": {"message": "Resource has been exhausted"}}"#)
      .create_async()
      .await;

    let client = test_client(server.url());
    let err = client.generate_problem(&Prompts::default(), "미분").await.unwrap_err();
    match err {
      Error::Upstream(msg) => {
        assert!(msg.contains("429"));
        assert!(msg.contains("Resource has been exhausted"));
      }
      other => panic!("expected Upstream, got {:?}", other),
    }
  }

  #[tokio::test]
  async fn empty_candidate_list_is_an_upstream_error() {
    let mut server = mockito::Server::new_async().await;
    let _m = server
      .mock("POST", "/models/gemini-2.0-flash:generateContent")
      .with_status(200)
      .with_header("content-type", "application/json")
      .with_body(r#"{"candidates": []}"#)
      .create_async()
      .await;

    let client = test_client(server.url());
    let err = client.generate_problem(&Prompts::default(), "미분").await.unwrap_err();
    assert!(matches!(err, Error::Upstream(_)));
  }

  #[tokio::test]
  async fn markerless_reply_is_a_parse_error() {
    let mut server = mockito::Server::new_async().await;
    let _m = server
      .mock("POST", "/models/gemini-2.0-flash:generateContent")
      .with_status(200)
      .with_header("content-type", "application/json")
      .match_query(mockito::Matcher::Any)
      .with_body(candidate_body("마커 없이 자유롭게 답변했습니다."))
      .create_async()
      .await;

    let client = test_client(server.url());
    let err = client.generate_problem(&Prompts::default(), "미분").await.unwrap_err();
    assert!(matches!(err, Error::Parse(_)));
  }

  #[tokio::test]
  async fn analyze_history_locates_json_inside_prose() {
    let reply = r#"분석 결과는 다음과 같습니다:
{
  "strengths": [{"topic": "미분", "correctRate": "80", "totalProblems": 5}],
  "weaknesses": [],
  "recommendations": ["계속 연습하세요."],
  "overallStats": {"totalProblems": 5, "averageCorrectRate": 80, "mostFrequentTopics": ["미분"]}
}
도움이 되었기를 바랍니다."#;

    let mut server = mockito::Server::new_async().await;
    let _m = server
      .mock("POST", "/models/gemini-2.0-flash:generateContent")
      .with_status(200)
      .with_header("content-type", "application/json")
      .match_query(mockito::Matcher::Any)
      .with_body(candidate_body(reply))
      .create_async()
      .await;

    let client = test_client(server.url());
    let records = vec![ProblemRecord {
      id: "1".into(),
      topic: "미분".into(),
      problem: "p".into(),
      solution: "s".into(),
      is_correct: true,
      timestamp: 0,
    }];
    let out = client.analyze_history(&Prompts::default(), &records).await.unwrap();
    assert_eq!(out.strengths[0].correct_rate, 80.0);
    assert_eq!(out.overall_stats.total_problems, 5);
  }
}
