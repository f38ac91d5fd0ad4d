//! Validation of the learning-analysis reply.
//!
//! The model is asked for a JSON object but answers in prose more often
//! than not, so the analysis path first locates the first balanced `{...}`
//! span in the reply, parses it, and then coerces the loosely-typed result
//! into `AnalysisResult`. Numeric fields arrive as numbers or as numeric
//! strings depending on the model's mood; both are accepted, anything else
//! is a validation error.

use serde_json::Value;

use crate::domain::{AnalysisResult, OverallStats, TopicBreakdown};
use crate::error::Error;

/// Return the first balanced `{...}` span in `text`, skipping braces inside
/// JSON string literals. None when no complete object is present.
pub fn locate_json_object(text: &str) -> Option<&str> {
  let start = text.find('{')?;
  let mut depth = 0usize;
  let mut in_string = false;
  let mut escaped = false;

  for (i, ch) in text[start..].char_indices() {
    if in_string {
      if escaped {
        escaped = false;
      } else if ch == '\\' {
        escaped = true;
      } else if ch == '"' {
        in_string = false;
      }
      continue;
    }
    match ch {
      '"' => in_string = true,
      '{' => depth += 1,
      '}' => {
        depth -= 1;
        if depth == 0 {
          return Some(&text[start..start + i + ch.len_utf8()]);
        }
      }
      _ => {}
    }
  }
  None
}

/// Validate a parsed analysis object into `AnalysisResult`.
/// Pure: the input value is only read, never mutated.
pub fn validate(raw: &Value) -> Result<AnalysisResult, Error> {
  let obj = raw
    .as_object()
    .ok_or_else(|| Error::Validation("analysis payload is not a JSON object".into()))?;

  for key in ["strengths", "weaknesses", "recommendations", "overallStats"] {
    if !obj.contains_key(key) {
      return Err(Error::Validation(format!("missing required field '{}'", key)));
    }
  }

  let strengths = breakdown_list(&obj["strengths"], "strengths")?;
  let weaknesses = breakdown_list(&obj["weaknesses"], "weaknesses")?;
  let recommendations = string_list(&obj["recommendations"], "recommendations")?;

  let stats = obj["overallStats"]
    .as_object()
    .ok_or_else(|| Error::Validation("'overallStats' is not an object".into()))?;
  let overall_stats = OverallStats {
    total_problems: coerce_count(stats.get("totalProblems"), "overallStats.totalProblems")?,
    average_correct_rate: coerce_number(
      stats.get("averageCorrectRate"),
      "overallStats.averageCorrectRate",
    )?,
    // The prompt asks for this but older model replies omit it.
    most_frequent_topics: match stats.get("mostFrequentTopics") {
      Some(v) => string_list(v, "overallStats.mostFrequentTopics")?,
      None => Vec::new(),
    },
  };

  Ok(AnalysisResult { strengths, weaknesses, recommendations, overall_stats })
}

fn breakdown_list(value: &Value, field: &str) -> Result<Vec<TopicBreakdown>, Error> {
  let items = value
    .as_array()
    .ok_or_else(|| Error::Validation(format!("'{}' is not an array", field)))?;

  items
    .iter()
    .map(|item| {
      let entry = item
        .as_object()
        .ok_or_else(|| Error::Validation(format!("'{}' entry is not an object", field)))?;
      let topic = entry
        .get("topic")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::Validation(format!("'{}' entry has no topic", field)))?
        .to_string();
      Ok(TopicBreakdown {
        topic,
        correct_rate: coerce_number(entry.get("correctRate"), "correctRate")?,
        total_problems: coerce_count(entry.get("totalProblems"), "totalProblems")?,
      })
    })
    .collect()
}

fn string_list(value: &Value, field: &str) -> Result<Vec<String>, Error> {
  let items = value
    .as_array()
    .ok_or_else(|| Error::Validation(format!("'{}' is not an array", field)))?;
  items
    .iter()
    .map(|v| {
      v.as_str()
        .map(str::to_string)
        .ok_or_else(|| Error::Validation(format!("'{}' entry is not a string", field)))
    })
    .collect()
}

/// Accept a JSON number or a numeric string; everything else fails.
fn coerce_number(value: Option<&Value>, field: &str) -> Result<f64, Error> {
  let v = value.ok_or_else(|| Error::Validation(format!("missing numeric field '{}'", field)))?;
  match v {
    Value::Number(n) => n
      .as_f64()
      .ok_or_else(|| Error::Validation(format!("'{}' is not representable as f64", field))),
    Value::String(s) => s
      .trim()
      .parse::<f64>()
      .map_err(|_| Error::Validation(format!("'{}' is not numeric: {:?}", field, s))),
    _ => Err(Error::Validation(format!("'{}' is not numeric", field))),
  }
}

fn coerce_count(value: Option<&Value>, field: &str) -> Result<u32, Error> {
  let n = coerce_number(value, field)?;
  if !n.is_finite() || n < 0.0 {
    return Err(Error::Validation(format!("'{}' is not a valid count: {}", field, n)));
  }
  Ok(n.round() as u32)
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn sample() -> Value {
    json!({
      "strengths": [
        { "topic": "미분", "correctRate": 85, "totalProblems": 4 }
      ],
      "weaknesses": [
        { "topic": "확률", "correctRate": "40", "totalProblems": "5" }
      ],
      "recommendations": ["확률 기초 문제를 더 풀어보세요."],
      "overallStats": {
        "totalProblems": 9,
        "averageCorrectRate": "60.5",
        "mostFrequentTopics": ["미분", "확률"]
      }
    })
  }

  #[test]
  fn validates_and_coerces_numeric_strings() {
    let out = validate(&sample()).unwrap();
    assert_eq!(out.strengths[0].correct_rate, 85.0);
    assert_eq!(out.weaknesses[0].correct_rate, 40.0);
    assert_eq!(out.weaknesses[0].total_problems, 5);
    assert_eq!(out.overall_stats.average_correct_rate, 60.5);
  }

  #[test]
  fn does_not_mutate_the_input() {
    let raw = sample();
    let before = raw.clone();
    let _ = validate(&raw).unwrap();
    assert_eq!(raw, before);
  }

  #[test]
  fn missing_top_level_key_fails() {
    let mut raw = sample();
    raw.as_object_mut().unwrap().remove("weaknesses");
    let err = validate(&raw).unwrap_err();
    assert!(err.to_string().contains("weaknesses"));
  }

  #[test]
  fn non_coercible_numeric_fails() {
    let mut raw = sample();
    raw["strengths"][0]["correctRate"] = json!("아주 높음");
    assert!(matches!(validate(&raw).unwrap_err(), Error::Validation(_)));
  }

  #[test]
  fn validation_is_idempotent() {
    let first = validate(&sample()).unwrap();
    let reserialized = serde_json::to_value(&first).unwrap();
    let second = validate(&reserialized).unwrap();
    assert_eq!(first, second);
  }

  #[test]
  fn missing_most_frequent_topics_defaults_to_empty() {
    let mut raw = sample();
    raw["overallStats"].as_object_mut().unwrap().remove("mostFrequentTopics");
    let out = validate(&raw).unwrap();
    assert!(out.overall_stats.most_frequent_topics.is_empty());
  }

  #[test]
  fn locates_first_balanced_object_in_prose() {
    let text = "분석 결과입니다:\n{\"a\": {\"b\": 1}, \"c\": \"중괄호 } 포함\"} 추가 설명";
    let span = locate_json_object(text).unwrap();
    assert_eq!(span, "{\"a\": {\"b\": 1}, \"c\": \"중괄호 } 포함\"}");
    assert!(serde_json::from_str::<Value>(span).is_ok());
  }

  #[test]
  fn unbalanced_text_yields_none() {
    assert!(locate_json_object("no json here").is_none());
    assert!(locate_json_object("{\"open\": true").is_none());
  }

  #[test]
  fn picks_the_first_object_not_the_widest_span() {
    let text = "{\"first\": 1} 그리고 {\"second\": 2}";
    assert_eq!(locate_json_object(text).unwrap(), "{\"first\": 1}");
  }
}
