//! Prompt configuration: Korean templates sent to the generation service,
//! overridable via a TOML file (`PROMPTS_CONFIG_PATH`).
//!
//! The defaults reproduce the production prompts. The `문제:` / `해답:`
//! marker lines are a wire contract shared with the extractor — changing
//! them in an override breaks parsing, so keep them intact.

use serde::Deserialize;
use tracing::{error, info};

#[derive(Clone, Debug, Deserialize, Default)]
pub struct PromptConfig {
  #[serde(default)]
  pub prompts: Prompts,
}

/// Templates used by the Gemini client. Placeholders: `{topic}`,
/// `{problem}`, `{difficulty_line}`, `{history_json}`.
#[derive(Clone, Debug, Deserialize)]
pub struct Prompts {
  pub generate_template: String,
  pub similar_template: String,
  pub analyze_template: String,
  // One line per difficulty tier, spliced into `{difficulty_line}`.
  pub difficulty_easy: String,
  pub difficulty_similar: String,
  pub difficulty_hard: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      generate_template: r#"다음 수학 주제에 대한 문제와 해답을 생성해주세요: {topic}

다음 형식으로 응답해주세요:
문제: [문제 내용]
해답: [해답과 풀이 과정]

주의사항:
1. 하나의 문제만 생성해주세요.
2. 문제와 해답은 반드시 위의 형식을 정확히 지켜주세요.
3. 추가 설명이나 다른 문제는 포함하지 마세요.
4. 수학 기호와 수식은 LaTeX 형식으로 작성해주세요:
   - 인라인 수식은 $...$ 안에 작성 (예: $x^2 + 2x + 1$)
   - 블록 수식은 $$...$$ 안에 작성 (예: $$\int_{0}^{1} x^2 dx$$)
5. 분수는 \frac{분자}{분모} 형식으로 작성해주세요.
6. 적분은 \int_{하한}^{상한} 형식으로 작성해주세요.
7. 제곱근은 \sqrt{내용} 형식으로 작성해주세요."#
        .into(),
      similar_template: r#"다음 수학 문제와 비슷한 난이도의 새로운 문제를 생성해주세요:

원본 문제: {problem}
주제: {topic}
{difficulty_line}

다음 형식으로 응답해주세요:
문제: [새로운 문제 내용]
해답: [해답과 풀이 과정]"#
        .into(),
      analyze_template: r#"다음은 사용자의 수학 문제 풀이 기록입니다. 각 문제는 주제, 정답 여부, 시간 정보를 포함합니다.
이 데이터를 바탕으로 사용자의 학습 분석을 해주세요.

문제 기록:
{history_json}

다음 형식으로 분석 결과를 JSON 형태로 제공해주세요. 반드시 유효한 JSON 형식을 지켜주세요:
{
  "strengths": [
    {
      "topic": "주제명",
      "correctRate": 정답률(0-100),
      "totalProblems": 총 문제 수
    }
  ],
  "weaknesses": [
    {
      "topic": "주제명",
      "correctRate": 정답률(0-100),
      "totalProblems": 총 문제 수
    }
  ],
  "recommendations": [
    "개선을 위한 구체적인 추천사항"
  ],
  "overallStats": {
    "totalProblems": 전체 문제 수,
    "averageCorrectRate": 전체 평균 정답률,
    "mostFrequentTopics": ["가장 자주 푼 주제들"]
  }
}

분석 시 다음 사항을 고려해주세요:
1. 정답률이 70% 이상인 주제는 강점으로 분류
2. 정답률이 50% 미만인 주제는 약점으로 분류
3. 추천사항은 구체적이고 실천 가능한 내용으로 작성
4. 전체 통계는 모든 문제를 종합적으로 분석
5. 반드시 유효한 JSON 형식을 지켜주세요"#
        .into(),
      difficulty_easy: "원본 문제보다 더 쉬운 문제를 만들어주세요.".into(),
      difficulty_similar: "원본 문제와 비슷한 난이도를 유지해주세요.".into(),
      difficulty_hard: "원본 문제보다 더 어려운 문제를 만들어주세요.".into(),
    }
  }
}

impl Prompts {
  pub fn difficulty_line(&self, difficulty: crate::domain::Difficulty) -> &str {
    use crate::domain::Difficulty::*;
    match difficulty {
      Easy => &self.difficulty_easy,
      Similar => &self.difficulty_similar,
      Hard => &self.difficulty_hard,
    }
  }
}

/// Attempt to load `PromptConfig` from PROMPTS_CONFIG_PATH. On any
/// parsing/IO error, returns None and the caller falls back to defaults.
pub fn load_prompt_config_from_env() -> Option<PromptConfig> {
  let path = std::env::var("PROMPTS_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<PromptConfig>(&s) {
      Ok(cfg) => {
        info!(target: "mathmind_backend", %path, "Loaded prompt config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "mathmind_backend", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "mathmind_backend", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::util::fill_template;

  #[test]
  fn default_templates_carry_the_marker_contract() {
    let p = Prompts::default();
    assert!(p.generate_template.contains("문제:"));
    assert!(p.generate_template.contains("해답:"));
    assert!(p.similar_template.contains("문제:"));
    assert!(p.similar_template.contains("해답:"));
  }

  #[test]
  fn latex_braces_survive_templating() {
    let p = Prompts::default();
    let filled = fill_template(&p.generate_template, &[("topic", "적분")]);
    assert!(filled.contains("적분"));
    assert!(!filled.contains("{topic}"));
    // LaTeX examples in the instructions must not be eaten by templating.
    assert!(filled.contains("\\frac{분자}{분모}"));
  }

  #[test]
  fn difficulty_lines_differ_per_tier() {
    use crate::domain::Difficulty;
    let p = Prompts::default();
    assert_ne!(p.difficulty_line(Difficulty::Easy), p.difficulty_line(Difficulty::Hard));
  }
}
