//! Loading the optional question bank from TOML.
//!
//! See `QuizConfig` and `QuestionCfg` for the expected schema.

use serde::Deserialize;
use tracing::{error, info};

#[derive(Clone, Debug, Deserialize, Default)]
pub struct QuizConfig {
  #[serde(default)]
  pub questions: Vec<QuestionCfg>,
}

/// Question entry accepted in TOML configuration.
/// Exactly one of the answer branches (single / multi / sample) should
/// be filled; validation happens when the bank is merged into state.
#[derive(Clone, Debug, Deserialize)]
pub struct QuestionCfg {
  #[serde(default)] pub id: Option<String>,
  pub module: String,
  pub lesson: String,
  #[serde(default)] pub difficulty: Option<String>,
  pub prompt: String,

  // multiple_choice / multi_select
  #[serde(default)] pub options: Option<Vec<String>>,
  #[serde(default)] pub correct: Option<usize>,
  #[serde(default)] pub correct_set: Option<Vec<usize>>,
  // self_judged
  #[serde(default)] pub sample_answer: Option<String>,

  #[serde(default)] pub xp: Option<u64>,
  #[serde(default)] pub explanation: Option<String>,
}

/// Attempt to load `QuizConfig` from QUIZ_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_quiz_config_from_env() -> Option<QuizConfig> {
  let path = std::env::var("QUIZ_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<QuizConfig>(&s) {
      Ok(cfg) => {
        info!(target: "sysdrill", %path, count = cfg.questions.len(), "Loaded question bank (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "sysdrill", %path, error = %e, "Failed to parse TOML question bank");
        None
      }
    },
    Err(e) => {
      error!(target: "sysdrill", %path, error = %e, "Failed to read TOML question bank file");
      None
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_a_mixed_bank() {
    let src = r#"
      [[questions]]
      module = "caching"
      lesson = "eviction"
      prompt = "Which policy evicts the least recently used entry?"
      options = ["FIFO", "LRU", "Random"]
      correct = 1
      xp = 10

      [[questions]]
      id = "q-cap"
      module = "fundamentals"
      lesson = "cap-theorem"
      difficulty = "core"
      prompt = "Sketch the trade-off a partition forces."
      sample_answer = "During a partition you choose availability or consistency."
    "#;
    let cfg: QuizConfig = toml::from_str(src).expect("parse");
    assert_eq!(cfg.questions.len(), 2);
    assert_eq!(cfg.questions[0].correct, Some(1));
    assert!(cfg.questions[0].sample_answer.is_none());
    assert_eq!(cfg.questions[1].id.as_deref(), Some("q-cap"));
    assert!(cfg.questions[1].sample_answer.is_some());
  }
}
