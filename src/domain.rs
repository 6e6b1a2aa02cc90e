//! Domain models: question kinds/sources, the question itself, and per-user progression state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How is the question answered and graded?
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QuestionKind {
  /// Pick exactly one option; graded by index match.
  MultipleChoice {
    options: Vec<String>,
    correct: usize,
  },
  /// Pick every option that applies; graded by set comparison.
  MultiSelect {
    options: Vec<String>,
    correct: Vec<usize>,
  },
  /// Free-text design answer. The server reveals a sample solution and
  /// the user reports their own pass/fail verdict.
  SelfJudged {
    sample_answer: String,
  },
}

/// Where did the question come from?
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum QuestionSource {
  LocalBank, // from user-provided TOML bank
  Seed,      // built-in question bank
}

/// A quiz item, addressed by module + lesson.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Question {
  pub id: String,
  pub module: String,     // e.g. "caching", "databases"
  pub lesson: String,     // e.g. "cache-invalidation"
  pub difficulty: String, // free-form (e.g., "intro", "core", "advanced")
  pub source: QuestionSource,

  pub prompt: String,
  #[serde(flatten)]
  pub kind: QuestionKind,

  /// XP granted when the answer is correct (or self-passed).
  pub xp_reward: u64,
  /// Shown after grading; empty when the author provided none.
  #[serde(default)]
  pub explanation: String,
}

/// Per-user progression state.
///
/// `level` is a cached derivation of `xp_points` and is recomputed on
/// every award; it is never mutated on its own. `longest_streak >=
/// current_streak` holds after every update.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserProgress {
  pub xp_points: u64,
  pub level: u32,
  pub current_streak: u32,
  pub longest_streak: u32,
  pub last_active_at: Option<DateTime<Utc>>,
}

impl UserProgress {
  /// Zero-valued state for a freshly seen user. XP 0 is level 1.
  pub fn new() -> Self {
    Self {
      xp_points: 0,
      level: 1,
      current_streak: 0,
      longest_streak: 0,
      last_active_at: None,
    }
  }
}

impl Default for UserProgress {
  fn default() -> Self {
    Self::new()
  }
}
