//! Core grading behaviors shared by the HTTP handlers.
//!
//! This includes:
//!   - Grading option answers (multiple choice by index, multi select by set comparison)
//!   - Revealing the sample solution for self-judged questions
//!   - Resolving self-reported verdicts for self-judged questions
//!
//! Deduction scoring mirrors the rubric style used elsewhere in the
//! app: start from 100, subtract per defect, clamp to [0, 100].

use std::collections::HashSet;

use tracing::{info, instrument, warn};

use crate::domain::{Question, QuestionKind};
use crate::state::AppState;

const MISSING_OPTION_PENALTY: f32 = 25.0;
const EXTRA_OPTION_PENALTY: f32 = 15.0;

/// Outcome of grading a submitted answer.
#[derive(Clone, Debug)]
pub struct Graded {
  pub correct: bool,
  pub score: f32,
  pub explanation: String,
  /// Set for self-judged questions: the sample solution the user
  /// compares their own answer against.
  pub sample_answer: Option<String>,
  /// XP to award; zero unless the answer was correct.
  pub xp_delta: u64,
}

impl Graded {
  fn wrong(explanation: String) -> Self {
    Self { correct: false, score: 0.0, explanation, sample_answer: None, xp_delta: 0 }
  }
}

/// What the client submitted for a question.
#[derive(Clone, Debug)]
pub struct Submission {
  pub selected: Option<usize>,
  pub selected_set: Option<Vec<usize>>,
}

#[instrument(level = "info", skip(state, submission), fields(%question_id))]
pub async fn evaluate_answer(state: &AppState, question_id: &str, submission: &Submission) -> Graded {
  let Some(q) = state.get_question(question_id).await else {
    return Graded::wrong(format!("Unknown questionId: {}", question_id));
  };

  match &q.kind {
    QuestionKind::MultipleChoice { options, correct } => grade_multiple_choice(&q, options, *correct, submission),
    QuestionKind::MultiSelect { options, correct } => grade_multi_select(&q, options, correct, submission),
    QuestionKind::SelfJudged { sample_answer } => {
      info!(target: "quiz", id = %q.id, "Revealing sample solution for self-judged question");
      Graded {
        correct: false,
        score: 0.0,
        explanation: "Compare your answer to the sample solution, then report your verdict via self_judge.".into(),
        sample_answer: Some(sample_answer.clone()),
        xp_delta: 0,
      }
    }
  }
}

/// Resolve a self-reported verdict. Only valid for self-judged
/// questions; XP is awarded only on a reported pass.
#[instrument(level = "info", skip(state), fields(%question_id, passed))]
pub async fn resolve_self_verdict(state: &AppState, question_id: &str, passed: bool) -> Result<Graded, String> {
  let Some(q) = state.get_question(question_id).await else {
    return Err(format!("Unknown questionId: {}", question_id));
  };
  let QuestionKind::SelfJudged { sample_answer } = &q.kind else {
    warn!(target: "quiz", id = %q.id, "self_judge called on a non-self-judged question");
    return Err("Question is not self-judged".into());
  };

  let score = if passed { 100.0 } else { 0.0 };
  Ok(Graded {
    correct: passed,
    score,
    explanation: if passed {
      "Self-reported pass.".into()
    } else {
      "Self-reported fail. Revisit the sample solution and try a similar question.".into()
    },
    sample_answer: Some(sample_answer.clone()),
    xp_delta: if passed { q.xp_reward } else { 0 },
  })
}

fn grade_multiple_choice(q: &Question, options: &[String], correct: usize, submission: &Submission) -> Graded {
  let Some(chosen) = submission.selected else {
    return Graded::wrong("No option selected.".into());
  };
  if chosen >= options.len() {
    return Graded::wrong(format!("Selected index {} out of range ({} options).", chosen, options.len()));
  }

  let is_correct = chosen == correct;
  let explanation = if is_correct {
    if q.explanation.is_empty() { "Correct.".into() } else { q.explanation.clone() }
  } else {
    let mut e = format!("Incorrect. The answer is option {}: {}.", correct + 1, options[correct]);
    if !q.explanation.is_empty() {
      e.push(' ');
      e.push_str(&q.explanation);
    }
    e
  };

  Graded {
    correct: is_correct,
    score: if is_correct { 100.0 } else { 0.0 },
    explanation,
    sample_answer: None,
    xp_delta: if is_correct { q.xp_reward } else { 0 },
  }
}

fn grade_multi_select(q: &Question, options: &[String], correct: &[usize], submission: &Submission) -> Graded {
  let Some(chosen) = &submission.selected_set else {
    return Graded::wrong("No options selected.".into());
  };
  if chosen.iter().any(|i| i >= &options.len()) {
    return Graded::wrong(format!("Selected index out of range ({} options).", options.len()));
  }

  let chosen_set: HashSet<usize> = chosen.iter().copied().collect();
  let correct_set: HashSet<usize> = correct.iter().copied().collect();

  let mut score = 100.0_f32;
  let mut notes: Vec<String> = vec![];
  for i in correct_set.difference(&chosen_set) {
    score -= MISSING_OPTION_PENALTY;
    notes.push(format!("Missed: {}", options[*i]));
  }
  for i in chosen_set.difference(&correct_set) {
    score -= EXTRA_OPTION_PENALTY;
    notes.push(format!("Should not apply: {}", options[*i]));
  }
  if score < 0.0 {
    score = 0.0;
  }

  let is_correct = chosen_set == correct_set;
  let explanation = if notes.is_empty() {
    if q.explanation.is_empty() { "All correct options selected.".into() } else { q.explanation.clone() }
  } else {
    let mut e = notes.join("; ");
    if !q.explanation.is_empty() {
      e.push_str(". ");
      e.push_str(&q.explanation);
    }
    e
  };

  Graded {
    correct: is_correct,
    score,
    explanation,
    sample_answer: None,
    xp_delta: if is_correct { q.xp_reward } else { 0 },
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::QuestionSource;

  fn mc_question() -> Question {
    Question {
      id: "t1".into(),
      module: "caching".into(),
      lesson: "eviction".into(),
      difficulty: "intro".into(),
      source: QuestionSource::Seed,
      prompt: "pick one".into(),
      kind: QuestionKind::MultipleChoice {
        options: vec!["FIFO".into(), "LRU".into(), "Random".into()],
        correct: 1,
      },
      xp_reward: 10,
      explanation: "LRU keeps hot keys.".into(),
    }
  }

  fn ms_question() -> Question {
    Question {
      id: "t2".into(),
      module: "scaling".into(),
      lesson: "sharding".into(),
      difficulty: "core".into(),
      source: QuestionSource::Seed,
      prompt: "pick all".into(),
      kind: QuestionKind::MultiSelect {
        options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
        correct: vec![0, 2],
      },
      xp_reward: 15,
      explanation: String::new(),
    }
  }

  fn submit_one(i: usize) -> Submission {
    Submission { selected: Some(i), selected_set: None }
  }

  fn submit_set(set: &[usize]) -> Submission {
    Submission { selected: None, selected_set: Some(set.to_vec()) }
  }

  #[test]
  fn multiple_choice_index_match() {
    let q = mc_question();
    let (options, correct) = match &q.kind {
      QuestionKind::MultipleChoice { options, correct } => (options.clone(), *correct),
      _ => unreachable!(),
    };

    let g = grade_multiple_choice(&q, &options, correct, &submit_one(1));
    assert!(g.correct);
    assert_eq!(g.score, 100.0);
    assert_eq!(g.xp_delta, 10);

    let g = grade_multiple_choice(&q, &options, correct, &submit_one(0));
    assert!(!g.correct);
    assert_eq!(g.xp_delta, 0);
    assert!(g.explanation.contains("option 2"));

    let g = grade_multiple_choice(&q, &options, correct, &submit_one(9));
    assert!(!g.correct);
    assert!(g.explanation.contains("out of range"));
  }

  #[test]
  fn multi_select_exact_match_required_for_correct() {
    let q = ms_question();
    let (options, correct) = match &q.kind {
      QuestionKind::MultiSelect { options, correct } => (options.clone(), correct.clone()),
      _ => unreachable!(),
    };

    let g = grade_multi_select(&q, &options, &correct, &submit_set(&[2, 0]));
    assert!(g.correct, "order must not matter");
    assert_eq!(g.score, 100.0);
    assert_eq!(g.xp_delta, 15);

    // One miss: partial credit but not correct, no XP.
    let g = grade_multi_select(&q, &options, &correct, &submit_set(&[0]));
    assert!(!g.correct);
    assert_eq!(g.score, 75.0);
    assert_eq!(g.xp_delta, 0);

    // One miss + one extra.
    let g = grade_multi_select(&q, &options, &correct, &submit_set(&[0, 1]));
    assert!(!g.correct);
    assert_eq!(g.score, 60.0);

    // Everything wrong: two misses and two extras.
    let g = grade_multi_select(&q, &options, &correct, &submit_set(&[1, 3]));
    assert_eq!(g.score, 20.0);
    assert!(!g.correct);

    let g = grade_multi_select(&q, &options, &correct, &submit_set(&[9]));
    assert!(!g.correct);
    assert!(g.explanation.contains("out of range"));
  }

  #[tokio::test]
  async fn self_judged_flow_awards_xp_only_on_pass() {
    let state = AppState::new();
    // q103 is a seeded self-judged question.
    let g = evaluate_answer(&state, "q103", &Submission { selected: None, selected_set: None }).await;
    assert!(!g.correct);
    assert!(g.sample_answer.is_some());
    assert_eq!(g.xp_delta, 0);

    let g = resolve_self_verdict(&state, "q103", true).await.expect("verdict");
    assert!(g.correct);
    assert_eq!(g.xp_delta, 20);

    let g = resolve_self_verdict(&state, "q103", false).await.expect("verdict");
    assert!(!g.correct);
    assert_eq!(g.xp_delta, 0);

    // Non-self-judged questions reject verdicts.
    assert!(resolve_self_verdict(&state, "q101", true).await.is_err());
  }

  #[tokio::test]
  async fn unknown_question_is_reported() {
    let state = AppState::new();
    let g = evaluate_answer(&state, "nope", &Submission { selected: None, selected_set: None }).await;
    assert!(!g.correct);
    assert!(g.explanation.contains("Unknown questionId"));
  }
}
