//! Public protocol structs for the HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Question, QuestionKind, QuestionSource, UserProgress};
use crate::progression;

/// Question kind as exposed to clients (no answers attached).
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKindOut {
    MultipleChoice,
    MultiSelect,
    SelfJudged,
}

/// DTO for question delivery. Deliberately withholds the correct
/// indices and the sample solution; those only come back through
/// grading.
#[derive(Debug, Serialize)]
pub struct QuestionOut {
    pub id: String,
    pub module: String,
    pub lesson: String,
    pub difficulty: String,
    pub source: QuestionSource,
    pub kind: QuestionKindOut,

    pub prompt: String,
    pub options: Vec<String>,
    #[serde(rename = "xpReward")]
    pub xp_reward: u64,
}

/// Convert full `Question` (internal) to the public DTO.
pub fn to_out(q: &Question) -> QuestionOut {
    let (kind, options) = match &q.kind {
        QuestionKind::MultipleChoice { options, .. } => (QuestionKindOut::MultipleChoice, options.clone()),
        QuestionKind::MultiSelect { options, .. } => (QuestionKindOut::MultiSelect, options.clone()),
        QuestionKind::SelfJudged { .. } => (QuestionKindOut::SelfJudged, vec![]),
    };
    QuestionOut {
        id: q.id.clone(),
        module: q.module.clone(),
        lesson: q.lesson.clone(),
        difficulty: q.difficulty.clone(),
        source: q.source.clone(),
        kind,
        prompt: q.prompt.clone(),
        options,
        xp_reward: q.xp_reward,
    }
}

/// Progression snapshot returned wherever state changes.
#[derive(Debug, Serialize)]
pub struct ProgressOut {
    #[serde(rename = "xpPoints")]
    pub xp_points: u64,
    pub level: u32,
    #[serde(rename = "xpIntoLevel")]
    pub xp_into_level: u64,
    #[serde(rename = "xpForNextLevel")]
    pub xp_for_next_level: u64,
    #[serde(rename = "currentStreak")]
    pub current_streak: u32,
    #[serde(rename = "longestStreak")]
    pub longest_streak: u32,
    #[serde(rename = "lastActiveAt")]
    pub last_active_at: Option<DateTime<Utc>>,
}

pub fn progress_out(p: &UserProgress) -> ProgressOut {
    ProgressOut {
        xp_points: p.xp_points,
        level: p.level,
        xp_into_level: progression::xp_into_level(p.xp_points),
        xp_for_next_level: progression::xp_for_next_level(p.xp_points),
        current_streak: p.current_streak,
        longest_streak: p.longest_streak,
        last_active_at: p.last_active_at,
    }
}

//
// HTTP request/response DTOs
//

#[derive(Debug, Deserialize)]
pub struct QuestionQuery {
    pub module: Option<String>,
    pub lesson: Option<String>,
}

#[derive(Deserialize)]
pub struct AnswerIn {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "questionId")]
    pub question_id: String,
    #[serde(default)]
    pub selected: Option<usize>,
    #[serde(default, rename = "selectedSet")]
    pub selected_set: Option<Vec<usize>>,
}

#[derive(Serialize)]
pub struct AnswerOut {
    pub correct: bool,
    pub score: f32,
    pub explanation: String,
    #[serde(rename = "sampleAnswer")]
    pub sample_answer: Option<String>,
    #[serde(rename = "xpAwarded")]
    pub xp_awarded: u64,
    #[serde(rename = "leveledUp")]
    pub leveled_up: bool,
    pub progress: ProgressOut,
}

#[derive(Deserialize)]
pub struct SelfJudgeIn {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "questionId")]
    pub question_id: String,
    pub passed: bool,
}

#[derive(Deserialize)]
pub struct ActivityIn {
    #[serde(rename = "userId")]
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ProgressQuery {
    #[serde(rename = "userId")]
    pub user_id: String,
}

#[derive(Serialize)]
pub struct ModuleLessonOut {
    pub module: String,
    pub lesson: String,
    pub questions: usize,
}

#[derive(Serialize)]
pub struct ModulesOut {
    pub lessons: Vec<ModuleLessonOut>,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}

#[derive(Serialize)]
pub struct ErrorOut {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::QuestionKind;

    fn mc_question() -> Question {
        Question {
            id: "q1".into(),
            module: "caching".into(),
            lesson: "eviction".into(),
            difficulty: "intro".into(),
            source: QuestionSource::Seed,
            prompt: "pick one".into(),
            kind: QuestionKind::MultipleChoice {
                options: vec!["FIFO".into(), "LRU".into()],
                correct: 1,
            },
            xp_reward: 10,
            explanation: "hidden from clients".into(),
        }
    }

    #[test]
    fn question_out_never_leaks_answers() {
        let json = serde_json::to_value(to_out(&mc_question())).expect("serialize");
        assert!(json.get("correct").is_none());
        assert!(json.get("sampleAnswer").is_none());
        assert!(json.get("sample_answer").is_none());
        assert!(json.get("explanation").is_none());
        assert_eq!(json["kind"], "multiple_choice");
        assert_eq!(json["xpReward"], 10);
        assert_eq!(json["options"].as_array().map(|a| a.len()), Some(2));
    }

    #[test]
    fn self_judged_question_out_has_no_options() {
        let mut q = mc_question();
        q.kind = QuestionKind::SelfJudged { sample_answer: "secret".into() };
        let json = serde_json::to_value(to_out(&q)).expect("serialize");
        assert_eq!(json["kind"], "self_judged");
        assert_eq!(json["options"].as_array().map(|a| a.len()), Some(0));
        assert!(!json.to_string().contains("secret"));
    }

    #[test]
    fn progress_out_uses_camel_case_wire_names() {
        let p = UserProgress { xp_points: 105, level: 2, current_streak: 3, longest_streak: 5, last_active_at: None };
        let json = serde_json::to_value(progress_out(&p)).expect("serialize");
        assert_eq!(json["xpPoints"], 105);
        assert_eq!(json["xpIntoLevel"], 5);
        assert_eq!(json["xpForNextLevel"], 150);
        assert_eq!(json["currentStreak"], 3);
        assert_eq!(json["longestStreak"], 5);
        assert!(json["lastActiveAt"].is_null());
    }

    #[test]
    fn answer_in_accepts_both_submission_shapes() {
        let single: AnswerIn =
            serde_json::from_str(r#"{"userId":"u1","questionId":"q1","selected":2}"#).expect("parse");
        assert_eq!(single.selected, Some(2));
        assert!(single.selected_set.is_none());

        let multi: AnswerIn =
            serde_json::from_str(r#"{"userId":"u1","questionId":"q1","selectedSet":[0,2]}"#).expect("parse");
        assert_eq!(multi.selected_set, Some(vec![0, 2]));
        assert!(multi.selected.is_none());
    }
}
