//! Application state: in-memory question and user stores plus selection logic.
//!
//! This module owns:
//!   - question stores (by id, by module+lesson, last-served per lesson)
//!   - the per-user progression store
//!
//! Progression updates (`award_xp`, `record_activity`) hold the user
//! store's write lock for the whole read-modify-write, so two
//! concurrent requests for the same user can never lose an update.

use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use tokio::sync::RwLock;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::config::{load_quiz_config_from_env, QuestionCfg, QuizConfig};
use crate::domain::{Question, QuestionKind, QuestionSource, UserProgress};
use crate::progression::{self, XpAward};
use crate::seeds::{hard_fallback_question, seed_questions};

type LessonKey = (String, String);

#[derive(Clone)]
pub struct AppState {
    pub by_id: Arc<RwLock<HashMap<String, Question>>>,
    pub by_lesson: Arc<RwLock<HashMap<LessonKey, Vec<String>>>>,
    pub last_by_lesson: Arc<RwLock<HashMap<LessonKey, String>>>,
    pub users: Arc<RwLock<HashMap<String, UserProgress>>>,
}

impl AppState {
    /// Build state from env: load the TOML bank (if any), merge built-in seeds, build indices.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Self {
        let cfg_opt = load_quiz_config_from_env();
        let (id_map, lesson_map) = build_question_maps(cfg_opt.as_ref());

        // Inventory summary by module/source.
        let mut count_by_module: HashMap<String, (usize, usize)> = HashMap::new();
        for q in id_map.values() {
            let entry = count_by_module.entry(q.module.clone()).or_insert((0, 0));
            match q.source {
                QuestionSource::LocalBank => entry.0 += 1,
                QuestionSource::Seed => entry.1 += 1,
            }
        }
        for (module, (bank, seed)) in count_by_module {
            info!(target: "quiz", %module, local_bank = bank, seed = seed, "Startup question inventory");
        }

        Self {
            by_id: Arc::new(RwLock::new(id_map)),
            by_lesson: Arc::new(RwLock::new(lesson_map)),
            last_by_lesson: Arc::new(RwLock::new(HashMap::new())),
            users: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Insert a question into both stores (by_id and by_lesson).
    #[instrument(level = "debug", skip(self, q), fields(id = %q.id))]
    pub async fn insert_question(&self, q: Question) {
        let mut by_id = self.by_id.write().await;
        let mut by_lesson = self.by_lesson.write().await;
        let key = (q.module.clone(), q.lesson.clone());
        let id = q.id.clone();
        by_id.insert(id.clone(), q);
        by_lesson.entry(key).or_default().push(id);
    }

    /// Module/lesson inventory with question counts, sorted for stable output.
    pub async fn inventory(&self) -> Vec<(String, String, usize)> {
        let by_lesson = self.by_lesson.read().await;
        let mut out: Vec<(String, String, usize)> = by_lesson
            .iter()
            .map(|((m, l), ids)| (m.clone(), l.clone(), ids.len()))
            .collect();
        out.sort();
        out
    }

    /// Selection policy: pick a random question from the lesson pool,
    /// avoiding the one served immediately before. Lessons with no
    /// content get a hard fallback (inserted so grading can find it).
    #[instrument(level = "info", skip(self), fields(%module, %lesson))]
    pub async fn choose_question(&self, module: &str, lesson: &str) -> (Question, &'static str) {
        let key = (module.to_string(), lesson.to_string());

        if let Some(ids) = { self.by_lesson.read().await.get(&key).cloned() } {
            if !ids.is_empty() {
                let last = { self.last_by_lesson.read().await.get(&key).cloned() };
                let pool: Vec<&String> = match &last {
                    Some(last_id) if ids.len() > 1 => ids.iter().filter(|id| *id != last_id).collect(),
                    _ => ids.iter().collect(),
                };
                let chosen_id = pool
                    .choose(&mut rand::thread_rng())
                    .map(|s| (*s).clone())
                    .unwrap_or_else(|| ids[0].clone());

                if let Some(q) = { self.by_id.read().await.get(&chosen_id).cloned() } {
                    self.last_by_lesson.write().await.insert(key, chosen_id.clone());
                    info!(target: "quiz", %module, %lesson, chosen = %chosen_id, source = "pool", "Serving question");
                    return (q, "pool");
                }
            }
        }

        let q = hard_fallback_question(module.to_string(), lesson.to_string());
        let id = q.id.clone();
        self.insert_question(q.clone()).await;
        self.last_by_lesson.write().await.insert(key, id.clone());
        warn!(target: "quiz", %module, %lesson, chosen = %id, source = "hard_fallback", "Inserted hard fallback question");
        (q, "hard_fallback")
    }

    /// Read-only access to a question by id.
    #[instrument(level = "debug", skip(self), fields(%id))]
    pub async fn get_question(&self, id: &str) -> Option<Question> {
        let by_id = self.by_id.read().await;
        by_id.get(id).cloned()
    }

    /// Current progression snapshot. Absent users read as zero-valued
    /// state without being inserted.
    #[instrument(level = "debug", skip(self), fields(%user_id))]
    pub async fn get_progress(&self, user_id: &str) -> UserProgress {
        let users = self.users.read().await;
        users.get(user_id).cloned().unwrap_or_default()
    }

    /// Award XP to a user and record the completion as activity, all
    /// under one write-lock guard. Returns the updated state and the
    /// award outcome (for level-up celebration in the UI).
    #[instrument(level = "info", skip(self), fields(%user_id, delta))]
    pub async fn award_xp(&self, user_id: &str, delta: u64, now: DateTime<Utc>) -> (UserProgress, XpAward) {
        let mut users = self.users.write().await;
        let p = users.entry(user_id.to_string()).or_default();

        let award = progression::apply_xp(p.xp_points, delta);
        let streak = progression::record_activity(p.last_active_at, p.current_streak, p.longest_streak, now);

        p.xp_points = award.new_xp;
        p.level = award.new_level;
        p.current_streak = streak.current_streak;
        p.longest_streak = streak.longest_streak;
        p.last_active_at = Some(streak.last_active_at);

        if award.leveled_up {
            info!(target: "quiz", %user_id, level = award.new_level, xp = award.new_xp, "Level up");
        }
        (p.clone(), award)
    }

    /// Record a session-start activity event (streak only, no XP),
    /// under one write-lock guard.
    #[instrument(level = "info", skip(self), fields(%user_id))]
    pub async fn record_activity(&self, user_id: &str, now: DateTime<Utc>) -> UserProgress {
        let mut users = self.users.write().await;
        let p = users.entry(user_id.to_string()).or_default();

        let streak = progression::record_activity(p.last_active_at, p.current_streak, p.longest_streak, now);
        p.current_streak = streak.current_streak;
        p.longest_streak = streak.longest_streak;
        p.last_active_at = Some(streak.last_active_at);

        p.clone()
    }
}

/// Merge the optional TOML bank with the built-in seeds into the two
/// question indices. Bank entries win over seeds with the same id;
/// duplicate ids within the bank itself are skipped with an error log,
/// so no id is ever indexed twice under a lesson (double-weighting it
/// in sampling).
fn build_question_maps(
    cfg: Option<&QuizConfig>,
) -> (HashMap<String, Question>, HashMap<LessonKey, Vec<String>>) {
    let mut id_map = HashMap::<String, Question>::new();
    let mut lesson_map = HashMap::<LessonKey, Vec<String>>::new();

    if let Some(cfg) = cfg {
        for qc in &cfg.questions {
            match question_from_cfg(qc) {
                Ok(q) => {
                    if id_map.contains_key(&q.id) {
                        error!(target: "quiz", id = %q.id, module = %qc.module, lesson = %qc.lesson, "Skipping bank item: duplicate id");
                        continue;
                    }
                    lesson_map
                        .entry((q.module.clone(), q.lesson.clone()))
                        .or_default()
                        .push(q.id.clone());
                    id_map.insert(q.id.clone(), q);
                }
                Err(e) => {
                    error!(target: "quiz", module = %qc.module, lesson = %qc.lesson, error = %e, "Skipping bank item");
                }
            }
        }
    }

    // Always insert built-in seeds, but don't overwrite existing ids.
    for q in seed_questions() {
        if id_map.contains_key(&q.id) {
            continue;
        }
        lesson_map
            .entry((q.module.clone(), q.lesson.clone()))
            .or_default()
            .push(q.id.clone());
        id_map.insert(q.id.clone(), q);
    }

    (id_map, lesson_map)
}

/// Validate and convert a TOML bank entry into a `Question`.
fn question_from_cfg(qc: &QuestionCfg) -> Result<Question, String> {
    let kind = match (&qc.options, qc.correct, &qc.correct_set, &qc.sample_answer) {
        (Some(options), Some(correct), None, None) => {
            if correct >= options.len() {
                return Err(format!("correct index {} out of range ({} options)", correct, options.len()));
            }
            QuestionKind::MultipleChoice { options: options.clone(), correct }
        }
        (Some(options), None, Some(set), None) => {
            if set.is_empty() {
                return Err("correct_set is empty".into());
            }
            if set.iter().any(|i| i >= &options.len()) {
                return Err("correct_set index out of range".into());
            }
            QuestionKind::MultiSelect { options: options.clone(), correct: set.clone() }
        }
        (None, None, None, Some(sample)) if !sample.trim().is_empty() => {
            QuestionKind::SelfJudged { sample_answer: sample.clone() }
        }
        _ => return Err("entry must be exactly one of: options+correct, options+correct_set, sample_answer".into()),
    };

    let xp_reward = qc.xp.unwrap_or(match kind {
        QuestionKind::MultipleChoice { .. } => 10,
        QuestionKind::MultiSelect { .. } => 15,
        QuestionKind::SelfJudged { .. } => 20,
    });

    Ok(Question {
        id: qc.id.clone().unwrap_or_else(|| Uuid::new_v4().to_string()),
        module: qc.module.clone(),
        lesson: qc.lesson.clone(),
        difficulty: qc.difficulty.clone().unwrap_or_else(|| "core".into()),
        source: QuestionSource::LocalBank,
        prompt: qc.prompt.clone(),
        kind,
        xp_reward,
        explanation: qc.explanation.clone().unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn empty_state() -> AppState {
        AppState {
            by_id: Arc::new(RwLock::new(HashMap::new())),
            by_lesson: Arc::new(RwLock::new(HashMap::new())),
            last_by_lesson: Arc::new(RwLock::new(HashMap::new())),
            users: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    #[tokio::test]
    async fn award_xp_persists_and_recomputes_level() {
        let state = empty_state();
        let now = Utc::now();

        let (p, award) = state.award_xp("u1", 90, now).await;
        assert_eq!(p.xp_points, 90);
        assert_eq!(p.level, 1);
        assert!(!award.leveled_up);

        let (p, award) = state.award_xp("u1", 15, now).await;
        assert_eq!(p.xp_points, 105);
        assert_eq!(p.level, 2);
        assert!(award.leveled_up);
        assert_eq!(p.current_streak, 1);
        assert_eq!(p.last_active_at, Some(now));
    }

    #[tokio::test]
    async fn activity_extends_and_breaks_streaks() {
        let state = empty_state();
        let day1 = Utc::now();

        let p = state.record_activity("u1", day1).await;
        assert_eq!(p.current_streak, 1);

        let p = state.record_activity("u1", day1 + Duration::hours(30)).await;
        assert_eq!(p.current_streak, 2);
        assert_eq!(p.longest_streak, 2);

        let p = state.record_activity("u1", day1 + Duration::hours(30) + Duration::hours(50)).await;
        assert_eq!(p.current_streak, 1);
        assert_eq!(p.longest_streak, 2);
    }

    #[tokio::test]
    async fn progress_read_does_not_create_users() {
        let state = empty_state();
        let p = state.get_progress("ghost").await;
        assert_eq!(p.xp_points, 0);
        assert_eq!(p.level, 1);
        assert!(state.users.read().await.is_empty());
    }

    #[tokio::test]
    async fn single_question_lesson_repeats_rather_than_failing() {
        let state = AppState::new();
        let (first, origin) = state.choose_question("caching", "eviction").await;
        assert_eq!(origin, "pool");
        let (second, _) = state.choose_question("caching", "eviction").await;
        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn empty_lesson_gets_hard_fallback() {
        let state = empty_state();
        let (q, origin) = state.choose_question("nosuch", "lesson").await;
        assert_eq!(origin, "hard_fallback");
        assert!(state.get_question(&q.id).await.is_some());
    }

    #[test]
    fn duplicate_bank_ids_are_indexed_once() {
        let cfg: QuizConfig = toml::from_str(
            r#"
            [[questions]]
            id = "dup"
            module = "caching"
            lesson = "eviction"
            prompt = "first"
            options = ["a", "b"]
            correct = 0

            [[questions]]
            id = "dup"
            module = "caching"
            lesson = "eviction"
            prompt = "second"
            options = ["a", "b"]
            correct = 1
            "#,
        )
        .expect("parse");

        let (id_map, lesson_map) = build_question_maps(Some(&cfg));
        let ids = lesson_map.get(&("caching".into(), "eviction".into())).expect("lesson");
        assert_eq!(ids.iter().filter(|id| id.as_str() == "dup").count(), 1, "id indexed twice");
        // First entry wins; the duplicate is skipped, not overwritten.
        assert_eq!(id_map.get("dup").map(|q| q.prompt.as_str()), Some("first"));
    }

    #[test]
    fn bank_ids_shadow_seed_ids_without_double_indexing() {
        let cfg: QuizConfig = toml::from_str(
            r#"
            [[questions]]
            id = "q201"
            module = "caching"
            lesson = "eviction"
            prompt = "bank override"
            options = ["a", "b"]
            correct = 0
            "#,
        )
        .expect("parse");

        let (id_map, lesson_map) = build_question_maps(Some(&cfg));
        let ids = lesson_map.get(&("caching".into(), "eviction".into())).expect("lesson");
        assert_eq!(ids.iter().filter(|id| id.as_str() == "q201").count(), 1);
        assert_eq!(id_map.get("q201").map(|q| q.source.clone()), Some(QuestionSource::LocalBank));
    }

    #[test]
    fn cfg_conversion_rejects_ambiguous_entries() {
        let qc = QuestionCfg {
            id: None,
            module: "m".into(),
            lesson: "l".into(),
            difficulty: None,
            prompt: "p".into(),
            options: Some(vec!["a".into(), "b".into()]),
            correct: Some(0),
            correct_set: None,
            sample_answer: Some("also".into()),
            xp: None,
            explanation: None,
        };
        assert!(question_from_cfg(&qc).is_err());

        let qc = QuestionCfg { sample_answer: None, correct: Some(5), ..qc };
        assert!(question_from_cfg(&qc).is_err(), "out-of-range index accepted");
    }
}
