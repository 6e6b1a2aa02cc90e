//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented and logs include parameters and basic result info.

use std::sync::Arc;

use axum::{
  extract::{Query, State},
  http::StatusCode,
  response::IntoResponse,
  Json,
};
use chrono::Utc;
use tracing::{info, instrument};

use crate::grading::{evaluate_answer, resolve_self_verdict, Submission};
use crate::protocol::*;
use crate::state::AppState;

const DEFAULT_MODULE: &str = "fundamentals";
const DEFAULT_LESSON: &str = "cap-theorem";

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

#[instrument(level = "info", skip(state))]
pub async fn http_get_modules(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  let lessons = state
    .inventory()
    .await
    .into_iter()
    .map(|(module, lesson, questions)| ModuleLessonOut { module, lesson, questions })
    .collect();
  Json(ModulesOut { lessons })
}

#[instrument(level = "info", skip(state), fields(
  module = %q.module.clone().unwrap_or_else(|| DEFAULT_MODULE.into()),
  lesson = %q.lesson.clone().unwrap_or_else(|| DEFAULT_LESSON.into()),
))]
pub async fn http_get_question(
  State(state): State<Arc<AppState>>,
  Query(q): Query<QuestionQuery>,
) -> impl IntoResponse {
  let module = q.module.unwrap_or_else(|| DEFAULT_MODULE.into());
  let lesson = q.lesson.unwrap_or_else(|| DEFAULT_LESSON.into());
  let (question, origin) = state.choose_question(&module, &lesson).await;
  info!(target: "quiz", %module, %lesson, id = %question.id, %origin, "HTTP question served");
  Json(to_out(&question))
}

#[instrument(level = "info", skip(state, body), fields(%body.user_id, %body.question_id))]
pub async fn http_post_answer(
  State(state): State<Arc<AppState>>,
  Json(body): Json<AnswerIn>,
) -> impl IntoResponse {
  let submission = Submission { selected: body.selected, selected_set: body.selected_set };
  let graded = evaluate_answer(&state, &body.question_id, &submission).await;

  let (progress, leveled_up) = if graded.xp_delta > 0 {
    let (p, award) = state.award_xp(&body.user_id, graded.xp_delta, Utc::now()).await;
    (p, award.leveled_up)
  } else {
    (state.get_progress(&body.user_id).await, false)
  };

  info!(
    target: "quiz",
    id = %body.question_id, user = %body.user_id,
    correct = graded.correct, score = %format!("{:.1}", graded.score),
    xp = graded.xp_delta, leveled_up,
    "HTTP answer evaluated"
  );
  Json(AnswerOut {
    correct: graded.correct,
    score: graded.score,
    explanation: graded.explanation,
    sample_answer: graded.sample_answer,
    xp_awarded: graded.xp_delta,
    leveled_up,
    progress: progress_out(&progress),
  })
}

#[instrument(level = "info", skip(state, body), fields(%body.user_id, %body.question_id, passed = body.passed))]
pub async fn http_post_self_judge(
  State(state): State<Arc<AppState>>,
  Json(body): Json<SelfJudgeIn>,
) -> Result<Json<AnswerOut>, (StatusCode, Json<ErrorOut>)> {
  let graded = resolve_self_verdict(&state, &body.question_id, body.passed)
    .await
    .map_err(|message| (StatusCode::BAD_REQUEST, Json(ErrorOut { message })))?;

  let (progress, leveled_up) = if graded.xp_delta > 0 {
    let (p, award) = state.award_xp(&body.user_id, graded.xp_delta, Utc::now()).await;
    (p, award.leveled_up)
  } else {
    (state.get_progress(&body.user_id).await, false)
  };

  info!(
    target: "quiz",
    id = %body.question_id, user = %body.user_id,
    passed = body.passed, xp = graded.xp_delta, leveled_up,
    "HTTP self-judge resolved"
  );
  Ok(Json(AnswerOut {
    correct: graded.correct,
    score: graded.score,
    explanation: graded.explanation,
    sample_answer: graded.sample_answer,
    xp_awarded: graded.xp_delta,
    leveled_up,
    progress: progress_out(&progress),
  }))
}

#[instrument(level = "info", skip(state, body), fields(%body.user_id))]
pub async fn http_post_activity(
  State(state): State<Arc<AppState>>,
  Json(body): Json<ActivityIn>,
) -> impl IntoResponse {
  let progress = state.record_activity(&body.user_id, Utc::now()).await;
  info!(
    target: "quiz",
    user = %body.user_id,
    streak = progress.current_streak, longest = progress.longest_streak,
    "HTTP activity recorded"
  );
  Json(progress_out(&progress))
}

#[instrument(level = "info", skip(state), fields(%q.user_id))]
pub async fn http_get_progress(
  State(state): State<Arc<AppState>>,
  Query(q): Query<ProgressQuery>,
) -> impl IntoResponse {
  let progress = state.get_progress(&q.user_id).await;
  Json(progress_out(&progress))
}
