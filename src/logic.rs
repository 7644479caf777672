//! Core behaviors shared by both HTTP and WebSocket handlers.
//!
//! This includes:
//!   - Lesson generation (OpenAI when configured, local template otherwise)
//!   - Reading and saving lessons as sections
//!   - Building the course flow and applying instructor moves with rollback

use tracing::{error, info, instrument, warn};

use crate::domain::{FlowItem, Lesson, Sections};
use crate::error::AppError;
use crate::flow::{assignment_order_updates, build_flow, lesson_ids_in_order, move_item, total_duration_minutes};
use crate::openai::LessonBrief;
use crate::protocol::{AssignmentUpdate, FlowMoveOut, FlowOut, GenerateLessonIn, GenerateLessonOut, LessonOut};
use crate::sectionizer::{recombine, sectionize, sections_from_structured};
use crate::seeds::local_lesson_template;
use crate::state::{AppState, NewLesson};
use crate::util::trunc_for_log;

pub const ORIGIN_OPENAI: &str = "openai_generated";
pub const ORIGIN_LOCAL: &str = "local_template";

fn required<'a>(value: &'a str, field: &'static str) -> Result<&'a str, AppError> {
  let v = value.trim();
  if v.is_empty() { Err(AppError::MissingField(field)) } else { Ok(v) }
}

/// Lesson plus its sections, recomputed from the stored notes.
pub fn lesson_out(lesson: Lesson) -> LessonOut {
  let sections = sectionize(&lesson.notes);
  LessonOut { lesson, sections }
}

#[instrument(level = "info", skip(state, req), fields(course_id = %req.course_id, title = %req.title))]
pub async fn generate_lesson(state: &AppState, req: &GenerateLessonIn) -> Result<GenerateLessonOut, AppError> {
  let course_id = required(&req.course_id, "courseId")?;
  let title = required(&req.title, "title")?;
  let topic = required(&req.topic, "topic")?;
  let course = state.get_course(course_id).await?;
  let difficulty = req
    .difficulty
    .as_deref()
    .map(str::trim)
    .filter(|d| !d.is_empty())
    .unwrap_or(course.difficulty.as_str());

  let brief = LessonBrief { course_title: &course.title, title, topic, difficulty };

  if let Some(oa) = &state.openai {
    match oa.generate_lesson_content(&state.prompts, &brief).await {
      Ok(gen) => {
        let sections = match &gen.structured {
          Some(map) => sections_from_structured(map),
          None => sectionize(&gen.content),
        };
        info!(target: "lesson", %course_id, origin = ORIGIN_OPENAI, structured = gen.structured.is_some(), "Lesson content ready");
        return Ok(GenerateLessonOut {
          content: gen.content,
          structured: gen.structured,
          sections,
          origin: ORIGIN_OPENAI,
        });
      }
      Err(e) => {
        error!(target: "lesson", %course_id, error = %e, "OpenAI lesson generation failed; using local template");
      }
    }
  }

  let content = local_lesson_template(brief.course_title, title, topic, difficulty);
  let sections = sectionize(&content);
  info!(target: "lesson", %course_id, origin = ORIGIN_LOCAL, "Lesson content ready");
  Ok(GenerateLessonOut { content, structured: None, sections, origin: ORIGIN_LOCAL })
}

/// Store a new lesson. Sections, when given, are recombined into the notes;
/// otherwise the raw notes are kept as authored.
#[instrument(level = "info", skip(state, sections, new), fields(title = %new.title, has_sections = sections.is_some()))]
pub async fn create_lesson(
  state: &AppState,
  course_id: &str,
  mut new: NewLesson,
  sections: Option<Sections>,
) -> Result<LessonOut, AppError> {
  if new.title.trim().is_empty() {
    return Err(AppError::MissingField("title"));
  }
  if let Some(sections) = &sections {
    new.notes = recombine(sections);
  }
  let lesson = state.add_lesson(course_id, new).await?;
  Ok(lesson_out(lesson))
}

#[instrument(level = "info", skip(state, sections))]
pub async fn save_lesson_sections(
  state: &AppState,
  course_id: &str,
  lesson_id: &str,
  sections: &Sections,
) -> Result<LessonOut, AppError> {
  if sections.is_empty() {
    warn!(target: "lesson", %course_id, %lesson_id, "Saving lesson with no section content");
  }
  let notes = recombine(sections);
  let lesson = state.save_lesson_notes(course_id, lesson_id, notes).await?;
  info!(target: "lesson", %course_id, %lesson_id, notes = %trunc_for_log(&lesson.notes, 80), "Lesson sections saved");
  Ok(lesson_out(lesson))
}

async fn rebuild_flow(state: &AppState, course_id: &str) -> Result<Vec<FlowItem>, AppError> {
  let course = state.get_course(course_id).await?;
  Ok(build_flow(&course.lessons, &course.assignments))
}

#[instrument(level = "info", skip(state))]
pub async fn course_flow(state: &AppState, course_id: &str) -> Result<FlowOut, AppError> {
  let items = rebuild_flow(state, course_id).await?;
  let total_duration_minutes = total_duration_minutes(&items);
  Ok(FlowOut { items, total_duration_minutes })
}

/// A failed move: the error plus the flow rebuilt from the unchanged store.
#[derive(Debug)]
pub struct FlowMoveFailure {
  pub error: AppError,
  pub flow: Vec<FlowItem>,
}

/// Apply an instructor move and persist the lesson order.
/// Assignment orders are computed and reported but not persisted.
///
/// The flow is read and the new order written under separate locks. This assumes a
/// single editor per course: a lesson added in between makes the write fail with
/// `InvalidReorder`, and the caller gets the rebuilt flow instead of the move.
#[instrument(level = "info", skip(state))]
pub async fn move_flow_item(
  state: &AppState,
  course_id: &str,
  from: usize,
  to: usize,
) -> Result<FlowMoveOut, FlowMoveFailure> {
  let current = rebuild_flow(state, course_id)
    .await
    .map_err(|error| FlowMoveFailure { error, flow: Vec::new() })?;

  let len = current.len();
  if from >= len || to >= len {
    warn!(target: "flow", %course_id, from, to, len, "Rejected move with out-of-range index");
    return Err(FlowMoveFailure { error: AppError::IndexOutOfRange { from, to, len }, flow: current });
  }

  let flow = move_item(&current, from, to);
  let lesson_ids = lesson_ids_in_order(&flow);
  let assignment_updates: Vec<AssignmentUpdate> = assignment_order_updates(&flow)
    .into_iter()
    .map(|(id, order)| AssignmentUpdate { id, order })
    .collect();

  if !lesson_ids.is_empty() {
    if let Err(error) = state.reorder_lessons(course_id, &lesson_ids).await {
      error!(target: "flow", %course_id, error = %error, "Persisting lesson order failed; rolling back flow");
      let flow = rebuild_flow(state, course_id).await.unwrap_or(current);
      return Err(FlowMoveFailure { error, flow });
    }
  }
  if !assignment_updates.is_empty() {
    warn!(target: "flow", %course_id, count = assignment_updates.len(), "Assignment order changes are not persisted");
  }

  info!(target: "flow", %course_id, from, to, lessons = lesson_ids.len(), "Flow item moved");
  Ok(FlowMoveOut { flow, lesson_ids, assignment_updates })
}

#[cfg(test)]
mod tests {
  use super::*;

  fn state() -> AppState {
    AppState::from_parts(None, None)
  }

  fn gen_req(course_id: &str, title: &str, topic: &str) -> GenerateLessonIn {
    GenerateLessonIn {
      course_id: course_id.into(),
      title: title.into(),
      topic: topic.into(),
      difficulty: None,
    }
  }

  #[tokio::test]
  async fn generation_without_ai_uses_local_template() {
    let st = state();
    let out = generate_lesson(&st, &gen_req("web-101", "Flexbox", "one-dimensional layout")).await.expect("lesson");
    assert_eq!(out.origin, ORIGIN_LOCAL);
    assert!(out.structured.is_none());
    for (key, value) in out.sections.iter() {
      assert!(!value.is_empty(), "{key:?} should be filled");
    }
    assert!(out.sections.introduction.contains("beginner"));
  }

  #[tokio::test]
  async fn generation_validates_input() {
    let st = state();
    assert_eq!(
      generate_lesson(&st, &gen_req("web-101", "  ", "t")).await.unwrap_err(),
      AppError::MissingField("title")
    );
    assert!(matches!(
      generate_lesson(&st, &gen_req("missing", "T", "t")).await,
      Err(AppError::CourseNotFound(_))
    ));
  }

  #[tokio::test]
  async fn saved_sections_read_back_identically() {
    let st = state();
    let mut sections = Sections::default();
    sections.introduction = "<p>Why selectors matter.</p>".into();
    sections.exercises = "<ol><li>Style a list</li></ol>".into();

    let saved = save_lesson_sections(&st, "web-101", "l-103", &sections).await.expect("save");
    assert_eq!(saved.sections, sections);
    let lesson = st.get_lesson("web-101", "l-103").await.expect("lesson");
    assert_eq!(lesson_out(lesson).sections, sections);
  }

  #[tokio::test]
  async fn create_lesson_recombines_sections() {
    let st = state();
    let mut sections = Sections::default();
    sections.main_content = "<p>Grid</p>".into();
    let new = NewLesson { title: "Grid".into(), ..Default::default() };
    let out = create_lesson(&st, "web-101", new, Some(sections.clone())).await.expect("lesson");
    assert!(out.lesson.notes.contains("<section class=\"main-content\">"));
    assert_eq!(out.sections, sections);
  }

  #[tokio::test]
  async fn seed_flow_interleaves_by_order() {
    let st = state();
    let flow = course_flow(&st, "web-101").await.expect("flow");
    let ids: Vec<&str> = flow.items.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, vec!["lesson-l-101", "lesson-l-102", "assignment-a-201", "lesson-l-103", "assignment-a-202"]);
    assert_eq!(flow.total_duration_minutes, 25 + 40 + 90 + 30 + 60);
  }

  #[tokio::test]
  async fn move_persists_lesson_order() {
    let st = state();
    let out = move_flow_item(&st, "web-101", 3, 0).await.expect("move");
    assert_eq!(out.flow[0].id, "lesson-l-103");
    assert_eq!(out.lesson_ids, vec!["l-103", "l-101", "l-102"]);
    assert_eq!(out.assignment_updates.len(), 2);

    let rebuilt = course_flow(&st, "web-101").await.expect("flow");
    let lessons: Vec<&str> = rebuilt
      .items
      .iter()
      .filter(|i| i.kind == crate::domain::FlowItemKind::Lesson)
      .map(|i| i.source_id.as_str())
      .collect();
    assert_eq!(lessons, vec!["l-103", "l-101", "l-102"]);
  }

  #[tokio::test]
  async fn lesson_order_computed_before_a_concurrent_add_is_rejected() {
    let st = state();
    let before = course_flow(&st, "web-101").await.expect("flow");
    let stale = lesson_ids_in_order(&move_item(&before.items, 3, 0));

    st.add_lesson("web-101", NewLesson { title: "Grid".into(), ..Default::default() }).await.expect("add");
    assert!(matches!(st.reorder_lessons("web-101", &stale).await, Err(AppError::InvalidReorder(_))));

    let after = course_flow(&st, "web-101").await.expect("flow");
    assert_eq!(after.items.len(), 6);
    assert_eq!(after.items[0].id, "lesson-l-101");
  }

  #[tokio::test]
  async fn out_of_range_move_returns_current_flow() {
    let st = state();
    let err = move_flow_item(&st, "web-101", 9, 0).await.unwrap_err();
    assert_eq!(err.error, AppError::IndexOutOfRange { from: 9, to: 0, len: 5 });
    assert_eq!(err.flow.len(), 5);
    assert_eq!(err.flow[0].id, "lesson-l-101");
  }
}
