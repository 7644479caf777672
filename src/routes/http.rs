//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented; errors render as `{"error": ...}` with a matching status.

use std::sync::Arc;

use axum::{
  extract::{Path, State},
  response::{IntoResponse, Response},
  Json,
};
use tracing::{info, instrument};

use crate::domain::{Assignment, Lesson};
use crate::error::AppError;
use crate::logic::*;
use crate::protocol::*;
use crate::sectionizer::{recombine, sectionize};
use crate::state::{AppState, NewLesson};

type ApiResult<T> = Result<Json<T>, AppError>;

impl IntoResponse for FlowMoveFailure {
  fn into_response(self) -> Response {
    let status = self.error.status();
    let body = FlowMoveErrorOut { error: self.error.to_string(), flow: self.flow };
    (status, Json(body)).into_response()
  }
}

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

#[instrument(level = "info", skip(body), fields(html_len = body.html.len()))]
pub async fn http_post_sectionize(Json(body): Json<SectionizeIn>) -> Json<SectionizeOut> {
  Json(SectionizeOut { sections: sectionize(&body.html) })
}

#[instrument(level = "info", skip(body))]
pub async fn http_post_recombine(Json(body): Json<RecombineIn>) -> Json<RecombineOut> {
  Json(RecombineOut { html: recombine(&body.sections) })
}

#[instrument(level = "info", skip(state, body), fields(course_id = %body.course_id, title = %body.title))]
pub async fn http_post_generate_lesson(
  State(state): State<Arc<AppState>>,
  Json(body): Json<GenerateLessonIn>,
) -> ApiResult<GenerateLessonOut> {
  let out = generate_lesson(&state, &body).await?;
  info!(target: "lesson", origin = out.origin, content_len = out.content.len(), "HTTP lesson generated");
  Ok(Json(out))
}

#[instrument(level = "info", skip(state))]
pub async fn http_list_courses(State(state): State<Arc<AppState>>) -> Json<Vec<CourseSummaryOut>> {
  let courses = state.list_courses().await;
  Json(courses.iter().map(to_summary).collect())
}

#[instrument(level = "info", skip(state))]
pub async fn http_list_lessons(
  State(state): State<Arc<AppState>>,
  Path(course_id): Path<String>,
) -> ApiResult<Vec<Lesson>> {
  let course = state.get_course(&course_id).await?;
  Ok(Json(course.lessons))
}

#[instrument(level = "info", skip(state, body), fields(title = %body.title))]
pub async fn http_create_lesson(
  State(state): State<Arc<AppState>>,
  Path(course_id): Path<String>,
  Json(body): Json<CreateLessonIn>,
) -> ApiResult<LessonOut> {
  let new = NewLesson {
    title: body.title,
    content: body.content,
    notes: body.notes,
    video_url: body.video_url,
    duration_minutes: body.duration_minutes,
  };
  Ok(Json(create_lesson(&state, &course_id, new, body.sections).await?))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_lesson(
  State(state): State<Arc<AppState>>,
  Path((course_id, lesson_id)): Path<(String, String)>,
) -> ApiResult<LessonOut> {
  let lesson = state.get_lesson(&course_id, &lesson_id).await?;
  Ok(Json(lesson_out(lesson)))
}

#[instrument(level = "info", skip(state, body))]
pub async fn http_put_lesson_sections(
  State(state): State<Arc<AppState>>,
  Path((course_id, lesson_id)): Path<(String, String)>,
  Json(body): Json<SaveSectionsIn>,
) -> ApiResult<LessonOut> {
  Ok(Json(save_lesson_sections(&state, &course_id, &lesson_id, &body.sections).await?))
}

#[instrument(level = "info", skip(state, body))]
pub async fn http_reorder_lessons(
  State(state): State<Arc<AppState>>,
  Path(course_id): Path<String>,
  Json(body): Json<ReorderLessonsIn>,
) -> ApiResult<Vec<Lesson>> {
  let ids = body.lesson_ids.ok_or(AppError::MissingField("lessonIds"))?;
  Ok(Json(state.reorder_lessons(&course_id, &ids).await?))
}

#[instrument(level = "info", skip(state, body), fields(title = %body.title))]
pub async fn http_create_assignment(
  State(state): State<Arc<AppState>>,
  Path(course_id): Path<String>,
  Json(body): Json<CreateAssignmentIn>,
) -> ApiResult<Assignment> {
  if body.title.trim().is_empty() {
    return Err(AppError::MissingField("title"));
  }
  Ok(Json(state.add_assignment(&course_id, to_assignment(body)).await?))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_flow(
  State(state): State<Arc<AppState>>,
  Path(course_id): Path<String>,
) -> ApiResult<FlowOut> {
  Ok(Json(course_flow(&state, &course_id).await?))
}

#[instrument(level = "info", skip(state, body), fields(from = body.from_index, to = body.to_index))]
pub async fn http_post_flow_move(
  State(state): State<Arc<AppState>>,
  Path(course_id): Path<String>,
  Json(body): Json<MoveFlowIn>,
) -> Result<Json<FlowMoveOut>, FlowMoveFailure> {
  let out = move_flow_item(&state, &course_id, body.from_index, body.to_index).await?;
  Ok(Json(out))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_progress(
  State(state): State<Arc<AppState>>,
  Path(course_id): Path<String>,
) -> ApiResult<ProgressOut> {
  let entries = state.progress_for_course(&course_id).await?;
  Ok(Json(ProgressOut { entries }))
}

#[instrument(level = "info", skip(state, body), fields(count = body.entries.len()))]
pub async fn http_post_progress_sync(
  State(state): State<Arc<AppState>>,
  Path(course_id): Path<String>,
  Json(body): Json<ProgressSyncIn>,
) -> ApiResult<ProgressSyncOut> {
  let rec = state.sync_progress(&course_id, &body.entries).await?;
  info!(target: "progress", %course_id, pushed = rec.push.len(), pulled = rec.pull.len(), "Progress reconciled");
  Ok(Json(ProgressSyncOut { entries: rec.merged, push: rec.push }))
}

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
  };
  use serde_json::{json, Value};
  use tower::util::ServiceExt;

  use super::*;
  use crate::routes::build_router;

  fn app() -> Router {
    build_router(Arc::new(AppState::from_parts(None, None)))
  }

  async fn call(app: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let req = Request::builder().method(method).uri(uri);
    let req = match body {
      Some(v) => req
        .header("content-type", "application/json")
        .body(Body::from(v.to_string()))
        .unwrap(),
      None => req.body(Body::empty()).unwrap(),
    };
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, value)
  }

  #[tokio::test]
  async fn health_is_ok() {
    let (status, body) = call(app(), Method::GET, "/api/v1/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "ok": true }));
  }

  #[tokio::test]
  async fn sectionize_endpoint_splits_headed_html() {
    let html = "<h2>Introduction</h2><p>i</p><h2>Summary</h2><p>s</p>";
    let (status, body) =
      call(app(), Method::POST, "/api/v1/sections/sectionize", Some(json!({ "html": html }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sections"]["introduction"], "<p>i</p>");
    assert_eq!(body["sections"]["takeaways"], "<p>s</p>");
    assert_eq!(body["sections"]["resources"], "");
  }

  #[tokio::test]
  async fn recombine_endpoint_wraps_sections() {
    let (status, body) = call(
      app(),
      Method::POST,
      "/api/v1/sections/recombine",
      Some(json!({ "sections": { "mainContent": "<p>m</p>" } })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let html = body["html"].as_str().unwrap();
    assert!(html.starts_with("<section class=\"main-content\">"));
    assert!(!html.contains("introduction"));
  }

  #[tokio::test]
  async fn generate_falls_back_to_local_template() {
    let (status, body) = call(
      app(),
      Method::POST,
      "/api/v1/lessons/generate",
      Some(json!({ "courseId": "web-101", "title": "Forms", "topic": "form validation" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["origin"], "local_template");
    assert!(body.get("structured").is_none());
    assert!(body["sections"]["exercises"].as_str().unwrap().contains("form validation"));
  }

  #[tokio::test]
  async fn generate_requires_topic() {
    let (status, body) = call(
      app(),
      Method::POST,
      "/api/v1/lessons/generate",
      Some(json!({ "courseId": "web-101", "title": "Forms" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing required field: topic");
  }

  #[tokio::test]
  async fn unknown_course_is_not_found() {
    let (status, body) = call(app(), Method::GET, "/api/v1/courses/nope/flow", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Course not found: nope");
  }

  #[tokio::test]
  async fn lesson_reads_back_with_sections() {
    let (status, body) = call(app(), Method::GET, "/api/v1/courses/web-101/lessons/l-102", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], "l-102");
    assert_eq!(body["durationMinutes"], 40);
    assert_eq!(body["sections"]["introduction"], "<p>Every page is a tree of elements.</p>");
    assert!(body["sections"]["takeaways"].as_str().unwrap().contains("Structure first"));
  }

  #[tokio::test]
  async fn saved_sections_survive_a_round_trip() {
    let app = app();
    let sections = json!({ "introduction": "<p>Selectors</p>", "resources": "<a href=\"#\">MDN</a>" });
    let (status, _) = call(
      app.clone(),
      Method::PUT,
      "/api/v1/courses/web-101/lessons/l-103/sections",
      Some(json!({ "sections": sections })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = call(app, Method::GET, "/api/v1/courses/web-101/lessons/l-103", None).await;
    assert_eq!(body["sections"]["introduction"], "<p>Selectors</p>");
    assert_eq!(body["sections"]["resources"], "<a href=\"#\">MDN</a>");
    assert_eq!(body["sections"]["mainContent"], "");
  }

  #[tokio::test]
  async fn flow_lists_items_and_total() {
    let (status, body) = call(app(), Method::GET, "/api/v1/courses/web-101/flow", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"].as_array().unwrap().len(), 5);
    assert_eq!(body["items"][2]["kind"], "assignment");
    assert_eq!(body["totalDurationMinutes"], 245);
  }

  #[tokio::test]
  async fn flow_move_persists_and_rejects_bad_indices() {
    let app = app();
    let (status, body) = call(
      app.clone(),
      Method::POST,
      "/api/v1/courses/web-101/flow/move",
      Some(json!({ "fromIndex": 1, "toIndex": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["lessonIds"], json!(["l-102", "l-101", "l-103"]));
    assert_eq!(body["flow"][0]["order"], 1);

    let (status, body) = call(
      app.clone(),
      Method::POST,
      "/api/v1/courses/web-101/flow/move",
      Some(json!({ "fromIndex": 0, "toIndex": 7 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("out of range"));
    assert_eq!(body["flow"][0]["sourceId"], "l-102");

    let (_, lessons) = call(app, Method::GET, "/api/v1/courses/web-101/lessons", None).await;
    assert_eq!(lessons[0]["id"], "l-102");
  }

  #[tokio::test]
  async fn reorder_rejects_partial_lists() {
    let (status, _) = call(
      app(),
      Method::PUT,
      "/api/v1/courses/web-101/lessons/reorder",
      Some(json!({ "lessonIds": ["l-101"] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn new_assignment_joins_the_flow() {
    let app = app();
    let (status, created) = call(
      app.clone(),
      Method::POST,
      "/api/v1/courses/web-101/assignments",
      Some(json!({ "title": "Flexbox froggy", "type": "CODING", "timeLimit": 15 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let id = created["id"].as_str().unwrap().to_string();

    let (_, flow) = call(app, Method::GET, "/api/v1/courses/web-101/flow", None).await;
    let last = &flow["items"][5];
    assert_eq!(last["sourceId"], id.as_str());
    assert_eq!(last["durationMinutes"], 15);
  }

  #[tokio::test]
  async fn progress_sync_returns_push_entries() {
    let app = app();
    let (status, body) = call(
      app.clone(),
      Method::POST,
      "/api/v1/courses/web-101/progress/sync",
      Some(json!({ "entries": [
        { "lessonId": "l-101", "completed": true, "videoProgress": 100.0, "timeSpentSecs": 600 },
        { "lessonId": "ghost", "completed": true }
      ] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["entries"].as_array().unwrap().len(), 1);

    let (_, body) = call(app, Method::GET, "/api/v1/courses/web-101/progress", None).await;
    assert_eq!(body["entries"][0]["lessonId"], "l-101");
    assert_eq!(body["entries"][0]["completed"], true);
  }
}
