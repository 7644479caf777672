//! Service errors surfaced to HTTP and WebSocket callers.

use axum::{
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AppError {
  #[error("Course not found: {0}")]
  CourseNotFound(String),

  #[error("Lesson not found: {0}")]
  LessonNotFound(String),

  #[error("Flow index out of range: from={from} to={to} len={len}")]
  IndexOutOfRange { from: usize, to: usize, len: usize },

  #[error("Invalid reorder: {0}")]
  InvalidReorder(String),

  #[error("Missing required field: {0}")]
  MissingField(&'static str),
}

impl AppError {
  pub fn status(&self) -> StatusCode {
    match self {
      AppError::CourseNotFound(_) | AppError::LessonNotFound(_) => StatusCode::NOT_FOUND,
      AppError::IndexOutOfRange { .. } | AppError::InvalidReorder(_) | AppError::MissingField(_) => {
        StatusCode::BAD_REQUEST
      }
    }
  }
}

impl IntoResponse for AppError {
  fn into_response(self) -> Response {
    let body = Json(json!({ "error": self.to_string() }));
    (self.status(), body).into_response()
  }
}
