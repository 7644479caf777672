//! Loading service configuration (prompts + optional course catalog) from TOML.
//!
//! See `AppConfig` and `Prompts` for expected schema. Example:
//!
//! ```toml
//! [prompts]
//! lesson_system = "You are an expert educational content creator..."
//!
//! [[courses]]
//! id = "rust-101"
//! title = "Rust Fundamentals"
//! difficulty = "beginner"
//!
//! [[courses.lessons]]
//! title = "Ownership"
//! duration_minutes = 45
//!
//! [[courses.assignments]]
//! title = "Borrow checker kata"
//! type = "CODING"
//! time_limit = 40
//! ```

use serde::Deserialize;
use tracing::{error, info};

use crate::domain::{AssignmentKind, AssignmentSource};

pub const CONFIG_PATH_ENV: &str = "LESSONFLOW_CONFIG_PATH";

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AppConfig {
  #[serde(default)]
  pub prompts: Prompts,
  #[serde(default)]
  pub courses: Vec<CourseCfg>,
}

/// Course entry accepted in TOML configuration. Missing ids are generated at startup.
#[derive(Clone, Debug, Deserialize)]
pub struct CourseCfg {
  #[serde(default)] pub id: Option<String>,
  pub title: String,
  #[serde(default)] pub difficulty: String,
  #[serde(default)] pub lessons: Vec<LessonCfg>,
  #[serde(default)] pub assignments: Vec<AssignmentCfg>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct LessonCfg {
  #[serde(default)] pub id: Option<String>,
  pub title: String,
  #[serde(default)] pub content: String,
  #[serde(default)] pub notes: String,
  #[serde(default)] pub video_url: Option<String>,
  #[serde(default)] pub duration_minutes: u32,
  #[serde(default)] pub order: Option<u32>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct AssignmentCfg {
  #[serde(default)] pub id: Option<String>,
  pub title: String,
  #[serde(default, rename = "type")] pub kind: AssignmentKind,
  #[serde(default)] pub difficulty: String,
  #[serde(default)] pub time_limit: Option<u32>,
  #[serde(default)] pub points: u32,
  #[serde(default)] pub order: Option<u32>,
  #[serde(default)] pub source: AssignmentSource,
}

/// Prompts used by the lesson generator. Override them in TOML to tune tone/structure.
/// Placeholders: `{course_title}`, `{title}`, `{topic}`, `{difficulty}`.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Prompts {
  pub lesson_system: String,
  pub lesson_user_template: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      lesson_system: "You are an expert educational content creator. Write clear, student-friendly lesson content. Respond ONLY with strict JSON.".into(),
      lesson_user_template: "Course: {course_title}\nDifficulty: {difficulty}\nLesson title: {title}\nLesson topic: {topic}\n\nWrite the lesson as HTML with <h2> headings named exactly: Introduction, Key Concepts, Examples, Practice Exercises, Key Takeaways, Resources.\nReturn JSON {\"content\": string (the full HTML), \"structured\": {\"introduction\": string, \"mainContent\": string, \"examples\": string, \"exercises\": string, \"takeaways\": string, \"resources\": string}} where each structured value is the HTML under that heading without the heading itself.".into(),
    }
  }
}

pub fn parse_config(raw: &str) -> Result<AppConfig, toml::de::Error> {
  toml::from_str::<AppConfig>(raw)
}

/// Attempt to load `AppConfig` from LESSONFLOW_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_config_from_env() -> Option<AppConfig> {
  let path = std::env::var(CONFIG_PATH_ENV).ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match parse_config(&s) {
      Ok(cfg) => {
        info!(target: "lessonflow_backend", %path, courses = cfg.courses.len(), "Loaded config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "lessonflow_backend", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "lessonflow_backend", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_catalog_and_keeps_default_prompts() {
    let cfg = parse_config(
      r#"
      [[courses]]
      id = "rust-101"
      title = "Rust Fundamentals"

      [[courses.lessons]]
      title = "Ownership"
      duration_minutes = 45

      [[courses.assignments]]
      title = "Kata"
      type = "QUIZ"
      source = "AI_GENERATED"
      "#,
    )
    .expect("config");

    assert_eq!(cfg.courses.len(), 1);
    let course = &cfg.courses[0];
    assert_eq!(course.lessons[0].duration_minutes, 45);
    assert_eq!(course.assignments[0].kind, AssignmentKind::Quiz);
    assert_eq!(course.assignments[0].source, AssignmentSource::AiGenerated);
    assert!(cfg.prompts.lesson_user_template.contains("{topic}"));
  }

  #[test]
  fn partial_prompts_override_only_given_fields() {
    let cfg = parse_config("[prompts]\nlesson_system = \"be brief\"\n").expect("config");
    assert_eq!(cfg.prompts.lesson_system, "be brief");
    assert_eq!(cfg.prompts.lesson_user_template, Prompts::default().lesson_user_template);
  }
}
