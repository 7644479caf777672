//! Application state: in-memory course catalog, progress store, prompts and AI client.
//!
//! This module owns:
//!   - the course catalog (lessons + assignments per course)
//!   - the authoritative lesson progress cache
//!   - the prompts struct (from TOML or defaults)
//!   - optional OpenAI client
//!
//! Lessons are looked up by explicit id only. Sections are never stored; they are
//! recomputed from `Lesson::notes` whenever a caller reads them.

use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::config::{load_config_from_env, AppConfig, AssignmentCfg, CourseCfg, LessonCfg, Prompts};
use crate::domain::{Assignment, Course, Lesson};
use crate::error::AppError;
use crate::openai::OpenAI;
use crate::progress::{ProgressCache, ProgressEntry, Reconciliation};
use crate::seeds::seed_courses;

/// Fields an author supplies for a new lesson; id and order are assigned by the store.
#[derive(Clone, Debug, Default)]
pub struct NewLesson {
    pub title: String,
    pub content: String,
    pub notes: String,
    pub video_url: Option<String>,
    pub duration_minutes: u32,
}

#[derive(Clone)]
pub struct AppState {
    pub courses: Arc<RwLock<HashMap<String, Course>>>,
    pub progress: Arc<RwLock<ProgressCache>>,
    pub openai: Option<OpenAI>,
    pub prompts: Prompts,
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn lesson_from_cfg(l: &LessonCfg) -> Lesson {
    Lesson {
        id: l.id.clone().unwrap_or_else(new_id),
        title: l.title.clone(),
        content: l.content.clone(),
        notes: l.notes.clone(),
        video_url: l.video_url.clone(),
        duration_minutes: l.duration_minutes,
        order: l.order,
    }
}

fn assignment_from_cfg(a: &AssignmentCfg) -> Assignment {
    Assignment {
        id: a.id.clone().unwrap_or_else(new_id),
        title: a.title.clone(),
        kind: a.kind,
        difficulty: a.difficulty.clone(),
        time_limit: a.time_limit,
        points: a.points,
        order: a.order,
        source: a.source,
    }
}

fn course_from_cfg(c: &CourseCfg) -> Course {
    Course {
        id: c.id.clone().unwrap_or_else(new_id),
        title: c.title.clone(),
        difficulty: c.difficulty.clone(),
        lessons: c.lessons.iter().map(lesson_from_cfg).collect(),
        assignments: c.assignments.iter().map(assignment_from_cfg).collect(),
    }
}

impl AppState {
    /// Build state from env: load config, seed the catalog, init OpenAI.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Self {
        let openai = OpenAI::from_env();
        if let Some(oa) = &openai {
            info!(target: "lessonflow_backend", base_url = %oa.base_url, model = %oa.model, "OpenAI enabled.");
        } else {
            info!(target: "lessonflow_backend", "OpenAI disabled (no OPENAI_API_KEY). Using local lesson template.");
        }
        Self::from_parts(load_config_from_env(), openai)
    }

    /// Build state from an already loaded config. Config courses win over built-in seeds
    /// with the same id.
    pub fn from_parts(cfg: Option<AppConfig>, openai: Option<OpenAI>) -> Self {
        let prompts = cfg.as_ref().map(|c| c.prompts.clone()).unwrap_or_default();

        let mut courses = HashMap::<String, Course>::new();
        if let Some(cfg) = &cfg {
            for cc in &cfg.courses {
                let course = course_from_cfg(cc);
                courses.insert(course.id.clone(), course);
            }
        }
        for c in seed_courses() {
            courses.entry(c.id.clone()).or_insert(c);
        }

        for c in courses.values() {
            info!(target: "lessonflow_backend", course_id = %c.id, lessons = c.lessons.len(), assignments = c.assignments.len(), "Startup course inventory");
        }

        Self {
            courses: Arc::new(RwLock::new(courses)),
            progress: Arc::new(RwLock::new(ProgressCache::new())),
            openai,
            prompts,
        }
    }

    /// All courses, sorted by id.
    pub async fn list_courses(&self) -> Vec<Course> {
        let mut out: Vec<Course> = self.courses.read().await.values().cloned().collect();
        out.sort_by(|a, b| a.id.cmp(&b.id));
        out
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn get_course(&self, course_id: &str) -> Result<Course, AppError> {
        self.courses
            .read()
            .await
            .get(course_id)
            .cloned()
            .ok_or_else(|| AppError::CourseNotFound(course_id.to_string()))
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn get_lesson(&self, course_id: &str, lesson_id: &str) -> Result<Lesson, AppError> {
        let course = self.get_course(course_id).await?;
        course
            .lessons
            .into_iter()
            .find(|l| l.id == lesson_id)
            .ok_or_else(|| AppError::LessonNotFound(lesson_id.to_string()))
    }

    /// Append a lesson at the end of the course.
    #[instrument(level = "info", skip(self, new), fields(title = %new.title))]
    pub async fn add_lesson(&self, course_id: &str, new: NewLesson) -> Result<Lesson, AppError> {
        let mut courses = self.courses.write().await;
        let course = courses
            .get_mut(course_id)
            .ok_or_else(|| AppError::CourseNotFound(course_id.to_string()))?;
        let order = u32::try_from(course.lessons.len() + 1).unwrap_or(u32::MAX);
        let lesson = Lesson {
            id: new_id(),
            title: new.title,
            content: new.content,
            notes: new.notes,
            video_url: new.video_url,
            duration_minutes: new.duration_minutes,
            order: Some(order),
        };
        course.lessons.push(lesson.clone());
        info!(target: "lesson", %course_id, lesson_id = %lesson.id, order, "Lesson added");
        Ok(lesson)
    }

    /// Replace a lesson's raw notes.
    #[instrument(level = "info", skip(self, notes), fields(notes_len = notes.len()))]
    pub async fn save_lesson_notes(
        &self,
        course_id: &str,
        lesson_id: &str,
        notes: String,
    ) -> Result<Lesson, AppError> {
        let mut courses = self.courses.write().await;
        let course = courses
            .get_mut(course_id)
            .ok_or_else(|| AppError::CourseNotFound(course_id.to_string()))?;
        let lesson = course
            .lessons
            .iter_mut()
            .find(|l| l.id == lesson_id)
            .ok_or_else(|| AppError::LessonNotFound(lesson_id.to_string()))?;
        lesson.notes = notes;
        Ok(lesson.clone())
    }

    /// Put the course's lessons in the given id order and renumber them `1..=N`.
    /// The list must name every lesson exactly once; on error the store is untouched.
    #[instrument(level = "info", skip(self, lesson_ids), fields(count = lesson_ids.len()))]
    pub async fn reorder_lessons(
        &self,
        course_id: &str,
        lesson_ids: &[String],
    ) -> Result<Vec<Lesson>, AppError> {
        let mut courses = self.courses.write().await;
        let course = courses
            .get_mut(course_id)
            .ok_or_else(|| AppError::CourseNotFound(course_id.to_string()))?;

        let mut by_id: HashMap<&str, &Lesson> =
            course.lessons.iter().map(|l| (l.id.as_str(), l)).collect();
        let mut reordered = Vec::with_capacity(lesson_ids.len());
        for (i, id) in lesson_ids.iter().enumerate() {
            let lesson = match by_id.remove(id.as_str()) {
                Some(l) => l,
                None if course.lessons.iter().any(|l| &l.id == id) => {
                    return Err(AppError::InvalidReorder(format!("lesson {id} listed twice")));
                }
                None => return Err(AppError::LessonNotFound(id.clone())),
            };
            let mut lesson = lesson.clone();
            lesson.order = Some(u32::try_from(i + 1).unwrap_or(u32::MAX));
            reordered.push(lesson);
        }
        if !by_id.is_empty() {
            let mut missing: Vec<&str> = by_id.into_keys().collect();
            missing.sort_unstable();
            return Err(AppError::InvalidReorder(format!("missing lessons: {}", missing.join(", "))));
        }

        course.lessons = reordered;
        info!(target: "flow", %course_id, count = course.lessons.len(), "Lessons reordered");
        Ok(course.lessons.clone())
    }

    /// Append an assignment. Its order is left unset unless given.
    #[instrument(level = "info", skip(self, assignment), fields(title = %assignment.title))]
    pub async fn add_assignment(
        &self,
        course_id: &str,
        mut assignment: Assignment,
    ) -> Result<Assignment, AppError> {
        let mut courses = self.courses.write().await;
        let course = courses
            .get_mut(course_id)
            .ok_or_else(|| AppError::CourseNotFound(course_id.to_string()))?;
        if assignment.id.trim().is_empty() {
            assignment.id = new_id();
        }
        if course.assignments.iter().any(|a| a.id == assignment.id) {
            warn!(target: "flow", %course_id, assignment_id = %assignment.id, "Assignment id reused; assigning a fresh one");
            assignment.id = new_id();
        }
        course.assignments.push(assignment.clone());
        Ok(assignment)
    }

    pub async fn progress_for_course(&self, course_id: &str) -> Result<Vec<ProgressEntry>, AppError> {
        self.get_course(course_id).await?;
        Ok(self.progress.read().await.entries_for_course(course_id))
    }

    /// Merge a client's local progress snapshot into the authoritative cache.
    #[instrument(level = "info", skip(self, entries), fields(count = entries.len()))]
    pub async fn sync_progress(
        &self,
        course_id: &str,
        entries: &[ProgressEntry],
    ) -> Result<Reconciliation, AppError> {
        let course = self.get_course(course_id).await?;
        let known: Vec<ProgressEntry> = entries
            .iter()
            .filter(|e| {
                let ok = course.lessons.iter().any(|l| l.id == e.lesson_id);
                if !ok {
                    warn!(target: "progress", %course_id, lesson_id = %e.lesson_id, "Dropping progress for unknown lesson");
                }
                ok
            })
            .cloned()
            .collect();
        Ok(self.progress.write().await.reconcile(course_id, &known))
    }
}
