//! Lesson progress cache keyed by `(course_id, lesson_id)`.
//!
//! Clients keep their own copy of completion flags and video progress. Instead of
//! letting two stores drift, both sides are merged through `reconcile`, which is
//! monotonic: completion never reverts, progress and time spent only grow.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEntry {
  pub lesson_id: String,
  #[serde(default)] pub completed: bool,
  /// Percent of the lesson video watched, 0–100.
  #[serde(default)] pub video_progress: f32,
  #[serde(default)] pub time_spent_secs: u64,
}

impl ProgressEntry {
  /// Combine two observations of the same lesson.
  pub fn merged(&self, other: &ProgressEntry) -> ProgressEntry {
    ProgressEntry {
      lesson_id: self.lesson_id.clone(),
      completed: self.completed || other.completed,
      video_progress: clamp_percent(self.video_progress.max(other.video_progress)),
      time_spent_secs: self.time_spent_secs.max(other.time_spent_secs),
    }
  }
}

fn clamp_percent(p: f32) -> f32 {
  if p.is_nan() { 0.0 } else { p.clamp(0.0, 100.0) }
}

/// Outcome of merging a remote snapshot into the cache.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reconciliation {
  /// Every entry of the course after the merge, sorted by lesson id.
  pub merged: Vec<ProgressEntry>,
  /// Entries the remote side is behind on (or missing) and must take.
  pub push: Vec<ProgressEntry>,
  /// Lesson ids the cache learned something new about from the remote side.
  pub pull: Vec<String>,
}

#[derive(Clone, Debug, Default)]
pub struct ProgressCache {
  entries: HashMap<(String, String), ProgressEntry>,
}

impl ProgressCache {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn get(&self, course_id: &str, lesson_id: &str) -> Option<&ProgressEntry> {
    self.entries.get(&(course_id.to_string(), lesson_id.to_string()))
  }

  /// Merge one update and return the stored result.
  pub fn record(&mut self, course_id: &str, update: ProgressEntry) -> ProgressEntry {
    let key = (course_id.to_string(), update.lesson_id.clone());
    let merged = match self.entries.get(&key) {
      Some(existing) => existing.merged(&update),
      None => ProgressEntry { video_progress: clamp_percent(update.video_progress), ..update },
    };
    self.entries.insert(key, merged.clone());
    merged
  }

  pub fn entries_for_course(&self, course_id: &str) -> Vec<ProgressEntry> {
    let mut out: Vec<ProgressEntry> = self
      .entries
      .iter()
      .filter(|((c, _), _)| c == course_id)
      .map(|(_, e)| e.clone())
      .collect();
    out.sort_by(|a, b| a.lesson_id.cmp(&b.lesson_id));
    out
  }

  /// Merge `remote` (another store's view of `course_id`) into this cache.
  pub fn reconcile(&mut self, course_id: &str, remote: &[ProgressEntry]) -> Reconciliation {
    let mut pull = Vec::new();
    let mut remote_by_lesson: HashMap<String, ProgressEntry> = HashMap::new();

    for r in remote {
      let combined = match remote_by_lesson.get(&r.lesson_id) {
        Some(prev) => prev.merged(r),
        None => r.clone(),
      };
      remote_by_lesson.insert(r.lesson_id.clone(), combined);
    }

    for r in remote_by_lesson.values() {
      let before = self.get(course_id, &r.lesson_id).cloned();
      let after = self.record(course_id, r.clone());
      if before.as_ref() != Some(&after) {
        pull.push(after.lesson_id.clone());
      }
    }
    pull.sort();

    let merged = self.entries_for_course(course_id);
    let push: Vec<ProgressEntry> = merged
      .iter()
      .filter(|e| remote_by_lesson.get(&e.lesson_id) != Some(*e))
      .cloned()
      .collect();

    info!(target: "progress", %course_id, remote = remote.len(), pulled = pull.len(), pushed = push.len(), "Reconciled lesson progress");
    debug!(target: "progress", %course_id, ?pull, "Lessons updated from remote");
    Reconciliation { merged, push, pull }
  }
}
