//! Domain models: lesson sections, lessons, assignments, courses and flow items.

use serde::{Deserialize, Serialize};

/// One of the six fixed pedagogical sections of a lesson.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SectionKey {
  Introduction,
  MainContent,
  Examples,
  Exercises,
  Takeaways,
  Resources,
}

impl SectionKey {
  /// Fixed presentation and persistence order.
  pub const ALL: [SectionKey; 6] = [
    SectionKey::Introduction,
    SectionKey::MainContent,
    SectionKey::Examples,
    SectionKey::Exercises,
    SectionKey::Takeaways,
    SectionKey::Resources,
  ];

  /// Name used in JSON payloads.
  pub fn wire_name(self) -> &'static str {
    match self {
      SectionKey::Introduction => "introduction",
      SectionKey::MainContent => "mainContent",
      SectionKey::Examples => "examples",
      SectionKey::Exercises => "exercises",
      SectionKey::Takeaways => "takeaways",
      SectionKey::Resources => "resources",
    }
  }

  /// Class attribute of the `<section>` block in persisted lesson notes.
  pub fn class_name(self) -> &'static str {
    match self {
      SectionKey::MainContent => "main-content",
      other => other.wire_name(),
    }
  }

  /// Heading shown above the section when notes are recombined.
  pub fn label(self) -> &'static str {
    match self {
      SectionKey::Introduction => "Introduction &amp; Learning Objectives",
      SectionKey::MainContent => "Main Content",
      SectionKey::Examples => "Examples &amp; Demonstrations",
      SectionKey::Exercises => "Practice Exercises",
      SectionKey::Takeaways => "Key Takeaways",
      SectionKey::Resources => "Additional Resources",
    }
  }

  /// Alternative heading keywords, `|`-separated, matched case-insensitively.
  pub fn keywords(self) -> &'static str {
    match self {
      SectionKey::Introduction => "introduction|overview|learning objectives",
      SectionKey::MainContent => "key concepts|main content|concepts",
      SectionKey::Examples => "examples|code snippets|demonstrations",
      SectionKey::Exercises => "practice|exercises|activities",
      SectionKey::Takeaways => "summary|takeaways|conclusion",
      SectionKey::Resources => "resources|further reading|links",
    }
  }

  /// Accepts wire names, class names and the legacy editor field names.
  pub fn from_name(name: &str) -> Option<SectionKey> {
    match name.trim().to_ascii_lowercase().as_str() {
      "introduction" => Some(SectionKey::Introduction),
      "maincontent" | "main-content" | "main_content" => Some(SectionKey::MainContent),
      "examples" => Some(SectionKey::Examples),
      "exercises" | "practiceexercises" => Some(SectionKey::Exercises),
      "takeaways" | "keytakeaways" => Some(SectionKey::Takeaways),
      "resources" | "additionalresources" => Some(SectionKey::Resources),
      _ => None,
    }
  }
}

/// Fully keyed section map: every `SectionKey` always has a (possibly empty) value.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Sections {
  pub introduction: String,
  pub main_content: String,
  pub examples: String,
  #[serde(alias = "practiceExercises")]
  pub exercises: String,
  #[serde(alias = "keyTakeaways")]
  pub takeaways: String,
  #[serde(alias = "additionalResources")]
  pub resources: String,
}

impl Sections {
  pub fn get(&self, key: SectionKey) -> &str {
    match key {
      SectionKey::Introduction => &self.introduction,
      SectionKey::MainContent => &self.main_content,
      SectionKey::Examples => &self.examples,
      SectionKey::Exercises => &self.exercises,
      SectionKey::Takeaways => &self.takeaways,
      SectionKey::Resources => &self.resources,
    }
  }

  pub fn set(&mut self, key: SectionKey, value: String) {
    let slot = match key {
      SectionKey::Introduction => &mut self.introduction,
      SectionKey::MainContent => &mut self.main_content,
      SectionKey::Examples => &mut self.examples,
      SectionKey::Exercises => &mut self.exercises,
      SectionKey::Takeaways => &mut self.takeaways,
      SectionKey::Resources => &mut self.resources,
    };
    *slot = value;
  }

  /// Sections in fixed order, including empty ones.
  pub fn iter(&self) -> impl Iterator<Item = (SectionKey, &str)> + '_ {
    SectionKey::ALL.into_iter().map(move |k| (k, self.get(k)))
  }

  pub fn is_empty(&self) -> bool {
    self.iter().all(|(_, v)| v.trim().is_empty())
  }
}

/// A lesson as stored in a course. `notes` is the raw HTML the sectionizer reads.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
  pub id: String,
  pub title: String,
  #[serde(default)] pub content: String,
  #[serde(default)] pub notes: String,
  #[serde(default)] pub video_url: Option<String>,
  #[serde(default)] pub duration_minutes: u32,
  #[serde(default)] pub order: Option<u32>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssignmentKind {
  #[default]
  Coding,
  Quiz,
  Essay,
  Project,
}

/// Where an assignment came from; shown as a badge in the student flow.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssignmentSource {
  #[default]
  Manual,
  AiGenerated,
  Codeforces,
  Skipped,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
  pub id: String,
  pub title: String,
  #[serde(default, rename = "type")] pub kind: AssignmentKind,
  #[serde(default)] pub difficulty: String,
  #[serde(default)] pub time_limit: Option<u32>,
  #[serde(default)] pub points: u32,
  #[serde(default)] pub order: Option<u32>,
  #[serde(default)] pub source: AssignmentSource,
}

/// A course with its two independently ordered collections.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
  pub id: String,
  pub title: String,
  #[serde(default)] pub difficulty: String,
  #[serde(default)] pub lessons: Vec<Lesson>,
  #[serde(default)] pub assignments: Vec<Assignment>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowItemKind {
  Lesson,
  Assignment,
}

/// One step of a course's learning sequence.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowItem {
  /// `lesson-<id>` or `assignment-<id>`; unique within one flow.
  pub id: String,
  /// Id of the lesson or assignment this item points at.
  pub source_id: String,
  pub kind: FlowItemKind,
  pub title: String,
  pub order: u32,
  pub duration_minutes: u32,
}
