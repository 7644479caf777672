//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Field names are camelCase on the wire to match the authoring frontend.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::{Assignment, AssignmentKind, AssignmentSource, Course, FlowItem, Lesson, Sections};
use crate::progress::ProgressEntry;

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    Sectionize {
        html: String,
    },
    Recombine {
        sections: Sections,
    },
    GetFlow {
        #[serde(rename = "courseId")]
        course_id: String,
    },
    MoveFlowItem {
        #[serde(rename = "courseId")]
        course_id: String,
        #[serde(rename = "fromIndex")]
        from_index: usize,
        #[serde(rename = "toIndex")]
        to_index: usize,
    },
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    Sections {
        sections: Sections,
    },
    Recombined {
        html: String,
    },
    Flow {
        flow: FlowOut,
    },
    FlowMoved {
        result: FlowMoveOut,
    },
    Error {
        message: String,
        /// Present when a move failed: the flow rebuilt from the unchanged store.
        #[serde(skip_serializing_if = "Option::is_none")]
        flow: Option<Vec<FlowItem>>,
    },
}

//
// HTTP request/response DTOs
//

#[derive(Debug, Deserialize)]
pub struct SectionizeIn {
    pub html: String,
}
#[derive(Debug, Serialize)]
pub struct SectionizeOut {
    pub sections: Sections,
}

#[derive(Debug, Deserialize)]
pub struct RecombineIn {
    pub sections: Sections,
}
#[derive(Debug, Serialize)]
pub struct RecombineOut {
    pub html: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateLessonIn {
    #[serde(default)]
    pub course_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub difficulty: Option<String>,
}
#[derive(Debug, Serialize)]
pub struct GenerateLessonOut {
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structured: Option<HashMap<String, String>>,
    pub sections: Sections,
    pub origin: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseSummaryOut {
    pub id: String,
    pub title: String,
    pub difficulty: String,
    pub lesson_count: usize,
    pub assignment_count: usize,
}

pub fn to_summary(c: &Course) -> CourseSummaryOut {
    CourseSummaryOut {
        id: c.id.clone(),
        title: c.title.clone(),
        difficulty: c.difficulty.clone(),
        lesson_count: c.lessons.len(),
        assignment_count: c.assignments.len(),
    }
}

/// Lesson with its derived sections.
#[derive(Debug, Serialize)]
pub struct LessonOut {
    #[serde(flatten)]
    pub lesson: Lesson,
    pub sections: Sections,
}

/// New lesson: either raw `notes` or editor `sections` (sections win when both are sent).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLessonIn {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub sections: Option<Sections>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub duration_minutes: u32,
}

#[derive(Debug, Deserialize)]
pub struct SaveSectionsIn {
    pub sections: Sections,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderLessonsIn {
    pub lesson_ids: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAssignmentIn {
    #[serde(default)]
    pub title: String,
    #[serde(default, rename = "type")]
    pub kind: AssignmentKind,
    #[serde(default)]
    pub difficulty: String,
    #[serde(default)]
    pub time_limit: Option<u32>,
    #[serde(default)]
    pub points: u32,
    #[serde(default)]
    pub order: Option<u32>,
    #[serde(default)]
    pub source: AssignmentSource,
}

pub fn to_assignment(a: CreateAssignmentIn) -> Assignment {
    Assignment {
        id: String::new(),
        title: a.title,
        kind: a.kind,
        difficulty: a.difficulty,
        time_limit: a.time_limit,
        points: a.points,
        order: a.order,
        source: a.source,
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowOut {
    pub items: Vec<FlowItem>,
    pub total_duration_minutes: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveFlowIn {
    pub from_index: usize,
    pub to_index: usize,
}

/// Computed order of an assignment after a move (not persisted).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssignmentUpdate {
    pub id: String,
    pub order: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowMoveOut {
    pub flow: Vec<FlowItem>,
    pub lesson_ids: Vec<String>,
    pub assignment_updates: Vec<AssignmentUpdate>,
}

#[derive(Debug, Serialize)]
pub struct FlowMoveErrorOut {
    pub error: String,
    pub flow: Vec<FlowItem>,
}

#[derive(Debug, Deserialize)]
pub struct ProgressSyncIn {
    #[serde(default)]
    pub entries: Vec<ProgressEntry>,
}
#[derive(Debug, Serialize)]
pub struct ProgressOut {
    pub entries: Vec<ProgressEntry>,
}
#[derive(Debug, Serialize)]
pub struct ProgressSyncOut {
    pub entries: Vec<ProgressEntry>,
    /// Entries the client must overwrite its local copy with.
    pub push: Vec<ProgressEntry>,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}
