//! Seed data and the local lesson template used when no AI backend is configured.

use crate::domain::{Assignment, AssignmentKind, AssignmentSource, Course, Lesson};

/// Built-in demo course so the service is useful without external config.
pub fn seed_courses() -> Vec<Course> {
  vec![Course {
    id: "web-101".into(),
    title: "Web Development Basics".into(),
    difficulty: "beginner".into(),
    lessons: vec![
      Lesson {
        id: "l-101".into(),
        title: "How the Web Works".into(),
        content: "Clients, servers and HTTP".into(),
        notes: "<section class=\"introduction\">\n<h2 class=\"section-label\">Introduction &amp; Learning Objectives</h2>\n<p>Follow a request from the browser to a server and back.</p>\n</section>\n\
                <section class=\"main-content\">\n<h2 class=\"section-label\">Main Content</h2>\n<p>HTTP is a request/response protocol over TCP.</p>\n</section>\n".into(),
        video_url: None,
        duration_minutes: 25,
        order: Some(1),
      },
      Lesson {
        id: "l-102".into(),
        title: "HTML Structure".into(),
        content: "Elements, attributes and document outline".into(),
        notes: "<h2>Overview</h2><p>Every page is a tree of elements.</p>\
                <h2>Key Concepts</h2><p>Block vs inline, semantic tags.</p>\
                <h2>Examples</h2><pre>&lt;main&gt;&lt;/main&gt;</pre>\
                <h2>Summary</h2><p>Structure first, style later.</p>".into(),
        video_url: Some("https://www.youtube.com/embed/UB1O30fR-EE".into()),
        duration_minutes: 40,
        order: Some(2),
      },
      Lesson {
        id: "l-103".into(),
        title: "Styling with CSS".into(),
        content: "Selectors and the cascade".into(),
        notes: String::new(),
        video_url: None,
        duration_minutes: 0,
        order: Some(4),
      },
    ],
    assignments: vec![
      Assignment {
        id: "a-201".into(),
        title: "Build a personal landing page".into(),
        kind: AssignmentKind::Project,
        difficulty: "EASY".into(),
        time_limit: Some(90),
        points: 100,
        order: Some(3),
        source: AssignmentSource::Manual,
      },
      Assignment {
        id: "a-202".into(),
        title: "CSS selectors quiz".into(),
        kind: AssignmentKind::Quiz,
        difficulty: "EASY".into(),
        time_limit: None,
        points: 20,
        order: None,
        source: AssignmentSource::AiGenerated,
      },
    ],
  }]
}

/// Headed lesson skeleton used as a last-resort generator. Its headings line up with
/// the sectionizer's keyword lists, so every section is populated.
pub fn local_lesson_template(course_title: &str, title: &str, topic: &str, difficulty: &str) -> String {
  format!(
    "<h2>Introduction</h2>\n<p>In this {difficulty} lesson of <strong>{course_title}</strong> you will learn about {topic}.</p>\n\
     <h2>Key Concepts</h2>\n<p>{title}: the core ideas behind {topic}, broken into small steps.</p>\n\
     <h2>Examples</h2>\n<p>A worked example applying {topic} to a familiar problem.</p>\n\
     <h2>Practice Exercises</h2>\n<ol><li>Explain {topic} in your own words.</li><li>Apply it to a small task.</li></ol>\n\
     <h2>Key Takeaways</h2>\n<ul><li>{title} builds directly on what you already know.</li></ul>\n\
     <h2>Resources</h2>\n<p>Look up \"{topic}\" in the course reading list.</p>\n"
  )
}
