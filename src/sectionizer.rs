//! Lesson HTML → six named sections, and back.
//!
//! AI-generated lesson notes arrive as loosely structured HTML. Three strategies
//! are tried in order:
//!   1) tagged blocks `<section class="NAME">…</section>` (the form `recombine` writes),
//!   2) heading keyword search (first heading whose text matches a section's keywords),
//!   3) positional split on heading boundaries when neither intro nor main content matched.
//!
//! Every function here is total: odd or malformed markup degrades to empty sections.
//! Boundaries are found over tag tokens (`<h1>`…`<h6>`, `<section>`), never free text,
//! so `<header>`, `<hr>` or the word "overview" in a paragraph are not mistaken for headings.

use std::collections::HashMap;
use std::ops::Range;
use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::domain::{SectionKey, Sections};
use crate::util::strip_tags;

const LABEL_CLASS: &str = "section-label";

fn heading_open_re() -> Option<&'static Regex> {
  static RE: OnceLock<Option<Regex>> = OnceLock::new();
  RE.get_or_init(|| Regex::new(r"(?i)<h[1-6](?:\s[^>]*)?>").ok()).as_ref()
}

fn heading_close_re() -> Option<&'static Regex> {
  static RE: OnceLock<Option<Regex>> = OnceLock::new();
  RE.get_or_init(|| Regex::new(r"(?i)</h[1-6]\s*>").ok()).as_ref()
}

/// Opening (`attrs` captured) or closing `<section>` tag.
fn section_tag_re() -> Option<&'static Regex> {
  static RE: OnceLock<Option<Regex>> = OnceLock::new();
  RE.get_or_init(|| Regex::new(r"(?i)<section\b([^>]*)>|</section\s*>").ok()).as_ref()
}

fn class_attr_re() -> Option<&'static Regex> {
  static RE: OnceLock<Option<Regex>> = OnceLock::new();
  RE.get_or_init(|| Regex::new(r#"(?i)\bclass\s*=\s*(?:"([^"]*)"|'([^']*)')"#).ok()).as_ref()
}

/// A heading element located in a document.
struct Heading {
  /// Byte offset of the opening `<hN`.
  start: usize,
  /// Markup between the opening and closing tags.
  inner: Range<usize>,
  /// Byte offset just past the closing tag.
  end: usize,
}

/// Start offsets of every heading opening tag, in document order.
fn heading_starts(html: &str) -> Vec<usize> {
  match heading_open_re() {
    Some(re) => re.find_iter(html).map(|m| m.start()).collect(),
    None => Vec::new(),
  }
}

/// Every properly closed heading. An opening tag with no closing tag still counts as a
/// boundary (see `heading_starts`) but cannot be matched against keywords.
fn headings(html: &str) -> Vec<Heading> {
  let (Some(open), Some(close)) = (heading_open_re(), heading_close_re()) else {
    return Vec::new();
  };
  open
    .find_iter(html)
    .filter_map(|m| {
      let c = close.find_at(html, m.end())?;
      Some(Heading { start: m.start(), inner: m.end()..c.start(), end: c.end() })
    })
    .collect()
}

fn keyword_list(pattern: &str) -> Vec<String> {
  pattern
    .split('|')
    .map(|k| k.trim().to_lowercase())
    .filter(|k| !k.is_empty())
    .collect()
}

/// Return the content between the first heading whose text contains one of the
/// `|`-separated keywords (case-insensitive) and the next heading of any level,
/// or the end of the document. Empty when no heading matches.
pub fn extract_section(html: &str, keyword_pattern: &str) -> String {
  let keywords = keyword_list(keyword_pattern);
  if keywords.is_empty() {
    return String::new();
  }
  let starts = heading_starts(html);

  for h in headings(html) {
    let text = strip_tags(&html[h.inner.clone()]).to_lowercase();
    if keywords.iter().any(|k| text.contains(k.as_str())) {
      let stop = starts.iter().copied().find(|&s| s >= h.end).unwrap_or(html.len());
      return html[h.end..stop].trim().to_string();
    }
  }
  String::new()
}

/// Split a document into six sections. Always fully keyed; never panics.
pub fn sectionize(html: &str) -> Sections {
  if let Some(tagged) = tagged_sections(html) {
    debug!(target: "lesson", strategy = "tagged", "Sectionized lesson notes");
    return tagged;
  }

  let mut sections = Sections::default();
  for key in SectionKey::ALL {
    sections.set(key, extract_section(html, key.keywords()));
  }

  if sections.introduction.is_empty() && sections.main_content.is_empty() && !html.trim().is_empty() {
    apply_positional_fallback(html, &mut sections);
    debug!(target: "lesson", strategy = "positional", "Sectionized lesson notes");
  } else {
    debug!(target: "lesson", strategy = "headings", "Sectionized lesson notes");
  }
  sections
}

/// Chunks of the document, each starting at a heading opening tag
/// (the first chunk is the preamble, dropped when blank).
fn heading_chunks(html: &str) -> Vec<&str> {
  let mut cuts = heading_starts(html);
  cuts.push(html.len());

  let mut chunks = Vec::with_capacity(cuts.len());
  let mut prev = 0;
  for cut in cuts {
    if cut > prev {
      chunks.push(&html[prev..cut]);
    }
    prev = cut;
  }
  if chunks.first().is_some_and(|c| c.trim().is_empty()) {
    chunks.remove(0);
  }
  chunks
}

/// First chunk → introduction, chunks `[1, n-2)` → main content, last chunk → takeaways.
/// An empty middle puts the whole document in main content, so a document without
/// headings lands in all three.
fn apply_positional_fallback(html: &str, sections: &mut Sections) {
  let chunks = heading_chunks(html);
  let n = chunks.len();
  if n == 0 {
    return;
  }

  sections.introduction = chunks[0].trim().to_string();
  let middle = if n > 3 { chunks[1..n - 2].concat() } else { String::new() };
  sections.main_content = if middle.trim().is_empty() {
    html.trim().to_string()
  } else {
    middle.trim().to_string()
  };
  sections.takeaways = chunks[n - 1].trim().to_string();
}

/// An open `<section>` while scanning for tagged blocks.
struct OpenBlock {
  key: Option<SectionKey>,
  /// Some enclosing block already names a section.
  nested_in_key: bool,
  inner_start: usize,
}

fn block_key(attrs: &str, class_attr: &Regex) -> Option<SectionKey> {
  let classes = class_attr
    .captures(attrs)
    .and_then(|c| c.get(1).or_else(|| c.get(2)))
    .map(|m| m.as_str())?;
  classes.split_whitespace().find_map(SectionKey::from_name)
}

/// Read `<section class="NAME">` blocks. `None` when the document has no block whose
/// class names a section, so the caller falls through to heading search.
///
/// Open and close tags are paired by depth, so a body may carry its own `<section>`
/// elements. Only the outermost named blocks count; unclosed ones are ignored.
fn tagged_sections(html: &str) -> Option<Sections> {
  let tags = section_tag_re()?;
  let class_attr = class_attr_re()?;

  let mut sections = Sections::default();
  let mut seen: Vec<SectionKey> = Vec::new();
  let mut stack: Vec<OpenBlock> = Vec::new();
  for cap in tags.captures_iter(html) {
    let Some(tag) = cap.get(0) else { continue };
    if let Some(attrs) = cap.get(1) {
      let nested_in_key = stack.last().is_some_and(|b| b.key.is_some() || b.nested_in_key);
      stack.push(OpenBlock {
        key: block_key(attrs.as_str(), class_attr),
        nested_in_key,
        inner_start: tag.end(),
      });
      continue;
    }
    let Some(block) = stack.pop() else { continue };
    let Some(key) = block.key.filter(|_| !block.nested_in_key) else { continue };
    if seen.contains(&key) {
      continue;
    }
    seen.push(key);
    let inner = &html[block.inner_start..tag.start()];
    sections.set(key, strip_label(inner, key).trim().to_string());
  }

  if seen.is_empty() { None } else { Some(sections) }
}

/// Drop the label heading `recombine` puts at the top of a block. Older notes carry an
/// unclassed heading with decorations around the label text; that form is accepted too.
fn strip_label(inner: &str, key: SectionKey) -> &str {
  let Some(first) = headings(inner).into_iter().next() else {
    return inner;
  };
  if !inner[..first.start].trim().is_empty() {
    return inner;
  }
  let open_tag = &inner[first.start..first.inner.start];
  let text = strip_tags(&inner[first.inner.clone()]).to_lowercase();
  let label = key.label().replace("&amp;", "&").to_lowercase();
  let is_label = open_tag.contains(LABEL_CLASS) || text.replace("&amp;", "&").contains(&label);
  if is_label { &inner[first.end..] } else { inner }
}

/// Canonical persisted form: each non-empty section wrapped in a labeled
/// `<section>` block, concatenated in fixed order.
pub fn recombine(sections: &Sections) -> String {
  let mut out = String::new();
  for (key, value) in sections.iter() {
    let body = value.trim();
    if body.is_empty() {
      continue;
    }
    out.push_str(&format!(
      "<section class=\"{}\">\n<h2 class=\"{}\">{}</h2>\n{}\n</section>\n",
      key.class_name(),
      LABEL_CLASS,
      key.label(),
      body
    ));
  }
  out
}

/// Sections from an AI `structured` map. Unknown names are ignored; missing ones stay empty.
pub fn sections_from_structured(structured: &HashMap<String, String>) -> Sections {
  let mut sections = Sections::default();
  for (name, value) in structured {
    match SectionKey::from_name(name) {
      Some(key) => sections.set(key, value.trim().to_string()),
      None => debug!(target: "lesson", %name, "Ignoring unknown structured section"),
    }
  }
  sections
}
