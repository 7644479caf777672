//! Course flow: one ordered path over a course's lessons and assignments.
//!
//! `build_flow` derives the whole sequence from the source collections every time;
//! there is no incremental update. `move_item` is the instructor's manual reorder
//! and always renumbers the result to `1..=N`.

use crate::domain::{Assignment, FlowItem, FlowItemKind, Lesson};

const DEFAULT_LESSON_MINUTES: u32 = 30;
const DEFAULT_ASSIGNMENT_MINUTES: u32 = 60;

/// An order of zero reads as "unset" (an unset integer column upstream is zero).
fn explicit_order(order: Option<u32>) -> Option<u32> {
  order.filter(|&o| o > 0)
}

fn position(index: usize) -> u32 {
  u32::try_from(index + 1).unwrap_or(u32::MAX)
}

pub fn lesson_item(lesson: &Lesson, index: usize) -> FlowItem {
  FlowItem {
    id: format!("lesson-{}", lesson.id),
    source_id: lesson.id.clone(),
    kind: FlowItemKind::Lesson,
    title: lesson.title.clone(),
    order: explicit_order(lesson.order).unwrap_or_else(|| position(index)),
    duration_minutes: if lesson.duration_minutes > 0 { lesson.duration_minutes } else { DEFAULT_LESSON_MINUTES },
  }
}

/// `lessons_len` is the size of the lesson collection the assignment is merged after.
pub fn assignment_item(assignment: &Assignment, index: usize, lessons_len: usize) -> FlowItem {
  FlowItem {
    id: format!("assignment-{}", assignment.id),
    source_id: assignment.id.clone(),
    kind: FlowItemKind::Assignment,
    title: assignment.title.clone(),
    order: explicit_order(assignment.order).unwrap_or_else(|| position(lessons_len + index)),
    duration_minutes: assignment
      .time_limit
      .filter(|&m| m > 0)
      .unwrap_or(DEFAULT_ASSIGNMENT_MINUTES),
  }
}

/// Merge lessons and assignments into one sequence sorted by order.
/// Ties keep input order: lessons first, then assignments.
pub fn build_flow(lessons: &[Lesson], assignments: &[Assignment]) -> Vec<FlowItem> {
  let mut items: Vec<FlowItem> = lessons
    .iter()
    .enumerate()
    .map(|(i, l)| lesson_item(l, i))
    .chain(assignments.iter().enumerate().map(|(j, a)| assignment_item(a, j, lessons.len())))
    .collect();
  // Vec::sort_by_key is stable.
  items.sort_by_key(|item| item.order);
  items
}

/// Move the item at `from` to `to` (remove, then insert into the shortened sequence)
/// and renumber every item to its new position.
///
/// # Panics
///
/// When `from` or `to` is not a valid index of `flow`. Callers check bounds first.
pub fn move_item(flow: &[FlowItem], from: usize, to: usize) -> Vec<FlowItem> {
  assert!(from < flow.len() && to < flow.len(), "move_item: index out of range");
  let mut items = flow.to_vec();
  let moved = items.remove(from);
  items.insert(to, moved);
  renumber(&mut items);
  items
}

fn renumber(items: &mut [FlowItem]) {
  for (k, item) in items.iter_mut().enumerate() {
    item.order = position(k);
  }
}

/// Lesson ids in flow order; the payload of a lesson reorder.
pub fn lesson_ids_in_order(flow: &[FlowItem]) -> Vec<String> {
  flow
    .iter()
    .filter(|i| i.kind == FlowItemKind::Lesson)
    .map(|i| i.source_id.clone())
    .collect()
}

/// `(assignment id, order)` pairs implied by the flow.
// TODO: persist these once assignments accept an order update; only lessons are saved today.
pub fn assignment_order_updates(flow: &[FlowItem]) -> Vec<(String, u32)> {
  flow
    .iter()
    .filter(|i| i.kind == FlowItemKind::Assignment)
    .map(|i| (i.source_id.clone(), i.order))
    .collect()
}

pub fn total_duration_minutes(flow: &[FlowItem]) -> u32 {
  flow.iter().map(|i| i.duration_minutes).sum()
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashSet;

  fn lesson(id: &str, order: Option<u32>) -> Lesson {
    Lesson {
      id: id.into(),
      title: format!("L{id}"),
      content: String::new(),
      notes: String::new(),
      video_url: None,
      duration_minutes: 0,
      order,
    }
  }

  fn assignment(id: &str, order: Option<u32>) -> Assignment {
    Assignment {
      id: id.into(),
      title: format!("A{id}"),
      kind: Default::default(),
      difficulty: "EASY".into(),
      time_limit: None,
      points: 10,
      order,
      source: Default::default(),
    }
  }

  fn ids(flow: &[FlowItem]) -> Vec<&str> {
    flow.iter().map(|i| i.id.as_str()).collect()
  }

  fn plain(id: &str, order: u32) -> FlowItem {
    FlowItem {
      id: id.into(),
      source_id: id.into(),
      kind: FlowItemKind::Lesson,
      title: id.into(),
      order,
      duration_minutes: 30,
    }
  }

  #[test]
  fn single_lesson_and_assignment_without_orders() {
    let flow = build_flow(&[lesson("1", None)], &[assignment("1", None)]);
    assert_eq!(ids(&flow), vec!["lesson-1", "assignment-1"]);
    assert_eq!(flow[0].order, 1);
    assert_eq!(flow[1].order, 2);
    assert_eq!(flow[0].duration_minutes, 30);
    assert_eq!(flow[1].duration_minutes, 60);
  }

  #[test]
  fn without_orders_flow_is_lessons_then_assignments() {
    let lessons = vec![lesson("a", None), lesson("b", None), lesson("c", None)];
    let assignments = vec![assignment("x", None), assignment("y", None)];
    let flow = build_flow(&lessons, &assignments);
    assert_eq!(ids(&flow), vec!["lesson-a", "lesson-b", "lesson-c", "assignment-x", "assignment-y"]);
  }

  #[test]
  fn explicit_orders_sort_strictly_and_keep_every_item() {
    let lessons = vec![lesson("a", Some(4)), lesson("b", Some(1)), lesson("c", Some(6))];
    let assignments = vec![assignment("x", Some(2)), assignment("y", Some(5)), assignment("z", Some(3))];
    let flow = build_flow(&lessons, &assignments);

    assert!(flow.windows(2).all(|w| w[0].order < w[1].order));
    assert_eq!(flow.len(), 6);
    let got: HashSet<&str> = flow.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(got.len(), 6);
    assert_eq!(ids(&flow), vec!["lesson-b", "assignment-x", "assignment-z", "lesson-a", "assignment-y", "lesson-c"]);
  }

  #[test]
  fn equal_orders_keep_input_order() {
    let flow = build_flow(&[lesson("a", Some(1))], &[assignment("x", Some(1))]);
    assert_eq!(ids(&flow), vec!["lesson-a", "assignment-x"]);
  }

  #[test]
  fn zero_order_falls_back_to_position() {
    let flow = build_flow(&[lesson("a", Some(0)), lesson("b", Some(0))], &[assignment("x", Some(0))]);
    let orders: Vec<u32> = flow.iter().map(|i| i.order).collect();
    assert_eq!(orders, vec![1, 2, 3]);
  }

  #[test]
  fn move_first_to_last() {
    let flow = vec![plain("a", 1), plain("b", 2), plain("c", 3)];
    let moved = move_item(&flow, 0, 2);
    assert_eq!(ids(&moved), vec!["b", "c", "a"]);
    assert_eq!(moved.iter().map(|i| i.order).collect::<Vec<_>>(), vec![1, 2, 3]);
  }

  #[test]
  fn move_renumbers_even_sparse_orders() {
    let flow = vec![plain("a", 10), plain("b", 20), plain("c", 30), plain("d", 31)];
    for (from, to) in [(0, 0), (3, 0), (1, 2), (2, 1), (0, 3)] {
      let moved = move_item(&flow, from, to);
      assert!(moved.iter().enumerate().all(|(k, i)| i.order as usize == k + 1), "from={from} to={to}");
      let before: HashSet<&str> = flow.iter().map(|i| i.id.as_str()).collect();
      let after: HashSet<&str> = moved.iter().map(|i| i.id.as_str()).collect();
      assert_eq!(before, after);
      assert_eq!(moved[to].id, flow[from].id);
    }
  }

  #[test]
  #[should_panic(expected = "index out of range")]
  fn move_out_of_range_panics() {
    let flow = vec![plain("a", 1)];
    let _ = move_item(&flow, 0, 1);
  }

  #[test]
  fn reorder_payload_helpers() {
    let flow = build_flow(&[lesson("1", None), lesson("2", None)], &[assignment("9", None)]);
    let moved = move_item(&flow, 2, 0);
    assert_eq!(lesson_ids_in_order(&moved), vec!["1", "2"]);
    assert_eq!(assignment_order_updates(&moved), vec![("9".to_string(), 1)]);
    assert_eq!(total_duration_minutes(&moved), 30 + 30 + 60);
  }
}
