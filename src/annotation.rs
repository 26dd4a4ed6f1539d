use std::collections::HashMap;

use serde::Serialize;

use crate::coords::Point;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct AnnotationId(pub u64);

/// What an examiner placed on the page. Coordinates are raster space.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Mark {
    Stroke { points: Vec<Point> },
    Check { at: Point },
    Cross { at: Point },
    Text { at: Point, text: String },
    Number { at: Point, text: String },
}

impl Mark {
    /// Anchor of a point mark. Strokes report the origin; their path is in `points`.
    pub fn anchor(&self) -> Point {
        match self {
            Mark::Stroke { .. } => Point::ORIGIN,
            Mark::Check { at }
            | Mark::Cross { at }
            | Mark::Text { at, .. }
            | Mark::Number { at, .. } => *at,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Mark::Stroke { .. } => "stroke",
            Mark::Check { .. } => "check",
            Mark::Cross { .. } => "cross",
            Mark::Text { .. } => "text",
            Mark::Number { .. } => "number",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Annotation {
    pub id: AnnotationId,
    pub mark: Mark,
}

/// Ordered annotations for one page. Append-only apart from `undo` and `clear`.
#[derive(Debug, Default)]
pub struct AnnotationStore {
    items: Vec<Annotation>,
    next_id: u64,
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a mark. Strokes without points are refused and return `None`.
    pub fn push(&mut self, mark: Mark) -> Option<AnnotationId> {
        if let Mark::Stroke { points } = &mark {
            if points.is_empty() {
                return None;
            }
        }
        let id = AnnotationId(self.next_id);
        self.next_id += 1;
        self.items.push(Annotation { id, mark });
        Some(id)
    }

    /// Drop the most recently appended annotation.
    pub fn undo(&mut self) -> Option<Annotation> {
        self.items.pop()
    }

    pub fn clear(&mut self) -> usize {
        let removed = self.items.len();
        self.items.clear();
        removed
    }

    pub fn iter(&self) -> impl Iterator<Item = &Annotation> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[Annotation] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// One `AnnotationStore` per page, so navigating never shows one page's marks
/// on another. Pages are 1-indexed to match the navigator.
#[derive(Debug, Default)]
pub struct AnnotationBook {
    pages: HashMap<u32, AnnotationStore>,
}

impl AnnotationBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(&self, page: u32) -> Option<&AnnotationStore> {
        self.pages.get(&page)
    }

    pub fn page_mut(&mut self, page: u32) -> &mut AnnotationStore {
        self.pages.entry(page).or_default()
    }

    /// Annotations for a page in replay order; empty if nothing was placed yet.
    pub fn annotations(&self, page: u32) -> &[Annotation] {
        self.pages.get(&page).map(|s| s.as_slice()).unwrap_or(&[])
    }

    pub fn total_len(&self) -> usize {
        self.pages.values().map(AnnotationStore::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(x: f64, y: f64) -> Mark {
        Mark::Check {
            at: Point::new(x, y),
        }
    }

    #[test]
    fn test_ids_follow_append_order() {
        let mut store = AnnotationStore::new();
        let a = store.push(check(1.0, 1.0)).unwrap();
        let b = store.push(check(2.0, 2.0)).unwrap();
        assert!(a < b);
        let ids: Vec<_> = store.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![a, b]);
    }

    #[test]
    fn test_undo_k_times_empties_store() {
        let mut store = AnnotationStore::new();
        for i in 0..5 {
            store.push(check(i as f64, 0.0));
        }
        for _ in 0..5 {
            assert!(store.undo().is_some());
        }
        assert!(store.is_empty());
        assert!(store.undo().is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_undo_is_lifo() {
        let mut store = AnnotationStore::new();
        store.push(check(1.0, 1.0));
        store.push(Mark::Cross {
            at: Point::new(5.0, 5.0),
        });
        let removed = store.undo().unwrap();
        assert_eq!(removed.mark.kind_name(), "cross");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_empty_stroke_is_refused() {
        let mut store = AnnotationStore::new();
        assert!(store.push(Mark::Stroke { points: vec![] }).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_clear_reports_removed_count() {
        let mut store = AnnotationStore::new();
        store.push(check(1.0, 1.0));
        store.push(check(2.0, 1.0));
        assert_eq!(store.clear(), 2);
        assert!(store.is_empty());
    }

    #[test]
    fn test_book_keeps_pages_apart() {
        let mut book = AnnotationBook::new();
        book.page_mut(1).push(check(1.0, 1.0));
        book.page_mut(2).push(check(2.0, 2.0));
        book.page_mut(2).push(check(3.0, 3.0));
        assert_eq!(book.annotations(1).len(), 1);
        assert_eq!(book.annotations(2).len(), 2);
        assert!(book.annotations(3).is_empty());
        book.page_mut(2).clear();
        assert_eq!(book.annotations(1).len(), 1);
        assert_eq!(book.total_len(), 1);
    }
}
