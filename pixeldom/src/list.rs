//! Selection-cursor engine for list-shaped composites.
//!
//! A composite owns its children wherever it likes (struct fields, a
//! `Vec`, a mix) and materializes them as an ordered `&mut dyn Widget`
//! slice per call. `ListState` holds only the cursor and the focused
//! flag, so a rebuilt child list can never be dereferenced through a
//! stale position.

use crate::widget::{EventResult, Widget};

/// Cursor and focus state for an ordered child list.
///
/// The cursor is always either a valid index into the child slice of
/// the current call or `None`; it is recomputed, never preserved,
/// across [`ListState::rebuild`].
#[derive(Debug, Default)]
pub struct ListState {
    focused: bool,
    cursor: Option<usize>,
}

impl ListState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    /// Delegate activation to the selected child.
    pub fn select(&mut self, children: &mut [&mut dyn Widget]) -> EventResult {
        match self.cursor {
            Some(index) => children[index].select(),
            None => EventResult::Ignored,
        }
    }

    /// Offer the event to the selected child; if it keeps the movement
    /// internal, report consumed. Otherwise advance the cursor to the
    /// next sibling, swapping focus. At the end of the list the event
    /// is not consumed so an ancestor can advance past this subtree.
    pub fn next(&mut self, children: &mut [&mut dyn Widget]) -> EventResult {
        let Some(index) = self.cursor else {
            return EventResult::Ignored;
        };
        if children[index].next().is_consumed() {
            return EventResult::Consumed;
        }
        if index + 1 >= children.len() {
            return EventResult::Ignored;
        }
        log::debug!("[list_next] cursor {} -> {}", index, index + 1);
        children[index].lose_focus();
        self.cursor = Some(index + 1);
        children[index + 1].focus();
        EventResult::Consumed
    }

    /// Mirror of [`ListState::next`], moving toward the head of the list.
    pub fn prev(&mut self, children: &mut [&mut dyn Widget]) -> EventResult {
        let Some(index) = self.cursor else {
            return EventResult::Ignored;
        };
        if children[index].prev().is_consumed() {
            return EventResult::Consumed;
        }
        if index == 0 {
            return EventResult::Ignored;
        }
        log::debug!("[list_prev] cursor {} -> {}", index, index - 1);
        children[index].lose_focus();
        self.cursor = Some(index - 1);
        children[index - 1].focus();
        EventResult::Consumed
    }

    /// Take focus, forwarding only to the selected child. Siblings
    /// never see focus events they did not already have.
    pub fn focus(&mut self, children: &mut [&mut dyn Widget]) -> EventResult {
        self.focused = true;
        if let Some(index) = self.cursor {
            children[index].focus();
        }
        EventResult::Consumed
    }

    /// Drop focus, forwarding only to the selected child.
    pub fn lose_focus(&mut self, children: &mut [&mut dyn Widget]) -> EventResult {
        self.focused = false;
        if let Some(index) = self.cursor {
            children[index].lose_focus();
        }
        EventResult::Consumed
    }

    /// Reset after a structural change to the child list: every child
    /// is blurred so none believes itself focused while off-tree, the
    /// cursor returns to the first child (or `None` for an empty list)
    /// and the new selection takes focus.
    pub fn rebuild(&mut self, children: &mut [&mut dyn Widget]) {
        for child in children.iter_mut() {
            child.lose_focus();
        }
        if children.is_empty() {
            self.cursor = None;
        } else {
            self.cursor = Some(0);
            children[0].focus();
        }
        log::debug!(
            "[list_rebuild] {} children, cursor {:?}",
            children.len(),
            self.cursor
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitmap::Bitmap;
    use crate::widget::{EventHandler, RenderMode, Renderable};

    /// Records focus traffic and optionally absorbs movement events,
    /// standing in for a child that handles next/prev internally.
    #[derive(Default)]
    struct Probe {
        focused: bool,
        absorb_moves: usize,
        selects: usize,
        focus_calls: usize,
        blur_calls: usize,
    }

    impl EventHandler for Probe {
        fn select(&mut self) -> EventResult {
            self.selects += 1;
            EventResult::Consumed
        }

        fn next(&mut self) -> EventResult {
            if self.absorb_moves > 0 {
                self.absorb_moves -= 1;
                EventResult::Consumed
            } else {
                EventResult::Ignored
            }
        }

        fn prev(&mut self) -> EventResult {
            self.next()
        }

        fn focus(&mut self) -> EventResult {
            self.focused = true;
            self.focus_calls += 1;
            EventResult::Consumed
        }

        fn lose_focus(&mut self) -> EventResult {
            self.focused = false;
            self.blur_calls += 1;
            EventResult::Consumed
        }
    }

    impl Renderable for Probe {
        fn render(&self) -> (Bitmap, RenderMode) {
            (Bitmap::new(1, 1), RenderMode::Normal)
        }
    }

    fn probes(n: usize) -> Vec<Probe> {
        (0..n).map(|_| Probe::default()).collect()
    }

    fn views(children: &mut [Probe]) -> Vec<&mut dyn Widget> {
        children.iter_mut().map(|p| p as &mut dyn Widget).collect()
    }

    #[test]
    fn test_empty_list_ignores_events() {
        let mut list = ListState::new();
        let mut children = probes(0);
        assert_eq!(list.select(&mut views(&mut children)), EventResult::Ignored);
        assert_eq!(list.next(&mut views(&mut children)), EventResult::Ignored);
        assert_eq!(list.prev(&mut views(&mut children)), EventResult::Ignored);
        assert_eq!(list.cursor(), None);
    }

    #[test]
    fn test_select_delegates_to_selected_child() {
        let mut list = ListState::new();
        let mut children = probes(3);
        list.rebuild(&mut views(&mut children));
        assert_eq!(list.select(&mut views(&mut children)), EventResult::Consumed);
        assert_eq!(children[0].selects, 1);
        assert_eq!(children[1].selects, 0);
    }

    #[test]
    fn test_next_advances_cursor_and_swaps_focus() {
        let mut list = ListState::new();
        let mut children = probes(2);
        list.rebuild(&mut views(&mut children));
        assert_eq!(list.next(&mut views(&mut children)), EventResult::Consumed);
        assert_eq!(list.cursor(), Some(1));
        assert!(!children[0].focused);
        assert!(children[1].focused);
    }

    #[test]
    fn test_child_absorbing_movement_keeps_cursor() {
        let mut list = ListState::new();
        let mut children = probes(2);
        list.rebuild(&mut views(&mut children));
        children[0].absorb_moves = 1;
        assert_eq!(list.next(&mut views(&mut children)), EventResult::Consumed);
        assert_eq!(list.cursor(), Some(0));
        assert!(children[0].focused);
    }

    #[test]
    fn test_next_at_end_bubbles() {
        let mut list = ListState::new();
        let mut children = probes(2);
        list.rebuild(&mut views(&mut children));
        list.next(&mut views(&mut children));
        assert_eq!(list.next(&mut views(&mut children)), EventResult::Ignored);
        assert_eq!(list.cursor(), Some(1));
        assert!(children[1].focused);
    }

    #[test]
    fn test_prev_at_start_bubbles() {
        let mut list = ListState::new();
        let mut children = probes(2);
        list.rebuild(&mut views(&mut children));
        assert_eq!(list.prev(&mut views(&mut children)), EventResult::Ignored);
        assert_eq!(list.cursor(), Some(0));
    }

    #[test]
    fn test_next_then_prev_returns_to_origin() {
        let mut list = ListState::new();
        let mut children = probes(3);
        list.rebuild(&mut views(&mut children));
        list.next(&mut views(&mut children));
        assert_eq!(list.cursor(), Some(1));
        assert_eq!(list.next(&mut views(&mut children)), EventResult::Consumed);
        assert_eq!(list.prev(&mut views(&mut children)), EventResult::Consumed);
        assert_eq!(list.cursor(), Some(1));
        assert!(children[1].focused);
    }

    #[test]
    fn test_rebuild_resets_cursor_to_first() {
        let mut list = ListState::new();
        let mut children = probes(3);
        list.rebuild(&mut views(&mut children));
        list.next(&mut views(&mut children));
        list.next(&mut views(&mut children));
        assert_eq!(list.cursor(), Some(2));

        list.rebuild(&mut views(&mut children));
        assert_eq!(list.cursor(), Some(0));
        assert!(children[0].focused);
        assert!(!children[1].focused);
        assert!(!children[2].focused);
        // Every child was blurred before the new selection took focus.
        assert!(children.iter().all(|p| p.blur_calls >= 1));
    }

    #[test]
    fn test_rebuild_empty_clears_cursor() {
        let mut list = ListState::new();
        let mut children = probes(2);
        list.rebuild(&mut views(&mut children));
        let mut none = probes(0);
        list.rebuild(&mut views(&mut none));
        assert_eq!(list.cursor(), None);
    }

    #[test]
    fn test_focus_forwards_to_selected_child_only() {
        let mut list = ListState::new();
        let mut children = probes(2);
        list.rebuild(&mut views(&mut children));
        let focus_before = (children[0].focus_calls, children[1].focus_calls);

        list.focus(&mut views(&mut children));
        assert!(list.is_focused());
        assert_eq!(children[0].focus_calls, focus_before.0 + 1);
        assert_eq!(children[1].focus_calls, focus_before.1);

        list.lose_focus(&mut views(&mut children));
        assert!(!list.is_focused());
        assert!(!children[0].focused);
    }
}
