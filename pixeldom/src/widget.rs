//! Widget capability traits.
//!
//! Every menu node is polymorphic over two capability sets: event
//! handling (navigation and selection) and rendering. Containers route
//! events to children through these traits and never know concrete
//! node types.

use crate::bitmap::Bitmap;

/// Result of offering an event to a widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventResult {
    /// Event was ignored, let an ancestor handle it.
    Ignored,
    /// Event was consumed, stop propagation.
    Consumed,
}

impl EventResult {
    /// Check if the event was consumed.
    pub fn is_consumed(&self) -> bool {
        matches!(self, EventResult::Consumed)
    }
}

/// How a parent should treat a rendered bitmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Compose into the parent's accumulated bitmap.
    Normal,
    /// Emit this bitmap verbatim, skipping all further composition.
    Fullscreen,
}

/// Navigation and selection event handling.
///
/// All methods default to `EventResult::Ignored`, so leaf widgets only
/// implement the events they react to.
pub trait EventHandler {
    /// Activate the widget.
    fn select(&mut self) -> EventResult {
        EventResult::Ignored
    }

    /// Move to the next entry. Consuming keeps the movement internal.
    fn next(&mut self) -> EventResult {
        EventResult::Ignored
    }

    /// Move to the previous entry. Consuming keeps the movement internal.
    fn prev(&mut self) -> EventResult {
        EventResult::Ignored
    }

    /// The widget became the focused element.
    fn focus(&mut self) -> EventResult {
        EventResult::Ignored
    }

    /// The widget stopped being the focused element.
    fn lose_focus(&mut self) -> EventResult {
        EventResult::Ignored
    }
}

/// Rendering capability.
pub trait Renderable {
    fn render(&self) -> (Bitmap, RenderMode);
}

/// The routing object type containers operate on.
pub trait Widget: EventHandler + Renderable {}

impl<T: EventHandler + Renderable> Widget for T {}
