//! Vertical composition of rendered children.

use crate::bitmap::Bitmap;
use crate::widget::{RenderMode, Renderable};

/// Accumulates child bitmaps top to bottom, growing the canvas as it
/// goes instead of pre-computing the final size.
#[derive(Debug)]
pub struct Stack {
    indent: usize,
    canvas: Bitmap,
}

impl Stack {
    /// `indent` shifts every pushed bitmap right by a fixed margin,
    /// reserving columns for a selection marker glyph.
    pub fn new(indent: usize) -> Self {
        Self {
            indent,
            canvas: Bitmap::new(0, 0),
        }
    }

    /// Append `child` below everything pushed so far. The canvas grows
    /// in height by the child's height and in width if the child is
    /// wider; the child is blitted transparently so rows already drawn
    /// are never blanked by a wider but mostly empty sibling.
    pub fn push(&mut self, child: &Bitmap) {
        let offset = self.canvas.height();
        self.canvas.expand_height(child.height());
        let needed = child.width() + self.indent;
        if needed > self.canvas.width() {
            self.canvas.expand_width(needed - self.canvas.width());
        }
        self.canvas.blit(child, (self.indent, offset), true);
    }

    pub fn finish(self) -> Bitmap {
        self.canvas
    }
}

/// Render `children` in order into a vertical stack. A child rendering
/// fullscreen short-circuits the composition; its bitmap is returned
/// verbatim with no further compositing.
pub fn render_stacked(children: &[&dyn Renderable], indent: usize) -> (Bitmap, RenderMode) {
    let mut stack = Stack::new(indent);
    for child in children {
        let (bitmap, mode) = child.render();
        if mode == RenderMode::Fullscreen {
            return (bitmap, mode);
        }
        stack.push(&bitmap);
    }
    (stack.finish(), RenderMode::Normal)
}
