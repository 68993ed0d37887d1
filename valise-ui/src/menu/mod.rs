//! The on-device menu tree.
//!
//! Nodes are `pixeldom` widgets; the root orchestrator composes them
//! into panel frames and owns the storage handles they act on.

pub mod drive;
pub mod iso;
pub mod newdrive;
pub mod options;
pub mod request;
pub mod root;

#[cfg(test)]
pub mod fakes;

pub use drive::{MountState, VirtualDrive};
pub use iso::IsoEntry;
pub use newdrive::NewDriveItem;
pub use options::OptionsItem;
pub use request::MenuRequest;
pub use root::RootMenu;

use pixeldom::{render_text, selector, Bitmap};

/// Left margin inside a row, reserved for the selector glyph.
pub const MENU_INDENT: usize = 13;
/// Margin the root adds to every top-level child.
pub const MENU_LEFT_SPACE: usize = 3;
/// Rows between the sidebar border line and its text.
pub const SIDEBAR_SPACE: usize = 2;
/// Extra shift for image rows under a drive heading.
pub const ISO_INDENT: usize = 5;
/// Extra shift for rows under the options heading.
pub const OPTION_INDENT: usize = 5;

/// Render a standard menu row: the label behind the marker margin,
/// with the selector glyph when the row is focused.
pub fn render_row(label: &str, focused: bool) -> Bitmap {
    let text = render_text(label);
    let mut row = Bitmap::new(text.width() + MENU_INDENT, text.height());
    row.blit(&text, (MENU_INDENT, 0), false);
    if focused {
        row.blit(&selector(), (0, 0), true);
    }
    row
}

/// Grow `canvas` downward by one child row, shifted right by `indent`.
pub(crate) fn append_below(canvas: &mut Bitmap, row: &Bitmap, indent: usize) {
    let offset = canvas.height();
    canvas.expand_height(row.height());
    let needed = row.width() + indent;
    if needed > canvas.width() {
        canvas.expand_width(needed - canvas.width());
    }
    canvas.blit(row, (indent, offset), true);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_row_reserves_marker_margin() {
        let row = render_row("a", false);
        assert_eq!(row.width(), MENU_INDENT + 6);
        for y in 0..row.height() {
            for x in 0..MENU_INDENT {
                assert_eq!(row.get(x, y), Some(0));
            }
        }
    }

    #[test]
    fn test_render_row_marks_focus() {
        let unfocused = render_row("a", false);
        let focused = render_row("a", true);
        assert_ne!(unfocused, focused);
        // The glyph lives inside the margin; the label is unchanged.
        let mut lit = 0;
        for y in 0..focused.height() {
            for x in 0..MENU_INDENT {
                if focused.get(x, y) != Some(0) {
                    lit += 1;
                }
            }
        }
        assert!(lit > 0);
    }
}
