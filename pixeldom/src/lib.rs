pub mod bitmap;
pub mod list;
pub mod stack;
pub mod text;
pub mod widget;

pub use bitmap::{Bitmap, Rotation};
pub use list::ListState;
pub use stack::{render_stacked, Stack};
pub use text::{mount_indicator, render_text, selector};
pub use widget::{EventHandler, EventResult, RenderMode, Renderable, Widget};
