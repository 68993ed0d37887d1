//! The expandable options node.
//!
//! Closed, it is a single "Options" row. Open, it lists the version,
//! the display flip action and two per-drive pickers. Actions are
//! buffered as requests for the main loop rather than run inline.

use pixeldom::{Bitmap, EventHandler, EventResult, ListState, RenderMode, Renderable, Widget};

use super::request::MenuRequest;
use super::{append_below, render_row, OPTION_INDENT};

/// A plain labeled row; any behavior lives on the owner.
struct OptionRow {
    label: String,
    focused: bool,
}

impl OptionRow {
    fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            focused: false,
        }
    }
}

impl EventHandler for OptionRow {
    fn focus(&mut self) -> EventResult {
        self.focused = true;
        EventResult::Consumed
    }

    fn lose_focus(&mut self) -> EventResult {
        self.focused = false;
        EventResult::Consumed
    }
}

impl Renderable for OptionRow {
    fn render(&self) -> (Bitmap, RenderMode) {
        (render_row(&self.label, self.focused), RenderMode::Normal)
    }
}

/// A heading row plus, when open, one row per drive name. Selecting a
/// name buffers the picker's request and closes the list again.
struct DrivePicker {
    label: &'static str,
    action: fn(String) -> MenuRequest,
    open: bool,
    focused: bool,
    names: Vec<String>,
    rows: Vec<OptionRow>,
    list: ListState,
    pending: Option<MenuRequest>,
}

impl DrivePicker {
    fn new(label: &'static str, action: fn(String) -> MenuRequest) -> Self {
        Self {
            label,
            action,
            open: false,
            focused: false,
            names: Vec::new(),
            rows: Vec::new(),
            list: ListState::new(),
            pending: None,
        }
    }

    fn set_names(&mut self, names: &[String]) {
        self.names = names.to_vec();
        self.rows = names
            .iter()
            .map(|name| OptionRow::new(name.as_str()))
            .collect();
        if self.open {
            self.rebuild();
        }
    }

    fn rebuild(&mut self) {
        let mut views: Vec<&mut dyn Widget> = self
            .rows
            .iter_mut()
            .map(|row| row as &mut dyn Widget)
            .collect();
        self.list.rebuild(&mut views);
    }

    fn take_request(&mut self) -> Option<MenuRequest> {
        self.pending.take()
    }
}

impl EventHandler for DrivePicker {
    fn select(&mut self) -> EventResult {
        if !self.open {
            self.open = true;
            self.rebuild();
            return EventResult::Consumed;
        }
        if let Some(index) = self.list.cursor() {
            let name = self.names[index].clone();
            log::debug!("[options] {}: {name}", self.label);
            self.pending = Some((self.action)(name));
        }
        self.open = false;
        EventResult::Consumed
    }

    fn next(&mut self) -> EventResult {
        if !self.open {
            return EventResult::Ignored;
        }
        let mut views: Vec<&mut dyn Widget> = self
            .rows
            .iter_mut()
            .map(|row| row as &mut dyn Widget)
            .collect();
        self.list.next(&mut views)
    }

    fn prev(&mut self) -> EventResult {
        if !self.open {
            return EventResult::Ignored;
        }
        let mut views: Vec<&mut dyn Widget> = self
            .rows
            .iter_mut()
            .map(|row| row as &mut dyn Widget)
            .collect();
        self.list.prev(&mut views)
    }

    fn focus(&mut self) -> EventResult {
        self.focused = true;
        if self.open {
            let mut views: Vec<&mut dyn Widget> = self
                .rows
                .iter_mut()
                .map(|row| row as &mut dyn Widget)
                .collect();
            self.list.focus(&mut views);
        }
        EventResult::Consumed
    }

    fn lose_focus(&mut self) -> EventResult {
        self.focused = false;
        if self.open {
            let mut views: Vec<&mut dyn Widget> = self
                .rows
                .iter_mut()
                .map(|row| row as &mut dyn Widget)
                .collect();
            self.list.lose_focus(&mut views);
        }
        EventResult::Consumed
    }
}

impl Renderable for DrivePicker {
    fn render(&self) -> (Bitmap, RenderMode) {
        // The label's marker hands over to the name rows while open.
        let mut bitmap = render_row(self.label, self.focused && !self.open);
        if self.open {
            for row in &self.rows {
                let (rendered, _) = row.render();
                append_below(&mut bitmap, &rendered, OPTION_INDENT);
            }
        }
        (bitmap, RenderMode::Normal)
    }
}

/// The options subtree: heading, version, flip action and the
/// snapshot/delete pickers.
pub struct OptionsItem {
    open: bool,
    heading: OptionRow,
    version: OptionRow,
    flip: OptionRow,
    snapshot: DrivePicker,
    delete: DrivePicker,
    list: ListState,
    pending: Option<MenuRequest>,
}

impl OptionsItem {
    pub fn new() -> Self {
        let mut options = Self {
            open: false,
            heading: OptionRow::new("Options"),
            version: OptionRow::new(format!("Version {}", env!("CARGO_PKG_VERSION"))),
            flip: OptionRow::new("Flip Display"),
            snapshot: DrivePicker::new("Snapshot Drive", MenuRequest::SnapshotDrive),
            delete: DrivePicker::new("Delete Drive", MenuRequest::RemoveDrive),
            list: ListState::new(),
            pending: None,
        };
        options.rebuild();
        options
    }

    /// Current drive names for the pickers; pushed by the root on every
    /// drive-set change.
    pub fn set_drive_names(&mut self, names: &[String]) {
        self.snapshot.set_names(names);
        self.delete.set_names(names);
    }

    pub fn take_request(&mut self) -> Option<MenuRequest> {
        self.pending
            .take()
            .or_else(|| self.snapshot.take_request())
            .or_else(|| self.delete.take_request())
    }

    fn views<'a>(
        heading: &'a mut OptionRow,
        version: &'a mut OptionRow,
        flip: &'a mut OptionRow,
        snapshot: &'a mut DrivePicker,
        delete: &'a mut DrivePicker,
        open: bool,
    ) -> Vec<&'a mut dyn Widget> {
        if open {
            vec![heading, version, flip, snapshot, delete]
        } else {
            vec![heading]
        }
    }

    fn toggle_open(&mut self) {
        self.open = !self.open;
        log::debug!("[options] open: {}", self.open);
        self.rebuild();
    }

    fn rebuild(&mut self) {
        let Self {
            heading,
            version,
            flip,
            snapshot,
            delete,
            list,
            open,
            ..
        } = self;
        list.rebuild(&mut Self::views(
            heading, version, flip, snapshot, delete, *open,
        ));
    }
}

impl Default for OptionsItem {
    fn default() -> Self {
        Self::new()
    }
}

impl EventHandler for OptionsItem {
    fn select(&mut self) -> EventResult {
        match self.list.cursor() {
            None => EventResult::Ignored,
            // Rows acting on the node itself are handled here; the
            // pickers handle their own rows.
            Some(0) => {
                self.toggle_open();
                EventResult::Consumed
            }
            Some(1) => EventResult::Consumed,
            Some(2) => {
                self.pending = Some(MenuRequest::FlipDisplay);
                EventResult::Consumed
            }
            Some(_) => {
                let Self {
                    heading,
                    version,
                    flip,
                    snapshot,
                    delete,
                    list,
                    open,
                    ..
                } = self;
                list.select(&mut Self::views(
                    heading, version, flip, snapshot, delete, *open,
                ))
            }
        }
    }

    fn next(&mut self) -> EventResult {
        let Self {
            heading,
            version,
            flip,
            snapshot,
            delete,
            list,
            open,
            ..
        } = self;
        list.next(&mut Self::views(
            heading, version, flip, snapshot, delete, *open,
        ))
    }

    fn prev(&mut self) -> EventResult {
        let Self {
            heading,
            version,
            flip,
            snapshot,
            delete,
            list,
            open,
            ..
        } = self;
        list.prev(&mut Self::views(
            heading, version, flip, snapshot, delete, *open,
        ))
    }

    fn focus(&mut self) -> EventResult {
        let Self {
            heading,
            version,
            flip,
            snapshot,
            delete,
            list,
            open,
            ..
        } = self;
        list.focus(&mut Self::views(
            heading, version, flip, snapshot, delete, *open,
        ))
    }

    fn lose_focus(&mut self) -> EventResult {
        let Self {
            heading,
            version,
            flip,
            snapshot,
            delete,
            list,
            open,
            ..
        } = self;
        list.lose_focus(&mut Self::views(
            heading, version, flip, snapshot, delete, *open,
        ))
    }
}

impl Renderable for OptionsItem {
    fn render(&self) -> (Bitmap, RenderMode) {
        let (mut bitmap, _) = self.heading.render();
        if !self.open {
            return (bitmap, RenderMode::Normal);
        }
        let children: [&dyn Renderable; 4] =
            [&self.version, &self.flip, &self.snapshot, &self.delete];
        for child in children {
            let (row, _) = child.render();
            append_below(&mut bitmap, &row, OPTION_INDENT);
        }
        (bitmap, RenderMode::Normal)
    }
}
