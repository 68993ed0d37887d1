//! Root of the menu tree.
//!
//! One subtree per virtual drive, then the new-drive wizard and the
//! options node. The root frames the stacked children to the panel size
//! and draws the pool free-space readout down the right edge. Drive
//! lifecycle operations live here; the main loop invokes them with the
//! requests the children buffer.

use std::path::Path;
use std::sync::Arc;

use pixeldom::{
    render_stacked, render_text, Bitmap, EventHandler, EventResult, ListState, RenderMode,
    Renderable, Rotation, Widget,
};
use valise_storage::{DriveFormat, MountHost, Result, VolumeManager};

use crate::config::UiConfig;

use super::drive::{MountState, VirtualDrive};
use super::newdrive::NewDriveItem;
use super::options::OptionsItem;
use super::request::MenuRequest;
use super::{MENU_LEFT_SPACE, SIDEBAR_SPACE};

type Formatter = fn(&Path, DriveFormat, &str) -> Result<()>;

pub struct RootMenu {
    manager: Box<dyn VolumeManager>,
    host: Arc<dyn MountHost>,
    formatter: Formatter,
    drives: Vec<VirtualDrive>,
    newdrive: NewDriveItem,
    options: OptionsItem,
    list: ListState,
    panel_size: (usize, usize),
    free_percent: i64,
}

impl RootMenu {
    pub fn new(
        manager: Box<dyn VolumeManager>,
        host: Arc<dyn MountHost>,
        config: &UiConfig,
        panel_size: (usize, usize),
    ) -> Result<Self> {
        let mut root = Self {
            manager,
            host,
            formatter: valise_storage::format_volume,
            drives: Vec::new(),
            newdrive: NewDriveItem::new(config),
            options: OptionsItem::new(),
            list: ListState::new(),
            panel_size,
            free_percent: 0,
        };
        root.discover()?;
        root.refresh()?;
        root.rebuild();
        root.focus();
        Ok(root)
    }

    /// Build one drive node per virtual volume in the group.
    fn discover(&mut self) -> Result<()> {
        self.drives.clear();
        for volume in self.manager.volumes()? {
            log::debug!("[root] found volume {}", volume.name);
            self.drives
                .push(VirtualDrive::new(volume, Arc::clone(&self.host)));
        }
        Ok(())
    }

    /// Re-derive everything that tracks the pool and the drive set: the
    /// sidebar percentage, the wizard's sizing base and the picker names.
    fn refresh(&mut self) -> Result<()> {
        self.free_percent = (100.0 - self.manager.percent_used()?) as i64;
        self.newdrive.set_pool_bytes(self.manager.pool_size()?);
        let names: Vec<String> = self
            .drives
            .iter()
            .map(|drive| drive.name().to_string())
            .collect();
        self.options.set_drive_names(&names);
        Ok(())
    }

    /// Create, format and expose a drive sized by the wizard. The name
    /// is derived from the current drive count.
    pub fn add_drive(&mut self, size: u64, format: DriveFormat) -> Result<()> {
        let name = format!("volume{}", self.drives.len());
        log::debug!("[root] creating {name}: {size} bytes, {format:?}");
        let volume = self.manager.create_volume(&name, size)?;
        (self.formatter)(&volume.path, format, &name)?;
        let mut drive = VirtualDrive::new(volume, Arc::clone(&self.host));
        drive.mount_external();
        self.drives.push(drive);
        self.newdrive.reset();
        self.refresh()?;
        self.rebuild();
        Ok(())
    }

    /// Unmount and delete a drive by name. An unknown name is logged
    /// and otherwise ignored; the picker may race a deletion.
    pub fn remove_drive(&mut self, name: &str) -> Result<()> {
        let Some(index) = self.drives.iter().position(|drive| drive.name() == name) else {
            log::warn!("[root] remove: no drive named {name}");
            return Ok(());
        };
        match self.drives[index].mount_state() {
            MountState::Internal => {
                self.drives[index].unmount_internal();
            }
            MountState::External => {
                self.drives[index].unmount_external();
            }
            MountState::Unmounted => {}
        }
        self.manager.delete_volume(name)?;
        self.drives.remove(index);
        self.refresh()?;
        self.rebuild();
        Ok(())
    }

    /// Snapshot a drive's current contents. The clone is created
    /// deactivated and shows up in the list on the next boot.
    pub fn snapshot_drive(&mut self, name: &str) -> Result<()> {
        let snapshot = self.manager.snapshot_volume(name)?;
        log::debug!("[root] snapshot of {name}: {}", snapshot.name);
        self.refresh()
    }

    /// Put the wizard back on its plain row, for when a buffered create
    /// fails after the wizard has already moved to its waiting screen.
    pub fn reset_wizard(&mut self) {
        self.newdrive.reset();
    }

    /// Drain the next buffered request from any child.
    pub fn take_request(&mut self) -> Option<MenuRequest> {
        self.newdrive
            .take_request()
            .or_else(|| self.options.take_request())
    }

    fn views<'a>(
        drives: &'a mut [VirtualDrive],
        newdrive: &'a mut NewDriveItem,
        options: &'a mut OptionsItem,
    ) -> Vec<&'a mut dyn Widget> {
        let mut views: Vec<&mut dyn Widget> = drives
            .iter_mut()
            .map(|drive| drive as &mut dyn Widget)
            .collect();
        views.push(newdrive);
        views.push(options);
        views
    }

    fn rebuild(&mut self) {
        let Self {
            drives,
            newdrive,
            options,
            list,
            ..
        } = self;
        list.rebuild(&mut Self::views(drives, newdrive, options));
    }

    fn render_sidebar(&self) -> Bitmap {
        let text = render_text(format!("{}% Free", self.free_percent));
        let mut sidebar = Bitmap::new(text.width(), text.height() + SIDEBAR_SPACE);
        // Divider line between the menu and the readout.
        for x in 0..sidebar.width() {
            sidebar.set(x, 0, 1);
        }
        sidebar.blit(&text, (0, SIDEBAR_SPACE), false);
        sidebar.rotate(Rotation::Left)
    }
}

impl EventHandler for RootMenu {
    fn select(&mut self) -> EventResult {
        let Self {
            drives,
            newdrive,
            options,
            list,
            ..
        } = self;
        list.select(&mut Self::views(drives, newdrive, options))
    }

    fn next(&mut self) -> EventResult {
        let Self {
            drives,
            newdrive,
            options,
            list,
            ..
        } = self;
        list.next(&mut Self::views(drives, newdrive, options))
    }

    fn prev(&mut self) -> EventResult {
        let Self {
            drives,
            newdrive,
            options,
            list,
            ..
        } = self;
        list.prev(&mut Self::views(drives, newdrive, options))
    }

    fn focus(&mut self) -> EventResult {
        let Self {
            drives,
            newdrive,
            options,
            list,
            ..
        } = self;
        list.focus(&mut Self::views(drives, newdrive, options))
    }

    fn lose_focus(&mut self) -> EventResult {
        let Self {
            drives,
            newdrive,
            options,
            list,
            ..
        } = self;
        list.lose_focus(&mut Self::views(drives, newdrive, options))
    }
}

impl Renderable for RootMenu {
    fn render(&self) -> (Bitmap, RenderMode) {
        let mut views: Vec<&dyn Renderable> = self
            .drives
            .iter()
            .map(|drive| drive as &dyn Renderable)
            .collect();
        views.push(&self.newdrive);
        views.push(&self.options);
        let (menu, mode) = render_stacked(&views, MENU_LEFT_SPACE);
        if mode == RenderMode::Fullscreen {
            return (menu, mode);
        }

        let (width, height) = self.panel_size;
        let mut frame = Bitmap::new(width, height);
        frame.blit(&menu, (0, 0), false);
        let sidebar = self.render_sidebar();
        frame.blit(&sidebar, (width - sidebar.width(), 0), true);
        (frame, RenderMode::Normal)
    }
}
