//! A virtual drive and its mount lifecycle.

use std::sync::Arc;

use pixeldom::{
    Bitmap, EventHandler, EventResult, ListState, RenderMode, Renderable, Widget,
};
use valise_storage::{LogicalVolume, MountHost};

use super::iso::IsoEntry;
use super::{render_row, ISO_INDENT};

/// Where a drive's contents are currently exposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountState {
    /// Not exposed anywhere.
    Unmounted,
    /// Mounted on the appliance filesystem so its images are browsable.
    Internal,
    /// Exposed to the USB host through the mass-storage gadget.
    External,
}

/// Title row of a drive. Carries only the label and a mount-state
/// snapshot; the owning drive runs the mount cycle when select lands
/// here.
struct DriveHeading {
    label: String,
    state: MountState,
    focused: bool,
}

impl EventHandler for DriveHeading {
    fn focus(&mut self) -> EventResult {
        self.focused = true;
        EventResult::Consumed
    }

    fn lose_focus(&mut self) -> EventResult {
        self.focused = false;
        EventResult::Consumed
    }
}

impl Renderable for DriveHeading {
    fn render(&self) -> (Bitmap, RenderMode) {
        let mut row = render_row(&self.label, self.focused);
        if self.state == MountState::External {
            row.blit(&pixeldom::mount_indicator(), (6, 0), true);
        }
        (row, RenderMode::Normal)
    }
}

/// One thin volume presented as a drive: a heading row plus, while
/// internally mounted, a row per image found on the volume.
///
/// The four transition methods are independently callable; outside
/// their precondition state they are logged no-ops returning `false`,
/// and a failing mount script aborts the transition with the prior
/// state intact.
pub struct VirtualDrive {
    volume: LogicalVolume,
    state: MountState,
    heading: DriveHeading,
    isos: Vec<IsoEntry>,
    list: ListState,
    host: Arc<dyn MountHost>,
}

impl VirtualDrive {
    pub fn new(volume: LogicalVolume, host: Arc<dyn MountHost>) -> Self {
        let mut drive = Self {
            heading: DriveHeading {
                label: volume.name.clone(),
                state: MountState::Unmounted,
                focused: false,
            },
            volume,
            state: MountState::Unmounted,
            isos: Vec::new(),
            list: ListState::new(),
            host,
        };
        drive.rebuild();
        drive
    }

    pub fn name(&self) -> &str {
        &self.volume.name
    }

    pub fn uuid(&self) -> &str {
        &self.volume.uuid
    }

    pub fn size(&self) -> u64 {
        self.volume.size
    }

    pub fn mount_state(&self) -> MountState {
        self.state
    }

    pub fn isos(&self) -> &[IsoEntry] {
        &self.isos
    }

    fn views<'a>(
        heading: &'a mut DriveHeading,
        isos: &'a mut [IsoEntry],
    ) -> Vec<&'a mut dyn Widget> {
        let mut children: Vec<&mut dyn Widget> = Vec::with_capacity(isos.len() + 1);
        children.push(heading);
        for iso in isos {
            children.push(iso);
        }
        children
    }

    /// Re-sync the heading snapshot and reset the cursor after any
    /// transition or child-set change.
    fn rebuild(&mut self) {
        self.heading.state = self.state;
        let Self {
            heading,
            isos,
            list,
            ..
        } = self;
        list.rebuild(&mut Self::views(heading, isos));
    }

    /// Advance the heading's mount cycle one step:
    /// UNMOUNTED -> EXTERNAL -> INTERNAL -> EXTERNAL -> ...
    fn cycle_mount(&mut self) {
        match self.state {
            MountState::Unmounted => {
                self.mount_external();
            }
            MountState::External => {
                if self.unmount_external() {
                    self.mount_internal();
                }
            }
            MountState::Internal => {
                if self.unmount_internal() {
                    self.mount_external();
                }
            }
        }
    }

    /// Mount on the appliance filesystem and list the images found.
    pub fn mount_internal(&mut self) -> bool {
        log::debug!("[mount] {} internal", self.name());
        if self.state != MountState::Unmounted {
            log::warn!("[mount] {} is not unmounted", self.name());
            return false;
        }
        let paths = match self.host.mount_internal(self.name()) {
            Ok(paths) => paths,
            Err(err) => {
                log::error!("[mount] {} mount-internal: {err}", self.name());
                return false;
            }
        };
        self.isos = paths
            .into_iter()
            .map(|path| IsoEntry::new(path, Arc::clone(&self.host)))
            .collect();
        self.state = MountState::Internal;
        self.rebuild();
        true
    }

    /// Leave the appliance filesystem, unmounting any exported images
    /// first and dropping the image rows.
    pub fn unmount_internal(&mut self) -> bool {
        log::debug!("[mount] {} unmount internal", self.name());
        if self.state != MountState::Internal {
            log::warn!("[mount] {} is not mounted internal", self.name());
            return false;
        }
        for iso in &mut self.isos {
            if iso.is_mounted() {
                if let Err(err) = iso.unmount() {
                    log::error!("[mount] {}: {err}", self.volume.name);
                }
            }
        }
        if let Err(err) = self.host.unmount_internal(self.name()) {
            log::error!("[mount] {} unmount-internal: {err}", self.name());
            return false;
        }
        self.isos.clear();
        self.state = MountState::Unmounted;
        self.rebuild();
        true
    }

    /// Expose over the mass-storage gadget.
    pub fn mount_external(&mut self) -> bool {
        log::debug!("[mount] {} external", self.name());
        if self.state != MountState::Unmounted {
            log::warn!("[mount] {} is already mounted", self.name());
            return false;
        }
        if let Err(err) = self.host.mount_external(self.name()) {
            log::error!("[mount] {} mount-external: {err}", self.name());
            return false;
        }
        self.state = MountState::External;
        self.rebuild();
        true
    }

    /// Withdraw from the mass-storage gadget.
    pub fn unmount_external(&mut self) -> bool {
        log::debug!("[mount] {} unmount external", self.name());
        if self.state != MountState::External {
            log::warn!("[mount] {} is not mounted external", self.name());
            return false;
        }
        if let Err(err) = self.host.unmount_external(self.name()) {
            log::error!("[mount] {} unmount-external: {err}", self.name());
            return false;
        }
        self.state = MountState::Unmounted;
        self.rebuild();
        true
    }
}

impl EventHandler for VirtualDrive {
    fn select(&mut self) -> EventResult {
        // Select on the heading row drives the mount cycle; image rows
        // handle themselves.
        if self.list.cursor() == Some(0) {
            self.cycle_mount();
            return EventResult::Consumed;
        }
        let Self {
            heading,
            isos,
            list,
            ..
        } = self;
        list.select(&mut Self::views(heading, isos))
    }

    fn next(&mut self) -> EventResult {
        let Self {
            heading,
            isos,
            list,
            ..
        } = self;
        list.next(&mut Self::views(heading, isos))
    }

    fn prev(&mut self) -> EventResult {
        let Self {
            heading,
            isos,
            list,
            ..
        } = self;
        list.prev(&mut Self::views(heading, isos))
    }

    fn focus(&mut self) -> EventResult {
        log::debug!("[focus] drive {}", self.name());
        let Self {
            heading,
            isos,
            list,
            ..
        } = self;
        list.focus(&mut Self::views(heading, isos))
    }

    fn lose_focus(&mut self) -> EventResult {
        let Self {
            heading,
            isos,
            list,
            ..
        } = self;
        list.lose_focus(&mut Self::views(heading, isos))
    }
}

impl Renderable for VirtualDrive {
    fn render(&self) -> (Bitmap, RenderMode) {
        let (mut bitmap, _) = self.heading.render();
        for iso in &self.isos {
            let (row, _) = iso.render();
            super::append_below(&mut bitmap, &row, ISO_INDENT);
        }
        (bitmap, RenderMode::Normal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::menu::fakes::{volume, FakeHost};

    fn drive_with(host: &Arc<FakeHost>) -> VirtualDrive {
        VirtualDrive::new(volume("volume0"), Arc::clone(host) as Arc<dyn MountHost>)
    }

    #[test]
    fn test_select_cycles_through_mount_states() {
        let host = Arc::new(FakeHost::default());
        let mut drive = drive_with(&host);
        assert_eq!(drive.mount_state(), MountState::Unmounted);

        drive.select();
        assert_eq!(drive.mount_state(), MountState::External);

        drive.select();
        assert_eq!(drive.mount_state(), MountState::Internal);

        drive.select();
        assert_eq!(drive.mount_state(), MountState::External);

        assert_eq!(
            host.calls(),
            vec![
                "mount-external volume0",
                "unmount-external volume0",
                "mount-internal volume0",
                "unmount-internal volume0",
                "mount-external volume0",
            ]
        );
    }

    #[test]
    fn test_internal_mount_lists_images() {
        let host = Arc::new(FakeHost::with_images(&["a.iso", "b.iso"]));
        let mut drive = drive_with(&host);
        drive.select();
        drive.select();
        assert_eq!(drive.isos().len(), 2);
        assert_eq!(drive.isos()[0].path().file_name().unwrap(), "a.iso");

        // Leaving INTERNAL drops the image rows again.
        drive.select();
        assert!(drive.isos().is_empty());
    }

    #[test]
    fn test_unmount_internal_unmounts_exported_images_first() {
        let host = Arc::new(FakeHost::with_images(&["a.iso"]));
        let mut drive = drive_with(&host);
        drive.select();
        drive.select();
        // Move onto the image row and export it.
        drive.next();
        drive.select();
        assert!(drive.isos()[0].is_mounted());

        drive.prev();
        drive.select();
        assert_eq!(drive.mount_state(), MountState::External);
        let calls = host.calls();
        let unmount_image = calls
            .iter()
            .position(|call| call.starts_with("unmount-image"))
            .unwrap();
        let unmount_internal = calls
            .iter()
            .position(|call| call.starts_with("unmount-internal"))
            .unwrap();
        assert!(unmount_image < unmount_internal);
    }

    #[test]
    fn test_transitions_never_skip() {
        let host = Arc::new(FakeHost::default());
        let mut drive = drive_with(&host);
        drive.select();
        assert_eq!(drive.mount_state(), MountState::External);

        // EXTERNAL is not a valid starting point for these.
        assert!(!drive.mount_internal());
        assert!(!drive.mount_external());
        assert_eq!(drive.mount_state(), MountState::External);
        assert_eq!(host.calls(), vec!["mount-external volume0"]);
    }

    #[test]
    fn test_script_failure_preserves_state() {
        let host = Arc::new(FakeHost::failing());
        let mut drive = drive_with(&host);
        drive.select();
        assert_eq!(drive.mount_state(), MountState::Unmounted);
    }

    #[test]
    fn test_navigation_covers_heading_and_images() {
        let host = Arc::new(FakeHost::with_images(&["a.iso", "b.iso"]));
        let mut drive = drive_with(&host);
        drive.focus();
        drive.select();
        drive.select();

        // Cursor resets to the heading after the rebuild.
        assert!(drive.next().is_consumed());
        assert!(drive.next().is_consumed());
        // Past the last image the event bubbles.
        assert!(!drive.next().is_consumed());
        assert!(drive.prev().is_consumed());
        assert!(drive.prev().is_consumed());
        assert!(!drive.prev().is_consumed());
    }
}
