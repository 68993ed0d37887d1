//! Hardware bring-up and the event loop.
//!
//! Startup order matters: config, mount scripts, volume group probe,
//! USB gadget, panel, menu tree, buttons. Anything failing here aborts
//! with the error surfaced by `main`; once the loop is running, storage
//! failures are logged and the menu keeps serving.

use std::fs;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;

use pixeldom::{render_text, Bitmap, EventHandler, Renderable};
use valise_storage::{
    DriveFormat, GadgetConfig, MountHost, ShellScripts, UsbGadget, VolumeGroup,
};

use crate::config::{Config, Scripts};
use crate::controller::{ControlEvent, Controller};
use crate::display::{Panel, Ssd1306, PANEL_HEIGHT, PANEL_WIDTH};
use crate::error::Result;
use crate::menu::{MenuRequest, RootMenu};

const GADGET_ROOT: &str = "/sys/kernel/config/usb_gadget/g1";

/// A poisoned lock still holds a usable menu; the panicking thread has
/// already logged its failure.
fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub fn run() -> Result<()> {
    let config = Config::load()?;
    let scripts = Scripts::from_env()?;
    let host: Arc<dyn MountHost> = Arc::new(ShellScripts::new(
        scripts.drive_script,
        scripts.image_script,
        scripts.mount_root,
    ));

    let group = VolumeGroup::from_path(format!("/dev/{}", config.storage.volume_group))?;
    let report = group.report()?;
    log::info!("[app] volume group {}: {} bytes", group.name(), report.vg_size);

    let mut gadget_config = GadgetConfig::default();
    if let Some(serial) = read_serial() {
        gadget_config.serial = serial;
    }
    UsbGadget::new(GADGET_ROOT, gadget_config).configure()?;

    let panel: Arc<Mutex<dyn Panel>> = Arc::new(Mutex::new(Ssd1306::open()?));
    let dimensions = lock(&panel).dimensions();
    let root = Arc::new(Mutex::new(RootMenu::new(
        Box::new(group),
        Arc::clone(&host),
        &config.ui,
        dimensions,
    )?));
    push_frame(&root, &panel)?;

    let mut controller = Controller::open()?;
    log::info!("[app] ready");
    loop {
        let Some(event) = controller.next() else {
            break;
        };
        let event = event?;
        log::debug!("[app] event: {event:?}");
        match event {
            ControlEvent::Up => {
                lock(&root).prev();
            }
            ControlEvent::Down => {
                lock(&root).next();
            }
            ControlEvent::Select => {
                lock(&root).select();
            }
            ControlEvent::LongPress => apply_flip(&panel, &mut controller),
        }
        push_frame(&root, &panel)?;

        loop {
            let request = lock(&root).take_request();
            let Some(request) = request else {
                break;
            };
            dispatch(request, &root, &panel, &mut controller);
            push_frame(&root, &panel)?;
        }
    }
    Ok(())
}

fn dispatch(
    request: MenuRequest,
    root: &Arc<Mutex<RootMenu>>,
    panel: &Arc<Mutex<dyn Panel>>,
    controller: &mut Controller,
) {
    log::debug!("[app] request: {request:?}");
    match request {
        MenuRequest::CreateDrive { size, format } => spawn_create(root, panel, size, format),
        MenuRequest::RemoveDrive(name) => {
            if let Err(err) = lock(root).remove_drive(&name) {
                log::error!("[app] remove {name}: {err}");
            }
        }
        MenuRequest::SnapshotDrive(name) => {
            if let Err(err) = lock(root).snapshot_drive(&name) {
                log::error!("[app] snapshot {name}: {err}");
            }
        }
        MenuRequest::FlipDisplay => apply_flip(panel, controller),
    }
}

/// Provisioning and formatting can take minutes. The wizard holds its
/// waiting screen while this runs off the input thread.
fn spawn_create(
    root: &Arc<Mutex<RootMenu>>,
    panel: &Arc<Mutex<dyn Panel>>,
    size: u64,
    format: DriveFormat,
) {
    let root = Arc::clone(root);
    let panel = Arc::clone(panel);
    thread::spawn(move || {
        let result = lock(&root).add_drive(size, format);
        if let Err(err) = result {
            log::error!("[app] create failed: {err}");
            lock(&root).reset_wizard();
        }
        if let Err(err) = push_frame(&root, &panel) {
            log::error!("[app] frame update: {err}");
        }
    });
}

/// Rotate both the panel output and the up/down buttons together.
fn apply_flip(panel: &Arc<Mutex<dyn Panel>>, controller: &mut Controller) {
    log::debug!("[app] flipping orientation");
    lock(panel).flip();
    controller.flip();
}

fn push_frame(root: &Arc<Mutex<RootMenu>>, panel: &Arc<Mutex<dyn Panel>>) -> Result<()> {
    let (frame, _) = lock(root).render();
    lock(panel).update(&frame)
}

fn serial_from_cpuinfo(cpuinfo: &str) -> Option<String> {
    cpuinfo
        .lines()
        .find(|line| line.starts_with("Serial"))
        .and_then(|line| line.split(':').nth(1))
        .map(|serial| serial.trim().to_string())
        .filter(|serial| !serial.is_empty())
}

/// Board serial for the gadget descriptor. Absent outside real
/// hardware, in which case the default placeholder stands.
fn read_serial() -> Option<String> {
    let cpuinfo = fs::read_to_string("/proc/cpuinfo").ok()?;
    serial_from_cpuinfo(&cpuinfo)
}

/// Last-ditch panel message for a fatal startup error. Failures here
/// are swallowed; there is nothing left to report them to.
pub fn render_failure() {
    let Ok(mut panel) = Ssd1306::open() else {
        return;
    };
    let mut frame = Bitmap::new(PANEL_WIDTH, PANEL_HEIGHT);
    frame.blit(&render_text("An error occurred."), (10, 25), false);
    let _ = panel.update(&frame);
}
