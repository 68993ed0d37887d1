//! The new-drive wizard.
//!
//! A single row that walks select through sizing, format choice and a
//! waiting screen. The actual creation runs on a background thread; the
//! wizard only buffers the request and sits in WAITING until the root
//! resets it under the tree lock.

use pixeldom::{render_text, selector, Bitmap, EventHandler, EventResult, RenderMode, Renderable};
use valise_storage::DriveFormat;

use crate::config::UiConfig;
use crate::display::{PANEL_HEIGHT, PANEL_WIDTH};

use super::render_row;
use super::request::MenuRequest;

const BYTES_PER_GB: f64 = (1024 * 1024 * 1024) as f64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WizardState {
    Normal,
    SelectingSize,
    SelectingFormat,
    Waiting,
}

/// The "New Drive" row and its capture of the creation parameters.
pub struct NewDriveItem {
    state: WizardState,
    percent: i64,
    step: i64,
    default_percent: i64,
    pool_bytes: u64,
    format_index: usize,
    pending: Option<MenuRequest>,
    focused: bool,
}

impl NewDriveItem {
    pub fn new(config: &UiConfig) -> Self {
        Self {
            state: WizardState::Normal,
            percent: config.default_percent,
            step: config.size_step,
            default_percent: config.default_percent,
            pool_bytes: 0,
            format_index: 0,
            pending: None,
            focused: false,
        }
    }

    /// Pool capacity the percentage is taken of. Pushed by the root on
    /// drive-set changes rather than read per frame.
    pub fn set_pool_bytes(&mut self, bytes: u64) {
        self.pool_bytes = bytes;
    }

    /// Hand the buffered creation request to the main loop.
    pub fn take_request(&mut self) -> Option<MenuRequest> {
        self.pending.take()
    }

    /// Back to the plain row. Run by the creation task under the tree
    /// lock when it finishes, successfully or not.
    pub fn reset(&mut self) {
        log::debug!("[wizard] reset");
        self.state = WizardState::Normal;
        self.percent = self.default_percent;
        self.format_index = 0;
        self.pending = None;
    }

    /// Requested capacity in bytes, rounded up to whole 512-byte
    /// sectors.
    fn target_size(&self) -> u64 {
        let raw = self.pool_bytes as u128 * self.percent.max(0) as u128 / 100;
        (raw.div_ceil(512) * 512) as u64
    }
}

impl EventHandler for NewDriveItem {
    fn select(&mut self) -> EventResult {
        match self.state {
            WizardState::Normal => {
                log::debug!("[wizard] sizing from {}%", self.default_percent);
                self.percent = self.default_percent;
                self.state = WizardState::SelectingSize;
            }
            WizardState::SelectingSize => {
                self.format_index = 0;
                self.state = WizardState::SelectingFormat;
            }
            WizardState::SelectingFormat => {
                let format = DriveFormat::ALL[self.format_index];
                let size = self.target_size();
                log::debug!("[wizard] requesting {size} bytes as {format:?}");
                self.pending = Some(MenuRequest::CreateDrive { size, format });
                self.state = WizardState::Waiting;
            }
            WizardState::Waiting => {}
        }
        EventResult::Consumed
    }

    fn next(&mut self) -> EventResult {
        match self.state {
            WizardState::Normal => EventResult::Ignored,
            WizardState::SelectingSize => {
                self.percent += self.step;
                EventResult::Consumed
            }
            WizardState::SelectingFormat => {
                if self.format_index + 1 < DriveFormat::ALL.len() {
                    self.format_index += 1;
                }
                EventResult::Consumed
            }
            WizardState::Waiting => EventResult::Consumed,
        }
    }

    fn prev(&mut self) -> EventResult {
        match self.state {
            WizardState::Normal => EventResult::Ignored,
            WizardState::SelectingSize => {
                self.percent = (self.percent - self.step).max(0);
                EventResult::Consumed
            }
            WizardState::SelectingFormat => {
                self.format_index = self.format_index.saturating_sub(1);
                EventResult::Consumed
            }
            WizardState::Waiting => EventResult::Consumed,
        }
    }

    fn focus(&mut self) -> EventResult {
        self.focused = true;
        EventResult::Consumed
    }

    fn lose_focus(&mut self) -> EventResult {
        self.focused = false;
        EventResult::Consumed
    }
}

impl Renderable for NewDriveItem {
    fn render(&self) -> (Bitmap, RenderMode) {
        match self.state {
            WizardState::Normal => (render_row("New Drive", self.focused), RenderMode::Normal),
            WizardState::SelectingSize => {
                let mut screen = Bitmap::new(PANEL_WIDTH, PANEL_HEIGHT);
                screen.blit(&render_text("New drive capacity:"), (0, 0), false);
                let gigabytes = self.target_size() as f64 / BYTES_PER_GB;
                screen.blit(
                    &render_text(format!("{}% ({:.2}GB)", self.percent, gigabytes)),
                    (10, 30),
                    false,
                );
                (screen, RenderMode::Fullscreen)
            }
            WizardState::SelectingFormat => {
                let mut screen = Bitmap::new(PANEL_WIDTH, PANEL_HEIGHT);
                screen.blit(&render_text("Select Format:"), (0, 0), false);
                for (index, format) in DriveFormat::ALL.iter().enumerate() {
                    let y = 9 * (index + 1);
                    screen.blit(&render_text(format.label()), (10, y), false);
                    if index == self.format_index {
                        screen.blit(&selector(), (2, y), true);
                    }
                }
                (screen, RenderMode::Fullscreen)
            }
            WizardState::Waiting => {
                let mut screen = Bitmap::new(PANEL_WIDTH, PANEL_HEIGHT);
                screen.blit(&render_text("Formatting new drive"), (0, 0), false);
                (screen, RenderMode::Fullscreen)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GB: u64 = 1024 * 1024 * 1024;

    fn wizard() -> NewDriveItem {
        let mut item = NewDriveItem::new(&UiConfig::default());
        item.set_pool_bytes(100 * GB);
        item
    }

    #[test]
    fn test_half_of_pool_is_already_aligned() {
        let mut item = wizard();
        item.select();
        assert_eq!(item.target_size(), 50 * GB);
    }

    #[test]
    fn test_target_size_rounds_up_to_sector() {
        let mut item = wizard();
        item.set_pool_bytes(1000);
        item.select();
        item.percent = 33;
        // 330 bytes requested, one whole sector allocated.
        assert_eq!(item.target_size(), 512);
    }

    #[test]
    fn test_percent_steps_and_clamps_at_zero() {
        let mut item = wizard();
        item.select();
        assert!(item.next().is_consumed());
        assert_eq!(item.percent, 60);

        for _ in 0..10 {
            item.prev();
        }
        assert_eq!(item.percent, 0);
        // No upper clamp short of the creation-time pool check.
        for _ in 0..12 {
            item.next();
        }
        assert_eq!(item.percent, 120);
    }

    #[test]
    fn test_moves_are_not_consumed_on_the_plain_row() {
        let mut item = wizard();
        assert!(!item.next().is_consumed());
        assert!(!item.prev().is_consumed());
    }

    #[test]
    fn test_select_walks_to_waiting_and_buffers_request() {
        let mut item = wizard();
        item.select();
        assert_eq!(item.render().1, RenderMode::Fullscreen);
        item.select();
        item.next();
        item.select();

        assert_eq!(
            item.take_request(),
            Some(MenuRequest::CreateDrive {
                size: 50 * GB,
                format: DriveFormat::Linux,
            })
        );
        assert_eq!(item.take_request(), None);

        // WAITING swallows everything.
        assert!(item.select().is_consumed());
        assert!(item.next().is_consumed());
        assert!(item.prev().is_consumed());
        assert_eq!(item.render().1, RenderMode::Fullscreen);
    }

    #[test]
    fn test_format_choice_clamps_at_both_ends() {
        let mut item = wizard();
        item.select();
        item.select();
        item.prev();
        assert_eq!(item.format_index, 0);
        for _ in 0..6 {
            item.next();
        }
        assert_eq!(item.format_index, DriveFormat::ALL.len() - 1);
    }

    #[test]
    fn test_reset_returns_to_the_plain_row() {
        let mut item = wizard();
        item.select();
        item.select();
        item.select();
        item.reset();
        assert_eq!(item.render().1, RenderMode::Normal);
        assert_eq!(item.take_request(), None);
        assert_eq!(item.percent, 50);
    }
}
