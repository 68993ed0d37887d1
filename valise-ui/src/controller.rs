//! Three-button GPIO input.
//!
//! Each button is a falling-edge line on the sysfs GPIO interface. The
//! controller is an iterator over debounced events; holding select past
//! the long-press threshold yields `LongPress` instead of `Select`.

use std::thread;
use std::time::{Duration, Instant};

use linux_embedded_hal::sysfs_gpio::{Direction, Edge, Pin, PinPoller};

use crate::error::Result;

const UP_PIN: u64 = 27;
const DOWN_PIN: u64 = 22;
const SELECT_PIN: u64 = 17;

const EDGE_TIMEOUT_MS: isize = 20;
const DEBOUNCE_DELAY: Duration = Duration::from_millis(100);
const DEBOUNCE_HOLD: Duration = Duration::from_millis(30);
const LONG_PRESS: Duration = Duration::from_secs(3);
const HOLD_POLL: Duration = Duration::from_millis(25);

/// A debounced button event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEvent {
    Up,
    Down,
    Select,
    LongPress,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Button {
    Up,
    Down,
    Select,
}

/// The three physical buttons, exposed as an event iterator.
pub struct Controller {
    up: Pin,
    down: Pin,
    select: Pin,
    up_poller: PinPoller,
    down_poller: PinPoller,
    select_poller: PinPoller,
    swapped: bool,
    last_event: Instant,
}

impl Controller {
    /// Claim the three input lines and arm their edge triggers.
    pub fn open() -> Result<Self> {
        let up = claim_input(UP_PIN)?;
        let down = claim_input(DOWN_PIN)?;
        let select = claim_input(SELECT_PIN)?;
        Ok(Self {
            up_poller: up.get_poller()?,
            down_poller: down.get_poller()?,
            select_poller: select.get_poller()?,
            up,
            down,
            select,
            swapped: false,
            last_event: Instant::now(),
        })
    }

    /// Swap the up/down mapping, tracking a flipped panel.
    pub fn flip(&mut self) {
        self.swapped = !self.swapped;
        log::debug!("[input] up/down swapped: {}", self.swapped);
    }

    /// Block until any line reports an edge.
    fn wait_edge(&mut self) -> Result<Button> {
        loop {
            if self.up_poller.poll(EDGE_TIMEOUT_MS)?.is_some() {
                return Ok(Button::Up);
            }
            if self.down_poller.poll(EDGE_TIMEOUT_MS)?.is_some() {
                return Ok(Button::Down);
            }
            if self.select_poller.poll(EDGE_TIMEOUT_MS)?.is_some() {
                return Ok(Button::Select);
            }
        }
    }

    /// One debounced event, or `None` for an edge dismissed as bounce.
    fn poll_event(&mut self) -> Result<Option<ControlEvent>> {
        let button = self.wait_edge()?;
        if self.last_event.elapsed() < DEBOUNCE_DELAY {
            return Ok(None);
        }
        // The line must still be low once the contact settles.
        thread::sleep(DEBOUNCE_HOLD);
        let pin = match button {
            Button::Up => &self.up,
            Button::Down => &self.down,
            Button::Select => &self.select,
        };
        if pin.get_value()? != 0 {
            return Ok(None);
        }

        let event = match button {
            Button::Up | Button::Down => map_direction(button, self.swapped),
            Button::Select => self.classify_select()?,
        };
        self.last_event = Instant::now();
        Ok(Some(event))
    }

    /// Watch the select line until release or the long-press threshold.
    fn classify_select(&self) -> Result<ControlEvent> {
        let pressed_at = Instant::now();
        loop {
            if pressed_at.elapsed() >= LONG_PRESS {
                return Ok(ControlEvent::LongPress);
            }
            if self.select.get_value()? != 0 {
                return Ok(ControlEvent::Select);
            }
            thread::sleep(HOLD_POLL);
        }
    }
}

impl Iterator for Controller {
    type Item = Result<ControlEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.poll_event() {
                Ok(Some(event)) => return Some(Ok(event)),
                Ok(None) => continue,
                Err(err) => return Some(Err(err)),
            }
        }
    }
}

fn claim_input(number: u64) -> Result<Pin> {
    let pin = Pin::new(number);
    pin.export()?;
    pin.set_direction(Direction::In)?;
    pin.set_edge(Edge::FallingEdge)?;
    Ok(pin)
}

fn map_direction(button: Button, swapped: bool) -> ControlEvent {
    match (button, swapped) {
        (Button::Up, false) | (Button::Down, true) => ControlEvent::Up,
        (Button::Up, true) | (Button::Down, false) => ControlEvent::Down,
        (Button::Select, _) => ControlEvent::Select,
    }
}
