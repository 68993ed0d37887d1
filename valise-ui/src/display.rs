//! SSD1306 panel transport over SPI.

use std::io::Write;
use std::thread;
use std::time::Duration;

use linux_embedded_hal::spidev::{SpiModeFlags, Spidev, SpidevOptions};
use linux_embedded_hal::sysfs_gpio::{Direction, Pin};
use pixeldom::Bitmap;

use crate::error::Result;

pub const PANEL_WIDTH: usize = 128;
pub const PANEL_HEIGHT: usize = 64;

const SPI_DEVICE: &str = "/dev/spidev0.0";
const SPI_SPEED_HZ: u32 = 8_000_000;
const DC_PIN: u64 = 19;
const RST_PIN: u64 = 25;

/// SSD1306 command bytes, named after the datasheet registers.
mod cmd {
    pub const SET_CONTRAST: u8 = 0x81;
    pub const DISPLAY_ALL_ON_RESUME: u8 = 0xA4;
    pub const NORMAL_DISPLAY: u8 = 0xA6;
    pub const DISPLAY_OFF: u8 = 0xAE;
    pub const DISPLAY_ON: u8 = 0xAF;
    pub const SET_DISPLAY_OFFSET: u8 = 0xD3;
    pub const SET_COM_PINS: u8 = 0xDA;
    pub const SET_VCOM_DETECT: u8 = 0xDB;
    pub const SET_DISPLAY_CLOCK_DIV: u8 = 0xD5;
    pub const SET_PRECHARGE: u8 = 0xD9;
    pub const SET_MULTIPLEX: u8 = 0xA8;
    pub const SET_START_LINE: u8 = 0x40;
    pub const MEMORY_MODE: u8 = 0x20;
    pub const COLUMN_ADDR: u8 = 0x21;
    pub const PAGE_ADDR: u8 = 0x22;
    pub const COM_SCAN_DEC: u8 = 0xC8;
    pub const SEG_REMAP: u8 = 0xA0;
    pub const CHARGE_PUMP: u8 = 0x8D;
}

/// Output device the rendered frames land on.
pub trait Panel: Send {
    fn dimensions(&self) -> (usize, usize);

    /// Push a frame. Oversized frames are cropped to the panel.
    fn update(&mut self, frame: &Bitmap) -> Result<()>;

    /// Toggle the 180-degree mounting orientation. Takes effect on the
    /// next update.
    fn flip(&mut self);
}

/// The physical 128x64 OLED behind `/dev/spidev0.0`.
pub struct Ssd1306 {
    inverted: bool,
    contents: Bitmap,
    dc_pin: Pin,
    rst_pin: Pin,
    bus: Spidev,
}

impl Ssd1306 {
    /// Claim the SPI bus and GPIO lines and run the power-on sequence.
    pub fn open() -> Result<Self> {
        let mut bus = Spidev::open(SPI_DEVICE)?;
        let options = SpidevOptions::new()
            .bits_per_word(8)
            .max_speed_hz(SPI_SPEED_HZ)
            .mode(SpiModeFlags::SPI_MODE_0)
            .build();
        bus.configure(&options)?;

        let dc_pin = Pin::new(DC_PIN);
        dc_pin.export()?;
        dc_pin.set_direction(Direction::Out)?;

        let rst_pin = Pin::new(RST_PIN);
        rst_pin.export()?;
        rst_pin.set_direction(Direction::Out)?;

        // The panel is mounted upside-down in the case.
        let mut panel = Self {
            inverted: true,
            contents: Bitmap::new(PANEL_WIDTH, PANEL_HEIGHT),
            dc_pin,
            rst_pin,
            bus,
        };
        panel.power_on()?;
        Ok(panel)
    }

    fn command(&mut self, byte: u8) -> Result<()> {
        self.dc_pin.set_value(0)?;
        self.bus.write_all(&[byte])?;
        Ok(())
    }

    fn data(&mut self, bytes: &[u8]) -> Result<()> {
        self.dc_pin.set_value(1)?;
        self.bus.write_all(bytes)?;
        Ok(())
    }

    fn reset(&mut self) -> Result<()> {
        self.rst_pin.set_value(1)?;
        thread::sleep(Duration::from_millis(1));
        self.rst_pin.set_value(0)?;
        thread::sleep(Duration::from_millis(10));
        self.rst_pin.set_value(1)?;
        Ok(())
    }

    fn power_on(&mut self) -> Result<()> {
        log::debug!("[display] power on");
        self.reset()?;

        self.command(cmd::DISPLAY_OFF)?;
        self.command(cmd::SET_DISPLAY_CLOCK_DIV)?;
        self.command(0x80)?;
        self.command(cmd::SET_MULTIPLEX)?;
        self.command(0x3F)?;
        self.command(cmd::SET_DISPLAY_OFFSET)?;
        self.command(0x00)?;
        self.command(cmd::SET_START_LINE)?;
        self.command(cmd::CHARGE_PUMP)?;
        self.command(0x14)?;
        self.command(cmd::MEMORY_MODE)?;
        self.command(0x00)?;
        self.command(cmd::SEG_REMAP | 0x1)?;
        self.command(cmd::COM_SCAN_DEC)?;
        self.command(cmd::SET_COM_PINS)?;
        self.command(0x12)?;
        self.command(cmd::SET_CONTRAST)?;
        self.command(0xCF)?;
        self.command(cmd::SET_PRECHARGE)?;
        self.command(0xF1)?;
        self.command(cmd::SET_VCOM_DETECT)?;
        self.command(0x40)?;
        self.command(cmd::DISPLAY_ALL_ON_RESUME)?;
        self.command(cmd::NORMAL_DISPLAY)?;
        self.command(cmd::DISPLAY_ON)
    }
}

impl Panel for Ssd1306 {
    fn dimensions(&self) -> (usize, usize) {
        (self.contents.width(), self.contents.height())
    }

    fn flip(&mut self) {
        self.inverted = !self.inverted;
    }

    fn update(&mut self, frame: &Bitmap) -> Result<()> {
        self.contents = Bitmap::new(PANEL_WIDTH, PANEL_HEIGHT);
        self.contents.blit(frame, (0, 0), false);

        let width = self.contents.width();
        let pages = self.contents.height() / 8;

        self.command(cmd::COLUMN_ADDR)?;
        self.command(0)?;
        self.command(width as u8 - 1)?;
        self.command(cmd::PAGE_ADDR)?;
        self.command(0)?;
        self.command(pages as u8 - 1)?;

        let mut data = Vec::with_capacity(width * pages);
        if self.inverted {
            for page in (0..pages).rev() {
                for x in (0..width).rev() {
                    data.push(pack_column(&self.contents, page, x, true));
                }
            }
        } else {
            for page in 0..pages {
                for x in 0..width {
                    data.push(pack_column(&self.contents, page, x, false));
                }
            }
        }
        self.data(&data)
    }
}

/// Pack one 8-pixel column of a page into the wire byte. Upright
/// frames put the top row at the least significant bit; inverted
/// frames reverse the bit order (the caller also reverses page and
/// column order for a half-turn).
fn pack_column(contents: &Bitmap, page: usize, x: usize, inverted: bool) -> u8 {
    let mut bits = 0u8;
    for bit in 0..8 {
        let y = if inverted {
            page * 8 + bit
        } else {
            page * 8 + 7 - bit
        };
        bits <<= 1;
        if contents.get(x, y).unwrap_or(0) != 0 {
            bits |= 1;
        }
    }
    bits
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_column_upright_top_row_is_lsb() {
        let mut contents = Bitmap::new(8, 8);
        contents.set(0, 0, 1);
        assert_eq!(pack_column(&contents, 0, 0, false), 0x01);
    }

    #[test]
    fn test_pack_column_inverted_top_row_is_msb() {
        let mut contents = Bitmap::new(8, 8);
        contents.set(0, 0, 1);
        assert_eq!(pack_column(&contents, 0, 0, true), 0x80);
    }

    #[test]
    fn test_pack_column_second_page_reads_lower_rows() {
        let mut contents = Bitmap::new(8, 16);
        contents.set(3, 15, 1);
        assert_eq!(pack_column(&contents, 1, 3, false), 0x80);
        assert_eq!(pack_column(&contents, 1, 3, true), 0x01);
    }
}
