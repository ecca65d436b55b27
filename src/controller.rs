//! The one interface every effect renders through.
//!
//! A [`Controller`] pairs the physical strip with the shared settings, so an
//! effect sees `{pixel_count, set_pixel, show, palette, frame_delay}` and
//! nothing else.

use crate::color::{Color, OFF};
use crate::device::{DeviceError, Strip};
use crate::settings::SharedSettings;
use std::time::Duration;

pub struct Controller {
    strip: Box<dyn Strip>,
    settings: SharedSettings,
}

impl Controller {
    pub fn new(strip: Box<dyn Strip>, settings: SharedSettings) -> Self {
        Self { strip, settings }
    }

    pub fn pixel_count(&self) -> usize {
        self.strip.pixel_count()
    }

    /// Write one pixel of the pending frame. Out-of-range indices are ignored.
    pub fn set_pixel(&mut self, index: usize, color: Color) {
        if index < self.strip.pixel_count() {
            self.strip.set_pixel(index, color);
        }
    }

    /// Set every pixel of the pending frame without flushing.
    pub fn fill(&mut self, color: Color) {
        for i in 0..self.strip.pixel_count() {
            self.strip.set_pixel(i, color);
        }
    }

    pub fn clear(&mut self) {
        self.fill(OFF);
    }

    /// Flush the pending frame to the device.
    pub fn show(&mut self) -> Result<(), DeviceError> {
        self.strip.show()
    }

    /// Current palette, re-read by effects at each frame.
    pub fn palette(&self) -> Vec<Color> {
        self.settings.palette()
    }

    pub fn frame_delay(&self) -> Duration {
        self.settings.frame_delay()
    }

    pub fn settings(&self) -> &SharedSettings {
        &self.settings
    }
}
