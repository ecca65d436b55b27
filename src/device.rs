//! Frame buffer devices: the hardware strip and an in-memory stand-in.
//!
//! Effects never talk to a device directly; they go through
//! [`Controller`](crate::controller::Controller), which owns a boxed [`Strip`].

use crate::StripConfig;
use crate::color::{Color, OFF};
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("failed to initialize strip: {0}")]
    Init(String),
    #[error("failed to push frame to strip: {0}")]
    Show(String),
}

/// A strip of individually addressable pixels.
///
/// `set_pixel` only writes the local buffer; nothing reaches the LEDs until
/// `show` flushes it. `show` may be slow, so callers flush once per frame.
pub trait Strip: Send {
    fn pixel_count(&self) -> usize;

    /// Out-of-range indices are ignored.
    fn set_pixel(&mut self, index: usize, color: Color);

    fn show(&mut self) -> Result<(), DeviceError>;
}

// ── In-memory strip ──────────────────────────────────────────────────

/// Pixel buffer that "shows" by copying into a shared snapshot.
///
/// Used by the simulator binary and by tests, which read frames back through
/// a [`StripProbe`].
pub struct MemoryStrip {
    pixels: Vec<Color>,
    probe: StripProbe,
}

/// Read side of a [`MemoryStrip`], usable from another thread.
#[derive(Clone, Default)]
pub struct StripProbe {
    inner: Arc<Mutex<ProbeState>>,
}

#[derive(Default)]
struct ProbeState {
    last_frame: Vec<Color>,
    frames_shown: u64,
    fail_show: bool,
}

impl MemoryStrip {
    pub fn new(pixel_count: usize) -> Self {
        Self {
            pixels: vec![OFF; pixel_count],
            probe: StripProbe::default(),
        }
    }

    pub fn probe(&self) -> StripProbe {
        self.probe.clone()
    }
}

impl Strip for MemoryStrip {
    fn pixel_count(&self) -> usize {
        self.pixels.len()
    }

    fn set_pixel(&mut self, index: usize, color: Color) {
        if let Some(pixel) = self.pixels.get_mut(index) {
            *pixel = color;
        }
    }

    fn show(&mut self) -> Result<(), DeviceError> {
        let mut state = self.probe.lock();
        if state.fail_show {
            return Err(DeviceError::Show("simulated failure".to_string()));
        }
        state.last_frame.clone_from(&self.pixels);
        state.frames_shown += 1;
        tracing::trace!(frame = state.frames_shown, "memory strip show");
        Ok(())
    }
}

impl StripProbe {
    fn lock(&self) -> std::sync::MutexGuard<'_, ProbeState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The most recently shown frame (empty before the first `show`).
    pub fn last_frame(&self) -> Vec<Color> {
        self.lock().last_frame.clone()
    }

    pub fn frames_shown(&self) -> u64 {
        self.lock().frames_shown
    }

    /// Make every following `show` fail until cleared.
    pub fn set_fail_show(&self, fail: bool) {
        self.lock().fail_show = fail;
    }
}

// ── Hardware strip ───────────────────────────────────────────────────

/// WS281x strip driven through `rs_ws281x` (PWM/DMA on a Raspberry Pi).
#[cfg(feature = "hardware")]
pub struct Ws281xStrip {
    controller: rs_ws281x::Controller,
    count: usize,
}

// SAFETY: the C driver keeps no thread-local state. The strip is only ever
// reached through the controller mutex, so one thread touches it at a time.
#[cfg(feature = "hardware")]
unsafe impl Send for Ws281xStrip {}

#[cfg(feature = "hardware")]
impl Ws281xStrip {
    pub fn new(config: StripConfig) -> Result<Self, DeviceError> {
        use rs_ws281x::{ChannelBuilder, ControllerBuilder, StripType};

        let count = i32::try_from(config.pixel_count)
            .map_err(|_| DeviceError::Init(format!("too many pixels: {}", config.pixel_count)))?;

        let controller = ControllerBuilder::new()
            .freq(config.frequency_hz)
            .dma(config.dma)
            .channel(
                0,
                ChannelBuilder::new()
                    .pin(config.pin)
                    .count(count)
                    .strip_type(StripType::Ws2812)
                    .brightness(config.brightness)
                    .build(),
            )
            .build()
            .map_err(|e| DeviceError::Init(e.to_string()))?;

        Ok(Self {
            controller,
            count: config.pixel_count,
        })
    }
}

#[cfg(feature = "hardware")]
impl Strip for Ws281xStrip {
    fn pixel_count(&self) -> usize {
        self.count
    }

    fn set_pixel(&mut self, index: usize, color: Color) {
        if let Some(led) = self.controller.leds_mut(0).get_mut(index) {
            // Raw layout is little-endian 0xWWRRGGBB
            *led = [color.b, color.g, color.r, 0];
        }
    }

    fn show(&mut self) -> Result<(), DeviceError> {
        self.controller
            .render()
            .map_err(|e| DeviceError::Show(e.to_string()))
    }
}

/// Open the strip described by `config`.
///
/// With the `hardware` feature this is the real WS281x driver; without it a
/// [`MemoryStrip`] stands in so the service runs anywhere.
pub fn open_strip(config: StripConfig) -> Result<Box<dyn Strip>, DeviceError> {
    #[cfg(feature = "hardware")]
    {
        Ok(Box::new(Ws281xStrip::new(config)?))
    }
    #[cfg(not(feature = "hardware"))]
    {
        tracing::warn!(
            "Built without the 'hardware' feature, simulating {} pixels in memory",
            config.pixel_count
        );
        Ok(Box::new(MemoryStrip::new(config.pixel_count)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{BLUE, RED};
    use pretty_assertions::assert_eq;

    #[test]
    fn nothing_visible_before_show() {
        let mut strip = MemoryStrip::new(3);
        let probe = strip.probe();
        strip.set_pixel(0, RED);
        assert_eq!(probe.frames_shown(), 0);
        assert!(probe.last_frame().is_empty());
    }

    #[test]
    fn show_snapshots_buffer() {
        let mut strip = MemoryStrip::new(3);
        let probe = strip.probe();
        strip.set_pixel(0, RED);
        strip.set_pixel(2, BLUE);
        strip.show().unwrap();
        assert_eq!(probe.last_frame(), vec![RED, OFF, BLUE]);
        assert_eq!(probe.frames_shown(), 1);
    }

    #[test]
    fn out_of_range_pixels_are_ignored() {
        let mut strip = MemoryStrip::new(2);
        let probe = strip.probe();
        strip.set_pixel(2, RED);
        strip.set_pixel(usize::MAX, RED);
        strip.show().unwrap();
        assert_eq!(probe.last_frame(), vec![OFF, OFF]);
    }

    #[test]
    fn failing_show_reports_error() {
        let mut strip = MemoryStrip::new(1);
        let probe = strip.probe();
        probe.set_fail_show(true);
        assert!(matches!(strip.show(), Err(DeviceError::Show(_))));
        assert_eq!(probe.frames_shown(), 0);
        probe.set_fail_show(false);
        assert!(strip.show().is_ok());
    }

    #[cfg(not(feature = "hardware"))]
    #[test]
    fn open_strip_simulates_without_hardware() {
        let strip = open_strip(StripConfig::default()).unwrap();
        assert_eq!(strip.pixel_count(), 120);
    }
}
