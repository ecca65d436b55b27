//! Effect scheduler for addressable LED strips.
//!
//! The pieces, bottom up:
//! - [`color`]: 24-bit colors, wheels and palettes
//! - [`device`]: the [`Strip`](device::Strip) trait, an in-memory strip and
//!   the WS281x driver (`hardware` feature)
//! - [`controller`]: what effects draw through
//! - [`cancel`]: the cooperative stop signal
//! - [`effects`]: the animations and their registry
//! - [`scheduler`]: runs at most one effect at a time
//! - [`server`]: HTTP API in front of the scheduler

pub mod cancel;
pub mod color;
pub mod controller;
pub mod device;
pub mod effects;
pub mod scheduler;
pub mod server;
pub mod settings;

pub use color::Color;
pub use controller::Controller;
pub use effects::{Args, Effect, EffectError, EffectRegistry};
pub use scheduler::{Scheduler, SchedulerError, SchedulerStatus};
pub use settings::{Settings, SharedSettings};

// ── Strip configuration ────────────────────────────────────────────

/// How to reach the physical strip.
///
/// Only `pixel_count` matters to the in-memory strip; the rest is passed to
/// the WS281x driver.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StripConfig {
    pub pixel_count: usize,
    /// GPIO pin carrying the data line (BCM numbering).
    pub pin: i32,
    pub dma: i32,
    pub brightness: u8,
    pub frequency_hz: u32,
}

impl Default for StripConfig {
    fn default() -> Self {
        Self {
            pixel_count: 120,
            pin: 18,
            dma: 10,
            brightness: 255,
            frequency_hz: 800_000,
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_config_matches_common_wiring() {
        let config = StripConfig::default();
        assert_eq!(config.pixel_count, 120);
        assert_eq!(config.pin, 18);
        assert_eq!(config.frequency_hz, 800_000);
    }
}
