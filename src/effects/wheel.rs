//! Hue wheel cycling along the strip.

use super::{Args, Effect, EffectError, draw_frame};
use crate::cancel::CancelToken;
use crate::color::Color;
use crate::controller::Controller;
use std::time::Duration;

const DEFAULT_WAIT_MS: u64 = 20;

/// Rotates a 256-step color ramp along the strip.
///
/// Args: `[wait_ms = 20, iterations = 1]`. Each iteration is 256 frames;
/// the effect ends on its own after the last one.
pub struct ColorWheel {
    ramp: fn(u8) -> Color,
}

impl ColorWheel {
    pub fn new(ramp: fn(u8) -> Color) -> Self {
        Self { ramp }
    }
}

/// Ramp position of pixel `i` at step `t`.
pub fn wheel_position(i: usize, t: usize) -> u8 {
    ((i + t) % 256) as u8
}

impl Effect for ColorWheel {
    fn run(&self, ctrl: &mut Controller, args: &Args, cancel: &CancelToken) -> Result<(), EffectError> {
        let wait = Duration::from_millis(args.get_or(0, DEFAULT_WAIT_MS)?);
        let iterations: u32 = args.get_or(1, 1)?;

        for _ in 0..iterations {
            for t in 0..256 {
                if !draw_frame(ctrl, cancel, |i, _| (self.ramp)(wheel_position(i, t)))? {
                    return Ok(());
                }
                if !cancel.sleep(wait) {
                    return Ok(());
                }
            }
        }
        Ok(())
    }
}
