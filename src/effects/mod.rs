//! Effect registry and the contract every animation implements.
//!
//! An effect runs on its own thread with exclusive use of the
//! [`Controller`] until it finishes or its [`CancelToken`] is raised.
//! Effects must poll the token at least once per frame and once per pixel
//! inside a frame, and must sleep only through [`CancelToken::sleep`], so a
//! stop request lands within one frame period.

pub mod clock;
pub mod fill;
pub mod race;
pub mod spatial;
pub mod wave;
pub mod wheel;

use crate::cancel::CancelToken;
use crate::color::{self, Color, LIME_GREEN, OFF};
use crate::controller::Controller;
use crate::device::DeviceError;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum EffectError {
    #[error(transparent)]
    Device(#[from] DeviceError),
    #[error("invalid argument {index}: {reason}")]
    InvalidArgument { index: usize, reason: String },
}

/// Positional arguments passed through from `start(name, args)`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Args(Vec<Value>);

impl Args {
    pub fn new(values: Vec<Value>) -> Self {
        Self(values)
    }

    /// Decode argument `index`. Missing or `null` arguments are `None`.
    pub fn get<T: DeserializeOwned>(&self, index: usize) -> Result<Option<T>, EffectError> {
        match self.0.get(index) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|e| EffectError::InvalidArgument {
                    index,
                    reason: e.to_string(),
                }),
        }
    }

    pub fn get_or<T: DeserializeOwned>(&self, index: usize, default: T) -> Result<T, EffectError> {
        Ok(self.get(index)?.unwrap_or(default))
    }
}

impl From<Vec<Value>> for Args {
    fn from(values: Vec<Value>) -> Self {
        Self(values)
    }
}

/// Something the scheduler can run.
///
/// `run` returns when the animation ends on its own or as soon as it sees
/// the token raised. It must never touch the token's flag itself.
pub trait Effect: Send + Sync {
    fn run(&self, ctrl: &mut Controller, args: &Args, cancel: &CancelToken) -> Result<(), EffectError>;
}

impl<F> Effect for F
where
    F: Fn(&mut Controller, &Args, &CancelToken) -> Result<(), EffectError> + Send + Sync,
{
    fn run(&self, ctrl: &mut Controller, args: &Args, cancel: &CancelToken) -> Result<(), EffectError> {
        self(ctrl, args, cancel)
    }
}

/// Paint one frame pixel by pixel and flush it.
///
/// `pixel(i, n)` computes pixel `i` of `n`. The token is checked before
/// every pixel; on cancellation the partial frame is dropped unshown and
/// `Ok(false)` comes back.
pub fn draw_frame(
    ctrl: &mut Controller,
    cancel: &CancelToken,
    mut pixel: impl FnMut(usize, usize) -> Color,
) -> Result<bool, EffectError> {
    let n = ctrl.pixel_count();
    for i in 0..n {
        if cancel.is_cancelled() {
            return Ok(false);
        }
        ctrl.set_pixel(i, pixel(i, n));
    }
    ctrl.show()?;
    Ok(true)
}

// ── Registry ─────────────────────────────────────────────────────────

/// Name → effect mapping, fixed once the scheduler owns it.
#[derive(Clone, Default)]
pub struct EffectRegistry {
    effects: HashMap<&'static str, Arc<dyn Effect>>,
}

impl EffectRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Every effect this crate ships.
    pub fn builtin() -> Self {
        use clock::{ClockEffect, ClockStyle};
        use wave::{Composite, WaveShape};

        Self::empty()
            .with("wheel", wheel::ColorWheel::new(color::wheel))
            .with("warm_wheel", wheel::ColorWheel::new(color::warm_wheel))
            .with("cool_wheel", wheel::ColorWheel::new(color::cool_wheel))
            .with("fill", fill::Fill)
            .with("lime_green", fill::Solid(LIME_GREEN))
            .with("off", fill::Solid(OFF))
            .with("palette", fill::PaletteFill)
            .with("bits", fill::Bits)
            .with("sine_wave", wave::WaveEffect::preset(WaveShape::Sine))
            .with("triangle_wave", wave::WaveEffect::preset(WaveShape::Triangle))
            .with("square_wave", wave::WaveEffect::preset(WaveShape::Square))
            .with("sawtooth_wave", wave::WaveEffect::preset(WaveShape::Sawtooth))
            .with("pulse_wave", wave::WaveEffect::preset(WaveShape::Pulse))
            .with("custom_wave", wave::WaveEffect::custom())
            .with("rainbow_wave", Composite::Rainbow)
            .with("dual_wave", Composite::Dual)
            .with("ocean_wave", Composite::Ocean)
            .with("fire_wave", Composite::Fire)
            .with("breathing_wave", Composite::Breathing)
            .with("lightning_wave", wave::Lightning)
            .with("clock", ClockEffect::local(ClockStyle::Dots))
            .with("clock_fill", ClockEffect::local(ClockStyle::Fill))
            .with("clock_markers", ClockEffect::local(ClockStyle::Markers))
            .with("clock_rollout", ClockEffect::local(ClockStyle::Rollout))
            .with("chase", spatial::Window::chase())
            .with("leapfrog", spatial::Window::leapfrog())
            .with("bounce", spatial::Window::bounce())
            .with("flash", spatial::Flash)
            .with("rollout", spatial::Rollout)
            .with("race", race::Race::default())
    }

    /// Add or replace an entry.
    pub fn with(mut self, name: &'static str, effect: impl Effect + 'static) -> Self {
        self.effects.insert(name, Arc::new(effect));
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Effect>> {
        self.effects.get(name).cloned()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.effects.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::device::{MemoryStrip, StripProbe};
    use crate::settings::SharedSettings;

    pub(crate) fn memory_controller(pixels: usize) -> (Controller, StripProbe) {
        let strip = MemoryStrip::new(pixels);
        let probe = strip.probe();
        (Controller::new(Box::new(strip), SharedSettings::default()), probe)
    }
}
