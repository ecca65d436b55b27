//! Waveform effects.
//!
//! Every pixel is a pure function of its index, the frame counter `t` and a
//! [`WaveConfig`]; the only randomness (fire flicker, lightning strikes) is
//! drawn from an injected RNG.

use super::{Args, Effect, EffectError, draw_frame};
use crate::cancel::CancelToken;
use crate::color::{
    BLUE, Color, GREEN, ORANGE, PURPLE, RED, WHITE, YELLOW, palette_clamped, palette_cyclic, wheel,
};
use crate::controller::Controller;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, TAU};
use std::time::Duration;

/// Width of the linear fade at each end of the strip, in pixels.
const EDGE_FADE_PIXELS: f64 = 10.0;

/// On-time fraction of the pulse wave.
const PULSE_DUTY: f64 = 0.3;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaveShape {
    #[default]
    Sine,
    Triangle,
    Square,
    Sawtooth,
    Pulse,
}

/// Parameters of the configurable wave.
///
/// Deserialized from the first argument of `custom_wave`; unspecified fields
/// take their defaults. An empty palette means "use the settings palette".
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveConfig {
    pub speed: f64,
    pub amplitude: f64,
    pub frequency: f64,
    /// Radians.
    pub phase_shift: f64,
    /// Pixels per cycle.
    pub wave_length: f64,
    /// Cycle palette colors along the strip instead of picking by wave height.
    pub color_shift: bool,
    pub brightness_modulation: bool,
    pub palette: Vec<Color>,
    pub shape: WaveShape,
    /// Negative runs the wave backwards.
    pub direction: i8,
    pub fade_edges: bool,
}

impl Default for WaveConfig {
    fn default() -> Self {
        Self {
            speed: 0.1,
            amplitude: 1.0,
            frequency: 1.0,
            phase_shift: 0.0,
            wave_length: 20.0,
            color_shift: false,
            brightness_modulation: true,
            palette: Vec::new(),
            shape: WaveShape::Sine,
            direction: 1,
            fade_edges: true,
        }
    }
}

impl WaveConfig {
    /// Tuned defaults for each shape's named effect.
    pub fn preset(shape: WaveShape) -> Self {
        let base = Self {
            shape,
            ..Self::default()
        };
        match shape {
            WaveShape::Sine => Self {
                palette: vec![BLUE, PURPLE, RED],
                ..base
            },
            WaveShape::Triangle => Self {
                palette: vec![GREEN, YELLOW, ORANGE],
                wave_length: 15.0,
                ..base
            },
            WaveShape::Pulse => Self {
                palette: vec![RED, WHITE],
                wave_length: 10.0,
                speed: 0.2,
                ..base
            },
            WaveShape::Square | WaveShape::Sawtooth => base,
        }
    }

    fn direction_sign(&self) -> f64 {
        if self.direction < 0 { -1.0 } else { 1.0 }
    }
}

/// Wave height in `[-amplitude, amplitude]` at `position` and frame `t`.
pub fn wave_value(position: f64, t: f64, config: &WaveConfig) -> f64 {
    let x = position / config.wave_length * TAU * config.frequency
        + t * config.speed * config.direction_sign()
        + config.phase_shift;
    let a = config.amplitude;

    match config.shape {
        WaveShape::Sine => x.sin() * a,
        // arcsin(sin x) is a linear ramp between ±π/2
        WaveShape::Triangle => (2.0 / PI) * x.sin().asin() * a,
        WaveShape::Square => {
            if x.sin() >= 0.0 {
                a
            } else {
                -a
            }
        }
        WaveShape::Sawtooth => 2.0 * (x / TAU - (x / TAU + 0.5).floor()) * a,
        WaveShape::Pulse => {
            if x.rem_euclid(TAU) < TAU * PULSE_DUTY {
                a
            } else {
                -a
            }
        }
    }
}

/// Linear attenuation within [`EDGE_FADE_PIXELS`] of either end.
pub fn edge_fade(i: usize, n: usize) -> f64 {
    let from_start = i as f64 / EDGE_FADE_PIXELS;
    let from_end = n.saturating_sub(i) as f64 / EDGE_FADE_PIXELS;
    from_start.min(from_end).min(1.0)
}

/// Color of pixel `i` of `n` at frame `t`.
pub fn wave_pixel(i: usize, n: usize, t: u64, config: &WaveConfig, palette: &[Color]) -> Color {
    let value = wave_value(i as f64, t as f64, config);
    let level = (value + 1.0) / 2.0;

    let base = if config.color_shift {
        palette_cyclic(palette, i + (t as f64 * 10.0) as usize)
    } else {
        palette_clamped(palette, (level * palette.len() as f64).floor() as i64)
    };

    let mut color = if config.brightness_modulation {
        base.scale(level)
    } else {
        base
    };
    if config.fade_edges {
        color = color.scale(edge_fade(i, n));
    }
    color
}

/// Runs a [`WaveConfig`], one frame per settings frame delay, until stopped.
pub struct WaveEffect {
    preset: Option<WaveConfig>,
}

impl WaveEffect {
    pub fn preset(shape: WaveShape) -> Self {
        Self {
            preset: Some(WaveConfig::preset(shape)),
        }
    }

    /// Takes its [`WaveConfig`] from the first argument.
    pub fn custom() -> Self {
        Self { preset: None }
    }
}

impl Effect for WaveEffect {
    fn run(&self, ctrl: &mut Controller, args: &Args, cancel: &CancelToken) -> Result<(), EffectError> {
        let config = match &self.preset {
            Some(preset) => preset.clone(),
            None => args.get::<WaveConfig>(0)?.unwrap_or_default(),
        };
        if !(config.wave_length.is_finite() && config.wave_length > 0.0) {
            return Err(EffectError::InvalidArgument {
                index: 0,
                reason: format!("wave_length must be positive, got {}", config.wave_length),
            });
        }

        let mut t: u64 = 0;
        loop {
            let palette = if config.palette.is_empty() {
                ctrl.palette()
            } else {
                config.palette.clone()
            };
            if !draw_frame(ctrl, cancel, |i, n| wave_pixel(i, n, t, &config, &palette))? {
                return Ok(());
            }
            if !cancel.sleep(ctrl.frame_delay()) {
                return Ok(());
            }
            t += 1;
        }
    }
}

// ── Fixed-recipe waves ───────────────────────────────────────────────

const OCEAN: [Color; 6] = [
    Color::new(0, 50, 100),
    Color::new(0, 100, 150),
    Color::new(0, 150, 200),
    Color::new(50, 200, 255),
    Color::new(100, 255, 255),
    Color::new(200, 255, 255),
];

/// Waves built from several sine components with their own coloring.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Composite {
    /// Hue wheel under a moving sine brightness.
    Rainbow,
    /// Two interfering waves, colored by their sum.
    Dual,
    /// Three slow components mapped onto blues.
    Ocean,
    /// Flickering reds and yellows.
    Fire,
    /// Whole-strip breathing over a local ripple.
    Breathing,
}

impl Composite {
    /// `flicker` in `[0.7, 1.0]` is only used by [`Composite::Fire`].
    pub fn pixel(self, i: usize, n: usize, t: u64, flicker: f64) -> Color {
        let x = i as f64;
        let t = t as f64;
        match self {
            Self::Rainbow => {
                let level = (x / 10.0 + t * 0.1).sin() * 0.5 + 0.5;
                let hue = (i * 256 / n.max(1) + t as usize * 2) % 256;
                wheel(hue as u8).scale(level)
            }
            Self::Dual => {
                let combined = (x / 8.0 + t * 0.1).sin() * 0.5 + (x / 12.0 + t * 0.15).sin() * 0.5;
                let base = if combined > 0.5 {
                    BLUE
                } else if combined > 0.0 {
                    PURPLE
                } else if combined > -0.5 {
                    RED
                } else {
                    ORANGE
                };
                base.scale((combined + 1.0) / 2.0)
            }
            Self::Ocean => {
                let combined = (x / 15.0 + t * 0.08).sin() * 0.3
                    + (x / 8.0 + t * 0.12).sin() * 0.2
                    + (x / 25.0 + t * 0.05).sin() * 0.1;
                let index = ((combined + 0.6) / 1.2 * OCEAN.len() as f64).floor() as i64;
                palette_clamped(&OCEAN, index)
            }
            Self::Fire => {
                let intensity = ((x / 6.0 + t * 0.2).sin() * 0.5 + 0.5) * flicker;
                let base = if intensity > 0.8 {
                    Color::new(255, 255, 100)
                } else if intensity > 0.6 {
                    Color::new(255, 200, 0)
                } else if intensity > 0.4 {
                    Color::new(255, 100, 0)
                } else if intensity > 0.2 {
                    Color::new(200, 0, 0)
                } else {
                    Color::new(50, 0, 0)
                };
                base.scale(intensity)
            }
            Self::Breathing => {
                let global = (t * 0.05).sin() * 0.5 + 0.5;
                let local = (x / 20.0 + t * 0.1).sin() * 0.3 + 0.7;
                let hue = (i * 2 + t as usize) % 256;
                wheel(hue as u8).scale(global * local)
            }
        }
    }
}

impl Effect for Composite {
    fn run(&self, ctrl: &mut Controller, _args: &Args, cancel: &CancelToken) -> Result<(), EffectError> {
        let mut rng = rand::thread_rng();
        let mut t: u64 = 0;
        loop {
            let drawn = draw_frame(ctrl, cancel, |i, n| {
                let flicker = rng.gen_range(0.7..1.0);
                self.pixel(i, n, t, flicker)
            })?;
            if !drawn || !cancel.sleep(ctrl.frame_delay()) {
                return Ok(());
            }
            t += 1;
        }
    }
}

// ── Lightning ────────────────────────────────────────────────────────

const STRIKE_CHANCE: f64 = 0.1;
const FLASH_HOLD: Duration = Duration::from_millis(50);
const FADE_STEP: Duration = Duration::from_millis(20);
const FADE_STEPS: u32 = 5;

/// Dark storm background with random full-strip flashes.
pub struct Lightning;

/// Background color between strikes.
pub fn storm_pixel(i: usize, t: u64) -> Color {
    let level = (i as f64 / 30.0 + t as f64 * 0.03).sin() * 0.3 + 0.3;
    Color::new((20.0 * level) as u8, (20.0 * level) as u8, (60.0 * level) as u8)
}

impl Lightning {
    /// Flash white, then fade out over [`FADE_STEPS`] frames.
    /// Returns `Ok(false)` if cancelled part-way.
    fn strike(ctrl: &mut Controller, cancel: &CancelToken) -> Result<bool, EffectError> {
        if !draw_frame(ctrl, cancel, |_, _| WHITE)? || !cancel.sleep(FLASH_HOLD) {
            return Ok(false);
        }
        for step in 0..FADE_STEPS {
            let gray = WHITE.scale(f64::from(FADE_STEPS - step) / f64::from(FADE_STEPS));
            if !draw_frame(ctrl, cancel, |_, _| gray)? || !cancel.sleep(FADE_STEP) {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn run_with(ctrl: &mut Controller, cancel: &CancelToken, rng: &mut impl Rng) -> Result<(), EffectError> {
        let mut t: u64 = 0;
        loop {
            let drawn = if rng.gen_bool(STRIKE_CHANCE) {
                Self::strike(ctrl, cancel)?
            } else {
                draw_frame(ctrl, cancel, |i, _| storm_pixel(i, t))?
            };
            if !drawn || !cancel.sleep(ctrl.frame_delay()) {
                return Ok(());
            }
            t += 1;
        }
    }
}

impl Effect for Lightning {
    fn run(&self, ctrl: &mut Controller, _args: &Args, cancel: &CancelToken) -> Result<(), EffectError> {
        Self::run_with(ctrl, cancel, &mut rand::thread_rng())
    }
}
