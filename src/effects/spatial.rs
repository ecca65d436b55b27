//! Moving windows and sweeps, colored from the settings palette.
//!
//! Lit pixels take `palette[i % len]`, so a palette change shows up on the
//! next frame.

use super::{Args, Effect, EffectError, draw_frame};
use crate::cancel::CancelToken;
use crate::color::{Color, OFF, palette_cyclic};
use crate::controller::Controller;

const DEFAULT_WINDOW: usize = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Motion {
    /// Wraps around the strip, advancing one pixel per frame.
    Chase,
    /// Wraps around the strip, jumping a full window per frame.
    Leapfrog,
    /// Runs between `0` and `n - k`, reversing at both ends.
    Bounce,
}

impl Motion {
    /// First pixel of the window at frame `t`.
    pub fn start(self, t: usize, n: usize, k: usize) -> usize {
        if n == 0 {
            return 0;
        }
        match self {
            Self::Chase => t % n,
            Self::Leapfrog => (t % n) * k % n,
            Self::Bounce => {
                let span = n.saturating_sub(k);
                if span == 0 {
                    return 0;
                }
                let phase = t % (2 * span);
                if phase <= span { phase } else { 2 * span - phase }
            }
        }
    }

    /// Whether pixel `i` falls inside a `k`-wide window starting at `start`.
    pub fn covers(self, i: usize, start: usize, k: usize, n: usize) -> bool {
        match self {
            Self::Chase | Self::Leapfrog => (i + n - start) % n < k,
            Self::Bounce => i >= start && i < start + k,
        }
    }
}

/// A window of `k` lit pixels (first argument, default 5) moving per [`Motion`].
pub struct Window {
    motion: Motion,
}

impl Window {
    pub fn chase() -> Self {
        Self { motion: Motion::Chase }
    }

    pub fn leapfrog() -> Self {
        Self {
            motion: Motion::Leapfrog,
        }
    }

    pub fn bounce() -> Self {
        Self { motion: Motion::Bounce }
    }
}

impl Effect for Window {
    fn run(&self, ctrl: &mut Controller, args: &Args, cancel: &CancelToken) -> Result<(), EffectError> {
        let requested: usize = args.get_or(0, DEFAULT_WINDOW)?;
        if requested == 0 {
            return Err(EffectError::InvalidArgument {
                index: 0,
                reason: "window must be at least one pixel".to_string(),
            });
        }

        let mut t = 0usize;
        loop {
            let n = ctrl.pixel_count();
            let k = requested.min(n);
            let start = self.motion.start(t, n, k);
            let palette = ctrl.palette();
            let drawn = draw_frame(ctrl, cancel, |i, n| {
                if self.motion.covers(i, start, k, n) {
                    palette_cyclic(&palette, i)
                } else {
                    OFF
                }
            })?;
            if !drawn || !cancel.sleep(ctrl.frame_delay()) {
                return Ok(());
            }
            t = t.wrapping_add(1);
        }
    }
}

// ── Flash ────────────────────────────────────────────────────────────

/// Whole strip alternating between the next palette color and off.
pub struct Flash;

/// Color of flash frame `f`: even frames step through the palette.
pub fn flash_color(palette: &[Color], f: usize) -> Color {
    if f % 2 == 0 {
        palette_cyclic(palette, f / 2)
    } else {
        OFF
    }
}

impl Effect for Flash {
    fn run(&self, ctrl: &mut Controller, _args: &Args, cancel: &CancelToken) -> Result<(), EffectError> {
        let mut f = 0usize;
        loop {
            let color = flash_color(&ctrl.palette(), f);
            if !draw_frame(ctrl, cancel, |_, _| color)? || !cancel.sleep(ctrl.frame_delay()) {
                return Ok(());
            }
            f = f.wrapping_add(1);
        }
    }
}

// ── Rollout ──────────────────────────────────────────────────────────

/// A boundary sweeps the strip one pixel per frame, painting the next
/// palette color over the previous sweep's color.
pub struct Rollout;

/// `(new, old)` colors of sweep `s`. The first sweep rolls over black.
pub fn sweep_colors(palette: &[Color], s: usize) -> (Color, Color) {
    let old = match s.checked_sub(1) {
        Some(prev) => palette_cyclic(palette, prev),
        None => OFF,
    };
    (palette_cyclic(palette, s), old)
}

impl Effect for Rollout {
    fn run(&self, ctrl: &mut Controller, _args: &Args, cancel: &CancelToken) -> Result<(), EffectError> {
        let mut sweep = 0usize;
        loop {
            let n = ctrl.pixel_count();
            for boundary in 1..=n {
                let (new, old) = sweep_colors(&ctrl.palette(), sweep);
                let drawn = draw_frame(ctrl, cancel, |i, _| if i < boundary { new } else { old })?;
                if !drawn || !cancel.sleep(ctrl.frame_delay()) {
                    return Ok(());
                }
            }
            if n == 0 && !cancel.sleep(ctrl.frame_delay()) {
                return Ok(());
            }
            sweep = sweep.wrapping_add(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::CancelFlag;
    use crate::color::{BLUE, GREEN, RED};
    use crate::effects::testing::memory_controller;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;
    use std::thread;
    use std::time::Duration;

    fn lit(motion: Motion, t: usize, n: usize, k: usize) -> Vec<usize> {
        let start = motion.start(t, n, k);
        (0..n).filter(|&i| motion.covers(i, start, k, n)).collect()
    }

    #[test]
    fn chase_wraps_around_the_ring() {
        assert_eq!(lit(Motion::Chase, 7, 10, 5), vec![0, 1, 7, 8, 9]);
    }

    #[rstest]
    #[case(0, vec![0, 1, 2, 3, 4])]
    #[case(1, vec![5, 6, 7, 8, 9])]
    #[case(2, vec![0, 1, 2, 3, 4])]
    fn leapfrog_jumps_whole_windows(#[case] t: usize, #[case] expected: Vec<usize>) {
        assert_eq!(lit(Motion::Leapfrog, t, 10, 5), expected);
    }

    #[test]
    fn bounce_reverses_at_both_ends() {
        let starts: Vec<usize> = (0..12).map(|t| Motion::Bounce.start(t, 10, 5)).collect();
        assert_eq!(starts, vec![0, 1, 2, 3, 4, 5, 4, 3, 2, 1, 0, 1]);
    }

    #[test]
    fn bounce_never_leaves_the_line() {
        for t in 0..50 {
            let pixels = lit(Motion::Bounce, t, 10, 5);
            assert_eq!(pixels.len(), 5, "t={t}");
            assert!(pixels.iter().all(|&i| i < 10));
        }
    }

    #[test]
    fn bounce_with_full_width_window_stays_put() {
        assert_eq!(Motion::Bounce.start(3, 5, 5), 0);
        assert_eq!(Motion::Bounce.start(3, 0, 5), 0);
    }

    #[test]
    fn flash_alternates_with_off() {
        let palette = [RED, GREEN];
        let colors: Vec<Color> = (0..6).map(|f| flash_color(&palette, f)).collect();
        assert_eq!(colors, vec![RED, OFF, GREEN, OFF, RED, OFF]);
    }

    #[test]
    fn sweeps_roll_over_previous_color() {
        let palette = [RED, GREEN, BLUE];
        assert_eq!(sweep_colors(&palette, 0), (RED, OFF));
        assert_eq!(sweep_colors(&palette, 1), (GREEN, RED));
        assert_eq!(sweep_colors(&palette, 3), (RED, BLUE));
    }

    #[test]
    fn window_uses_palette_by_pixel_index() {
        let (mut ctrl, probe) = memory_controller(6);
        ctrl.settings().set_frame_delay(Duration::from_millis(1));
        let flag = CancelFlag::new();
        let token = flag.token();
        let worker = thread::spawn(move || {
            Window::bounce().run(&mut ctrl, &Args::new(vec![json!(2)]), &token)
        });
        while probe.frames_shown() == 0 {
            thread::sleep(Duration::from_millis(1));
        }
        flag.raise();
        worker.join().unwrap().unwrap();
        let first_lit = probe.last_frame().iter().filter(|&&c| c != OFF).count();
        assert_eq!(first_lit, 2);
    }

    #[test]
    fn empty_window_is_rejected() {
        let (mut ctrl, _) = memory_controller(6);
        let result = Window::chase().run(&mut ctrl, &Args::new(vec![json!(0)]), &CancelToken::never());
        assert!(matches!(result, Err(EffectError::InvalidArgument { index: 0, .. })));
    }
}
