//! Light race: three racers crawl down the strip at random until one wins.

use super::{Args, Effect, EffectError, draw_frame};
use crate::cancel::CancelToken;
use crate::color::{BLUE, Color, GREEN, OFF, RED};
use crate::controller::Controller;
use rand::Rng;
use std::time::Duration;

const ADVANCE_CHANCE: f64 = 0.5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Racer {
    pub color: Color,
    pub position: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RaceState {
    pub racers: Vec<Racer>,
    finish: usize,
}

impl RaceState {
    /// Red, green and blue on the start line of an `n`-pixel track.
    pub fn new(n: usize) -> Self {
        let racers = [RED, GREEN, BLUE]
            .into_iter()
            .map(|color| Racer { color, position: 0 })
            .collect();
        Self {
            racers,
            finish: n.saturating_sub(1),
        }
    }

    /// Move every racer forward with probability one half.
    ///
    /// Returns the winner's color once someone reaches the last pixel; if
    /// several arrive together the earliest racer wins.
    pub fn step(&mut self, rng: &mut impl Rng) -> Option<Color> {
        for racer in &mut self.racers {
            if racer.position < self.finish && rng.gen_bool(ADVANCE_CHANCE) {
                racer.position += 1;
            }
        }
        self.racers
            .iter()
            .find(|r| r.position >= self.finish)
            .map(|r| r.color)
    }

    /// Later racers are drawn over earlier ones.
    pub fn pixel(&self, i: usize) -> Color {
        self.racers
            .iter()
            .rev()
            .find(|r| r.position == i)
            .map_or(OFF, |r| r.color)
    }
}

/// Redraws the track every `tick`; ends by filling the strip with the
/// winner's color.
pub struct Race {
    tick: Duration,
}

impl Default for Race {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(100),
        }
    }
}

impl Race {
    pub fn with_tick(tick: Duration) -> Self {
        Self { tick }
    }

    fn run_with(&self, ctrl: &mut Controller, cancel: &CancelToken, rng: &mut impl Rng) -> Result<(), EffectError> {
        let mut state = RaceState::new(ctrl.pixel_count());
        loop {
            if let Some(winner) = state.step(rng) {
                tracing::info!(?winner, "race finished");
                draw_frame(ctrl, cancel, |_, _| winner)?;
                return Ok(());
            }
            if !draw_frame(ctrl, cancel, |i, _| state.pixel(i))? || !cancel.sleep(self.tick) {
                return Ok(());
            }
        }
    }
}

impl Effect for Race {
    fn run(&self, ctrl: &mut Controller, _args: &Args, cancel: &CancelToken) -> Result<(), EffectError> {
        self.run_with(ctrl, cancel, &mut rand::thread_rng())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::testing::memory_controller;
    use pretty_assertions::assert_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn racers_only_move_forward_one_step() {
        let mut state = RaceState::new(50);
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..20 {
            let before = state.clone();
            state.step(&mut rng);
            for (old, new) in before.racers.iter().zip(&state.racers) {
                assert!(new.position == old.position || new.position == old.position + 1);
            }
        }
    }

    #[test]
    fn someone_always_wins() {
        let mut state = RaceState::new(10);
        let mut rng = StdRng::seed_from_u64(1);
        let winner = (0..10_000).find_map(|_| state.step(&mut rng));
        let winner = winner.unwrap();
        assert!([RED, GREEN, BLUE].contains(&winner));
        assert!(state.racers.iter().any(|r| r.position == 9 && r.color == winner));
    }

    #[test]
    fn single_pixel_track_finishes_immediately() {
        let mut state = RaceState::new(1);
        assert_eq!(state.step(&mut StdRng::seed_from_u64(0)), Some(RED));
    }

    #[test]
    fn last_racer_drawn_on_top() {
        let state = RaceState::new(10);
        assert_eq!(state.pixel(0), BLUE);
        assert_eq!(state.pixel(1), OFF);
    }

    #[test]
    fn race_ends_with_winner_color() {
        let (mut ctrl, probe) = memory_controller(6);
        let mut rng = StdRng::seed_from_u64(3);
        Race::with_tick(Duration::ZERO)
            .run_with(&mut ctrl, &CancelToken::never(), &mut rng)
            .unwrap();
        let frame = probe.last_frame();
        assert!(frame.iter().all(|&c| c == frame[0]));
        assert!([RED, GREEN, BLUE].contains(&frame[0]));
    }
}
