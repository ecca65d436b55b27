//! Wall clocks laid out along the strip.
//!
//! Minutes and seconds map onto the strip proportionally (`value * n / 60`),
//! hours onto twelve equal segments. AM hours draw red, PM hours (12 and
//! later) draw blue.

use super::{Args, Effect, EffectError, draw_frame};
use crate::cancel::CancelToken;
use crate::color::{BLUE, Color, GREEN, OFF, PURPLE, RED, YELLOW};
use crate::controller::Controller;
use chrono::Timelike;
use std::time::Duration;

const TICK: Duration = Duration::from_secs(1);

const MINUTE_COLOR: Color = GREEN;
const SECOND_COLOR: Color = PURPLE;
const MARKER_COLOR: Color = YELLOW;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeOfDay {
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
}

impl TimeOfDay {
    pub fn new(hour: u32, minute: u32, second: u32) -> Self {
        Self { hour, minute, second }
    }

    pub fn now_local() -> Self {
        let now = chrono::Local::now();
        Self::new(now.hour(), now.minute(), now.second())
    }

    pub fn is_pm(&self) -> bool {
        self.hour >= 12
    }

    fn hour_color(&self) -> Color {
        if self.is_pm() { BLUE } else { RED }
    }
}

/// Pixel positions of the three hands on an `n`-pixel strip.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Hands {
    /// Width of one hour segment.
    pub segment: usize,
    /// End (exclusive) of the hour span starting at 0.
    pub hour_end: usize,
    pub minute: usize,
    pub second: usize,
}

impl Hands {
    pub fn at(time: TimeOfDay, n: usize) -> Self {
        let segment = n / 12;
        Self {
            segment,
            hour_end: (time.hour % 12) as usize * segment,
            minute: time.minute as usize * n / 60,
            second: time.second as usize * n / 60,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClockStyle {
    /// Last hour segment lit, minute and second as two-pixel dots.
    Dots,
    /// Hour span from 0; minute and second each drawn as whichever is
    /// larger of a dot pair or a span continuing the previous hand.
    Fill,
    /// Yellow hour markers with single-pixel hour and minute hands.
    Markers,
    /// Markers face with the second hand rolling out over one second.
    Rollout,
}

fn paint(frame: &mut [Color], range: std::ops::Range<usize>, color: Color) {
    let end = range.end.min(frame.len());
    if range.start < end {
        frame[range.start..end].fill(color);
    }
}

fn dot(frame: &mut [Color], pos: usize, color: Color) {
    paint(frame, pos..pos + 2, color);
}

/// Markers, hour pixel and minute pixel; no second hand.
fn markers_face(time: TimeOfDay, n: usize) -> Vec<Color> {
    let hands = Hands::at(time, n);
    let mut frame = vec![OFF; n];
    if hands.segment > 0 {
        for i in (0..n).step_by(hands.segment) {
            frame[i] = MARKER_COLOR;
        }
    }
    paint(&mut frame, hands.hour_end..hands.hour_end + 1, time.hour_color());
    paint(&mut frame, hands.minute..hands.minute + 1, MINUTE_COLOR);
    frame
}

/// Static frame for `style` at `time`.
///
/// For [`ClockStyle::Rollout`] this is the face before any second pixels
/// roll out.
pub fn render(style: ClockStyle, time: TimeOfDay, n: usize) -> Vec<Color> {
    let hands = Hands::at(time, n);
    let hour_color = time.hour_color();

    match style {
        ClockStyle::Dots => {
            let mut frame = vec![OFF; n];
            paint(
                &mut frame,
                hands.hour_end.saturating_sub(hands.segment)..hands.hour_end,
                hour_color,
            );
            dot(&mut frame, hands.minute, MINUTE_COLOR);
            dot(&mut frame, hands.second, SECOND_COLOR);
            frame
        }
        ClockStyle::Fill => {
            let mut frame = vec![OFF; n];
            paint(&mut frame, 0..hands.hour_end, hour_color);

            let minute_reach = if hands.minute <= hands.hour_end {
                dot(&mut frame, hands.minute, MINUTE_COLOR);
                hands.hour_end.max(hands.minute + 2)
            } else {
                paint(&mut frame, hands.hour_end..hands.minute, MINUTE_COLOR);
                hands.minute
            };

            // A span ending at or before `minute_reach` would be empty
            if hands.second <= minute_reach {
                dot(&mut frame, hands.second, SECOND_COLOR);
            } else {
                paint(&mut frame, minute_reach..hands.second, SECOND_COLOR);
            }
            frame
        }
        ClockStyle::Markers => {
            let mut frame = markers_face(time, n);
            dot(&mut frame, hands.second, SECOND_COLOR);
            frame
        }
        ClockStyle::Rollout => markers_face(time, n),
    }
}

/// Per-pixel delay so a rollout of `steps` pixels takes one second.
///
/// `None` when there is nothing to roll out this tick.
pub fn rollout_delay(steps: usize) -> Option<Duration> {
    let steps = u32::try_from(steps).ok().filter(|&s| s > 0)?;
    Some(TICK / steps)
}

pub struct ClockEffect {
    style: ClockStyle,
    now: fn() -> TimeOfDay,
}

impl ClockEffect {
    pub fn new(style: ClockStyle, now: fn() -> TimeOfDay) -> Self {
        Self { style, now }
    }

    /// Clock driven by the local wall-clock time.
    pub fn local(style: ClockStyle) -> Self {
        Self::new(style, TimeOfDay::now_local)
    }

    /// One second of rollout. Returns `Ok(false)` if cancelled.
    fn roll_out(&self, ctrl: &mut Controller, cancel: &CancelToken, time: TimeOfDay) -> Result<bool, EffectError> {
        let n = ctrl.pixel_count();
        let mut frame = render(ClockStyle::Rollout, time, n);
        let steps = Hands::at(time, n).second;

        let Some(delay) = rollout_delay(steps) else {
            return Ok(draw_frame(ctrl, cancel, |i, _| frame[i])? && cancel.sleep(TICK));
        };
        for j in 0..steps {
            frame[j] = SECOND_COLOR;
            if !draw_frame(ctrl, cancel, |i, _| frame[i])? || !cancel.sleep(delay) {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

impl Effect for ClockEffect {
    fn run(&self, ctrl: &mut Controller, _args: &Args, cancel: &CancelToken) -> Result<(), EffectError> {
        loop {
            let time = (self.now)();
            let keep_going = if self.style == ClockStyle::Rollout {
                self.roll_out(ctrl, cancel, time)?
            } else {
                let frame = render(self.style, time, ctrl.pixel_count());
                draw_frame(ctrl, cancel, |i, _| frame[i])? && cancel.sleep(TICK)
            };
            if !keep_going {
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::CancelFlag;
    use crate::effects::testing::memory_controller;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use std::thread;

    fn midnight() -> TimeOfDay {
        TimeOfDay::new(0, 0, 0)
    }

    #[rstest]
    #[case(0, false)]
    #[case(11, false)]
    #[case(12, true)]
    #[case(23, true)]
    fn noon_counts_as_pm(#[case] hour: u32, #[case] pm: bool) {
        assert_eq!(TimeOfDay::new(hour, 0, 0).is_pm(), pm);
    }

    #[rstest]
    #[case(TimeOfDay::new(0, 0, 0), 120, Hands { segment: 10, hour_end: 0, minute: 0, second: 0 })]
    #[case(TimeOfDay::new(15, 30, 45), 120, Hands { segment: 10, hour_end: 30, minute: 60, second: 90 })]
    #[case(TimeOfDay::new(12, 59, 59), 60, Hands { segment: 5, hour_end: 0, minute: 59, second: 59 })]
    #[case(TimeOfDay::new(5, 1, 1), 10, Hands { segment: 0, hour_end: 0, minute: 0, second: 0 })]
    fn hands_scale_with_strip(#[case] time: TimeOfDay, #[case] n: usize, #[case] expected: Hands) {
        assert_eq!(Hands::at(time, n), expected);
    }

    #[rstest]
    #[case(ClockStyle::Dots)]
    #[case(ClockStyle::Fill)]
    fn midnight_lights_only_the_origin(#[case] style: ClockStyle) {
        let frame = render(style, midnight(), 60);
        assert_eq!(&frame[..2], &[SECOND_COLOR, SECOND_COLOR]);
        assert!(frame[2..].iter().all(|&c| c == OFF));
    }

    #[test]
    fn dots_light_last_hour_segment() {
        let frame = render(ClockStyle::Dots, TimeOfDay::new(14, 0, 30), 120);
        // hour 2 (PM) → 10..20, minute dot at 0, second dot at 60
        assert_eq!(frame[9], OFF);
        assert!(frame[10..20].iter().all(|&c| c == BLUE));
        assert_eq!(&frame[0..2], &[MINUTE_COLOR, MINUTE_COLOR]);
        assert_eq!(&frame[60..62], &[SECOND_COLOR, SECOND_COLOR]);
        assert_eq!(frame[20], OFF);
    }

    #[test]
    fn fill_chains_spans() {
        // hour 3 → 0..30, minute 20 → 40, second 30 → 60
        let frame = render(ClockStyle::Fill, TimeOfDay::new(3, 20, 30), 120);
        assert!(frame[0..30].iter().all(|&c| c == RED));
        assert!(frame[30..40].iter().all(|&c| c == MINUTE_COLOR));
        assert!(frame[40..60].iter().all(|&c| c == SECOND_COLOR));
        assert!(frame[60..].iter().all(|&c| c == OFF));
    }

    #[test]
    fn fill_uses_dots_inside_earlier_spans() {
        // hour 6 → 0..60, minute 10 → 20 (dot), second 5 → 10 (dot)
        let frame = render(ClockStyle::Fill, TimeOfDay::new(6, 10, 5), 120);
        assert_eq!(&frame[20..22], &[MINUTE_COLOR, MINUTE_COLOR]);
        assert_eq!(&frame[10..12], &[SECOND_COLOR, SECOND_COLOR]);
        assert_eq!(frame[22], RED);
        assert_eq!(frame[60], OFF);
    }

    #[test]
    fn fill_second_span_starts_after_minute_dot() {
        // hour 3 → 0..30, minute 15 → 30 (dot 30..32), second 30 → 60
        let frame = render(ClockStyle::Fill, TimeOfDay::new(3, 15, 30), 120);
        assert_eq!(&frame[30..32], &[MINUTE_COLOR, MINUTE_COLOR]);
        assert!(frame[32..60].iter().all(|&c| c == SECOND_COLOR));
        assert_eq!(frame[60], OFF);
    }

    #[rstest]
    #[case(TimeOfDay::new(0, 0, 1), 60, 1)]
    #[case(TimeOfDay::new(3, 15, 16), 120, 32)]
    fn fill_second_just_past_minute_dot_is_a_dot(
        #[case] time: TimeOfDay,
        #[case] n: usize,
        #[case] second: usize,
    ) {
        let frame = render(ClockStyle::Fill, time, n);
        assert_eq!(&frame[second..second + 2], &[SECOND_COLOR, SECOND_COLOR]);
        assert_eq!(frame.iter().filter(|&&c| c == SECOND_COLOR).count(), 2);
    }

    #[test]
    fn markers_every_segment() {
        let frame = render(ClockStyle::Markers, TimeOfDay::new(1, 30, 0), 60);
        let markers: Vec<usize> = (0..60).filter(|&i| frame[i] == MARKER_COLOR).collect();
        // 0/1 hold the second dot, 5 the hour hand, 30 the minute hand
        assert_eq!(markers, vec![10, 15, 20, 25, 35, 40, 45, 50, 55]);
        assert_eq!(frame[5], RED);
        assert_eq!(frame[30], MINUTE_COLOR);
    }

    #[test]
    fn tiny_strip_has_no_markers() {
        let frame = render(ClockStyle::Markers, TimeOfDay::new(3, 0, 0), 6);
        assert!(!frame.contains(&MARKER_COLOR));
    }

    #[test]
    fn rollout_face_has_no_second_hand() {
        let frame = render(ClockStyle::Rollout, TimeOfDay::new(0, 0, 30), 60);
        assert!(!frame.contains(&SECOND_COLOR));
    }

    #[rstest]
    #[case(0, None)]
    #[case(1, Some(Duration::from_secs(1)))]
    #[case(4, Some(Duration::from_millis(250)))]
    fn rollout_takes_one_second(#[case] steps: usize, #[case] expected: Option<Duration>) {
        assert_eq!(rollout_delay(steps), expected);
    }

    #[rstest]
    #[case(ClockStyle::Dots)]
    #[case(ClockStyle::Rollout)]
    fn clock_stops_mid_tick(#[case] style: ClockStyle) {
        let (mut ctrl, probe) = memory_controller(60);
        let flag = CancelFlag::new();
        let token = flag.token();
        let worker = thread::spawn(move || {
            ClockEffect::new(style, midnight).run(&mut ctrl, &Args::default(), &token)
        });
        while probe.frames_shown() == 0 {
            thread::sleep(Duration::from_millis(1));
        }
        flag.raise();
        worker.join().unwrap().unwrap();
        assert_eq!(probe.frames_shown(), 1);
    }
}
