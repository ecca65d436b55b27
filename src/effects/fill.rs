//! Single-frame effects: paint once, flush, done.

use super::{Args, Effect, EffectError, draw_frame};
use crate::cancel::CancelToken;
use crate::color::{Color, GREEN, OFF, RED, palette_cyclic};
use crate::controller::Controller;

/// Fill with the `#rrggbb` color given as the first argument.
pub struct Fill;

/// Fill with a fixed color.
pub struct Solid(pub Color);

/// Paint the settings palette cyclically along the strip.
pub struct PaletteFill;

/// Show a bit string from the first argument: `1` green, `0` red.
/// Pixels past the end of the string are turned off.
pub struct Bits;

impl Effect for Fill {
    fn run(&self, ctrl: &mut Controller, args: &Args, cancel: &CancelToken) -> Result<(), EffectError> {
        let color: Color = args.get(0)?.ok_or_else(|| EffectError::InvalidArgument {
            index: 0,
            reason: "a fill color is required".to_string(),
        })?;
        draw_frame(ctrl, cancel, |_, _| color)?;
        Ok(())
    }
}

impl Effect for Solid {
    fn run(&self, ctrl: &mut Controller, _args: &Args, cancel: &CancelToken) -> Result<(), EffectError> {
        draw_frame(ctrl, cancel, |_, _| self.0)?;
        Ok(())
    }
}

impl Effect for PaletteFill {
    fn run(&self, ctrl: &mut Controller, _args: &Args, cancel: &CancelToken) -> Result<(), EffectError> {
        let palette = ctrl.palette();
        draw_frame(ctrl, cancel, |i, _| palette_cyclic(&palette, i))?;
        Ok(())
    }
}

/// Parse a string of `0`/`1` characters.
pub fn parse_bits(text: &str) -> Option<Vec<bool>> {
    text.chars()
        .map(|c| match c {
            '0' => Some(false),
            '1' => Some(true),
            _ => None,
        })
        .collect()
}

impl Effect for Bits {
    fn run(&self, ctrl: &mut Controller, args: &Args, cancel: &CancelToken) -> Result<(), EffectError> {
        let text: String = args.get_or(0, String::new())?;
        let bits = parse_bits(&text).ok_or_else(|| EffectError::InvalidArgument {
            index: 0,
            reason: format!("expected only 0 and 1, got {text:?}"),
        })?;
        draw_frame(ctrl, cancel, |i, _| match bits.get(i) {
            Some(true) => GREEN,
            Some(false) => RED,
            None => OFF,
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{BLUE, LIME_GREEN};
    use crate::effects::testing::memory_controller;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn solid_shows_exactly_one_frame() {
        let (mut ctrl, probe) = memory_controller(3);
        Solid(LIME_GREEN)
            .run(&mut ctrl, &Args::default(), &CancelToken::never())
            .unwrap();
        assert_eq!(probe.frames_shown(), 1);
        assert_eq!(probe.last_frame(), vec![LIME_GREEN; 3]);
    }

    #[test]
    fn fill_uses_argument() {
        let (mut ctrl, probe) = memory_controller(2);
        Fill.run(&mut ctrl, &Args::new(vec![json!("#0000ff")]), &CancelToken::never())
            .unwrap();
        assert_eq!(probe.last_frame(), vec![BLUE, BLUE]);
    }

    #[test]
    fn fill_without_color_is_an_argument_error() {
        let (mut ctrl, probe) = memory_controller(2);
        let result = Fill.run(&mut ctrl, &Args::default(), &CancelToken::never());
        assert!(matches!(result, Err(EffectError::InvalidArgument { index: 0, .. })));
        assert_eq!(probe.frames_shown(), 0);
    }

    #[test]
    fn palette_fill_cycles_settings_palette() {
        let (mut ctrl, probe) = memory_controller(4);
        PaletteFill
            .run(&mut ctrl, &Args::default(), &CancelToken::never())
            .unwrap();
        assert_eq!(probe.last_frame(), vec![RED, GREEN, BLUE, RED]);
    }

    #[test]
    fn bits_map_to_green_and_red() {
        let (mut ctrl, probe) = memory_controller(4);
        Bits.run(&mut ctrl, &Args::new(vec![json!("101")]), &CancelToken::never())
            .unwrap();
        assert_eq!(probe.last_frame(), vec![GREEN, RED, GREEN, OFF]);
    }

    #[test]
    fn bits_reject_other_characters() {
        assert_eq!(parse_bits("10x"), None);
        assert_eq!(parse_bits(""), Some(vec![]));
    }
}
