//! Color model: pure functions mapping scalar or positional input to RGB.
//!
//! Nothing in here holds state. Every function that scales a channel by a
//! fraction truncates toward zero so rendered frames are reproducible.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// An RGB color with 8 bits per channel.
///
/// Serialized as a `#rrggbb` hex string, which is what the settings API
/// sends and receives.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

pub const OFF: Color = Color::new(0, 0, 0);
pub const RED: Color = Color::new(255, 0, 0);
pub const GREEN: Color = Color::new(0, 255, 0);
pub const BLUE: Color = Color::new(0, 0, 255);
pub const LIME_GREEN: Color = Color::new(50, 205, 50);
pub const PURPLE: Color = Color::new(128, 0, 128);
pub const YELLOW: Color = Color::new(255, 255, 0);
pub const ORANGE: Color = Color::new(255, 165, 0);
pub const CYAN: Color = Color::new(0, 255, 255);
pub const WHITE: Color = Color::new(255, 255, 255);

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Unpack a `0x00RRGGBB` value.
    pub const fn from_u32(packed: u32) -> Self {
        Self {
            r: (packed >> 16) as u8,
            g: (packed >> 8) as u8,
            b: packed as u8,
        }
    }

    /// Scale every channel by `fraction`, clamped to `[0, 1]`, truncating.
    pub fn scale(self, fraction: f64) -> Self {
        let fraction = if fraction.is_nan() {
            0.0
        } else {
            fraction.clamp(0.0, 1.0)
        };
        Self {
            r: (f64::from(self.r) * fraction) as u8,
            g: (f64::from(self.g) * fraction) as u8,
            b: (f64::from(self.b) * fraction) as u8,
        }
    }
}

/// Linear interpolation from `from` (ratio 0) to `to` (ratio 1).
pub fn blend(from: Color, to: Color, ratio: f64) -> Color {
    let ratio = ratio.clamp(0.0, 1.0);
    let channel = |a: u8, b: u8| -> u8 {
        let a = f64::from(a);
        let b = f64::from(b);
        // `as u8` truncates toward zero and saturates
        (a + (b - a) * ratio) as u8
    };
    Color {
        r: channel(from.r, to.r),
        g: channel(from.g, to.g),
        b: channel(from.b, to.b),
    }
}

/// Classic 256-step hue ramp.
///
/// Three linear segments with breakpoints at 85 and 170; in each segment two
/// channels move in steps of 3 and the third is zero.
pub fn wheel(pos: u8) -> Color {
    match pos {
        0..85 => Color::new(pos * 3, 255 - pos * 3, 0),
        85..170 => {
            let p = pos - 85;
            Color::new(255 - p * 3, 0, p * 3)
        }
        _ => {
            let p = pos - 170;
            Color::new(0, p * 3, 255 - p * 3)
        }
    }
}

/// A wheel through three anchor colors, sharing the breakpoints of [`wheel`].
pub fn tinted_wheel(pos: u8, anchors: [Color; 3]) -> Color {
    let [a, b, c] = anchors;
    match pos {
        0..85 => blend(a, b, f64::from(pos) / 85.0),
        85..170 => blend(b, c, f64::from(pos - 85) / 85.0),
        _ => blend(c, a, f64::from(pos - 170) / 86.0),
    }
}

/// Red → orange → yellow and back.
pub fn warm_wheel(pos: u8) -> Color {
    tinted_wheel(pos, [RED, ORANGE, YELLOW])
}

/// Blue → cyan → purple and back.
pub fn cool_wheel(pos: u8) -> Color {
    tinted_wheel(pos, [BLUE, CYAN, PURPLE])
}

/// Pick `palette[index]` with the index clamped into range.
///
/// Returns [`OFF`] for an empty palette.
pub fn palette_clamped(palette: &[Color], index: i64) -> Color {
    let Some(last) = palette.len().checked_sub(1) else {
        return OFF;
    };
    let index = usize::try_from(index.max(0)).unwrap_or(0).min(last);
    palette[index]
}

/// Pick `palette[index % len]`, cycling through the palette.
pub fn palette_cyclic(palette: &[Color], index: usize) -> Color {
    if palette.is_empty() {
        return OFF;
    }
    palette[index % palette.len()]
}

// ── Hex conversion ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid color {0:?}, expected #rrggbb")]
pub struct ParseColorError(pub String);

impl FromStr for Color {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ParseColorError(s.to_string()));
        }
        let packed = u32::from_str_radix(hex, 16).map_err(|_| ParseColorError(s.to_string()))?;
        Ok(Self::from_u32(packed))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl TryFrom<String> for Color {
    type Error = ParseColorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(c: Color) -> Self {
        c.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    // ── Wheel ──────────────────────────────────────────────────────

    #[rstest]
    #[case(0, Color::new(0, 255, 0))]
    #[case(1, Color::new(3, 252, 0))]
    #[case(84, Color::new(252, 3, 0))]
    #[case(85, Color::new(255, 0, 0))]
    #[case(169, Color::new(3, 0, 252))]
    #[case(170, Color::new(0, 0, 255))]
    #[case(255, Color::new(0, 255, 0))]
    fn wheel_breakpoints(#[case] pos: u8, #[case] expected: Color) {
        assert_eq!(wheel(pos), expected);
    }

    #[test]
    fn wheel_segments_have_a_zero_channel() {
        for pos in 0..=255u8 {
            let c = wheel(pos);
            assert!(c.r == 0 || c.g == 0 || c.b == 0, "pos {pos}: {c:?}");
        }
    }

    #[rstest]
    #[case(0, RED)]
    #[case(85, ORANGE)]
    #[case(170, YELLOW)]
    fn warm_wheel_hits_anchors(#[case] pos: u8, #[case] expected: Color) {
        assert_eq!(warm_wheel(pos), expected);
    }

    #[test]
    fn cool_wheel_starts_blue() {
        assert_eq!(cool_wheel(0), BLUE);
        assert_eq!(cool_wheel(85), CYAN);
    }

    // ── Blending and scaling ───────────────────────────────────────

    #[test]
    fn blend_truncates() {
        assert_eq!(blend(RED, BLUE, 0.5), Color::new(127, 0, 127));
    }

    #[rstest]
    #[case(0.0, RED)]
    #[case(1.0, BLUE)]
    #[case(-3.0, RED)]
    #[case(7.0, BLUE)]
    fn blend_endpoints_are_clamped(#[case] ratio: f64, #[case] expected: Color) {
        assert_eq!(blend(RED, BLUE, ratio), expected);
    }

    #[test]
    fn scale_truncates_not_rounds() {
        assert_eq!(Color::new(200, 101, 51).scale(0.5), Color::new(100, 50, 25));
    }

    #[rstest]
    #[case(1.5, Color::new(10, 20, 30))]
    #[case(-0.5, OFF)]
    #[case(f64::NAN, OFF)]
    fn scale_clamps_fraction(#[case] fraction: f64, #[case] expected: Color) {
        assert_eq!(Color::new(10, 20, 30).scale(fraction), expected);
    }

    // ── Palette indexing ───────────────────────────────────────────

    #[rstest]
    #[case(-4, RED)]
    #[case(0, RED)]
    #[case(2, BLUE)]
    #[case(9, BLUE)]
    fn palette_index_is_clamped(#[case] index: i64, #[case] expected: Color) {
        assert_eq!(palette_clamped(&[RED, GREEN, BLUE], index), expected);
    }

    #[test]
    fn palette_cycles() {
        assert_eq!(palette_cyclic(&[RED, GREEN], 3), GREEN);
        assert_eq!(palette_cyclic(&[], 3), OFF);
    }

    // ── Hex ────────────────────────────────────────────────────────

    #[test]
    fn packed_value_unpacks_to_channels() {
        assert_eq!(Color::from_u32(0x32cd32), LIME_GREEN);
    }

    #[rstest]
    #[case("#32cd32", LIME_GREEN)]
    #[case("ff0000", RED)]
    #[case(" #0000FF ", BLUE)]
    fn parse_hex(#[case] input: &str, #[case] expected: Color) {
        assert_eq!(input.parse::<Color>().unwrap(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("#12345")]
    #[case("#gg0000")]
    #[case("#ff00001")]
    fn parse_hex_rejects(#[case] input: &str) {
        assert!(input.parse::<Color>().is_err());
    }

    #[test]
    fn serializes_as_hex_string() {
        let json = serde_json::to_string(&vec![RED, LIME_GREEN]).unwrap();
        assert_eq!(json, r##"["#ff0000","#32cd32"]"##);
        let back: Vec<Color> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, vec![RED, LIME_GREEN]);
    }
}
