//! Runtime settings consulted by effects at every frame.
//!
//! The HTTP layer writes, the running effect reads. Changes are picked up on
//! the effect's next frame; nothing already drawn is touched.

use crate::color::{BLUE, Color, GREEN, RED};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    #[error("palette must contain at least one color")]
    EmptyPalette,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    /// Cycled through by palette-driven effects. Never empty.
    pub palette: Vec<Color>,
    pub frame_delay: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            palette: vec![RED, GREEN, BLUE],
            frame_delay: Duration::from_millis(50),
        }
    }
}

/// Cheaply cloneable handle to the one settings instance.
#[derive(Clone, Debug, Default)]
pub struct SharedSettings {
    inner: Arc<RwLock<Settings>>,
}

impl SharedSettings {
    pub fn new(settings: Settings) -> Self {
        Self {
            inner: Arc::new(RwLock::new(settings)),
        }
    }

    pub fn snapshot(&self) -> Settings {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn palette(&self) -> Vec<Color> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .palette
            .clone()
    }

    pub fn set_palette(&self, palette: Vec<Color>) -> Result<(), SettingsError> {
        if palette.is_empty() {
            return Err(SettingsError::EmptyPalette);
        }
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .palette = palette;
        Ok(())
    }

    pub fn frame_delay(&self) -> Duration {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .frame_delay
    }

    pub fn set_frame_delay(&self, delay: Duration) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .frame_delay = delay;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::LIME_GREEN;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_to_rgb_palette() {
        let settings = SharedSettings::default();
        assert_eq!(settings.palette(), vec![RED, GREEN, BLUE]);
        assert_eq!(settings.frame_delay(), Duration::from_millis(50));
    }

    #[test]
    fn empty_palette_is_rejected_and_leaves_old_one() {
        let settings = SharedSettings::default();
        assert_eq!(settings.set_palette(vec![]), Err(SettingsError::EmptyPalette));
        assert_eq!(settings.palette(), vec![RED, GREEN, BLUE]);
    }

    #[test]
    fn updates_are_visible_through_clones() {
        let settings = SharedSettings::default();
        let reader = settings.clone();
        settings.set_palette(vec![LIME_GREEN]).unwrap();
        settings.set_frame_delay(Duration::from_millis(5));
        assert_eq!(
            reader.snapshot(),
            Settings {
                palette: vec![LIME_GREEN],
                frame_delay: Duration::from_millis(5),
            }
        );
    }
}
