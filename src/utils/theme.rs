use plotters::style::RGBColor;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::utils::errors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    pub fn from_flag(dark: bool) -> Self {
        if dark {
            Theme::Dark
        } else {
            Theme::Light
        }
    }

    pub fn is_dark(self) -> bool {
        self == Theme::Dark
    }

    pub fn toggled(self) -> Self {
        Theme::from_flag(!self.is_dark())
    }

    pub fn palette(self) -> ChartPalette {
        match self {
            Theme::Light => ChartPalette {
                background: RGBColor(255, 255, 255),
                grid: RGBColor(229, 231, 235),
                axis: RGBColor(75, 85, 99),
                text: RGBColor(31, 41, 55),
                line: RGBColor(37, 99, 235),
                guide: RGBColor(156, 163, 175),
                marker: RGBColor(37, 99, 235),
                marker_outline: RGBColor(255, 255, 255),
            },
            Theme::Dark => ChartPalette {
                background: RGBColor(17, 24, 39),
                grid: RGBColor(55, 65, 81),
                axis: RGBColor(156, 163, 175),
                text: RGBColor(229, 231, 235),
                line: RGBColor(96, 165, 250),
                guide: RGBColor(107, 114, 128),
                marker: RGBColor(96, 165, 250),
                marker_outline: RGBColor(17, 24, 39),
            },
        }
    }
}

/// Colours used by the chart renderer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartPalette {
    pub background: RGBColor,
    pub grid: RGBColor,
    pub axis: RGBColor,
    pub text: RGBColor,
    pub line: RGBColor,
    pub guide: RGBColor,
    pub marker: RGBColor,
    pub marker_outline: RGBColor,
}

/// The persisted dark-theme flag, stored as "1" or "0"
pub struct ThemeStore {
    path: PathBuf,
}

impl ThemeStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file means the light theme
    pub fn load(&self) -> Result<Theme, AppError> {
        match std::fs::read_to_string(&self.path) {
            Ok(flag) => Ok(Theme::from_flag(flag.trim() == "1")),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No theme flag at {}, using light theme", self.path.display());
                Ok(Theme::Light)
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self, theme: Theme) -> Result<(), AppError> {
        let flag = if theme.is_dark() { "1" } else { "0" };
        std::fs::write(&self.path, flag)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store(tag: &str) -> ThemeStore {
        let name = format!(
            "coinboard_theme_{}_{}_{}",
            tag,
            std::process::id(),
            chrono::Utc::now().timestamp_millis()
        );
        ThemeStore::new(std::env::temp_dir().join(name))
    }

    #[test]
    fn test_missing_flag_is_light() {
        let store = temp_store("missing");
        assert_eq!(store.load().unwrap(), Theme::Light);
    }

    #[test]
    fn test_flag_round_trip() {
        let store = temp_store("roundtrip");
        store.save(Theme::Dark).unwrap();
        assert_eq!(std::fs::read_to_string(store.path()).unwrap(), "1");
        assert_eq!(store.load().unwrap(), Theme::Dark);

        store.save(Theme::Light).unwrap();
        assert_eq!(std::fs::read_to_string(store.path()).unwrap(), "0");
        assert_eq!(store.load().unwrap(), Theme::Light);

        let _ = std::fs::remove_file(store.path());
    }

    #[test]
    fn test_toggle() {
        assert_eq!(Theme::Light.toggled(), Theme::Dark);
        assert_eq!(Theme::Dark.toggled(), Theme::Light);
        assert_ne!(Theme::Light.palette().background, Theme::Dark.palette().background);
    }
}
