//! Device properties and application configuration.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::error::ConfigError;

/// Scale of the system font size.
pub const SYSTEM_FONT_SIZE_SCALE: &str = "ohos.system.fontSizeScale";
/// Application font size behaviour; `followSystem` or `nonFollowSystem`.
pub const APP_FONT_SIZE_SCALE: &str = "ohos.application.fontSizeScale";
/// Upper bound of the application font scale.
pub const APP_FONT_MAX_SCALE: &str = "ohos.application.fontSizeMaxScale";

/// Value of [`APP_FONT_SIZE_SCALE`] that makes the app follow the system font.
pub const FOLLOW_SYSTEM: &str = "followSystem";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeviceOrientation {
    #[default]
    Portrait,
    Landscape,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SystemProperties {
    /// Device folds along the long edge and has a visible-area display.
    pub super_fold_display_device: bool,
    pub orientation: DeviceOrientation,
    /// Whether overlays span the whole display by default.
    pub expand_display: bool,
}

/// Application-wide configuration items, keyed by global configuration key.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppConfiguration {
    items: BTreeMap<String, String>,
}

impl AppConfiguration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        text.parse()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.items.insert(key.into(), value.into());
    }

    /// Value of `key`, or `None` when missing or empty.
    pub fn item(&self, key: &str) -> Option<&str> {
        self.items
            .get(key)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl FromStr for AppConfiguration {
    type Err = ConfigError;

    /// Parses `key = value` lines. Blank lines and `#` comments are skipped.
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let mut config = AppConfiguration::new();
        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                return Err(ConfigError::Parse {
                    line: idx + 1,
                    reason: "expected `key = value`".to_string(),
                });
            };
            let key = key.trim();
            if key.is_empty() {
                return Err(ConfigError::Parse {
                    line: idx + 1,
                    reason: "empty key".to_string(),
                });
            }
            config.set(key, value.trim());
        }
        Ok(config)
    }
}

/// Lenient float parsing; malformed values read as `0.0`.
pub fn parse_scale(value: &str) -> f32 {
    value.trim().parse().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn parses_keys_and_skips_comments() {
        let text = indoc! {"
            # font settings
            ohos.system.fontSizeScale = 1.25

            ohos.application.fontSizeScale=followSystem
        "};
        let config: AppConfiguration = text.parse().expect("parse");
        assert_eq!(config.len(), 2);
        assert_eq!(config.item(SYSTEM_FONT_SIZE_SCALE), Some("1.25"));
        assert_eq!(config.item(APP_FONT_SIZE_SCALE), Some(FOLLOW_SYSTEM));
        assert_eq!(config.item(APP_FONT_MAX_SCALE), None);
    }

    #[test]
    fn empty_values_read_as_missing() {
        let config: AppConfiguration = "ohos.application.fontSizeMaxScale =".parse().unwrap();
        assert_eq!(config.item(APP_FONT_MAX_SCALE), None);
    }

    #[test]
    fn reports_line_of_malformed_entry() {
        let err = "a = 1\nbroken".parse::<AppConfiguration>().unwrap_err();
        match err {
            ConfigError::Parse { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn scale_parsing_is_lenient() {
        assert_eq!(parse_scale(" 1.5 "), 1.5);
        assert_eq!(parse_scale("large"), 0.0);
    }
}
