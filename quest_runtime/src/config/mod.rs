//! Runtime settings, loaded from TOML.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{QuestError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestConfig {
    /// Upper bound on signals handled by one pump before the rest are dropped.
    #[serde(default = "default_max_signals_per_pump")]
    pub max_signals_per_pump: usize,

    /// Progress interval for wait objectives that request a tracker but set no interval.
    #[serde(default = "default_wait_progress_interval")]
    pub default_wait_progress_interval_secs: f32,

    /// Restarts one quest may go through within a single pump before it is failed.
    #[serde(default = "default_max_quest_restarts_per_pump")]
    pub max_quest_restarts_per_pump: u32,

    /// Hard ceiling for a sub-quest's `max_attempts`.
    #[serde(default = "default_max_sub_quest_attempts_cap")]
    pub max_sub_quest_attempts_cap: u32,

    /// Z-order handed to the UI surface when it is attached.
    #[serde(default = "default_quest_screen_z_order")]
    pub quest_screen_z_order: i32,

    #[serde(default)]
    pub distance: DistanceConfig,
}

fn default_max_signals_per_pump() -> usize {
    10_000
}

fn default_wait_progress_interval() -> f32 {
    0.02
}

fn default_max_quest_restarts_per_pump() -> u32 {
    8
}

fn default_max_sub_quest_attempts_cap() -> u32 {
    10
}

fn default_quest_screen_z_order() -> i32 {
    10
}

impl Default for QuestConfig {
    fn default() -> Self {
        Self {
            max_signals_per_pump: default_max_signals_per_pump(),
            default_wait_progress_interval_secs: default_wait_progress_interval(),
            max_quest_restarts_per_pump: default_max_quest_restarts_per_pump(),
            max_sub_quest_attempts_cap: default_max_sub_quest_attempts_cap(),
            quest_screen_z_order: default_quest_screen_z_order(),
            distance: DistanceConfig::default(),
        }
    }
}

impl QuestConfig {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|_| QuestError::ConfigNotFound(path.display().to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse config from TOML text. Missing fields take their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| QuestError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.max_signals_per_pump == 0 {
            return Err(QuestError::InvalidConfig(
                "max_signals_per_pump must be at least 1".to_string(),
            ));
        }
        if self.max_quest_restarts_per_pump == 0 {
            return Err(QuestError::InvalidConfig(
                "max_quest_restarts_per_pump must be at least 1".to_string(),
            ));
        }
        if self.max_sub_quest_attempts_cap == 0 {
            return Err(QuestError::InvalidConfig(
                "max_sub_quest_attempts_cap must be at least 1".to_string(),
            ));
        }
        if self.default_wait_progress_interval_secs <= 0.0 {
            return Err(QuestError::InvalidConfig(
                "default_wait_progress_interval_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Display units for distances reported to the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum DistanceUnit {
    Centimeters,
    #[default]
    Meters,
    Kilometers,
    Feet,
}

/// Conversion factors from world centimeters into each display unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceConfig {
    #[serde(default)]
    pub display_unit: DistanceUnit,
    #[serde(default = "default_cm")]
    pub centimeters: f32,
    #[serde(default = "default_m")]
    pub meters: f32,
    #[serde(default = "default_km")]
    pub kilometers: f32,
    #[serde(default = "default_ft")]
    pub feet: f32,
}

fn default_cm() -> f32 {
    1.0
}

fn default_m() -> f32 {
    0.01
}

fn default_km() -> f32 {
    0.00001
}

fn default_ft() -> f32 {
    0.0328084
}

impl Default for DistanceConfig {
    fn default() -> Self {
        Self {
            display_unit: DistanceUnit::default(),
            centimeters: default_cm(),
            meters: default_m(),
            kilometers: default_km(),
            feet: default_ft(),
        }
    }
}

impl DistanceConfig {
    pub fn factor(&self, unit: DistanceUnit) -> f32 {
        match unit {
            DistanceUnit::Centimeters => self.centimeters,
            DistanceUnit::Meters => self.meters,
            DistanceUnit::Kilometers => self.kilometers,
            DistanceUnit::Feet => self.feet,
        }
    }

    /// Convert a world distance in centimeters to `unit`.
    pub fn convert_from_cm(&self, centimeters: f32, unit: DistanceUnit) -> f32 {
        centimeters * self.factor(unit)
    }

    /// Convert to the configured display unit.
    pub fn to_display(&self, centimeters: f32) -> f32 {
        self.convert_from_cm(centimeters, self.display_unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = QuestConfig::from_toml_str("").unwrap();
        assert_eq!(config, QuestConfig::default());
        assert_eq!(config.max_signals_per_pump, 10_000);
        assert_eq!(config.max_sub_quest_attempts_cap, 10);
    }

    #[test]
    fn test_partial_override() {
        let config = QuestConfig::from_toml_str(
            r#"
            max_signals_per_pump = 64
            quest_screen_z_order = 3

            [distance]
            display_unit = "Feet"
            "#,
        )
        .unwrap();

        assert_eq!(config.max_signals_per_pump, 64);
        assert_eq!(config.quest_screen_z_order, 3);
        assert_eq!(config.distance.display_unit, DistanceUnit::Feet);
        assert!((config.distance.meters - 0.01).abs() < f32::EPSILON);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = QuestConfig::from_toml_str("max_signals_per_pump = 0").unwrap_err();
        assert!(matches!(err, QuestError::InvalidConfig(_)));

        let err = QuestConfig::from_toml_str("max_signals_per_pump = \"lots\"").unwrap_err();
        assert!(matches!(err, QuestError::Config(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_sub_quest_attempts_cap = 4").unwrap();

        let config = QuestConfig::load(file.path()).unwrap();
        assert_eq!(config.max_sub_quest_attempts_cap, 4);

        let missing = QuestConfig::load(Path::new("/nonexistent/quests.toml")).unwrap_err();
        assert!(matches!(missing, QuestError::ConfigNotFound(_)));
    }

    #[test]
    fn test_distance_conversion() {
        let distance = DistanceConfig::default();
        assert!((distance.convert_from_cm(250.0, DistanceUnit::Meters) - 2.5).abs() < 1e-5);
        assert!((distance.convert_from_cm(100_000.0, DistanceUnit::Kilometers) - 1.0).abs() < 1e-5);
        assert!((distance.convert_from_cm(100.0, DistanceUnit::Feet) - 3.28084).abs() < 1e-4);
        assert!((distance.to_display(300.0) - 3.0).abs() < 1e-5);
    }
}
