use std::io::Write;
use std::path::Path;

use quest_runtime::{DistanceUnit, QuestConfig, QuestError, QuestSubsystem};
use tempfile::NamedTempFile;

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp file");
    file.write_all(content.as_bytes()).expect("write config");
    file
}

#[test]
fn test_subsystem_from_config_file() {
    let file = write_config(
        r#"
max_signals_per_pump = 50
max_sub_quest_attempts_cap = 4

[distance]
display_unit = "Kilometers"
"#,
    );

    let subsystem = QuestSubsystem::from_config_file(file.path()).expect("load config");
    let config = subsystem.config();
    assert_eq!(config.max_signals_per_pump, 50);
    assert_eq!(config.max_sub_quest_attempts_cap, 4);
    assert_eq!(config.quest_screen_z_order, 10);
    assert_eq!(config.distance.display_unit, DistanceUnit::Kilometers);
    assert!((config.distance.to_display(250_000.0) - 2.5).abs() < 1e-4);
}

#[test]
fn test_missing_file() {
    let err = QuestSubsystem::from_config_file(Path::new("/nonexistent/quests.toml"))
        .expect_err("missing file should fail");
    assert!(matches!(err, QuestError::ConfigNotFound(_)));
}

#[test]
fn test_malformed_and_invalid_values() {
    let file = write_config("max_signals_per_pump = \"lots\"");
    let err = QuestConfig::load(file.path()).expect_err("type mismatch");
    assert!(matches!(err, QuestError::Config(_)));

    let file = write_config("max_quest_restarts_per_pump = 0");
    let err = QuestConfig::load(file.path()).expect_err("zero restarts");
    assert!(matches!(err, QuestError::InvalidConfig(_)));

    let file = write_config("max_signals_per_pump = 0");
    let err = QuestConfig::load(file.path()).expect_err("zero limit");
    assert!(matches!(err, QuestError::InvalidConfig(_)));
}
