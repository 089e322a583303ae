//! Per-node configuration: display metadata, policies, and modifiers.

use serde::{Deserialize, Serialize};

/// What happens to the owning quest (or sequence) when an objective fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum FailureResponse {
    /// The whole quest (or enclosing sequence) fails.
    #[default]
    FailQuest,
    /// Treat the failure as a pass and move on.
    ContinueToNextObjective,
    /// Start the quest (or enclosing sequence) over.
    RestartQuest,
}

/// Effect an optional objective has on the main-line objective it is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OptionalResponse {
    #[default]
    NoEffect,
    CompleteParent,
    FailParent,
    /// Move the quest past the parent without counting the parent as completed.
    AdvanceParent,
    /// Hold the parent: its completion does not advance the quest until unblocked.
    BlockParent,
}

/// Where a progress tracker is drawn relative to the objective label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TrackerPosition {
    #[default]
    Inline,
    Full,
}

/// Text shown for an objective in quest logs and trackers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayInfo {
    pub label: String,
    pub tip: String,
    pub description: String,
    pub category: String,
    pub icon: Option<String>,
}

impl Default for DisplayInfo {
    fn default() -> Self {
        Self {
            label: "Default Label".to_string(),
            tip: String::new(),
            description: "Default Description".to_string(),
            category: "Misc".to_string(),
            icon: None,
        }
    }
}

/// Extra rules evaluated by the runtime wrapper while an objective runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ObjectiveModifier {
    /// Fail the objective once it has been running longer than `seconds`.
    TimeLimit { seconds: f32 },
}

impl ObjectiveModifier {
    pub fn time_limit(seconds: f32) -> Self {
        ObjectiveModifier::TimeLimit { seconds }
    }

    /// Whether the condition still holds after `elapsed_secs` of running time.
    pub fn check(&self, elapsed_secs: f32) -> bool {
        match self {
            ObjectiveModifier::TimeLimit { seconds } => elapsed_secs <= *seconds,
        }
    }
}

impl Default for ObjectiveModifier {
    fn default() -> Self {
        ObjectiveModifier::TimeLimit { seconds: 60.0 }
    }
}

/// Configuration shared by every objective kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveSettings {
    pub display: DisplayInfo,
    /// Higher priorities are listed first in the tracker.
    pub display_priority: i32,
    pub show_in_ui: bool,
    pub generate_progress_tracker: bool,
    pub tracker_position: TrackerPosition,
    pub failure_response: FailureResponse,
    pub optional_completion_response: OptionalResponse,
    pub optional_failure_response: OptionalResponse,
    /// One optional output pin is allocated per entry.
    pub optionals: Vec<String>,
    /// Cosmetic nodes never spawn optionals of their own.
    pub cosmetic: bool,
    pub modifiers: Vec<ObjectiveModifier>,
}

impl Default for ObjectiveSettings {
    fn default() -> Self {
        Self {
            display: DisplayInfo::default(),
            display_priority: 0,
            show_in_ui: true,
            generate_progress_tracker: false,
            tracker_position: TrackerPosition::default(),
            failure_response: FailureResponse::default(),
            optional_completion_response: OptionalResponse::default(),
            optional_failure_response: OptionalResponse::default(),
            optionals: Vec::new(),
            cosmetic: false,
            modifiers: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = ObjectiveSettings::default();
        assert_eq!(settings.display.label, "Default Label");
        assert_eq!(settings.display.category, "Misc");
        assert_eq!(settings.failure_response, FailureResponse::FailQuest);
        assert_eq!(settings.optional_completion_response, OptionalResponse::NoEffect);
        assert!(settings.show_in_ui);
        assert!(!settings.cosmetic);
    }

    #[test]
    fn test_time_limit_check() {
        let limit = ObjectiveModifier::time_limit(10.0);
        assert!(limit.check(0.0));
        assert!(limit.check(10.0));
        assert!(!limit.check(10.5));
        assert_eq!(ObjectiveModifier::default(), ObjectiveModifier::time_limit(60.0));
    }
}
