//! Kind-specific settings for the built-in objective kinds.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::QuestAssetId;

/// Settings for a timed wait.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaitSettings {
    /// Zero or less completes on execute.
    pub duration_secs: f32,
    /// When false the quest UI is hidden while waiting.
    pub keep_ui_displayed: bool,
    /// Report progress at this interval while waiting. `None` reports nothing.
    pub progress_interval_secs: Option<f32>,
}

impl Default for WaitSettings {
    fn default() -> Self {
        Self {
            duration_secs: 5.0,
            keep_ui_displayed: false,
            progress_interval_secs: None,
        }
    }
}

/// How a sequence runs its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SequenceMode {
    /// One child at a time, in chain order.
    Sequential,
    /// All children at once.
    #[default]
    Parallel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SequenceSettings {
    pub mode: SequenceMode,
}

/// When a sub-quest objective counts as completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SubQuestCompletion {
    #[default]
    OnSubQuestComplete,
    /// When the nested objective at `specific_objective_index` completes.
    OnSpecificObjective,
    /// Only when completed from outside.
    Manual,
}

/// What a sub-quest objective does when its nested quest fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SubQuestFailure {
    #[default]
    FailWithSubQuest,
    RestartSubQuest,
    IgnoreFailure,
}

/// How the nested quest participates in quest tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SubQuestTracking {
    NoTracking,
    #[default]
    TrackWithParent,
    AlwaysTrack,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubQuestSettings {
    pub quest: Option<QuestAssetId>,
    pub completion: SubQuestCompletion,
    pub specific_objective_index: usize,
    pub failure: SubQuestFailure,
    /// Total runs allowed, the first one included.
    pub max_attempts: u32,
    pub inherit_world_context: bool,
    pub tracking: SubQuestTracking,
}

impl SubQuestSettings {
    pub fn for_quest(quest: QuestAssetId) -> Self {
        Self {
            quest: Some(quest),
            ..Self::default()
        }
    }

    /// `max_attempts` clamped into `1..=cap`.
    pub fn clamped_max_attempts(&self, cap: u32) -> u32 {
        self.max_attempts.clamp(1, cap.max(1))
    }
}

impl Default for SubQuestSettings {
    fn default() -> Self {
        Self {
            quest: None,
            completion: SubQuestCompletion::default(),
            specific_objective_index: 0,
            failure: SubQuestFailure::default(),
            max_attempts: 3,
            inherit_world_context: true,
            tracking: SubQuestTracking::default(),
        }
    }
}

/// Type tag of an objective node plus its kind-specific settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ObjectiveKind {
    /// Launch marker at the head of a quest graph.
    Entry,
    Wait(WaitSettings),
    Sequence(SequenceSettings),
    SubQuest(SubQuestSettings),
    /// Resolved only by the host through the quest subsystem.
    External,
    /// Host-defined behavior looked up by `type_tag`.
    Custom {
        type_tag: String,
        properties: HashMap<String, serde_json::Value>,
    },
}

impl ObjectiveKind {
    pub fn custom(type_tag: impl Into<String>) -> Self {
        ObjectiveKind::Custom {
            type_tag: type_tag.into(),
            properties: HashMap::new(),
        }
    }

    pub fn type_name(&self) -> &str {
        match self {
            ObjectiveKind::Entry => "Entry",
            ObjectiveKind::Wait(_) => "Wait",
            ObjectiveKind::Sequence(_) => "Sequence",
            ObjectiveKind::SubQuest(_) => "SubQuest",
            ObjectiveKind::External => "External",
            ObjectiveKind::Custom { type_tag, .. } => type_tag,
        }
    }

    pub fn is_entry(&self) -> bool {
        matches!(self, ObjectiveKind::Entry)
    }

    pub fn is_sequence(&self) -> bool {
        matches!(self, ObjectiveKind::Sequence(_))
    }
}
