//! Event types published by the runtime.

use serde::{Deserialize, Serialize};

use quest_graph::QuestAssetId;

/// Telemetry events delivered to registered quest receivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuestEventType {
    QuestStarted,
    QuestCompleted,
    QuestFailed,
    ObjectiveStarted,
    ObjectiveCompleted,
    ObjectiveFailed,
}

impl std::fmt::Display for QuestEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            QuestEventType::QuestStarted => "quest_started",
            QuestEventType::QuestCompleted => "quest_completed",
            QuestEventType::QuestFailed => "quest_failed",
            QuestEventType::ObjectiveStarted => "objective_started",
            QuestEventType::ObjectiveCompleted => "objective_completed",
            QuestEventType::ObjectiveFailed => "objective_failed",
        };
        write!(f, "{}", name)
    }
}

/// Dot-separated tag broadcast to tag receivers, e.g. `Quest.Door.Opened`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuestTag(String);

impl QuestTag {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True if this tag equals `parent` or sits beneath it in the hierarchy.
    pub fn matches(&self, parent: &str) -> bool {
        self.0 == parent
            || (self.0.starts_with(parent) && self.0[parent.len()..].starts_with('.'))
    }
}

impl std::fmt::Display for QuestTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Changes to the subsystem's quest registry, in the order they happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuestLifecycleEvent {
    QuestChanged(QuestAssetId),
    QuestAdded(QuestAssetId),
    QuestRemoved(QuestAssetId),
    QuestTracked(QuestAssetId),
    QuestUntracked(QuestAssetId),
    SubQuestTrackingChanged { quest: QuestAssetId, tracked: bool },
}
