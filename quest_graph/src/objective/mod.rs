//! Objective node definitions.
//!
//! A node is what a quest designer places in the graph. It never changes
//! while a quest runs; per-instance state such as completion flags lives in
//! the runtime wrapper built around it.

mod kinds;
mod settings;

pub use kinds::*;
pub use settings::*;

use serde::{Deserialize, Serialize};

use crate::{NodeId, PinId};

/// One task in a quest graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectiveNode {
    pub id: NodeId,
    pub kind: ObjectiveKind,
    pub settings: ObjectiveSettings,

    /// Execution input. Entry nodes have none.
    pub input: Option<PinId>,
    /// Output pins in allocation order. Index 0 is the main execution output.
    pub outputs: Vec<PinId>,
    /// One pin per entry of `settings.optionals`.
    pub optional_outputs: Vec<PinId>,
}

impl ObjectiveNode {
    /// Create a node definition with default settings. Pins are allocated
    /// when the node is added to a graph.
    pub fn new(kind: ObjectiveKind) -> Self {
        Self {
            id: NodeId::new(),
            kind,
            settings: ObjectiveSettings::default(),
            input: None,
            outputs: Vec::new(),
            optional_outputs: Vec::new(),
        }
    }

    pub fn entry() -> Self {
        let mut node = Self::new(ObjectiveKind::Entry);
        node.settings.display.label = "Launch".to_string();
        node.settings.show_in_ui = false;
        node
    }

    pub fn external(label: impl Into<String>) -> Self {
        Self::new(ObjectiveKind::External).with_label(label)
    }

    pub fn wait(duration_secs: f32) -> Self {
        Self::new(ObjectiveKind::Wait(WaitSettings {
            duration_secs,
            ..WaitSettings::default()
        }))
    }

    pub fn sequence(mode: SequenceMode) -> Self {
        Self::new(ObjectiveKind::Sequence(SequenceSettings { mode }))
    }

    pub fn sub_quest(settings: SubQuestSettings) -> Self {
        Self::new(ObjectiveKind::SubQuest(settings))
    }

    /// Builder: set the display label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.settings.display.label = label.into();
        self
    }

    /// Builder: set the display tip.
    pub fn with_tip(mut self, tip: impl Into<String>) -> Self {
        self.settings.display.tip = tip.into();
        self
    }

    /// Builder: set the failure response.
    pub fn with_failure_response(mut self, response: FailureResponse) -> Self {
        self.settings.failure_response = response;
        self
    }

    /// Builder: set how this node affects its parent when used as an optional.
    pub fn with_optional_responses(
        mut self,
        on_complete: OptionalResponse,
        on_fail: OptionalResponse,
    ) -> Self {
        self.settings.optional_completion_response = on_complete;
        self.settings.optional_failure_response = on_fail;
        self
    }

    /// Builder: declare an optional output slot.
    pub fn with_optional(mut self, label: impl Into<String>) -> Self {
        self.settings.optionals.push(label.into());
        self
    }

    /// Builder: set the display priority.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.settings.display_priority = priority;
        self
    }

    /// Builder: request a progress tracker.
    pub fn with_progress_tracker(mut self) -> Self {
        self.settings.generate_progress_tracker = true;
        self
    }

    /// Builder: add a modifier.
    pub fn with_modifier(mut self, modifier: ObjectiveModifier) -> Self {
        self.settings.modifiers.push(modifier);
        self
    }

    /// Builder: mark as cosmetic.
    pub fn cosmetic(mut self) -> Self {
        self.settings.cosmetic = true;
        self
    }

    pub fn label(&self) -> &str {
        &self.settings.display.label
    }

    pub fn is_entry(&self) -> bool {
        self.kind.is_entry()
    }

    /// All pins owned by this node.
    pub fn pins(&self) -> impl Iterator<Item = PinId> + '_ {
        self.input
            .iter()
            .chain(self.outputs.iter())
            .chain(self.optional_outputs.iter())
            .copied()
    }
}
