//! Objective runtime wrapper - the per-instance state around a node.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use quest_graph::{NodeId, ObjectiveModifier, ObjectiveNode, QuestGraph};
use tracing::{debug, info};

use super::{Objective, ObjectiveContext, ObjectiveRuntimeId, ObjectiveSignal};
use crate::quest::QuestScope;
use crate::services::{QuestEventType, QuestServices};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ObjectiveState {
    #[default]
    NotStarted,
    InProgress,
    Completed,
    Failed,
    /// Running, but completion is held by a blocking optional.
    Blocked,
}

/// The single consumer a wrapper's signals are delivered to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Listener {
    MainLine,
    Optional,
    Sequence,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgressTracker {
    pub current: f32,
    pub max: f32,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self {
            current: 0.0,
            max: 1.0,
        }
    }

    pub fn fraction(&self) -> f32 {
        if self.max <= 0.0 {
            return 0.0;
        }
        (self.current / self.max).clamp(0.0, 1.0)
    }

    pub fn is_full(&self) -> bool {
        self.current >= self.max
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only view of a wrapper for queries and the UI.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectiveSnapshot {
    pub id: ObjectiveRuntimeId,
    pub node: NodeId,
    pub kind: String,
    pub label: String,
    pub tip: String,
    pub display_priority: i32,
    pub show_in_ui: bool,
    pub optional: bool,
    pub parent: Option<ObjectiveRuntimeId>,
    pub state: ObjectiveState,
    pub progress: Option<ProgressTracker>,
}

/// Mutable state of one objective inside one quest instance.
///
/// The node definition is shared and never touched; everything that changes
/// while the objective runs lives here.
pub struct ObjectiveRuntime {
    id: ObjectiveRuntimeId,
    node: NodeId,
    behavior: Box<dyn Objective>,
    state: ObjectiveState,
    completed: bool,
    failed: bool,
    optional: bool,
    parent: Option<ObjectiveRuntimeId>,
    display_priority: i32,
    cosmetic: bool,
    tracker: Option<ProgressTracker>,
    listener: Option<Listener>,
    tracked: bool,
    paused: bool,
    released: bool,
    modifiers: Vec<ObjectiveModifier>,
    elapsed_secs: f32,
    limit_tripped: bool,
    blocked: bool,
    held_completion: bool,
}

impl ObjectiveRuntime {
    pub fn new(node: &ObjectiveNode, behavior: Box<dyn Objective>) -> Self {
        let settings = &node.settings;
        Self {
            id: ObjectiveRuntimeId::new(),
            node: node.id,
            behavior,
            state: ObjectiveState::NotStarted,
            completed: false,
            failed: false,
            optional: false,
            parent: None,
            display_priority: settings.display_priority,
            cosmetic: settings.cosmetic,
            tracker: settings
                .generate_progress_tracker
                .then(ProgressTracker::new),
            listener: None,
            tracked: false,
            paused: false,
            released: false,
            modifiers: settings.modifiers.clone(),
            elapsed_secs: 0.0,
            limit_tripped: false,
            blocked: false,
            held_completion: false,
        }
    }

    /// Mark as an optional attached to `parent`.
    pub(crate) fn into_optional(mut self, parent: ObjectiveRuntimeId) -> Self {
        self.optional = true;
        self.parent = Some(parent);
        self
    }

    pub fn id(&self) -> ObjectiveRuntimeId {
        self.id
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn behavior(&self) -> &dyn Objective {
        self.behavior.as_ref()
    }

    pub fn state(&self) -> ObjectiveState {
        if self.blocked && self.state == ObjectiveState::InProgress {
            ObjectiveState::Blocked
        } else {
            self.state
        }
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn is_failed(&self) -> bool {
        self.failed
    }

    pub fn is_resolved(&self) -> bool {
        self.completed || self.failed
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn parent(&self) -> Option<ObjectiveRuntimeId> {
        self.parent
    }

    pub fn display_priority(&self) -> i32 {
        self.display_priority
    }

    pub fn tracker(&self) -> Option<&ProgressTracker> {
        self.tracker.as_ref()
    }

    pub fn is_tracked(&self) -> bool {
        self.tracked
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_bound(&self) -> bool {
        self.listener.is_some()
    }

    pub fn listener(&self) -> Option<Listener> {
        self.listener
    }

    /// Optionals attached to an optional, or to a cosmetic node, are never started.
    pub fn can_generate_optionals(&self) -> bool {
        !self.optional
            && !self.cosmetic
            && !self.behavior.is_cosmetic()
            && self.behavior.can_generate_optionals()
    }

    pub(crate) fn bind(&mut self, listener: Listener) {
        self.listener = Some(listener);
    }

    pub(crate) fn unbind(&mut self) {
        self.listener = None;
    }

    /// Whether signals from this wrapper should reach `listener`.
    pub(crate) fn accepts(&self, listener: Listener) -> bool {
        self.listener == Some(listener)
    }

    pub(crate) fn execute(&mut self, scope: &QuestScope, services: &mut QuestServices) {
        self.state = ObjectiveState::InProgress;
        self.completed = false;
        self.failed = false;
        self.paused = false;
        self.released = false;
        self.elapsed_secs = 0.0;
        self.limit_tripped = false;
        self.blocked = false;
        self.held_completion = false;
        if let Some(tracker) = self.tracker.as_mut() {
            *tracker = ProgressTracker::new();
        }

        debug!(
            objective = %self.id,
            node = %self.node,
            kind = self.behavior.name(),
            "Executing objective"
        );
        services.broadcast_event(scope.asset.id, QuestEventType::ObjectiveStarted);

        let mut ctx = ObjectiveContext::new(self.id, self.node, scope, services);
        self.behavior.execute(&mut ctx);
    }

    pub(crate) fn pause(&mut self, scope: &QuestScope, services: &mut QuestServices) {
        if self.state != ObjectiveState::InProgress || self.paused {
            return;
        }
        self.paused = true;
        let mut ctx = ObjectiveContext::new(self.id, self.node, scope, services);
        self.behavior.pause(&mut ctx);
    }

    pub(crate) fn resume(&mut self, scope: &QuestScope, services: &mut QuestServices) {
        if !self.paused {
            return;
        }
        self.paused = false;
        let mut ctx = ObjectiveContext::new(self.id, self.node, scope, services);
        self.behavior.resume(&mut ctx);
    }

    pub(crate) fn mark_tracked(
        &mut self,
        tracked: bool,
        scope: &QuestScope,
        services: &mut QuestServices,
    ) {
        self.tracked = tracked;
        let mut ctx = ObjectiveContext::new(self.id, self.node, scope, services);
        self.behavior.mark_tracked(tracked, &mut ctx);
    }

    /// Advance running time and evaluate modifiers. Paused wrappers are frozen.
    pub(crate) fn tick(&mut self, dt: Duration, scope: &QuestScope, services: &mut QuestServices) {
        if self.state != ObjectiveState::InProgress || self.paused || self.listener.is_none() {
            return;
        }

        self.elapsed_secs += dt.as_secs_f32();
        if !self.limit_tripped && self.modifiers.iter().any(|m| !m.check(self.elapsed_secs)) {
            self.limit_tripped = true;
            info!(
                objective = %self.id,
                elapsed = self.elapsed_secs,
                "Objective modifier condition failed"
            );
            services.signals.push_back(ObjectiveSignal::failed(self.id));
            return;
        }

        let mut ctx = ObjectiveContext::new(self.id, self.node, scope, services);
        self.behavior.tick(dt, &mut ctx);
    }

    /// Unbind and run the cleanup hook once for this run.
    pub(crate) fn release(&mut self, scope: &QuestScope, services: &mut QuestServices) {
        self.listener = None;
        self.tracked = false;
        if self.state == ObjectiveState::NotStarted || self.released {
            return;
        }
        self.released = true;
        let mut ctx = ObjectiveContext::new(self.id, self.node, scope, services);
        self.behavior.cleanup(&mut ctx);
    }

    /// Record completion. Returns false if the wrapper was already resolved.
    pub(crate) fn on_completed(&mut self, scope: &QuestScope, services: &mut QuestServices) -> bool {
        if self.is_resolved() {
            return false;
        }
        self.completed = true;
        self.blocked = false;
        self.held_completion = false;
        self.state = ObjectiveState::Completed;
        if let Some(tracker) = self.tracker.as_mut() {
            tracker.current = tracker.max;
        }
        services.broadcast_event(scope.asset.id, QuestEventType::ObjectiveCompleted);
        true
    }

    /// Record failure. Returns false if the wrapper was already resolved.
    pub(crate) fn on_failed(&mut self, scope: &QuestScope, services: &mut QuestServices) -> bool {
        if self.is_resolved() {
            return false;
        }
        self.failed = true;
        self.blocked = false;
        self.held_completion = false;
        self.state = ObjectiveState::Failed;
        services.broadcast_event(scope.asset.id, QuestEventType::ObjectiveFailed);
        true
    }

    pub(crate) fn on_progress(&mut self, current: f32, max: f32) {
        if let Some(tracker) = self.tracker.as_mut() {
            tracker.current = current;
            if max > 0.0 {
                tracker.max = max;
            }
        }
    }

    pub(crate) fn block(&mut self) {
        if self.state == ObjectiveState::InProgress {
            self.blocked = true;
        }
    }

    pub fn is_blocked(&self) -> bool {
        self.blocked
    }

    pub(crate) fn hold_completion(&mut self) {
        self.held_completion = true;
    }

    /// Lift a block. Returns true if a completion was held while blocked.
    pub(crate) fn unblock(&mut self) -> bool {
        let held = self.held_completion;
        self.blocked = false;
        self.held_completion = false;
        held
    }

    pub(crate) fn route_signal(
        &mut self,
        signal: &ObjectiveSignal,
        scope: &QuestScope,
        services: &mut QuestServices,
    ) -> bool {
        if self.listener.is_none() {
            return false;
        }
        let mut ctx = ObjectiveContext::new(self.id, self.node, scope, services);
        self.behavior.route_signal(signal, &mut ctx)
    }

    /// This wrapper, or one it owns, if it is bound and has the given id.
    pub fn find_active(&self, id: ObjectiveRuntimeId) -> Option<&ObjectiveRuntime> {
        if !self.is_bound() {
            return None;
        }
        if self.id == id {
            return Some(self);
        }
        self.behavior
            .children()
            .into_iter()
            .find_map(|child| child.find_active(id))
    }

    /// Like [`Self::find_active`], matching on the node instead.
    pub fn find_active_by_node(&self, node: NodeId) -> Option<&ObjectiveRuntime> {
        if !self.is_bound() {
            return None;
        }
        if self.node == node {
            return Some(self);
        }
        self.behavior
            .children()
            .into_iter()
            .find_map(|child| child.find_active_by_node(node))
    }

    pub fn snapshot(&self, graph: &QuestGraph) -> ObjectiveSnapshot {
        let definition = graph.node(self.node);
        let progress = self.tracker.or_else(|| {
            self.behavior.progress().map(|fraction| ProgressTracker {
                current: fraction,
                max: 1.0,
            })
        });
        ObjectiveSnapshot {
            id: self.id,
            node: self.node,
            kind: definition
                .map(|n| n.kind.type_name().to_string())
                .unwrap_or_default(),
            label: definition.map(|n| n.label().to_string()).unwrap_or_default(),
            tip: definition
                .map(|n| n.settings.display.tip.clone())
                .unwrap_or_default(),
            display_priority: self.display_priority,
            show_in_ui: definition.is_some_and(|n| n.settings.show_in_ui),
            optional: self.optional,
            parent: self.parent,
            state: self.state(),
            progress,
        }
    }
}

impl std::fmt::Debug for ObjectiveRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectiveRuntime")
            .field("id", &self.id)
            .field("node", &self.node)
            .field("kind", &self.behavior.name())
            .field("state", &self.state())
            .field("optional", &self.optional)
            .field("listener", &self.listener)
            .finish()
    }
}
