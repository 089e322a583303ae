//! Objective behavior and the context it runs in.
//!
//! An [`Objective`] is the behavior of one node kind. The runtime never
//! learns the concrete kind: it only drives the hooks below and reacts to
//! the signals an objective queues through its [`ObjectiveContext`].

mod builtin;
mod factory;
mod runtime;

pub use builtin::*;
pub use factory::*;
pub use runtime::*;

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use quest_graph::{NodeId, ObjectiveNode, QuestAsset, QuestAssetId, QuestGraph};
use tracing::debug;

use crate::config::QuestConfig;
use crate::quest::QuestScope;
use crate::services::{QuestServices, QuestTag, WorldContext};

/// Identity of one runtime wrapper. Never reused, not even across restarts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectiveRuntimeId(pub Uuid);

impl ObjectiveRuntimeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ObjectiveRuntimeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ObjectiveRuntimeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SignalKind {
    Completed,
    Failed,
    Progress { current: f32, max: f32 },
}

/// A completion, failure, or progress report queued by an objective.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveSignal {
    pub source: ObjectiveRuntimeId,
    pub kind: SignalKind,
}

impl ObjectiveSignal {
    pub fn completed(source: ObjectiveRuntimeId) -> Self {
        Self {
            source,
            kind: SignalKind::Completed,
        }
    }

    pub fn failed(source: ObjectiveRuntimeId) -> Self {
        Self {
            source,
            kind: SignalKind::Failed,
        }
    }

    pub fn progress(source: ObjectiveRuntimeId, current: f32, max: f32) -> Self {
        Self {
            source,
            kind: SignalKind::Progress { current, max },
        }
    }
}

/// Behavior of one objective kind.
///
/// Only `execute` is required. An objective finishes by calling
/// [`ObjectiveContext::complete`] or [`ObjectiveContext::fail`], either from
/// inside a hook or later, after the host reports an external event.
/// Anything it schedules outside the runtime must be cancelled in `cleanup`.
pub trait Objective {
    fn execute(&mut self, ctx: &mut ObjectiveContext<'_>);

    fn pause(&mut self, _ctx: &mut ObjectiveContext<'_>) {}

    fn resume(&mut self, _ctx: &mut ObjectiveContext<'_>) {}

    fn mark_tracked(&mut self, _tracked: bool, _ctx: &mut ObjectiveContext<'_>) {}

    /// Release everything the objective holds. May run more than once.
    fn cleanup(&mut self, _ctx: &mut ObjectiveContext<'_>) {}

    /// Host time step.
    fn tick(&mut self, _dt: Duration, _ctx: &mut ObjectiveContext<'_>) {}

    /// Handle a signal raised by something this objective owns.
    ///
    /// Composites return true when the signal came from one of their
    /// children (or deeper). Leaf objectives own nothing.
    fn route_signal(&mut self, _signal: &ObjectiveSignal, _ctx: &mut ObjectiveContext<'_>) -> bool {
        false
    }

    /// Runtime wrappers owned by this objective.
    fn children(&self) -> Vec<&ObjectiveRuntime> {
        Vec::new()
    }

    /// Fraction complete, if the objective tracks it itself.
    fn progress(&self) -> Option<f32> {
        None
    }

    fn can_generate_optionals(&self) -> bool {
        true
    }

    fn is_cosmetic(&self) -> bool {
        false
    }

    fn name(&self) -> &str {
        "Objective"
    }

    fn description(&self) -> &str {
        ""
    }

    fn category(&self) -> &str {
        "Misc"
    }
}

/// Handle passed to every [`Objective`] hook.
pub struct ObjectiveContext<'a> {
    pub(crate) objective: ObjectiveRuntimeId,
    pub(crate) node: NodeId,
    pub(crate) scope: &'a QuestScope,
    pub(crate) services: &'a mut QuestServices,
}

impl<'a> ObjectiveContext<'a> {
    pub(crate) fn new(
        objective: ObjectiveRuntimeId,
        node: NodeId,
        scope: &'a QuestScope,
        services: &'a mut QuestServices,
    ) -> Self {
        Self {
            objective,
            node,
            scope,
            services,
        }
    }

    pub fn id(&self) -> ObjectiveRuntimeId {
        self.objective
    }

    pub fn node_id(&self) -> NodeId {
        self.node
    }

    /// Definition of the node being run.
    pub fn node(&self) -> Option<&ObjectiveNode> {
        self.scope.asset.graph.node(self.node)
    }

    pub fn graph(&self) -> &QuestGraph {
        &self.scope.asset.graph
    }

    pub fn asset(&self) -> &Arc<QuestAsset> {
        &self.scope.asset
    }

    pub fn quest_id(&self) -> QuestAssetId {
        self.scope.asset.id
    }

    pub fn world(&self) -> Option<&WorldContext> {
        self.scope.world.as_ref()
    }

    pub fn config(&self) -> &QuestConfig {
        &self.services.config
    }

    pub fn services(&mut self) -> &mut QuestServices {
        &mut *self.services
    }

    /// Signal that the objective succeeded.
    pub fn complete(&mut self) {
        debug!(objective = %self.objective, "Objective signalled completion");
        self.services
            .signals
            .push_back(ObjectiveSignal::completed(self.objective));
    }

    /// Signal that the objective failed.
    pub fn fail(&mut self) {
        debug!(objective = %self.objective, "Objective signalled failure");
        self.services
            .signals
            .push_back(ObjectiveSignal::failed(self.objective));
    }

    pub fn report_progress(&mut self, current: f32, max: f32) {
        self.services
            .signals
            .push_back(ObjectiveSignal::progress(self.objective, current, max));
    }

    pub fn broadcast_tag(&mut self, tag: &QuestTag) {
        let quest = self.scope.asset.id;
        self.services.broadcast_tag(quest, tag);
    }

    pub fn set_ui_visible(&mut self, visible: bool) {
        self.services.set_ui_visible(visible);
    }
}
