//! Quest Runtime - one running instance of a quest graph.
//!
//! The runtime owns a wrapper for every node on the quest's main line and
//! exposes exactly one of them as the current objective. Execution moves
//! along the chain as objectives signal completion:
//!
//! 1. **Initialize**: walk the execution chain from the entry node and wrap each node
//! 2. **Start**: validate the first objective's input and execute from the entry pin
//! 3. **Execute from pin**: resolve the pin's first live connection, bind and run that node
//! 4. **Advance**: follow the current node's output; a dead end completes the quest
//!
//! Failures are resolved by the failed node's failure response. A restart
//! discards every wrapper and builds a fresh set, so signals still queued for
//! the previous generation no longer match anything and are dropped.
//!
//! The main line is a single chain. Branching belongs to sequence objectives.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use quest_graph::{FailureResponse, NodeId, OptionalResponse, PinId, QuestAsset, QuestAssetId};
use tracing::{debug, info, warn};

use crate::objective::{
    Listener, ObjectiveRuntime, ObjectiveRuntimeId, ObjectiveSignal, ObjectiveSnapshot,
    SignalKind,
};
use crate::services::{QuestEventType, QuestOutcome, QuestServices, QuestSummary, WorldContext};

/// Identity of one quest runtime instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuestInstanceId(pub Uuid);

impl QuestInstanceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for QuestInstanceId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for QuestInstanceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum QuestStatus {
    #[default]
    Uninitialized,
    Available,
    InProgress,
    Failed,
    Completed,
}

impl QuestStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, QuestStatus::Completed | QuestStatus::Failed)
    }
}

/// What every objective of one quest instance runs against.
#[derive(Clone)]
pub struct QuestScope {
    pub(crate) instance: QuestInstanceId,
    pub(crate) asset: Arc<QuestAsset>,
    pub(crate) world: Option<WorldContext>,
    /// This quest's asset followed by every asset running it as a sub-quest.
    pub(crate) lineage: Vec<QuestAssetId>,
}

impl QuestScope {
    pub fn instance(&self) -> QuestInstanceId {
        self.instance
    }

    pub fn asset(&self) -> &Arc<QuestAsset> {
        &self.asset
    }

    pub fn world(&self) -> Option<&WorldContext> {
        self.world.as_ref()
    }

    pub fn lineage(&self) -> &[QuestAssetId] {
        &self.lineage
    }

    /// True if `asset` is this quest or one of the quests it is nested in.
    pub fn is_running(&self, asset: QuestAssetId) -> bool {
        self.lineage.contains(&asset)
    }
}

/// An optional objective attached to a main-line objective.
#[derive(Debug)]
pub struct OptionalObjectiveRecord {
    wrapper: ObjectiveRuntime,
    parent: ObjectiveRuntimeId,
    completed: bool,
    failed: bool,
}

impl OptionalObjectiveRecord {
    pub fn wrapper(&self) -> &ObjectiveRuntime {
        &self.wrapper
    }

    pub fn parent(&self) -> ObjectiveRuntimeId {
        self.parent
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn is_failed(&self) -> bool {
        self.failed
    }
}

pub struct QuestRuntime {
    scope: QuestScope,
    status: QuestStatus,
    objectives: Vec<ObjectiveRuntime>,
    current: Option<usize>,
    optionals: Vec<OptionalObjectiveRecord>,
    tracked: bool,
    /// Pump generation and the restarts counted within it.
    restart_budget: (u64, u32),
}

impl QuestRuntime {
    /// Create an uninitialized runtime for `asset`.
    pub fn new(asset: Arc<QuestAsset>, world: Option<WorldContext>) -> Self {
        Self::with_lineage(asset, world, Vec::new())
    }

    /// Runtime for a quest nested inside the quest that owns `parent`.
    pub(crate) fn nested(asset: Arc<QuestAsset>, world: Option<WorldContext>, parent: &QuestScope) -> Self {
        Self::with_lineage(asset, world, parent.lineage.clone())
    }

    fn with_lineage(
        asset: Arc<QuestAsset>,
        world: Option<WorldContext>,
        ancestors: Vec<QuestAssetId>,
    ) -> Self {
        let mut lineage = vec![asset.id];
        lineage.extend(ancestors);
        Self {
            scope: QuestScope {
                instance: QuestInstanceId::new(),
                asset,
                world,
                lineage,
            },
            status: QuestStatus::Uninitialized,
            objectives: Vec::new(),
            current: None,
            optionals: Vec::new(),
            tracked: false,
            restart_budget: (0, 0),
        }
    }

    /// Build the main-line wrappers. Re-initializing tears down the previous run first.
    pub fn initialize(&mut self, services: &mut QuestServices, tracked: bool) {
        if self.status != QuestStatus::Uninitialized || !self.objectives.is_empty() {
            self.uninitialize(services);
        }

        self.objectives = self.build_main_line(services);
        self.current = None;
        self.tracked = tracked;
        self.status = QuestStatus::Available;
        info!(
            quest = %self.scope.asset.title,
            objectives = self.objectives.len(),
            "Quest initialized"
        );
    }

    fn build_main_line(&self, services: &QuestServices) -> Vec<ObjectiveRuntime> {
        let graph = &self.scope.asset.graph;
        let Some(entry) = graph.entry_node() else {
            warn!(quest = %self.scope.asset.title, "Quest graph has no entry node");
            return Vec::new();
        };

        let mut chain = Vec::new();
        let mut seen = HashSet::from([entry]);
        let mut next = graph.next_in_chain(entry);
        while let Some(node_id) = next {
            if !seen.insert(node_id) {
                warn!(
                    quest = %self.scope.asset.title,
                    node = %node_id,
                    "Quest main line loops back on itself, stopping the walk"
                );
                break;
            }
            let Some(node) = graph.node(node_id) else {
                break;
            };
            chain.push(ObjectiveRuntime::new(node, services.factory.create(node)));
            next = graph.next_in_chain(node_id);
        }
        chain
    }

    /// Begin executing from the first objective.
    ///
    /// Malformed graphs log a warning and leave the quest where it was.
    pub fn start(&mut self, services: &mut QuestServices) {
        match self.status {
            QuestStatus::Uninitialized => {
                warn!(quest = %self.scope.asset.title, "Cannot start an uninitialized quest");
                return;
            }
            QuestStatus::Completed | QuestStatus::Failed => {
                debug!(quest = %self.scope.asset.title, "Quest already finished");
                return;
            }
            _ => {}
        }

        let asset = Arc::clone(&self.scope.asset);
        if asset.graph.entry_node().is_none() {
            warn!(quest = %asset.title, "Quest graph has no entry node, not starting");
            return;
        }

        if self.objectives.iter().all(|o| o.is_completed()) {
            self.status = QuestStatus::InProgress;
            self.mark_complete(services);
            return;
        }

        let first = self.current.unwrap_or(0);
        let Some(node) = asset.graph.node(self.objectives[first].node()) else {
            warn!(quest = %asset.title, "First objective is missing from the graph");
            return;
        };
        let Some(input) = node.input else {
            warn!(quest = %asset.title, node = %node.id, "First objective has no input pin");
            return;
        };
        let Some(entry_pin) = asset.graph.first_valid_connection(input) else {
            warn!(quest = %asset.title, node = %node.id, "First objective's input is not connected");
            return;
        };

        self.status = QuestStatus::InProgress;
        info!(quest = %asset.title, "Quest started");
        services.broadcast_event(asset.id, QuestEventType::QuestStarted);
        self.execute_objective_from_pin(entry_pin, services);
    }

    /// Run the node connected to `pin`, making it the current objective.
    ///
    /// An unconnected pin is the end of the main line and completes the quest.
    pub fn execute_objective_from_pin(&mut self, pin: PinId, services: &mut QuestServices) {
        let asset = Arc::clone(&self.scope.asset);
        let Some(target) = asset.graph.first_valid_connection(pin) else {
            debug!(quest = %asset.title, "Reached the end of the main line");
            self.finish_main_line(services);
            self.mark_complete(services);
            return;
        };
        let Some(node_id) = asset.graph.pin_owner(target) else {
            warn!(quest = %asset.title, pin = %target, "Connected pin has no owner");
            return;
        };
        let Some(index) = self.objectives.iter().position(|o| o.node() == node_id) else {
            warn!(
                quest = %asset.title,
                node = %node_id,
                "Connected node is not on the quest's main line, completing quest"
            );
            self.finish_main_line(services);
            self.mark_complete(services);
            return;
        };

        let scope = &self.scope;
        if let Some(previous) = self.current {
            self.objectives[previous].release(scope, services);
        }
        self.current = Some(index);

        let wrapper = &mut self.objectives[index];
        wrapper.bind(Listener::MainLine);
        wrapper.execute(scope, services);
        if self.tracked {
            wrapper.mark_tracked(true, scope, services);
            self.refresh_ui(services);
        }

        self.start_optional_objectives(services);
    }

    /// Follow output `output_index` of the current objective.
    pub fn advance_to_next_objective(&mut self, output_index: usize, services: &mut QuestServices) {
        let asset = Arc::clone(&self.scope.asset);
        let Some(current) = self.current else {
            warn!(quest = %asset.title, "No current objective to advance from");
            return;
        };
        let Some(node) = asset.graph.node(self.objectives[current].node()) else {
            warn!(quest = %asset.title, "Current objective is missing from the graph");
            return;
        };
        let Some(&pin) = node.outputs.get(output_index) else {
            warn!(
                quest = %asset.title,
                node = %node.id,
                index = output_index,
                "Output index out of range"
            );
            return;
        };

        if asset.graph.valid_connections(pin).is_empty() {
            self.finish_main_line(services);
            self.mark_complete(services);
            return;
        }
        self.execute_objective_from_pin(pin, services);
    }

    /// Deliver a signal to whichever wrapper of this quest raised it.
    ///
    /// Returns false if nothing here is bound to the signal's source.
    pub fn handle_signal(&mut self, signal: &ObjectiveSignal, services: &mut QuestServices) -> bool {
        if let Some(index) = self.current {
            if self.objectives[index].id() == signal.source {
                if !self.objectives[index].accepts(Listener::MainLine) {
                    return false;
                }
                match signal.kind {
                    SignalKind::Completed => self.on_objective_completed(services),
                    SignalKind::Failed => self.on_objective_failed(services),
                    SignalKind::Progress { current, max } => {
                        self.objectives[index].on_progress(current, max);
                        if self.tracked {
                            self.refresh_ui(services);
                        }
                    }
                }
                return true;
            }
        }

        if let Some(pos) = self
            .optionals
            .iter()
            .position(|r| r.wrapper.id() == signal.source)
        {
            if !self.optionals[pos].wrapper.accepts(Listener::Optional) {
                return false;
            }
            self.on_optional_signal(pos, signal.kind, services);
            return true;
        }

        let scope = &self.scope;
        if let Some(index) = self.current {
            if self.objectives[index].route_signal(signal, scope, services) {
                return true;
            }
        }
        self.optionals
            .iter_mut()
            .any(|record| record.wrapper.route_signal(signal, scope, services))
    }

    fn on_objective_completed(&mut self, services: &mut QuestServices) {
        let Some(index) = self.current else {
            return;
        };
        let scope = &self.scope;
        let wrapper = &mut self.objectives[index];
        if wrapper.is_blocked() {
            info!(objective = %wrapper.id(), "Objective completion held by a blocking optional");
            wrapper.hold_completion();
            return;
        }
        if !wrapper.on_completed(scope, services) {
            return;
        }
        let finished = wrapper.id();
        wrapper.unbind();
        if self.tracked {
            wrapper.mark_tracked(false, scope, services);
        }

        self.stop_optionals_of(finished, services);
        self.advance_to_next_objective(0, services);
    }

    fn on_objective_failed(&mut self, services: &mut QuestServices) {
        let Some(index) = self.current else {
            return;
        };
        let asset = Arc::clone(&self.scope.asset);
        let scope = &self.scope;
        let wrapper = &mut self.objectives[index];
        if !wrapper.on_failed(scope, services) {
            return;
        }
        let finished = wrapper.id();
        let response = asset
            .graph
            .node(wrapper.node())
            .map(|n| n.settings.failure_response)
            .unwrap_or_default();
        wrapper.unbind();
        if self.tracked {
            wrapper.mark_tracked(false, scope, services);
        }

        self.stop_optionals_of(finished, services);
        info!(quest = %asset.title, response = ?response, "Objective failed");
        match response {
            FailureResponse::FailQuest => self.mark_failed(services),
            FailureResponse::ContinueToNextObjective => self.advance_to_next_objective(0, services),
            FailureResponse::RestartQuest => self.restart(services),
        }
    }

    /// Throw away every wrapper and start over from the first objective.
    ///
    /// Only ever reached from signal handling, after the failing objective's
    /// own hook has returned. A quest that restarts more than
    /// `max_quest_restarts_per_pump` times within one pump is failed instead.
    pub fn restart(&mut self, services: &mut QuestServices) {
        let (pump, count) = self.restart_budget;
        let count = if pump == services.pump { count + 1 } else { 1 };
        self.restart_budget = (services.pump, count);
        if count > services.config.max_quest_restarts_per_pump {
            warn!(
                quest = %self.scope.asset.title,
                restarts = count - 1,
                "Quest keeps restarting within one pump, failing it"
            );
            self.mark_failed(services);
            return;
        }

        info!(quest = %self.scope.asset.title, "Restarting quest");
        self.stop_all_optionals(services);
        let scope = &self.scope;
        for wrapper in self.objectives.iter_mut() {
            wrapper.release(scope, services);
        }

        self.objectives = self.build_main_line(services);
        self.current = None;
        self.status = QuestStatus::Available;
        self.start(services);
    }

    /// Release the current objective and its optionals.
    fn finish_main_line(&mut self, services: &mut QuestServices) {
        self.stop_all_optionals(services);
        if let Some(index) = self.current.take() {
            self.objectives[index].release(&self.scope, services);
        }
    }

    pub fn mark_complete(&mut self, services: &mut QuestServices) {
        if self.status.is_terminal() || self.status == QuestStatus::Uninitialized {
            return;
        }
        self.finish_main_line(services);
        self.status = QuestStatus::Completed;
        if self.tracked {
            self.untrack(services);
        }

        let asset = Arc::clone(&self.scope.asset);
        info!(quest = %asset.title, rewards = asset.rewards.len(), "Quest completed");
        for reward in &asset.rewards {
            services.grant_reward(reward);
        }
        services.broadcast_event(asset.id, QuestEventType::QuestCompleted);
        self.push_outcome(services);
    }

    pub fn mark_failed(&mut self, services: &mut QuestServices) {
        if self.status.is_terminal() || self.status == QuestStatus::Uninitialized {
            return;
        }
        self.finish_main_line(services);
        self.status = QuestStatus::Failed;
        if self.tracked {
            self.untrack(services);
        }

        info!(quest = %self.scope.asset.title, "Quest failed");
        services.broadcast_event(self.scope.asset.id, QuestEventType::QuestFailed);
        self.push_outcome(services);
    }

    fn push_outcome(&self, services: &mut QuestServices) {
        services.outcomes.push(QuestOutcome {
            asset: self.scope.asset.id,
            instance: self.scope.instance,
            status: self.status,
        });
    }

    /// Show this quest on screen. Requires a current objective.
    pub fn track(&mut self, services: &mut QuestServices) -> bool {
        let Some(index) = self.current else {
            warn!(quest = %self.scope.asset.title, "Cannot track a quest without a current objective");
            return false;
        };
        self.tracked = true;
        let scope = &self.scope;
        self.objectives[index].mark_tracked(true, scope, services);
        for record in self.optionals.iter_mut() {
            record.wrapper.mark_tracked(true, scope, services);
        }
        self.refresh_ui(services);
        true
    }

    pub fn untrack(&mut self, services: &mut QuestServices) {
        self.tracked = false;
        let scope = &self.scope;
        if let Some(index) = self.current {
            self.objectives[index].mark_tracked(false, scope, services);
        }
        for record in self.optionals.iter_mut() {
            record.wrapper.mark_tracked(false, scope, services);
        }
        services.hide_objectives(&self.summary());
    }

    /// Replace what the UI shows for this quest with its displayable objectives.
    pub fn refresh_ui(&self, services: &mut QuestServices) {
        if services.ui.is_none() {
            return;
        }
        let objectives = self.displayable_objectives();
        services.show_objectives(&self.summary(), &objectives);
    }

    pub fn pause(&mut self, services: &mut QuestServices) {
        let scope = &self.scope;
        if let Some(index) = self.current {
            self.objectives[index].pause(scope, services);
        }
        for record in self.optionals.iter_mut() {
            record.wrapper.pause(scope, services);
        }
    }

    pub fn resume(&mut self, services: &mut QuestServices) {
        let scope = &self.scope;
        if let Some(index) = self.current {
            self.objectives[index].resume(scope, services);
        }
        for record in self.optionals.iter_mut() {
            record.wrapper.resume(scope, services);
        }
    }

    /// Host time step for the current objective and its optionals.
    pub fn tick(&mut self, dt: Duration, services: &mut QuestServices) {
        if self.status != QuestStatus::InProgress {
            return;
        }
        let scope = &self.scope;
        if let Some(index) = self.current {
            self.objectives[index].tick(dt, scope, services);
        }
        for record in self.optionals.iter_mut() {
            record.wrapper.tick(dt, scope, services);
        }
    }

    /// Lift a block on the current objective, applying any completion held meanwhile.
    pub fn unblock_current(&mut self, services: &mut QuestServices) -> bool {
        let Some(index) = self.current else {
            return false;
        };
        let wrapper = &mut self.objectives[index];
        if !wrapper.is_blocked() {
            return false;
        }
        if wrapper.unblock() {
            services.push_signal(ObjectiveSignal::completed(wrapper.id()));
        }
        true
    }

    fn start_optional_objectives(&mut self, services: &mut QuestServices) {
        let Some(index) = self.current else {
            return;
        };
        if !self.objectives[index].can_generate_optionals() {
            return;
        }
        let asset = Arc::clone(&self.scope.asset);
        let Some(node) = asset.graph.node(self.objectives[index].node()) else {
            return;
        };
        for &pin in &node.optional_outputs {
            for peer in asset.graph.valid_connections(pin) {
                if let Some(owner) = asset.graph.pin_owner(peer) {
                    self.start_optional_objective(owner, services);
                }
            }
        }
    }

    /// Attach `node` as an optional of the current objective and run it.
    ///
    /// Returns false if that pairing is already active or nothing is running.
    pub fn start_optional_objective(&mut self, node: NodeId, services: &mut QuestServices) -> bool {
        let asset = Arc::clone(&self.scope.asset);
        let Some(index) = self.current else {
            warn!(quest = %asset.title, "No current objective to attach an optional to");
            return false;
        };
        let parent = self.objectives[index].id();
        if self
            .optionals
            .iter()
            .any(|r| r.parent == parent && r.wrapper.node() == node)
        {
            debug!(quest = %asset.title, node = %node, "Optional objective already active");
            return false;
        }
        let Some(definition) = asset.graph.node(node) else {
            warn!(quest = %asset.title, node = %node, "Optional objective is not in the graph");
            return false;
        };
        if definition.is_entry() {
            warn!(quest = %asset.title, node = %node, "An entry node cannot be an optional objective");
            return false;
        }

        let wrapper = ObjectiveRuntime::new(definition, services.factory.create(definition))
            .into_optional(parent);
        self.optionals.push(OptionalObjectiveRecord {
            wrapper,
            parent,
            completed: false,
            failed: false,
        });

        let scope = &self.scope;
        if let Some(record) = self.optionals.last_mut() {
            record.wrapper.bind(Listener::Optional);
            record.wrapper.execute(scope, services);
            if self.tracked {
                record.wrapper.mark_tracked(true, scope, services);
            }
        }
        if self.tracked {
            self.refresh_ui(services);
        }
        debug!(quest = %asset.title, node = %node, "Optional objective started");
        true
    }

    /// Stop one optional objective by its wrapper id.
    pub fn stop_optional_objective(
        &mut self,
        optional: ObjectiveRuntimeId,
        services: &mut QuestServices,
    ) -> bool {
        let Some(pos) = self
            .optionals
            .iter()
            .position(|r| r.wrapper.id() == optional)
        else {
            return false;
        };
        let mut record = self.optionals.remove(pos);
        record.wrapper.release(&self.scope, services);
        if self.tracked {
            self.refresh_ui(services);
        }
        true
    }

    fn stop_optionals_of(&mut self, parent: ObjectiveRuntimeId, services: &mut QuestServices) {
        let (stopped, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.optionals)
            .into_iter()
            .partition(|r| r.parent == parent);
        self.optionals = kept;
        for mut record in stopped {
            record.wrapper.release(&self.scope, services);
        }
    }

    fn stop_all_optionals(&mut self, services: &mut QuestServices) {
        for mut record in std::mem::take(&mut self.optionals) {
            record.wrapper.release(&self.scope, services);
        }
    }

    fn on_optional_signal(&mut self, pos: usize, kind: SignalKind, services: &mut QuestServices) {
        let asset = Arc::clone(&self.scope.asset);
        let scope = &self.scope;
        let record = &mut self.optionals[pos];
        let response = match kind {
            SignalKind::Progress { current, max } => {
                record.wrapper.on_progress(current, max);
                if self.tracked {
                    self.refresh_ui(services);
                }
                return;
            }
            SignalKind::Completed => {
                if !record.wrapper.on_completed(scope, services) {
                    return;
                }
                record.completed = true;
                asset
                    .graph
                    .node(record.wrapper.node())
                    .map(|n| n.settings.optional_completion_response)
                    .unwrap_or_default()
            }
            SignalKind::Failed => {
                if !record.wrapper.on_failed(scope, services) {
                    return;
                }
                record.failed = true;
                asset
                    .graph
                    .node(record.wrapper.node())
                    .map(|n| n.settings.optional_failure_response)
                    .unwrap_or_default()
            }
        };
        self.resolve_optional(pos, response, services);
    }

    fn resolve_optional(&mut self, pos: usize, response: OptionalResponse, services: &mut QuestServices) {
        let mut record = self.optionals.remove(pos);
        record.wrapper.release(&self.scope, services);
        let parent = record.parent;
        let parent_is_current = self
            .current
            .is_some_and(|index| self.objectives[index].id() == parent);
        debug!(
            quest = %self.scope.asset.title,
            optional = %record.wrapper.id(),
            completed = record.completed,
            response = ?response,
            "Optional objective resolved"
        );

        match response {
            OptionalResponse::NoEffect => {}
            OptionalResponse::CompleteParent => services.push_signal(ObjectiveSignal::completed(parent)),
            OptionalResponse::FailParent => services.push_signal(ObjectiveSignal::failed(parent)),
            OptionalResponse::AdvanceParent => {
                if parent_is_current {
                    self.stop_optionals_of(parent, services);
                    self.advance_to_next_objective(0, services);
                }
            }
            OptionalResponse::BlockParent => {
                if let Some(index) = self.current.filter(|_| parent_is_current) {
                    self.objectives[index].block();
                }
            }
        }

        if self.tracked {
            self.refresh_ui(services);
        }
    }

    /// Tear down every wrapper. The runtime can be initialized again afterwards.
    pub fn uninitialize(&mut self, services: &mut QuestServices) {
        if self.tracked {
            self.untrack(services);
        }
        self.stop_all_optionals(services);
        let scope = &self.scope;
        for wrapper in self.objectives.iter_mut() {
            wrapper.release(scope, services);
        }
        self.objectives.clear();
        self.current = None;
        self.status = QuestStatus::Uninitialized;
        debug!(quest = %self.scope.asset.title, "Quest uninitialized");
    }

    pub fn instance(&self) -> QuestInstanceId {
        self.scope.instance
    }

    pub fn scope(&self) -> &QuestScope {
        &self.scope
    }

    pub fn asset(&self) -> &Arc<QuestAsset> {
        &self.scope.asset
    }

    pub fn asset_id(&self) -> QuestAssetId {
        self.scope.asset.id
    }

    pub fn world(&self) -> Option<&WorldContext> {
        self.scope.world.as_ref()
    }

    pub fn status(&self) -> QuestStatus {
        self.status
    }

    pub fn is_tracked(&self) -> bool {
        self.tracked
    }

    pub fn objectives(&self) -> &[ObjectiveRuntime] {
        &self.objectives
    }

    pub fn current_objective(&self) -> Option<&ObjectiveRuntime> {
        self.current.map(|index| &self.objectives[index])
    }

    /// First main-line objective that has not completed yet.
    pub fn next_objective(&self) -> Option<&ObjectiveRuntime> {
        self.objectives.iter().find(|o| !o.is_completed())
    }

    pub fn optional_objectives(&self) -> &[OptionalObjectiveRecord] {
        &self.optionals
    }

    pub fn are_all_objectives_completed(&self) -> bool {
        self.objectives.iter().all(|o| o.is_completed())
    }

    /// Fraction of main-line objectives completed.
    pub fn progress(&self) -> f32 {
        if self.objectives.is_empty() {
            return if self.status == QuestStatus::Completed { 1.0 } else { 0.0 };
        }
        let done = self.objectives.iter().filter(|o| o.is_completed()).count();
        done as f32 / self.objectives.len() as f32
    }

    /// Running wrappers: the current objective and every optional.
    pub fn active_wrappers(&self) -> Vec<&ObjectiveRuntime> {
        self.current_objective()
            .filter(|o| o.is_bound())
            .into_iter()
            .chain(self.optionals.iter().map(|r| &r.wrapper))
            .collect()
    }

    /// Find a running wrapper by id, composite children included.
    pub fn find_active(&self, id: ObjectiveRuntimeId) -> Option<&ObjectiveRuntime> {
        self.active_wrappers()
            .into_iter()
            .find_map(|wrapper| wrapper.find_active(id))
    }

    /// Find a running wrapper by node, composite children included.
    pub fn find_active_by_node(&self, node: NodeId) -> Option<&ObjectiveRuntime> {
        self.active_wrappers()
            .into_iter()
            .find_map(|wrapper| wrapper.find_active_by_node(node))
    }

    pub fn summary(&self) -> QuestSummary {
        QuestSummary {
            asset: self.scope.asset.id,
            instance: self.scope.instance,
            title: self.scope.asset.title.clone(),
            status: self.status,
        }
    }

    pub fn snapshots(&self) -> Vec<ObjectiveSnapshot> {
        let graph = &self.scope.asset.graph;
        self.objectives.iter().map(|o| o.snapshot(graph)).collect()
    }

    /// What the tracker shows: running objectives marked for display, highest priority first.
    pub fn displayable_objectives(&self) -> Vec<ObjectiveSnapshot> {
        let graph = &self.scope.asset.graph;
        let mut shown: Vec<ObjectiveSnapshot> = self
            .active_wrappers()
            .into_iter()
            .map(|o| o.snapshot(graph))
            .filter(|s| s.show_in_ui)
            .collect();
        shown.sort_by(|a, b| b.display_priority.cmp(&a.display_priority));
        shown
    }
}

/// Emergency teardown for a runtime dropped while still running.
///
/// The owning services are out of reach here, so cleanup hooks run against a
/// throwaway [`QuestServices`]. Anything they would do through the services
/// is lost: UI visibility is not restored, and no signals, events or
/// lifecycle entries reach the host. Call [`QuestRuntime::uninitialize`]
/// before dropping to get those.
impl Drop for QuestRuntime {
    fn drop(&mut self) {
        let running = self.objectives.iter().any(|o| o.is_bound()) || !self.optionals.is_empty();
        if running {
            warn!(
                quest = %self.scope.asset.title,
                "Quest runtime dropped while running, cleaning up without host services"
            );
            let mut services = QuestServices::default();
            self.uninitialize(&mut services);
        }
    }
}

impl std::fmt::Debug for QuestRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuestRuntime")
            .field("quest", &self.scope.asset.title)
            .field("instance", &self.scope.instance)
            .field("status", &self.status)
            .field("current", &self.current)
            .field("objectives", &self.objectives.len())
            .field("optionals", &self.optionals.len())
            .finish()
    }
}
