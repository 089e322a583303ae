//! Sequence objective - fans out to a chain of child objectives and reduces
//! their outcomes to a single completion or failure.
//!
//! Children are found by following the node's sequence pin and then each
//! child's first execution output, the same single-chain walk the quest main
//! line uses. Sequential mode runs them one at a time; parallel mode runs
//! them all at once and finishes when none is outstanding.

use std::collections::HashSet;
use std::time::Duration;

use quest_graph::{FailureResponse, NodeId, PinCategory, SequenceMode};
use tracing::{debug, info, warn};

use crate::objective::{
    Listener, Objective, ObjectiveContext, ObjectiveRuntime, ObjectiveSignal, SignalKind,
};

pub struct SequenceObjective {
    mode: SequenceMode,
    children: Vec<ObjectiveRuntime>,
    next_index: usize,
    completed: usize,
    failed: usize,
    outcome: Option<bool>,
    tracked: bool,
}

impl SequenceObjective {
    pub fn new(mode: SequenceMode) -> Self {
        Self {
            mode,
            children: Vec::new(),
            next_index: 0,
            completed: 0,
            failed: 0,
            outcome: None,
            tracked: false,
        }
    }

    pub fn mode(&self) -> SequenceMode {
        self.mode
    }

    /// Children currently running.
    pub fn active_children(&self) -> Vec<&ObjectiveRuntime> {
        self.children.iter().filter(|c| c.is_bound()).collect()
    }

    pub fn completed_children(&self) -> Vec<&ObjectiveRuntime> {
        self.children.iter().filter(|c| c.is_completed()).collect()
    }

    /// Completed children over total children.
    pub fn sequence_progress(&self) -> f32 {
        if self.children.is_empty() {
            return if self.outcome == Some(true) { 1.0 } else { 0.0 };
        }
        self.completed as f32 / self.children.len() as f32
    }

    pub fn is_sequence_complete(&self) -> bool {
        self.outcome == Some(true)
    }

    fn collect_children(ctx: &ObjectiveContext<'_>) -> Vec<NodeId> {
        let graph = &ctx.scope.asset.graph;
        let own = ctx.node_id();
        let mut seen = HashSet::from([own]);
        let mut chain = Vec::new();

        let mut next = graph
            .find_output_by_category(own, &PinCategory::Sequence)
            .and_then(|pin| graph.next_from_pin(pin));
        while let Some(node) = next {
            if !seen.insert(node) {
                warn!(sequence = %own, node = %node, "Sequence chain repeats a node, stopping the walk");
                break;
            }
            chain.push(node);
            next = graph.next_in_chain(node);
        }
        chain
    }

    /// Build a fresh generation of children and start them.
    fn run(&mut self, ctx: &mut ObjectiveContext<'_>) {
        self.release_children(ctx);

        let scope = ctx.scope;
        let graph = &scope.asset.graph;
        self.children = Self::collect_children(ctx)
            .into_iter()
            .filter_map(|id| graph.node(id))
            .map(|node| ObjectiveRuntime::new(node, ctx.services.factory.create(node)))
            .collect();
        self.next_index = 0;
        self.completed = 0;
        self.failed = 0;
        self.outcome = None;

        if self.children.is_empty() {
            debug!(sequence = %ctx.id(), "Sequence has no children, completing");
            self.finish(true, ctx);
            return;
        }

        info!(
            sequence = %ctx.id(),
            mode = ?self.mode,
            children = self.children.len(),
            "Starting sequence"
        );
        match self.mode {
            SequenceMode::Sequential => self.start_child(0, ctx),
            SequenceMode::Parallel => {
                for index in 0..self.children.len() {
                    self.start_child(index, ctx);
                }
            }
        }
    }

    fn start_child(&mut self, index: usize, ctx: &mut ObjectiveContext<'_>) {
        let scope = ctx.scope;
        let child = &mut self.children[index];
        child.bind(Listener::Sequence);
        child.execute(scope, ctx.services);
        if self.tracked {
            child.mark_tracked(true, scope, ctx.services);
        }
    }

    fn release_children(&mut self, ctx: &mut ObjectiveContext<'_>) {
        let scope = ctx.scope;
        for child in self.children.iter_mut() {
            child.release(scope, ctx.services);
        }
    }

    fn outstanding(&self) -> usize {
        self.children.iter().filter(|c| !c.is_resolved()).count()
    }

    fn finish(&mut self, success: bool, ctx: &mut ObjectiveContext<'_>) {
        self.outcome = Some(success);
        self.release_children(ctx);
        if success {
            ctx.complete();
        } else {
            ctx.fail();
        }
    }

    fn advance_sequential(&mut self, ctx: &mut ObjectiveContext<'_>) {
        self.next_index += 1;
        if self.next_index < self.children.len() {
            self.start_child(self.next_index, ctx);
        } else {
            self.finish(true, ctx);
        }
    }

    fn on_child_completed(&mut self, index: usize, ctx: &mut ObjectiveContext<'_>) {
        let scope = ctx.scope;
        let child = &mut self.children[index];
        if !child.on_completed(scope, ctx.services) {
            return;
        }
        child.release(scope, ctx.services);
        self.completed += 1;
        debug!(
            sequence = %ctx.id(),
            completed = self.completed,
            total = self.children.len(),
            "Sequence child completed"
        );
        ctx.report_progress(self.completed as f32, self.children.len() as f32);

        match self.mode {
            SequenceMode::Sequential => self.advance_sequential(ctx),
            SequenceMode::Parallel => {
                if self.outstanding() == 0 {
                    self.finish(true, ctx);
                }
            }
        }
    }

    fn on_child_failed(&mut self, index: usize, ctx: &mut ObjectiveContext<'_>) {
        let scope = ctx.scope;
        let child = &mut self.children[index];
        if !child.on_failed(scope, ctx.services) {
            return;
        }
        child.release(scope, ctx.services);
        self.failed += 1;
        let response = scope
            .asset
            .graph
            .node(child.node())
            .map(|n| n.settings.failure_response)
            .unwrap_or_default();
        debug!(sequence = %ctx.id(), response = ?response, "Sequence child failed");

        match response {
            FailureResponse::FailQuest => self.finish(false, ctx),
            FailureResponse::ContinueToNextObjective => match self.mode {
                SequenceMode::Sequential => self.advance_sequential(ctx),
                SequenceMode::Parallel => {
                    if self.outstanding() == 0 {
                        self.finish(self.completed > 0, ctx);
                    }
                }
            },
            FailureResponse::RestartQuest => {
                info!(sequence = %ctx.id(), "Restarting sequence");
                self.run(ctx);
            }
        }
    }
}

impl Objective for SequenceObjective {
    fn execute(&mut self, ctx: &mut ObjectiveContext<'_>) {
        self.run(ctx);
    }

    fn pause(&mut self, ctx: &mut ObjectiveContext<'_>) {
        let scope = ctx.scope;
        for child in self.children.iter_mut().filter(|c| c.is_bound()) {
            child.pause(scope, ctx.services);
        }
    }

    fn resume(&mut self, ctx: &mut ObjectiveContext<'_>) {
        let scope = ctx.scope;
        for child in self.children.iter_mut().filter(|c| c.is_bound()) {
            child.resume(scope, ctx.services);
        }
    }

    fn mark_tracked(&mut self, tracked: bool, ctx: &mut ObjectiveContext<'_>) {
        self.tracked = tracked;
        let scope = ctx.scope;
        for child in self.children.iter_mut().filter(|c| c.is_bound()) {
            child.mark_tracked(tracked, scope, ctx.services);
        }
    }

    fn cleanup(&mut self, ctx: &mut ObjectiveContext<'_>) {
        self.release_children(ctx);
    }

    fn tick(&mut self, dt: Duration, ctx: &mut ObjectiveContext<'_>) {
        let scope = ctx.scope;
        for child in self.children.iter_mut() {
            child.tick(dt, scope, ctx.services);
        }
    }

    fn route_signal(&mut self, signal: &ObjectiveSignal, ctx: &mut ObjectiveContext<'_>) -> bool {
        if let Some(index) = self.children.iter().position(|c| c.id() == signal.source) {
            if self.outcome.is_some() || !self.children[index].accepts(Listener::Sequence) {
                return false;
            }
            match signal.kind {
                SignalKind::Completed => self.on_child_completed(index, ctx),
                SignalKind::Failed => self.on_child_failed(index, ctx),
                SignalKind::Progress { current, max } => {
                    self.children[index].on_progress(current, max)
                }
            }
            return true;
        }

        let scope = ctx.scope;
        self.children
            .iter_mut()
            .any(|child| child.route_signal(signal, scope, ctx.services))
    }

    fn children(&self) -> Vec<&ObjectiveRuntime> {
        self.children.iter().collect()
    }

    fn progress(&self) -> Option<f32> {
        Some(self.sequence_progress())
    }

    fn name(&self) -> &str {
        "Sequence"
    }

    fn description(&self) -> &str {
        "Runs a chain of objectives in order or all at once"
    }

    fn category(&self) -> &str {
        "Flow"
    }
}

impl std::fmt::Debug for SequenceObjective {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SequenceObjective")
            .field("mode", &self.mode)
            .field("children", &self.children.len())
            .field("completed", &self.completed)
            .field("failed", &self.failed)
            .field("outcome", &self.outcome)
            .finish()
    }
}
