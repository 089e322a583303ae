//! Sub-quest objective - runs a whole nested quest as one objective.
//!
//! The nested runtime is owned by the objective and never registered with
//! the subsystem, so it does not show up in quest enumeration. Its signals
//! travel through the shared queue like any other and reach it through
//! [`Objective::route_signal`].

use std::sync::Arc;
use std::time::Duration;

use quest_graph::{
    QuestAsset, SubQuestCompletion, SubQuestFailure, SubQuestSettings, SubQuestTracking,
};
use tracing::{debug, info, warn};

use crate::objective::{Objective, ObjectiveContext, ObjectiveRuntime, ObjectiveSignal};
use crate::quest::{QuestRuntime, QuestStatus};
use crate::services::QuestLifecycleEvent;

pub struct SubQuestObjective {
    settings: SubQuestSettings,
    asset: Option<Arc<QuestAsset>>,
    runtime: Option<QuestRuntime>,
    restarts: u32,
    max_attempts: u32,
    resolved: bool,
    parent_tracked: bool,
    warned_index: bool,
}

impl SubQuestObjective {
    pub fn new(settings: SubQuestSettings) -> Self {
        let max_attempts = settings.max_attempts.max(1);
        Self {
            settings,
            asset: None,
            runtime: None,
            restarts: 0,
            max_attempts,
            resolved: false,
            parent_tracked: false,
            warned_index: false,
        }
    }

    pub fn settings(&self) -> &SubQuestSettings {
        &self.settings
    }

    /// The nested quest, while it runs.
    pub fn runtime(&self) -> Option<&QuestRuntime> {
        self.runtime.as_ref()
    }

    /// Restarts performed since the last fresh execute.
    pub fn restart_attempts(&self) -> u32 {
        self.restarts
    }

    pub fn sub_quest_progress(&self) -> f32 {
        self.runtime.as_ref().map_or(0.0, QuestRuntime::progress)
    }

    pub fn current_sub_quest_objective_label(&self) -> Option<String> {
        let runtime = self.runtime.as_ref()?;
        let node = runtime.current_objective()?.node();
        runtime
            .asset()
            .graph
            .node(node)
            .map(|n| n.label().to_string())
    }

    /// Mark the nested quest completed, resolving this objective if it waits for that.
    pub fn force_complete_sub_quest(&mut self, ctx: &mut ObjectiveContext<'_>) {
        let Some(runtime) = self.runtime.as_mut() else {
            warn!(objective = %ctx.id(), "No sub-quest running to complete");
            return;
        };
        info!(objective = %ctx.id(), quest = %runtime.asset_id(), "Force completing sub-quest");
        runtime.mark_complete(ctx.services);
        self.reconcile(ctx);
    }

    fn wants_tracking(&self) -> bool {
        match self.settings.tracking {
            SubQuestTracking::NoTracking => false,
            SubQuestTracking::TrackWithParent => self.parent_tracked,
            SubQuestTracking::AlwaysTrack => true,
        }
    }

    fn apply_tracking(&mut self, ctx: &mut ObjectiveContext<'_>) {
        let wanted = self.wants_tracking();
        let Some(runtime) = self.runtime.as_mut() else {
            return;
        };
        if runtime.is_tracked() == wanted {
            return;
        }
        let changed = if wanted {
            runtime.track(ctx.services)
        } else {
            runtime.untrack(ctx.services);
            true
        };
        if changed {
            ctx.services
                .lifecycle
                .push(QuestLifecycleEvent::SubQuestTrackingChanged {
                    quest: runtime.asset_id(),
                    tracked: wanted,
                });
        }
    }

    fn launch(&mut self, ctx: &mut ObjectiveContext<'_>) {
        let Some(asset) = self.asset.clone() else {
            return;
        };
        let world = if self.settings.inherit_world_context {
            ctx.scope.world.clone()
        } else {
            None
        };

        let mut runtime = QuestRuntime::nested(asset, world, ctx.scope);
        runtime.initialize(ctx.services, false);
        runtime.start(ctx.services);
        debug!(
            objective = %ctx.id(),
            quest = %runtime.asset_id(),
            attempt = self.restarts + 1,
            "Sub-quest launched"
        );
        self.runtime = Some(runtime);
        self.apply_tracking(ctx);
        self.reconcile(ctx);
    }

    fn teardown(&mut self, ctx: &mut ObjectiveContext<'_>) {
        if let Some(mut runtime) = self.runtime.take() {
            if runtime.is_tracked() {
                ctx.services
                    .lifecycle
                    .push(QuestLifecycleEvent::SubQuestTrackingChanged {
                        quest: runtime.asset_id(),
                        tracked: false,
                    });
            }
            runtime.uninitialize(ctx.services);
        }
    }

    /// Start the nested quest over. Refuses, failing this objective, once
    /// the attempt budget is spent.
    fn restart_sub_quest(&mut self, ctx: &mut ObjectiveContext<'_>) -> bool {
        if self.restarts + 1 >= self.max_attempts {
            warn!(
                objective = %ctx.id(),
                attempts = self.restarts + 1,
                "Sub-quest out of attempts, failing"
            );
            self.resolved = true;
            ctx.fail();
            return false;
        }
        self.restarts += 1;
        info!(objective = %ctx.id(), restarts = self.restarts, "Restarting sub-quest");
        self.teardown(ctx);
        self.launch(ctx);
        true
    }

    /// Turn the nested quest's state into this objective's outcome.
    fn reconcile(&mut self, ctx: &mut ObjectiveContext<'_>) {
        if self.resolved {
            return;
        }
        let Some(runtime) = self.runtime.as_ref() else {
            return;
        };

        if self.settings.completion == SubQuestCompletion::OnSpecificObjective {
            let index = self.settings.specific_objective_index;
            match runtime.objectives().get(index) {
                Some(objective) if objective.is_completed() => {
                    self.resolved = true;
                    ctx.complete();
                    return;
                }
                None if !self.warned_index => {
                    warn!(
                        objective = %ctx.id(),
                        index,
                        count = runtime.objectives().len(),
                        "Sub-quest objective index out of range"
                    );
                    self.warned_index = true;
                }
                _ => {}
            }
        }

        match runtime.status() {
            QuestStatus::Completed => {
                if self.settings.completion == SubQuestCompletion::OnSubQuestComplete {
                    self.resolved = true;
                    ctx.complete();
                }
            }
            QuestStatus::Failed => match self.settings.failure {
                SubQuestFailure::FailWithSubQuest => {
                    self.resolved = true;
                    ctx.fail();
                }
                SubQuestFailure::RestartSubQuest => {
                    self.restart_sub_quest(ctx);
                }
                SubQuestFailure::IgnoreFailure => {
                    debug!(objective = %ctx.id(), "Sub-quest failed, waiting for external resolution");
                }
            },
            _ => {}
        }
    }
}

impl Objective for SubQuestObjective {
    fn execute(&mut self, ctx: &mut ObjectiveContext<'_>) {
        self.teardown(ctx);
        self.restarts = 0;
        self.resolved = false;
        self.warned_index = false;
        self.max_attempts = self
            .settings
            .clamped_max_attempts(ctx.config().max_sub_quest_attempts_cap);

        let Some(id) = self.settings.quest else {
            warn!(objective = %ctx.id(), "Sub-quest objective has no quest set");
            ctx.fail();
            return;
        };
        let Some(asset) = ctx.services.assets.get(id) else {
            warn!(objective = %ctx.id(), quest = %id, "Sub-quest asset is not registered");
            ctx.fail();
            return;
        };
        if ctx.scope.is_running(asset.id) {
            warn!(
                objective = %ctx.id(),
                quest = %id,
                "Sub-quest would run a quest it is already nested in, failing"
            );
            ctx.fail();
            return;
        }

        self.asset = Some(asset);
        self.launch(ctx);
    }

    fn pause(&mut self, ctx: &mut ObjectiveContext<'_>) {
        if let Some(runtime) = self.runtime.as_mut() {
            runtime.pause(ctx.services);
        }
    }

    fn resume(&mut self, ctx: &mut ObjectiveContext<'_>) {
        if let Some(runtime) = self.runtime.as_mut() {
            runtime.resume(ctx.services);
        }
    }

    fn mark_tracked(&mut self, tracked: bool, ctx: &mut ObjectiveContext<'_>) {
        self.parent_tracked = tracked;
        self.apply_tracking(ctx);
    }

    fn cleanup(&mut self, ctx: &mut ObjectiveContext<'_>) {
        self.teardown(ctx);
    }

    fn tick(&mut self, dt: Duration, ctx: &mut ObjectiveContext<'_>) {
        if let Some(runtime) = self.runtime.as_mut() {
            runtime.tick(dt, ctx.services);
        }
    }

    fn route_signal(&mut self, signal: &ObjectiveSignal, ctx: &mut ObjectiveContext<'_>) -> bool {
        let Some(runtime) = self.runtime.as_mut() else {
            return false;
        };
        if !runtime.handle_signal(signal, ctx.services) {
            return false;
        }
        self.reconcile(ctx);
        true
    }

    fn children(&self) -> Vec<&ObjectiveRuntime> {
        self.runtime
            .as_ref()
            .map(QuestRuntime::active_wrappers)
            .unwrap_or_default()
    }

    fn progress(&self) -> Option<f32> {
        self.runtime.as_ref().map(QuestRuntime::progress)
    }

    fn can_generate_optionals(&self) -> bool {
        false
    }

    fn name(&self) -> &str {
        "SubQuest"
    }

    fn description(&self) -> &str {
        "Runs another quest as a single objective"
    }

    fn category(&self) -> &str {
        "Flow"
    }
}

impl std::fmt::Debug for SubQuestObjective {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubQuestObjective")
            .field("quest", &self.settings.quest)
            .field("running", &self.runtime.is_some())
            .field("restarts", &self.restarts)
            .field("max_attempts", &self.max_attempts)
            .field("resolved", &self.resolved)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objective::ObjectiveRuntimeId;
    use crate::quest::QuestScope;
    use crate::services::QuestServices;
    use crate::testing::{chain_asset, executed, pump, recording_services, started};
    use quest_graph::{NodeId, ObjectiveNode, QuestAssetId};

    /// Parent quest: entry -> sub-quest -> "After".
    fn parent_asset(settings: SubQuestSettings) -> (QuestAsset, NodeId) {
        let mut asset = QuestAsset::new("Parent");
        let entry = asset.add_node(ObjectiveNode::entry());
        let sub = asset.add_node(ObjectiveNode::sub_quest(settings).with_label("Errand"));
        let after = asset.add_node(ObjectiveNode::external("After"));
        asset.graph.link(entry, sub).unwrap();
        asset.graph.link(sub, after).unwrap();
        (asset, sub)
    }

    fn register_child(services: &mut QuestServices, labels: &[&str]) -> QuestAssetId {
        let (child, _) = chain_asset(labels);
        services.assets_mut().register(child)
    }

    fn nested(runtime: &QuestRuntime) -> ObjectiveRuntimeId {
        runtime
            .current_objective()
            .unwrap()
            .behavior()
            .children()
            .first()
            .map(|w| w.id())
            .unwrap()
    }

    fn current_label(runtime: &QuestRuntime) -> String {
        let node = runtime.current_objective().unwrap().node();
        runtime.asset().graph.node(node).unwrap().label().to_string()
    }

    #[test]
    fn test_completes_with_sub_quest() {
        let (mut services, log) = recording_services();
        let child = register_child(&mut services, &["Inner1", "Inner2"]);
        let (asset, sub) = parent_asset(SubQuestSettings::for_quest(child));
        let mut runtime = started(asset, &mut services);

        assert_eq!(executed(&log), vec!["execute:Inner1"]);
        assert!(runtime.find_active_by_node(sub).is_some());

        services.push_signal(ObjectiveSignal::completed(nested(&runtime)));
        pump(&mut runtime, &mut services);
        services.push_signal(ObjectiveSignal::completed(nested(&runtime)));
        pump(&mut runtime, &mut services);

        assert_eq!(current_label(&runtime), "After");
        assert!(log.borrow().contains(&"cleanup:Inner2".to_string()));
    }

    #[test]
    fn test_restart_cap_fails_outward() {
        let (mut services, log) = recording_services();
        let child = register_child(&mut services, &["Inner"]);
        let settings = SubQuestSettings {
            failure: SubQuestFailure::RestartSubQuest,
            max_attempts: 2,
            ..SubQuestSettings::for_quest(child)
        };
        let (asset, _) = parent_asset(settings);
        let mut runtime = started(asset, &mut services);

        services.push_signal(ObjectiveSignal::failed(nested(&runtime)));
        pump(&mut runtime, &mut services);
        assert_eq!(runtime.status(), QuestStatus::InProgress);
        assert_eq!(executed(&log), vec!["execute:Inner", "execute:Inner"]);

        services.push_signal(ObjectiveSignal::failed(nested(&runtime)));
        pump(&mut runtime, &mut services);
        assert_eq!(runtime.status(), QuestStatus::Failed);
        assert_eq!(executed(&log).len(), 2);
    }

    #[test]
    fn test_specific_objective_completion() {
        let (mut services, _log) = recording_services();
        let child = register_child(&mut services, &["First", "Second"]);
        let settings = SubQuestSettings {
            completion: SubQuestCompletion::OnSpecificObjective,
            specific_objective_index: 0,
            ..SubQuestSettings::for_quest(child)
        };
        let (asset, _) = parent_asset(settings);
        let mut runtime = started(asset, &mut services);

        services.push_signal(ObjectiveSignal::completed(nested(&runtime)));
        pump(&mut runtime, &mut services);
        assert_eq!(current_label(&runtime), "After");
    }

    #[test]
    fn test_ignored_failure_waits() {
        let (mut services, _log) = recording_services();
        let child = register_child(&mut services, &["Inner"]);
        let settings = SubQuestSettings {
            failure: SubQuestFailure::IgnoreFailure,
            ..SubQuestSettings::for_quest(child)
        };
        let (asset, _) = parent_asset(settings);
        let mut runtime = started(asset, &mut services);

        services.push_signal(ObjectiveSignal::failed(nested(&runtime)));
        pump(&mut runtime, &mut services);
        assert_eq!(runtime.status(), QuestStatus::InProgress);
        assert_eq!(current_label(&runtime), "Errand");
    }

    #[test]
    fn test_missing_asset_fails() {
        let (mut services, _log) = recording_services();
        let (asset, _) = parent_asset(SubQuestSettings::for_quest(QuestAssetId::new()));
        let runtime = started(asset, &mut services);
        assert_eq!(runtime.status(), QuestStatus::Failed);
    }

    #[test]
    fn test_mutually_nested_quests_fail_instead_of_recursing() {
        let (mut services, _log) = recording_services();
        let mut outer = QuestAsset::new("Outer");
        let mut inner = QuestAsset::new("Inner");

        let entry = inner.add_node(ObjectiveNode::entry());
        let back = inner.add_node(ObjectiveNode::sub_quest(SubQuestSettings::for_quest(outer.id)));
        inner.graph.link(entry, back).unwrap();
        let inner_id = services.assets_mut().register(inner);

        let entry = outer.add_node(ObjectiveNode::entry());
        let down = outer.add_node(ObjectiveNode::sub_quest(SubQuestSettings::for_quest(inner_id)));
        outer.graph.link(entry, down).unwrap();
        services.assets_mut().register(outer.clone());

        let runtime = started(outer, &mut services);
        assert_eq!(runtime.status(), QuestStatus::Failed);
        assert!(runtime.find_active_by_node(down).is_none());
    }

    #[test]
    fn test_nested_lineage() {
        let outer = Arc::new(QuestAsset::new("Outer"));
        let inner = Arc::new(QuestAsset::new("Inner"));
        let parent = QuestRuntime::new(outer.clone(), None);
        let child = QuestRuntime::nested(inner.clone(), None, parent.scope());

        assert_eq!(parent.scope().lineage(), &[outer.id]);
        assert_eq!(child.scope().lineage(), &[inner.id, outer.id]);
        assert!(child.scope().is_running(outer.id));
        assert!(!parent.scope().is_running(inner.id));
    }

    #[test]
    fn test_always_track_records_lifecycle() {
        let (mut services, _log) = recording_services();
        let child = register_child(&mut services, &["Inner"]);
        let settings = SubQuestSettings {
            tracking: SubQuestTracking::AlwaysTrack,
            ..SubQuestSettings::for_quest(child)
        };
        let (asset, _) = parent_asset(settings);
        let _runtime = started(asset, &mut services);

        assert!(services.lifecycle.contains(&QuestLifecycleEvent::SubQuestTrackingChanged {
            quest: child,
            tracked: true,
        }));
    }

    #[test]
    fn test_force_complete() {
        let (mut services, _log) = recording_services();
        let child = register_child(&mut services, &["Inner"]);
        let asset = Arc::new(QuestAsset::new("Host"));
        let scope = QuestScope {
            instance: crate::quest::QuestInstanceId::new(),
            lineage: vec![asset.id],
            asset,
            world: None,
        };
        let id = ObjectiveRuntimeId::new();
        let mut objective = SubQuestObjective::new(SubQuestSettings::for_quest(child));

        let mut ctx = ObjectiveContext::new(id, NodeId::new(), &scope, &mut services);
        objective.execute(&mut ctx);
        assert_eq!(objective.current_sub_quest_objective_label().as_deref(), Some("Inner"));

        objective.force_complete_sub_quest(&mut ctx);
        assert_eq!(objective.runtime().unwrap().status(), QuestStatus::Completed);
        assert!(services.signals.contains(&ObjectiveSignal::completed(id)));

        let mut ctx = ObjectiveContext::new(id, NodeId::new(), &scope, &mut services);
        objective.cleanup(&mut ctx);
        assert!(objective.runtime().is_none());
    }
}
