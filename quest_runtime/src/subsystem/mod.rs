//! Quest Subsystem - registry of running quests and the entry point hosts use.
//!
//! Every public operation that can make an objective signal ends by pumping
//! the signal queue, so by the time it returns the quests have reacted to
//! everything it caused.

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;

use quest_graph::{NodeId, ObjectiveNode, QuestAssetId, QuestType};
use tracing::{debug, info, warn};

use crate::config::QuestConfig;
use crate::error::Result;
use crate::objective::{Objective, ObjectiveRuntime, ObjectiveRuntimeId, ObjectiveSignal};
use crate::quest::{OptionalObjectiveRecord, QuestRuntime, QuestStatus};
use crate::services::{
    PlayerContext, QuestEventType, QuestLifecycleEvent, QuestReceiver, QuestServices, QuestTag,
    QuestUi, RewardGranter, WorldContext,
};

/// Called once a queued quest load has been attempted.
pub type LoadCallback = Box<dyn FnOnce(bool)>;

struct PendingLoad {
    asset: QuestAssetId,
    track: bool,
    world: Option<WorldContext>,
    on_done: LoadCallback,
}

pub struct QuestSubsystem {
    services: QuestServices,
    quests: HashMap<QuestAssetId, QuestRuntime>,
    /// Registration order.
    order: Vec<QuestAssetId>,
    tracked: Option<QuestAssetId>,
    pending: VecDeque<PendingLoad>,
}

impl QuestSubsystem {
    pub fn new(config: QuestConfig) -> Self {
        Self {
            services: QuestServices::new(config),
            quests: HashMap::new(),
            order: Vec::new(),
            tracked: None,
            pending: VecDeque::new(),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(QuestConfig::default())
    }

    /// Build a subsystem from a TOML config file.
    pub fn from_config_file(path: &Path) -> Result<Self> {
        Ok(Self::new(QuestConfig::load(path)?))
    }

    pub fn config(&self) -> &QuestConfig {
        self.services.config()
    }

    pub fn services(&self) -> &QuestServices {
        &self.services
    }

    pub fn services_mut(&mut self) -> &mut QuestServices {
        &mut self.services
    }

    pub fn register_asset(&mut self, asset: quest_graph::QuestAsset) -> QuestAssetId {
        self.services.assets_mut().register(asset)
    }

    pub fn set_world_context(&mut self, world: WorldContext) {
        self.services.set_world_context(world);
    }

    pub fn set_player_context(&mut self, player: PlayerContext) {
        self.services.set_player_context(player);
    }

    pub fn set_ui(&mut self, ui: Box<dyn QuestUi>) {
        self.services.set_ui(ui);
    }

    pub fn set_reward_granter(&mut self, granter: Box<dyn RewardGranter>) {
        self.services.set_reward_granter(granter);
    }

    /// Register behavior for a node type. Returns true if it replaced an earlier one.
    pub fn register_objective_type<F>(&mut self, type_tag: impl Into<String>, constructor: F) -> bool
    where
        F: Fn(&ObjectiveNode) -> Box<dyn Objective> + 'static,
    {
        self.services.factory_mut().register(type_tag, constructor)
    }

    /// Start a registered quest asset.
    ///
    /// Falls back to the subsystem's world context when `world` is None and
    /// returns false if neither exists, if the asset is unknown, or if the
    /// quest is already running.
    pub fn add_quest(&mut self, asset: QuestAssetId, track: bool, world: Option<WorldContext>) -> bool {
        let definition = match self.services.assets().require(asset) {
            Ok(definition) => definition,
            Err(e) => {
                warn!(error = %e, "Cannot add quest");
                return false;
            }
        };
        let Some(world) = world.or_else(|| self.services.world_context().cloned()) else {
            warn!(quest = %definition.title, "Cannot add quest without a world context");
            return false;
        };

        if let Some(existing) = self.quests.get(&asset) {
            let replaceable = match existing.status() {
                QuestStatus::Failed => true,
                QuestStatus::Completed => definition.repeatable,
                _ => false,
            };
            if !replaceable {
                warn!(quest = %definition.title, status = ?existing.status(), "Quest is already registered");
                return false;
            }
            debug!(quest = %definition.title, "Replacing finished quest");
            self.remove_quest(asset);
        }

        let mut runtime = QuestRuntime::new(definition, Some(world));
        runtime.initialize(&mut self.services, false);
        info!(quest = %runtime.asset().title, instance = %runtime.instance(), "Quest added");
        self.quests.insert(asset, runtime);
        self.order.push(asset);
        self.services.lifecycle.push(QuestLifecycleEvent::QuestAdded(asset));

        if let Some(runtime) = self.quests.get_mut(&asset) {
            runtime.start(&mut self.services);
        }
        if track {
            self.track_quest(asset);
        }
        self.services.lifecycle.push(QuestLifecycleEvent::QuestChanged(asset));
        self.process_signals();
        true
    }

    /// Queue a quest load. The next [`Self::update`] performs it and reports the result.
    pub fn add_quest_async<F>(&mut self, asset: QuestAssetId, track: bool, world: Option<WorldContext>, on_done: F)
    where
        F: FnOnce(bool) + 'static,
    {
        debug!(quest = %asset, "Quest load queued");
        self.pending.push_back(PendingLoad {
            asset,
            track,
            world,
            on_done: Box::new(on_done),
        });
    }

    pub fn pending_loads(&self) -> usize {
        self.pending.len()
    }

    /// Tear down a quest and forget it.
    pub fn remove_quest(&mut self, asset: QuestAssetId) -> bool {
        let Some(mut runtime) = self.quests.remove(&asset) else {
            return false;
        };
        self.order.retain(|id| *id != asset);
        if self.tracked == Some(asset) {
            self.tracked = None;
            self.services.lifecycle.push(QuestLifecycleEvent::QuestUntracked(asset));
        }
        runtime.uninitialize(&mut self.services);
        self.services.lifecycle.push(QuestLifecycleEvent::QuestRemoved(asset));
        info!(quest = %runtime.asset().title, "Quest removed");
        true
    }

    /// Tear down every quest and drop all receivers and queued work.
    pub fn reset_all_quests(&mut self) {
        for asset in std::mem::take(&mut self.order) {
            if let Some(mut runtime) = self.quests.remove(&asset) {
                runtime.uninitialize(&mut self.services);
            }
        }
        self.quests.clear();
        self.tracked = None;
        self.pending.clear();
        self.services.signals.clear();
        self.services.outcomes.clear();
        self.services.receivers_mut().clear();
        info!("All quests reset");
    }

    /// Show `asset` on screen, replacing whichever quest was tracked before.
    pub fn track_quest(&mut self, asset: QuestAssetId) -> bool {
        if !self.quests.contains_key(&asset) {
            warn!(quest = %asset, "Cannot track an unregistered quest");
            return false;
        }
        if self.tracked == Some(asset) {
            if let Some(runtime) = self.quests.get(&asset) {
                runtime.refresh_ui(&mut self.services);
            }
            return true;
        }

        if let Some(previous) = self.tracked.take() {
            if let Some(runtime) = self.quests.get_mut(&previous) {
                runtime.untrack(&mut self.services);
            }
            self.services.lifecycle.push(QuestLifecycleEvent::QuestUntracked(previous));
        }

        let tracked = self
            .quests
            .get_mut(&asset)
            .is_some_and(|runtime| runtime.track(&mut self.services));
        if tracked {
            self.tracked = Some(asset);
            self.services.lifecycle.push(QuestLifecycleEvent::QuestTracked(asset));
        }
        tracked
    }

    pub fn untrack_quest(&mut self, asset: QuestAssetId) -> bool {
        if self.tracked != Some(asset) {
            return false;
        }
        if let Some(runtime) = self.quests.get_mut(&asset) {
            runtime.untrack(&mut self.services);
        }
        self.tracked = None;
        self.services.lifecycle.push(QuestLifecycleEvent::QuestUntracked(asset));
        true
    }

    fn is_active(&self, objective: ObjectiveRuntimeId) -> bool {
        self.quests
            .values()
            .any(|runtime| runtime.find_active(objective).is_some())
    }

    fn signal_active(&mut self, signal: ObjectiveSignal) -> bool {
        if !self.is_active(signal.source) {
            warn!(objective = %signal.source, "No running objective with this id");
            return false;
        }
        self.services.push_signal(signal);
        self.process_signals();
        true
    }

    /// Complete a running objective from outside.
    pub fn complete_objective(&mut self, objective: ObjectiveRuntimeId) -> bool {
        self.signal_active(ObjectiveSignal::completed(objective))
    }

    /// Fail a running objective from outside.
    pub fn fail_objective(&mut self, objective: ObjectiveRuntimeId) -> bool {
        self.signal_active(ObjectiveSignal::failed(objective))
    }

    pub fn report_progress(&mut self, objective: ObjectiveRuntimeId, current: f32, max: f32) -> bool {
        self.signal_active(ObjectiveSignal::progress(objective, current, max))
    }

    pub fn pause_quest(&mut self, asset: QuestAssetId) -> bool {
        let Some(runtime) = self.quests.get_mut(&asset) else {
            return false;
        };
        runtime.pause(&mut self.services);
        self.process_signals();
        true
    }

    pub fn resume_quest(&mut self, asset: QuestAssetId) -> bool {
        let Some(runtime) = self.quests.get_mut(&asset) else {
            return false;
        };
        runtime.resume(&mut self.services);
        self.process_signals();
        true
    }

    /// Lift a blocking optional's hold on the quest's current objective.
    pub fn unblock_objective(&mut self, asset: QuestAssetId) -> bool {
        let unblocked = self
            .quests
            .get_mut(&asset)
            .is_some_and(|runtime| runtime.unblock_current(&mut self.services));
        self.process_signals();
        unblocked
    }

    /// Host time step: performs queued loads, ticks every quest, and pumps signals.
    pub fn update(&mut self, dt: Duration) {
        while let Some(load) = self.pending.pop_front() {
            let added = self.add_quest(load.asset, load.track, load.world);
            (load.on_done)(added);
        }

        for asset in &self.order {
            if let Some(runtime) = self.quests.get_mut(asset) {
                runtime.tick(dt, &mut self.services);
            }
        }
        self.process_signals();
    }

    pub fn start_optional_objective(&mut self, asset: QuestAssetId, node: NodeId) -> bool {
        let started = self
            .quests
            .get_mut(&asset)
            .is_some_and(|runtime| runtime.start_optional_objective(node, &mut self.services));
        self.process_signals();
        started
    }

    pub fn stop_optional_objective(&mut self, asset: QuestAssetId, optional: ObjectiveRuntimeId) -> bool {
        let stopped = self
            .quests
            .get_mut(&asset)
            .is_some_and(|runtime| runtime.stop_optional_objective(optional, &mut self.services));
        self.process_signals();
        stopped
    }

    pub fn optional_objectives(&self, asset: QuestAssetId) -> &[OptionalObjectiveRecord] {
        self.quests
            .get(&asset)
            .map(QuestRuntime::optional_objectives)
            .unwrap_or_default()
    }

    /// Drain the signal queue, routing each signal to the quest that owns its source.
    ///
    /// Returns how many signals were handled. Once the configured per-pump
    /// limit is reached the rest stay queued for the next pump.
    pub fn process_signals(&mut self) -> usize {
        self.services.pump = self.services.pump.wrapping_add(1);
        self.drain_outcomes();
        let limit = self.services.config.max_signals_per_pump;
        let mut handled = 0;

        while handled < limit {
            let Some(signal) = self.services.pop_signal() else {
                break;
            };
            handled += 1;

            let mut delivered = false;
            for asset in &self.order {
                if let Some(runtime) = self.quests.get_mut(asset) {
                    if runtime.handle_signal(&signal, &mut self.services) {
                        delivered = true;
                        break;
                    }
                }
            }
            if !delivered {
                debug!(objective = %signal.source, kind = ?signal.kind, "Dropped signal from an unbound objective");
            }
            self.drain_outcomes();
        }

        if self.services.pending_signals() > 0 {
            warn!(
                deferred = self.services.pending_signals(),
                limit,
                "Signal limit reached, deferring the rest to the next pump"
            );
        }
        handled
    }

    fn drain_outcomes(&mut self) {
        for outcome in std::mem::take(&mut self.services.outcomes) {
            let registered = self
                .quests
                .get(&outcome.asset)
                .is_some_and(|runtime| runtime.instance() == outcome.instance);
            if !registered {
                continue;
            }
            if self.tracked == Some(outcome.asset) {
                self.tracked = None;
                self.services
                    .lifecycle
                    .push(QuestLifecycleEvent::QuestUntracked(outcome.asset));
            }
            info!(quest = %outcome.asset, status = ?outcome.status, "Quest finished");
            self.services
                .lifecycle
                .push(QuestLifecycleEvent::QuestChanged(outcome.asset));
        }
    }

    /// Lifecycle events recorded since the last call.
    pub fn take_lifecycle_events(&mut self) -> Vec<QuestLifecycleEvent> {
        std::mem::take(&mut self.services.lifecycle)
    }

    pub fn quest_status(&self, asset: QuestAssetId) -> Option<QuestStatus> {
        self.quests.get(&asset).map(QuestRuntime::status)
    }

    /// Registered quests in registration order.
    pub fn registered_quests(&self) -> Vec<QuestAssetId> {
        self.order.clone()
    }

    pub fn quests_with_status(&self, status: QuestStatus) -> Vec<QuestAssetId> {
        self.order
            .iter()
            .copied()
            .filter(|id| self.quest_status(*id) == Some(status))
            .collect()
    }

    pub fn quests_of_type(&self, quest_type: QuestType) -> Vec<QuestAssetId> {
        self.order
            .iter()
            .copied()
            .filter(|id| {
                self.quests
                    .get(id)
                    .is_some_and(|q| q.asset().quest_type == quest_type)
            })
            .collect()
    }

    pub fn tracked_quest(&self) -> Option<QuestAssetId> {
        self.tracked
    }

    pub fn runtime(&self, asset: QuestAssetId) -> Option<&QuestRuntime> {
        self.quests.get(&asset)
    }

    pub fn current_objective(&self, asset: QuestAssetId) -> Option<&ObjectiveRuntime> {
        self.quests.get(&asset)?.current_objective()
    }

    pub fn next_objective(&self, asset: QuestAssetId) -> Option<&ObjectiveRuntime> {
        self.quests.get(&asset)?.next_objective()
    }

    pub fn objectives(&self, asset: QuestAssetId) -> &[ObjectiveRuntime] {
        self.quests
            .get(&asset)
            .map(QuestRuntime::objectives)
            .unwrap_or_default()
    }

    pub fn are_all_objectives_completed(&self, asset: QuestAssetId) -> bool {
        self.quests
            .get(&asset)
            .is_some_and(QuestRuntime::are_all_objectives_completed)
    }

    /// Running wrapper for `node`, searching optionals and composite children too.
    pub fn find_objective(&self, asset: QuestAssetId, node: NodeId) -> Option<&ObjectiveRuntime> {
        self.quests.get(&asset)?.find_active_by_node(node)
    }

    pub fn register_event_receiver<R: QuestReceiver + 'static>(&mut self, receiver: &Rc<R>) -> bool {
        self.services.receivers_mut().register_event(receiver)
    }

    pub fn unregister_event_receiver<R: QuestReceiver + 'static>(&mut self, receiver: &Rc<R>) -> bool {
        self.services.receivers_mut().unregister_event(receiver)
    }

    pub fn register_tag_receiver<R: QuestReceiver + 'static>(&mut self, receiver: &Rc<R>) -> bool {
        self.services.receivers_mut().register_tag(receiver)
    }

    pub fn unregister_tag_receiver<R: QuestReceiver + 'static>(&mut self, receiver: &Rc<R>) -> bool {
        self.services.receivers_mut().unregister_tag(receiver)
    }

    pub fn clear_event_receivers(&mut self) {
        self.services.receivers_mut().clear_events();
    }

    pub fn clear_tag_receivers(&mut self) {
        self.services.receivers_mut().clear_tags();
    }

    pub fn broadcast_event(&mut self, quest: QuestAssetId, event: QuestEventType) {
        self.services.broadcast_event(quest, event);
    }

    pub fn broadcast_tag(&mut self, quest: QuestAssetId, tag: &QuestTag) {
        self.services.broadcast_tag(quest, tag);
    }
}

impl Drop for QuestSubsystem {
    fn drop(&mut self) {
        if !self.quests.is_empty() {
            self.reset_all_quests();
        }
    }
}

impl std::fmt::Debug for QuestSubsystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuestSubsystem")
            .field("quests", &self.order.len())
            .field("tracked", &self.tracked)
            .field("pending", &self.pending.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objective::ObjectiveContext;
    use quest_graph::{FailureResponse, ObjectiveKind, QuestAsset};
    use std::cell::{Cell, RefCell};

    fn world() -> WorldContext {
        Rc::new("overworld".to_string())
    }

    fn chain(title: &str, labels: &[&str]) -> QuestAsset {
        let mut asset = QuestAsset::new(title);
        let mut previous = asset.add_node(ObjectiveNode::entry());
        for label in labels {
            let id = asset.add_node(ObjectiveNode::external(*label));
            asset.graph.link(previous, id).unwrap();
            previous = id;
        }
        asset
    }

    fn subsystem() -> QuestSubsystem {
        let mut subsystem = QuestSubsystem::with_defaults();
        subsystem.set_world_context(world());
        subsystem
    }

    fn complete_current(subsystem: &mut QuestSubsystem, asset: QuestAssetId) -> bool {
        let id = subsystem.current_objective(asset).unwrap().id();
        subsystem.complete_objective(id)
    }

    #[test]
    fn test_add_requires_known_asset_and_world() {
        let mut subsystem = QuestSubsystem::with_defaults();
        let id = subsystem.register_asset(chain("Fetch", &["A"]));

        assert!(!subsystem.add_quest(QuestAssetId::new(), false, Some(world())));
        assert!(!subsystem.add_quest(id, false, None));
        assert!(subsystem.add_quest(id, false, Some(world())));
        assert_eq!(subsystem.quest_status(id), Some(QuestStatus::InProgress));
    }

    #[test]
    fn test_duplicate_and_repeatable() {
        let mut subsystem = subsystem();
        let once = subsystem.register_asset(chain("Once", &["A"]));
        let again = subsystem.register_asset(chain("Again", &["A"]).repeatable());

        assert!(subsystem.add_quest(once, false, None));
        assert!(!subsystem.add_quest(once, false, None));

        assert!(complete_current(&mut subsystem, once));
        assert_eq!(subsystem.quest_status(once), Some(QuestStatus::Completed));
        assert!(!subsystem.add_quest(once, false, None));

        assert!(subsystem.add_quest(again, false, None));
        assert!(complete_current(&mut subsystem, again));
        assert!(subsystem.add_quest(again, false, None));
        assert_eq!(subsystem.quest_status(again), Some(QuestStatus::InProgress));
        assert_eq!(subsystem.registered_quests(), vec![once, again]);
    }

    #[test]
    fn test_tracking_switches_quests() {
        let mut subsystem = subsystem();
        let first = subsystem.register_asset(chain("First", &["A"]));
        let second = subsystem.register_asset(chain("Second", &["B"]));
        subsystem.add_quest(first, true, None);
        subsystem.add_quest(second, false, None);
        subsystem.take_lifecycle_events();

        assert_eq!(subsystem.tracked_quest(), Some(first));
        assert!(subsystem.track_quest(second));
        assert_eq!(subsystem.tracked_quest(), Some(second));
        assert!(!subsystem.runtime(first).unwrap().is_tracked());
        assert_eq!(
            subsystem.take_lifecycle_events(),
            vec![
                QuestLifecycleEvent::QuestUntracked(first),
                QuestLifecycleEvent::QuestTracked(second),
            ]
        );

        assert!(!subsystem.untrack_quest(first));
        assert!(subsystem.untrack_quest(second));
        assert_eq!(subsystem.tracked_quest(), None);
    }

    #[test]
    fn test_finished_quest_is_untracked() {
        let mut subsystem = subsystem();
        let id = subsystem.register_asset(chain("Short", &["A"]));
        subsystem.add_quest(id, true, None);
        subsystem.take_lifecycle_events();

        complete_current(&mut subsystem, id);
        assert_eq!(subsystem.tracked_quest(), None);
        assert_eq!(
            subsystem.take_lifecycle_events(),
            vec![
                QuestLifecycleEvent::QuestUntracked(id),
                QuestLifecycleEvent::QuestChanged(id),
            ]
        );
    }

    #[test]
    fn test_unknown_objective_is_rejected() {
        let mut subsystem = subsystem();
        assert!(!subsystem.complete_objective(ObjectiveRuntimeId::new()));
        assert!(!subsystem.fail_objective(ObjectiveRuntimeId::new()));
    }

    #[test]
    fn test_async_add_runs_on_update() {
        let mut subsystem = subsystem();
        let id = subsystem.register_asset(chain("Later", &["A"]));
        let results = Rc::new(RefCell::new(Vec::new()));

        let sink = results.clone();
        subsystem.add_quest_async(id, false, None, move |ok| sink.borrow_mut().push(ok));
        let sink = results.clone();
        subsystem.add_quest_async(QuestAssetId::new(), false, None, move |ok| sink.borrow_mut().push(ok));
        assert_eq!(subsystem.pending_loads(), 2);
        assert_eq!(subsystem.quest_status(id), None);

        subsystem.update(Duration::from_millis(16));
        assert_eq!(*results.borrow(), vec![true, false]);
        assert_eq!(subsystem.quest_status(id), Some(QuestStatus::InProgress));
    }

    #[test]
    fn test_signal_limit_defers_excess() {
        let config = QuestConfig {
            max_signals_per_pump: 2,
            ..QuestConfig::default()
        };
        let mut subsystem = QuestSubsystem::new(config);
        for _ in 0..5 {
            subsystem
                .services_mut()
                .push_signal(ObjectiveSignal::completed(ObjectiveRuntimeId::new()));
        }
        assert_eq!(subsystem.process_signals(), 2);
        assert_eq!(subsystem.services().pending_signals(), 3);
        assert_eq!(subsystem.process_signals(), 2);
        assert_eq!(subsystem.process_signals(), 1);
        assert_eq!(subsystem.services().pending_signals(), 0);
    }

    /// Fails the moment it runs while the shared switch is on.
    struct Trap {
        armed: Rc<Cell<bool>>,
    }

    impl Objective for Trap {
        fn execute(&mut self, ctx: &mut ObjectiveContext<'_>) {
            if self.armed.get() {
                ctx.fail();
            }
        }
    }

    #[test]
    fn test_restart_loop_fails_only_the_looping_quest() {
        let mut subsystem = subsystem();
        let armed = Rc::new(Cell::new(false));
        let switch = armed.clone();
        subsystem.register_objective_type("Trap", move |_| {
            Box::new(Trap {
                armed: switch.clone(),
            })
        });

        let mut looping = QuestAsset::new("Looping");
        let entry = looping.add_node(ObjectiveNode::entry());
        let trap = looping.add_node(
            ObjectiveNode::new(ObjectiveKind::custom("Trap"))
                .with_failure_response(FailureResponse::RestartQuest),
        );
        looping.graph.link(entry, trap).unwrap();
        let looping = subsystem.register_asset(looping);
        let healthy = subsystem.register_asset(chain("Healthy", &["A", "B"]));

        assert!(subsystem.add_quest(looping, false, None));
        assert!(subsystem.add_quest(healthy, false, None));

        armed.set(true);
        let trap_id = subsystem.current_objective(looping).unwrap().id();
        let healthy_id = subsystem.current_objective(healthy).unwrap().id();
        subsystem
            .services_mut()
            .push_signal(ObjectiveSignal::failed(trap_id));
        subsystem
            .services_mut()
            .push_signal(ObjectiveSignal::completed(healthy_id));
        subsystem.process_signals();

        assert_eq!(subsystem.quest_status(looping), Some(QuestStatus::Failed));
        assert_eq!(subsystem.services().pending_signals(), 0);
        let current = subsystem.current_objective(healthy).unwrap();
        assert_ne!(current.id(), healthy_id);
        assert!(subsystem.objectives(healthy)[0].is_completed());
    }

    #[test]
    fn test_restart_budget_is_per_pump() {
        let mut subsystem = subsystem();
        let mut asset = QuestAsset::new("Stubborn");
        let entry = asset.add_node(ObjectiveNode::entry());
        let step = asset.add_node(
            ObjectiveNode::external("Try").with_failure_response(FailureResponse::RestartQuest),
        );
        asset.graph.link(entry, step).unwrap();
        let quest = subsystem.register_asset(asset);
        subsystem.add_quest(quest, false, None);

        let cap = subsystem.config().max_quest_restarts_per_pump;
        for _ in 0..cap + 2 {
            let id = subsystem.current_objective(quest).unwrap().id();
            assert!(subsystem.fail_objective(id));
        }
        assert_eq!(subsystem.quest_status(quest), Some(QuestStatus::InProgress));
    }

    #[test]
    fn test_queries_by_status_and_type() {
        let mut subsystem = subsystem();
        let main = subsystem.register_asset(chain("Main", &["A"]));
        let side = subsystem.register_asset(chain("Side", &["A"]).with_type(QuestType::Side));
        subsystem.add_quest(main, false, None);
        subsystem.add_quest(side, false, None);
        complete_current(&mut subsystem, side);

        assert_eq!(subsystem.quests_with_status(QuestStatus::Completed), vec![side]);
        assert_eq!(subsystem.quests_with_status(QuestStatus::InProgress), vec![main]);
        assert_eq!(subsystem.quests_of_type(QuestType::Side), vec![side]);
        assert!(subsystem.are_all_objectives_completed(side));
        assert!(!subsystem.are_all_objectives_completed(main));
    }

    #[test]
    fn test_remove_and_reset() {
        let mut subsystem = subsystem();
        let a = subsystem.register_asset(chain("A", &["A"]));
        let b = subsystem.register_asset(chain("B", &["B"]));
        subsystem.add_quest(a, true, None);
        subsystem.add_quest(b, false, None);

        assert!(subsystem.remove_quest(a));
        assert!(!subsystem.remove_quest(a));
        assert_eq!(subsystem.tracked_quest(), None);

        subsystem.reset_all_quests();
        assert!(subsystem.registered_quests().is_empty());
        assert_eq!(subsystem.quest_status(b), None);
    }
}
